use calculator_service::rpc::CalculatorClient;
use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "calculator-cli")]
#[command(about = "Command line client for the calculator service", long_about = None)]
struct Cli {
    /// gRPC endpoint of the service.
    #[arg(short, long, env = "CALCULATOR_GRPC_URL", default_value = "http://localhost:8083")]
    grpc: String,

    /// Service HTTP endpoint, used by `status` and `version`.
    #[arg(long, env = "CALCULATOR_HTTP_URL", default_value = "http://localhost:8080")]
    http: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// a + b
    Add(Operands),
    /// a - b
    Subtract(Operands),
    /// a * b
    Multiply(Operands),
    /// a / b
    Divide(Operands),
    /// Show dependency status
    Status,
    /// Show build information
    Version,
}

#[derive(clap::Args)]
struct Operands {
    #[arg(allow_negative_numbers = true)]
    a: f64,
    #[arg(allow_negative_numbers = true)]
    b: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Status => return get_json(&format!("{}/status", cli.http)).await,
        Commands::Version => return get_json(&format!("{}/version", cli.http)).await,
        Commands::Add(Operands { a, b }) => CalculatorClient::from_uri(cli.grpc)?.add(a, b).await,
        Commands::Subtract(Operands { a, b }) => CalculatorClient::from_uri(cli.grpc)?.subtract(a, b).await,
        Commands::Multiply(Operands { a, b }) => CalculatorClient::from_uri(cli.grpc)?.multiply(a, b).await,
        Commands::Divide(Operands { a, b }) => CalculatorClient::from_uri(cli.grpc)?.divide(a, b).await,
    };

    match result {
        Ok(value) => println!("{value}"),
        Err(status) => {
            eprintln!("Error: {:?}: {}", status.code(), status.message());
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn get_json(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let res = reqwest::get(url).await?;
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
