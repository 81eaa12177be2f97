use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "lifecycle-cli")]
#[command(about = "Management CLI for the service lifecycle controller", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the composite health snapshot
    Health,
    /// Show version and lifecycle state
    Status,
    /// Ask the service to shut down gracefully
    Shutdown,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            let up = res.status().is_success();
            print_response(res).await?;
            if !up {
                std::process::exit(1);
            }
        }
        Commands::Status => {
            let res = client.get(format!("{}/admin/status", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Shutdown => {
            let res = client.post(format!("{}/admin/shutdown", cli.url)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    if !status.is_success() {
        eprintln!("HTTP {}", status);
    }
    Ok(())
}
