use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "hwd-cli")]
#[command(about = "Command line client for the hardware wallet daemon", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:9510")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show daemon build info
    Version,
    /// Check whether a device is connected
    Available,
    /// Show device features
    Features,
    /// Request a CSRF token
    Csrf,
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Version => "version",
            Commands::Available => "available",
            Commands::Features => "features",
            Commands::Csrf => "csrf",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let url = format!("{}/api/v1/{}", cli.url.trim_end_matches('/'), cli.command.path());
    let res = client.get(url).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: daemon returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
