use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "search-admin")]
#[command(about = "Operator CLI for search engine failover", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "SEARCH_ADMIN_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show search engine health and rollback state
    Status,
    /// Route all search traffic to the database fallback
    Rollback {
        /// Reason tag recorded with the rollback
        #[arg(short, long, default_value = "manual_intervention")]
        reason: String,
    },
    /// Re-probe the search engine and restore it if healthy
    Recover,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = match cli.command {
        Commands::Status => {
            client
                .get(format!("{}/health/search", cli.url))
                .send()
                .await?
        }
        Commands::Rollback { reason } => {
            client
                .post(format!("{}/admin/search/rollback", cli.url))
                .headers(headers)
                .json(&json!({ "reason": reason }))
                .send()
                .await?
        }
        Commands::Recover => {
            client
                .post(format!("{}/admin/search/recover", cli.url))
                .headers(headers)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let body = res.text().await?;

    match serde_json::from_str::<Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", body),
    }

    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        std::process::exit(1);
    }
    Ok(())
}
