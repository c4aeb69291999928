use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use segment_router::SegmentMarker;

#[derive(Parser)]
#[command(name = "segctl")]
#[command(about = "Management CLI for the segment router", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "SEGCTL_API_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check router status
    Status,
    /// List registered classifiers in dispatch order
    Classifiers,
    /// Show the schema → backend group table
    Segments,
    /// Encode a schema name into a segment marker
    Encode { schema: String },
    /// Decode a segment marker into its schema name
    Decode { marker: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let path = match cli.command {
        Commands::Encode { schema } => {
            let marker = SegmentMarker::new(schema).ok_or("schema name must not be empty")?;
            println!("{}", marker.encode());
            return Ok(());
        }
        Commands::Decode { marker } => {
            let marker = SegmentMarker::decode(&marker)?;
            println!("{}", marker.schema());
            return Ok(());
        }
        Commands::Status => "status",
        Commands::Classifiers => "classifiers",
        Commands::Segments => "segments",
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = reqwest::Client::new()
        .get(format!("{}/admin/{}", cli.url.trim_end_matches('/'), path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
