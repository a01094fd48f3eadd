use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Management CLI for the rate limiting gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "GATE_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Gateway version, store backend and window policy
    Status,
    /// Effective quota per endpoint class
    Limits,
    /// Hourly usage per endpoint class
    Usage {
        /// Hours since the Unix epoch (defaults to the current hour)
        #[arg(long)]
        hour: Option<u64>,
    },
    /// Classes rejecting more than 10% of this hour's traffic
    Alerts,
    /// Clear a client's counters for one endpoint class
    Reset {
        /// Client id as shown by `usage` (IP address or `key:<hash>`)
        #[arg(long)]
        client: String,
        /// Endpoint class (auth, ai, live, websocket, admin, general)
        #[arg(long)]
        class: String,
    },
}

impl Commands {
    fn path(&self) -> String {
        match self {
            Commands::Status => "/admin/status".to_string(),
            Commands::Limits => "/admin/limits".to_string(),
            Commands::Usage { hour: Some(hour) } => format!("/admin/usage?hour={}", hour),
            Commands::Usage { hour: None } => "/admin/usage".to_string(),
            Commands::Alerts => "/admin/alerts".to_string(),
            Commands::Reset { .. } => "/admin/reset".to_string(),
        }
    }
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

    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path());
    let res = match &cli.command {
        Commands::Reset { client: id, class } => {
            client
                .post(url)
                .headers(headers)
                .json(&json!({ "client": id, "class": class }))
                .send()
                .await?
        }
        _ => client.get(url).headers(headers).send().await?,
    };
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
