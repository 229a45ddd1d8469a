use std::collections::BTreeMap;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use actor_controller::http::READINESS_HEADER;

#[derive(Parser)]
#[command(name = "actor-cli")]
#[command(about = "Client for a running actor-controller standby server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:4321")]
    url: String,

    /// API token; falls back to APIFY_TOKEN
    #[arg(short, long, env = "APIFY_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a readiness probe
    Probe,
    /// Run a task with GET query parameters (key=value)
    Get {
        #[arg(value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
    /// Run a task with a JSON body
    Post {
        /// JSON object, e.g. '{"url": "https://example.com"}'
        body: String,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
    }

    match cli.command {
        Commands::Probe => {
            let res = client
                .get(&cli.url)
                .header(READINESS_HEADER, "1")
                .send()
                .await?;
            let status = res.status();
            println!("{} {}", status.as_u16(), res.text().await?);
            Ok(status.is_success())
        }
        Commands::Get { params } => {
            let query: BTreeMap<String, String> = params.into_iter().collect();
            let res = client
                .get(&cli.url)
                .headers(headers)
                .query(&query)
                .send()
                .await?;
            print_response(res).await
        }
        Commands::Post { body } => {
            let body: Value = serde_json::from_str(&body)?;
            let res = client
                .post(&cli.url)
                .headers(headers)
                .json(&body)
                .send()
                .await?;
            print_response(res).await
        }
    }
}

async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: server returned status {}", status);
        eprintln!("{}", rendered);
    }
    Ok(status.is_success())
}
