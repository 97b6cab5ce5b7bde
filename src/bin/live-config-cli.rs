use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Parser)]
#[command(name = "live-config-cli")]
#[command(about = "Inspect and change variables of a running live-config endpoint", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Bearer token, when the endpoint requires one
    #[arg(short, long, env = "LIVE_CONFIG_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every environment-backed variable
    Get {
        /// Only show this variable
        name: Option<String>,
    },
    /// Set variables from NAME=VALUE pairs (JSON body)
    Set {
        #[arg(required = true, value_parser = parse_pair)]
        pairs: Vec<(String, String)>,
    },
    /// Set variables from NAME=VALUE pairs (query string)
    Put {
        #[arg(required = true, value_parser = parse_pair)]
        pairs: Vec<(String, String)>,
    },
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got {:?}", s))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let url = format!("{}/", cli.url.trim_end_matches('/'));

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key))?,
        );
    }

    match cli.command {
        Commands::Get { name } => {
            let res = client.get(&url).headers(headers).send().await?;
            let status = res.status();
            if !status.is_success() {
                return report_failure(res).await;
            }
            let vars: BTreeMap<String, Value> = res.json().await?;
            match name {
                Some(name) => match vars.get(&name) {
                    Some(value) => println!("{}", value),
                    None => {
                        eprintln!("Error: no environment-backed variable named {}", name);
                        std::process::exit(1);
                    }
                },
                None => println!("{}", serde_json::to_string_pretty(&vars)?),
            }
        }
        Commands::Set { pairs } => {
            let body: BTreeMap<String, String> = pairs.into_iter().collect();
            let res = client.post(&url).headers(headers).json(&body).send().await?;
            print_update(res).await?;
        }
        Commands::Put { pairs } => {
            let res = client.put(&url).headers(headers).query(&pairs).send().await?;
            print_update(res).await?;
        }
    }

    Ok(())
}

async fn print_update(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    if res.status().is_success() {
        println!("{}", res.status());
        return Ok(());
    }
    report_failure(res).await
}

async fn report_failure(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Error: control endpoint returned status {}", res.status());
    if let Ok(text) = res.text().await {
        if !text.is_empty() {
            eprintln!("{}", text);
        }
    }
    std::process::exit(1);
}
