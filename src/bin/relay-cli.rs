use clap::{Parser, Subcommand};
use request_relay::relay::{RequestDescription, ResponseEnvelope};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Command-line client for the request relay service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay a request through the service
    Send {
        /// HTTP method (GET, POST, ... or any custom verb)
        method: String,
        /// Target URL
        target: String,
        /// Header as 'Name: value' (repeatable)
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
        /// Query parameter as key=value (repeatable)
        #[arg(short = 'q', long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Request body; parsed as JSON when possible, sent as text otherwise
        #[arg(short = 'd', long = "data")]
        data: Option<String>,
        /// Do not record the exchange in history
        #[arg(long)]
        no_history: bool,
    },
    /// Inspect or manage recorded requests
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Check service liveness
    Health,
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List records, most recent first
    List,
    /// Show one record
    Get { id: String },
    /// Delete one record
    Delete { id: String },
    /// Delete all records
    Clear,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Send {
            method,
            target,
            headers,
            params,
            data,
            no_history,
        } => {
            let mut request = RequestDescription::new(method, target);
            request.headers.extend(headers);
            request.params.extend(params);
            request.body = data.as_deref().map(parse_body);

            let res = client
                .post(format!("{}/proxy/send", base))
                .json(&request)
                .send()
                .await?;
            if !res.status().is_success() {
                return print_error(res).await;
            }

            let envelope: ResponseEnvelope = res.json().await?;
            eprintln!(
                "{} {} ({} ms, {} bytes)",
                envelope.status, envelope.status_text, envelope.response_time, envelope.size
            );
            println!("{}", serde_json::to_string_pretty(&envelope)?);

            if !no_history {
                let res = client
                    .post(format!("{}/history", base))
                    .json(&json!({ "request": request, "response": envelope }))
                    .send()
                    .await?;
                if !res.status().is_success() {
                    eprintln!("Warning: failed to record history ({})", res.status());
                }
            }
        }
        Commands::History { command } => match command {
            HistoryCommands::List => {
                let res = client.get(format!("{}/history", base)).send().await?;
                print_response(res).await?;
            }
            HistoryCommands::Get { id } => {
                let res = client.get(format!("{}/history/{}", base, id)).send().await?;
                print_response(res).await?;
            }
            HistoryCommands::Delete { id } => {
                let res = client
                    .delete(format!("{}/history/{}", base, id))
                    .send()
                    .await?;
                print_response(res).await?;
            }
            HistoryCommands::Clear => {
                let res = client.delete(format!("{}/history", base)).send().await?;
                print_response(res).await?;
            }
        },
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{}'", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    Ok((key.to_string(), value.to_string()))
}

fn parse_body(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

async fn print_error(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Error: relay service returned status {}", res.status());
    if let Ok(text) = res.text().await {
        eprintln!("Response: {}", text);
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        return print_error(res).await;
    }

    let text = res.text().await?;
    if text.is_empty() {
        if status == reqwest::StatusCode::NO_CONTENT {
            println!("Done");
        } else {
            println!("Not found");
        }
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
