use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "conf-cli")]
#[command(about = "Client for the PgBouncer configuration API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:6488")]
    url: String,

    #[arg(long, default_value = "")]
    username: String,

    #[arg(long, default_value = "")]
    password: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set one or more KEY=VALUE entries
    Set {
        #[arg(required = true, value_parser = parse_pair)]
        pairs: Vec<(String, String)>,
    },
    /// Remove one or more keys
    Unset {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Upload a file into the conf directory and point KEY at it
    Upload { key: String, file: PathBuf },
    /// Reload without changing any key
    Reload,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{}`", s)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut request = match cli.command {
        Commands::Set { pairs } => client.post(&cli.url).form(&pairs),
        Commands::Unset { keys } => {
            let pairs: Vec<(String, String)> = keys.into_iter().map(|k| (k, String::new())).collect();
            client.post(&cli.url).form(&pairs)
        }
        Commands::Upload { key, file } => {
            let data = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| key.clone());
            let form = Form::new().part(key, Part::bytes(data).file_name(file_name));
            client.post(&cli.url).multipart(form)
        }
        Commands::Reload => client.post(&cli.url),
    };

    if !cli.username.is_empty() || !cli.password.is_empty() {
        request = request.basic_auth(&cli.username, Some(&cli.password));
    }

    let res = request.send().await?;
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        eprintln!("Response: {}", text);
        std::process::exit(1);
    }
    println!("{}", text);
    Ok(())
}
