use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vibe::broker::Credentials;

#[derive(Parser, Debug)]
#[command(name = "vibe", about = "Brokerage and market-data tools for a trading agent")]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print the output JSON
    #[arg(long, global = true)]
    pretty: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every tool's function declaration
    Tools,

    /// Invoke one tool and print its tagged result
    Call {
        /// Tool name, e.g. get_current_price
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable (respects RUST_LOG)
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = vibe::load_config(cli.config.as_deref())?;

    let output = match cli.command {
        Command::Tools => render(&vibe::tools::declarations(), cli.pretty)?,
        Command::Call { tool, args } => {
            let args: serde_json::Value =
                serde_json::from_str(&args).context("Failed to parse --args JSON")?;
            let credentials = Credentials::from_env().context("Missing vendor credentials")?;
            let registry = vibe::build_registry(&config, credentials)
                .context("Failed to build tool registry")?;

            let result = registry.call(&tool, args).await;
            render(&result, cli.pretty)?
        }
    };
    println!("{output}");

    Ok(())
}

fn render<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}
