//! SolAgent CLI entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use solagent::{config, ui, Response, SolAgent, StreamCallbacks, Toolbox, Wallet};

const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
const RPC_URL_ENV: &str = "SOLANA_RPC_URL";

#[derive(Parser)]
#[command(name = "solagent")]
#[command(about = "SolAgent - provider-agnostic text-generation gateway")]
#[command(version)]
struct Cli {
    /// Solana RPC endpoint (defaults to $SOLANA_RPC_URL, then mainnet-beta)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a prompt to a model
    Prompt {
        /// Model identifier, e.g. "openai:gpt-4o-mini" or "ollama:llama3"
        #[arg(short, long)]
        model: String,

        /// Print the reply as it streams in
        #[arg(short, long)]
        stream: bool,

        /// Prompt text
        text: String,
    },

    /// List the registered providers
    Providers,

    /// Show RPC health and configured credentials
    Status,

    /// Write a default configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env first, so RUST_LOG set there reaches the filter
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let path = config::config_path();
            if path.exists() {
                ui::print_warning(&format!("Config already exists at {:?}", path));
                return Ok(());
            }
            let path = config::save(&config::Config::default())?;
            ui::print_success(&format!("Wrote {:?}", path));
            ui::print_step("Set OPENAI_API_KEY / GOOGLE_API_KEY / DEEPSEEK_API_KEY or edit the file.");
        }

        Commands::Providers => {
            let agent = build_gateway(cli.rpc_url.as_deref())?;
            for name in agent.registry().available() {
                println!("{name}");
            }
        }

        Commands::Status => {
            let agent = build_gateway(cli.rpc_url.as_deref())?;
            ui::print_header("Status", agent.wallet().rpc_url().as_str());

            match agent.connection().get_health().await {
                Ok(health) => ui::print_success(&format!("RPC health: {health}")),
                Err(e) => ui::print_error(&format!("RPC health check failed: {e}")),
            }

            let configured = agent.config().providers.configured();
            for name in agent.registry().available() {
                if configured.iter().any(|c| *c == name) {
                    ui::print_step(&format!("{name}: ✓"));
                } else {
                    ui::print_step(&format!("{name}: credentials not set"));
                }
            }
        }

        Commands::Prompt {
            model,
            stream,
            text,
        } => {
            let agent = build_gateway(cli.rpc_url.as_deref())?;
            run_prompt(&agent, &model, &text, stream).await?;
        }
    }

    Ok(())
}

fn build_gateway(rpc_url: Option<&str>) -> Result<SolAgent> {
    let wallet = match rpc_url {
        Some(url) => Wallet::new(url)?,
        None if std::env::var_os(RPC_URL_ENV).is_some() => Wallet::from_env(RPC_URL_ENV)?,
        None => Wallet::new(DEFAULT_RPC_URL)?,
    };

    let mut config = config::load()?;
    config.providers.fill_from_env();

    Ok(SolAgent::create(wallet, config))
}

async fn run_prompt(agent: &SolAgent, model: &str, text: &str, stream: bool) -> Result<()> {
    use std::io::Write;

    let callbacks = stream.then(|| {
        StreamCallbacks::new()
            .on_chunk(|chunk| {
                print!("{chunk}");
                std::io::stdout().flush().ok();
            })
            .on_final(|_| println!())
    });

    match agent.prompt(model, &Toolbox::new(), text, callbacks).await {
        Ok(Response::Text(reply)) => println!("{reply}"),
        Ok(Response::Stream(stream)) => {
            if let Err(e) = stream.drain().await {
                println!();
                ui::print_error(&e.to_string());
                return Err(e.into());
            }
        }
        Err(e) => {
            ui::print_error(&e.to_string());
            return Err(e.into());
        }
    }

    Ok(())
}
