mod builtins;
mod card;
mod config;
mod error;
mod host;
mod model;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};
use host::Agent;

const CONFIG_FILE: &str = "switchboard.toml";

#[derive(Parser)]
#[command(name = "switchboard")]
#[command(about = "A tool-dispatching A2A agent", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./switchboard.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Host advertised on the agent card
    #[arg(long, global = true)]
    host: Option<String>,

    /// Port advertised on the agent card
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session
    Chat,
    /// Dispatch a single request and print the reply
    ///
    /// Flags may appear anywhere. Put text that starts with `-` after `--`.
    Ask {
        /// Request text
        #[arg(required = true, allow_negative_numbers = true)]
        text: Vec<String>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the A2A agent card as JSON
    Card,
    /// List registered tools
    Tools,
}

fn main() {
    init_logging();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let agent = Agent::from_config(&config)?;
    tracing::info!(
        agent = %config.agent.name,
        tools = agent.registry().len(),
        "agent ready"
    );

    // The agent may own a blocking HTTP client, which must be dropped
    // outside the runtime, so it lives outside `block_on`.
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        match cli.command {
            Some(Commands::Chat) | None => cmd_chat(&agent, &config).await,
            Some(Commands::Ask { text, json }) => cmd_ask(&agent, &text.join(" "), json).await,
            Some(Commands::Card) => cmd_card(&agent, &config),
            Some(Commands::Tools) => {
                cmd_tools(&agent);
                Ok(())
            }
        }
    })
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) if !path.exists() => {
            return Err(Error::ConfigNotFound { path: path.clone() });
        }
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(CONFIG_FILE)?,
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    config.apply_overrides(cli.host.clone(), cli.port);
    Ok(config)
}

async fn cmd_chat(agent: &Agent, config: &Config) -> Result<()> {
    println!("{} v{}", config.agent.name, env!("CARGO_PKG_VERSION"));
    let names: Vec<_> = agent.registry().tools().map(|t| t.name()).collect();
    println!(
        "Tools: {}",
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        }
    );
    println!("Type 'quit' or Ctrl+D to exit.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "exit" {
            break;
        }

        let reply = agent.handle(input).await;
        println!("\n{}\n", reply.result.reply_text);
    }

    println!("\nSession ended.");
    Ok(())
}

async fn cmd_ask(agent: &Agent, text: &str, json: bool) -> Result<()> {
    let reply = agent.handle(text).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        println!("{}", reply.result.reply_text);
    }
    Ok(())
}

fn cmd_card(agent: &Agent, config: &Config) -> Result<()> {
    let card = card::build_agent_card(&config.agent, agent.registry());
    println!("{}", serde_json::to_string_pretty(&card)?);
    Ok(())
}

fn cmd_tools(agent: &Agent) {
    if agent.registry().is_empty() {
        println!("No tools registered. Built-ins: {}", builtins::AVAILABLE.join(", "));
        return;
    }

    println!("{:<14}  {:<28}  DESCRIPTION", "NAME", "TAGS");
    println!("{}", "-".repeat(80));

    for tool in agent.registry().tools() {
        println!(
            "{:<14}  {:<28}  {}",
            tool.name(),
            tool.tags().join(", "),
            tool.description()
        );
    }
    println!("\nBuilt-ins: {}", builtins::AVAILABLE.join(", "));
}
