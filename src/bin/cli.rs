use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use toolgate::{
    config::{load_instances, settings::default_config_path},
    models::{JsonObject, ToolCallResult},
    plugins::{self, Plugin},
    AppState,
};

#[derive(Parser)]
#[command(name = "toolgate-cli")]
#[command(about = "CLI tool for checking and exercising a toolgate configuration", long_about = None)]
struct Cli {
    /// External system served by the gateway
    #[arg(short, long, env = "TOOLGATE_SYSTEM", default_value = "jenkins")]
    system: String,

    /// Instance file (defaults to <system>-config.json)
    #[arg(short, long, env = "TOOLGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the instance file
    CheckConfig,

    /// List the tools of the selected system
    Tools,

    /// Run one tool call against the configured backend
    Call {
        /// Tool name
        tool: String,

        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

/// One dispatch against the real backend, as the server would run it
async fn call_tool(
    plugin: &Plugin,
    config: &Path,
    tool: &str,
    raw_args: &str,
) -> Result<ToolCallResult> {
    let arguments: JsonObject =
        serde_json::from_str(raw_args).context("--args must be a JSON object")?;
    let instances = load_instances(config)?;
    let state = AppState::build(plugin, instances)?;

    Ok(state.dispatcher.dispatch(tool, Some(arguments)).await)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let plugin = match plugins::for_system(&cli.system) {
        Ok(plugin) => plugin,
        Err(err) => {
            eprintln!("❌ {}", err);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Tools => {
            println!("{:<28} {:<8} Description", "Tool", "Returns");
            println!("{}", "-".repeat(75));
            for tool in plugin.tools() {
                println!(
                    "{:<28} {:<8} {}",
                    tool.name(),
                    tool.result_shape().as_str(),
                    tool.description()
                );
            }
        }

        Commands::CheckConfig => {
            let path = cli
                .config
                .unwrap_or_else(|| default_config_path(plugin.name()));
            match load_instances(&path) {
                Ok(config) => {
                    println!("✅ {} is valid", path.display());
                    for instance in &config.instances {
                        let restriction = instance
                            .restriction()
                            .map(|r| format!(" ({})", r))
                            .unwrap_or_default();
                        println!("  {:<16} {}{}", instance.name, instance.base_url, restriction);
                    }
                }
                Err(err) => {
                    eprintln!("❌ {}", err);
                    std::process::exit(1);
                }
            }
        }

        Commands::Call { tool, args } => {
            let path = cli
                .config
                .unwrap_or_else(|| default_config_path(plugin.name()));
            match call_tool(&plugin, &path, &tool, &args).await {
                Ok(result) => {
                    println!("{}", serde_json::to_string_pretty(&result.to_json())?);
                    if result.is_error() {
                        std::process::exit(1);
                    }
                }
                Err(err) => {
                    eprintln!("❌ {:#}", err);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
