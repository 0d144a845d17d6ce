// SpaceTraders sync engine - command line entry point

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use spacetraders_sync::{logging, Action, Admiral, FleetStatus, SyncConfig};

#[derive(Parser)]
#[command(name = "spacetraders-sync", version, about = "Client-side state sync for SpaceTraders")]
struct Cli {
    /// Configuration file, created with defaults if missing
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the current snapshot and print agent, fleet, contracts and cooldowns
    Status,
    /// Fetch the snapshot, then run a JSON list of actions in order
    Run {
        /// File holding `[{"kind": "orbit", "shipSymbol": "..."}, ...]`
        actions: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Start at the command-line level so config loading is logged too
    let mut log = logging::init(cli.verbose);
    let config = match SyncConfig::load_or_create(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };
    log.widen(config.logging.verbosity);
    config.log_summary();

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &SyncConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Parse the action file before spending any requests
    let actions: Option<Vec<Action>> = match &command {
        Command::Status => None,
        Command::Run { actions } => {
            let raw = fs::read_to_string(actions)
                .map_err(|e| format!("failed to read {}: {}", actions.display(), e))?;
            Some(serde_json::from_str(&raw).map_err(|e| format!("invalid action list: {}", e))?)
        }
    };

    let token = config.load_agent_token()?;
    let mut admiral = Admiral::connect(config, token).await?;

    match actions {
        None => print_status(&admiral.fleet_status()),
        Some(actions) => {
            let mut transactions = admiral.take_transactions();
            let total = actions.len();

            for (index, action) in actions.into_iter().enumerate() {
                let kind = action.kind();
                match admiral.execute(action).await {
                    Ok(outcome) => {
                        println!("✅ [{}/{}] {}: {:?}", index + 1, total, kind, outcome);
                    }
                    Err(e) => {
                        println!("❌ [{}/{}] {}: {}", index + 1, total, kind, e);
                        if let Some(api_error) = e.api_error() {
                            println!("   category: {:?}", api_error.category());
                        }
                        break;
                    }
                }

                if let Some(receiver) = transactions.as_mut() {
                    while let Ok(event) = receiver.try_recv() {
                        println!("   💰 {:?}", event);
                    }
                }
            }

            print_status(&admiral.fleet_status());
        }
    }

    admiral.shutdown().await;
    Ok(())
}

fn print_status(status: &FleetStatus) {
    if let Some(agent) = &status.agent {
        println!("📊 Agent {} @ {}", agent.symbol, agent.headquarters);
        println!("   💰 Credits: {}", agent.credits);
    }

    println!("🚢 Fleet ({} ships):", status.ships.len());
    for ship in &status.ships {
        println!(
            "   • {} {:?} at {} | fuel {}/{} | cargo {}/{}",
            ship.symbol,
            ship.nav.status,
            ship.nav.waypoint_symbol,
            ship.fuel.current,
            ship.fuel.capacity,
            ship.cargo.units,
            ship.cargo.capacity
        );
    }

    println!("📋 Contracts ({}):", status.contracts.len());
    for contract in &status.contracts {
        println!(
            "   • {} {:?} accepted={} fulfilled={}",
            contract.id, contract.contract_type, contract.accepted, contract.fulfilled
        );
        for delivery in &contract.terms.deliver {
            println!(
                "     - {} → {}: {}/{}",
                delivery.trade_symbol, delivery.destination_symbol, delivery.units_fulfilled, delivery.units_required
            );
        }
    }

    if status.cooldowns.is_empty() {
        println!("⏳ No active cooldowns");
    } else {
        println!("⏳ Cooldowns:");
        for (ship, remaining) in &status.cooldowns {
            println!("   • {}: {}s", ship, remaining.as_secs());
        }
    }
}
