// Entrypoint for the `jsonbin` CLI.
// - Parses flags, sets up logging, loads the configuration and runs one
//   action against the bin service.
// - Returns `anyhow::Result` so any failure prints a message and exits 1.

use std::path::Path;

use anyhow::{Context, Result};
use clap::CommandFactory;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jsonbin_cli::bins::{self, Bin};
use jsonbin_cli::cli::{Action, Cli, DEFAULT_SAVE_FILE};
use jsonbin_cli::store::FileStore;
use jsonbin_cli::ui::{main_menu, render_bin_list, with_spinner};
use jsonbin_cli::{BinClient, Config};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    // No action: show usage and exit successfully.
    let Some(action) = cli.action()? else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match action {
        Action::New { file, bin_name, private } => add_local_bin(&file, &bin_name, private),
        action => run_remote(&cli, action),
    }
}

/// `-new`: append a locally built bin to a bin-list file. No network.
fn add_local_bin(file: &Path, bin_name: &str, private: bool) -> Result<()> {
    let bin = Bin::new(bin_name, private)?;
    let list = bins::add_to_file(&FileStore::new(), file, bin.clone())
        .with_context(|| format!("Failed to add bin to {}", file.display()))?;
    println!("Added {} to {} ({} bins total).", bin, file.display(), list.len());
    Ok(())
}

fn run_remote(cli: &Cli, action: Action) -> Result<()> {
    let config = Config::load(cli.env.as_deref()).context("Failed to load configuration")?;
    let client = BinClient::new(config)?;

    match action {
        Action::Create { file, bin_name, save } => {
            let id = with_spinner("Creating bin...", || {
                client.create_bin(&file, &bin_name, save.as_deref())
            })
            .context("Failed to create bin")?;
            println!("Success! Created bin → ID: {id}");
        }
        Action::Get { id } => {
            let list = with_spinner("Reading bin...", || client.get(&id))
                .context("Failed to read bin")?;
            print!("{}", render_bin_list(&id, &list));
        }
        Action::Update { file, id } => {
            with_spinner("Updating bin...", || client.update(&file, &id))
                .context("Failed to update bin")?;
            println!("Success! Bin {id} updated.");
        }
        Action::Delete { id, prune } => {
            with_spinner("Deleting bin...", || client.delete(&id))
                .context("Failed to delete bin")?;
            println!("Success! Bin {id} deleted.");
            if let Some(save) = prune {
                match client.prune_saved(&save, &id) {
                    Ok(removed) => println!("Removed {removed} saved entries from {}.", save.display()),
                    Err(err) => warn!(error = %err, "bin deleted but its saved id was not pruned"),
                }
            }
        }
        Action::List { save } => {
            client
                .list(&save, &mut std::io::stdout())
                .context("Failed to list bins")?;
        }
        Action::Interactive => {
            let save = if cli.save.is_empty() { DEFAULT_SAVE_FILE } else { cli.save.as_str() };
            main_menu(&client, Path::new(save))?;
        }
        Action::New { file, bin_name, private } => add_local_bin(&file, &bin_name, private)?,
    }

    Ok(())
}
