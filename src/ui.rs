// UI layer: terminal output helpers and the interactive menu.
// The menu uses `dialoguer` prompts and drives the same `BinClient`
// operations as the flag-based commands.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::BinClient;
use crate::bins::BinList;
use crate::cli::DEFAULT_BIN_NAME;
use crate::store::Store;
use crate::transport::Transport;

/// Run `work` while a spinner with `message` is shown on stderr. The
/// spinner hides itself when stderr is not a terminal.
pub fn with_spinner<T>(message: &str, work: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = work();
    spinner.finish_and_clear();
    result
}

/// Render the content of a bin the way `-get` prints it.
pub fn render_bin_list(id: &str, list: &BinList) -> String {
    let mut out = format!("Bin {id} content:\n");
    if list.is_empty() {
        out.push_str("  (no bins)\n");
    }
    for (i, bin) in list.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, bin));
    }
    out
}

/// Interactive menu. Loops until the user picks "Exit". Failed operations
/// are reported and the menu continues.
pub fn main_menu<T: Transport, S: Store>(client: &BinClient<T, S>, save_file: &Path) -> Result<()> {
    let items = ["Create bin", "Read bin", "Update bin", "Delete bin", "List saved bins", "Exit"];
    loop {
        let selection = Select::new()
            .with_prompt("What do you want to do?")
            .items(&items)
            .default(0)
            .interact()?;
        let outcome = match selection {
            0 => handle_create(client, save_file),
            1 => handle_get(client),
            2 => handle_update(client),
            3 => handle_delete(client, save_file),
            4 => client
                .list(save_file, &mut io::stdout())
                .map(|_| ())
                .map_err(anyhow::Error::from),
            _ => break,
        };
        if let Err(err) = outcome {
            println!("Failed: {err:#}");
        }
    }
    Ok(())
}

fn prompt_id() -> Result<String> {
    let id: String = Input::new().with_prompt("Bin id").interact_text()?;
    Ok(id.trim().to_string())
}

fn prompt_file() -> Result<PathBuf> {
    let path: String = Input::new().with_prompt("JSON file path").interact_text()?;
    Ok(PathBuf::from(path.trim()))
}

fn handle_create<T: Transport, S: Store>(client: &BinClient<T, S>, save_file: &Path) -> Result<()> {
    let file = prompt_file()?;
    let name: String = Input::new()
        .with_prompt("Bin name")
        .default(DEFAULT_BIN_NAME.to_string())
        .interact_text()?;
    let save = Confirm::new()
        .with_prompt(format!("Save the id to {}?", save_file.display()))
        .default(true)
        .interact()?;

    let save_as = save.then_some(save_file);
    let id = with_spinner("Creating bin...", || client.create_bin(&file, &name, save_as))?;
    println!("Success! Created bin → ID: {id}");
    Ok(())
}

fn handle_get<T: Transport, S: Store>(client: &BinClient<T, S>) -> Result<()> {
    let id = prompt_id()?;
    let list = with_spinner("Reading bin...", || client.get(&id))?;
    print!("{}", render_bin_list(&id, &list));
    Ok(())
}

fn handle_update<T: Transport, S: Store>(client: &BinClient<T, S>) -> Result<()> {
    let id = prompt_id()?;
    let file = prompt_file()?;
    with_spinner("Updating bin...", || client.update(&file, &id))?;
    println!("Success! Bin {id} updated.");
    Ok(())
}

fn handle_delete<T: Transport, S: Store>(client: &BinClient<T, S>, save_file: &Path) -> Result<()> {
    let id = prompt_id()?;
    let sure = Confirm::new()
        .with_prompt(format!("Delete bin {id}? This cannot be undone"))
        .default(false)
        .interact()?;
    if !sure {
        return Ok(());
    }
    with_spinner("Deleting bin...", || client.delete(&id))?;
    println!("Success! Bin {id} deleted.");

    let prune = Confirm::new()
        .with_prompt(format!("Also remove it from {}?", save_file.display()))
        .default(true)
        .interact()?;
    if prune {
        let removed = client.prune_saved(save_file, &id)?;
        println!("Removed {removed} saved entr{}.", if removed == 1 { "y" } else { "ies" });
    }
    Ok(())
}
