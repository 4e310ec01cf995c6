//! `vaultkeep delete` — remove an entry from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{build_store, log_audit, unlock_contents, Cli};
use crate::errors::{Result, VaultKeepError};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, key: &str, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete entry '{key}'?"))
            .default(false)
            .interact()
            .map_err(|e| VaultKeepError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let mut store = build_store(cli)?;
    let mut contents = unlock_contents(cli, &mut store)?;

    contents.remove(key)?;
    store.save_contents(&contents)?;
    store.lock();

    log_audit(cli, "delete", "ok", None);
    output::success(&format!("Deleted entry '{key}'"));

    Ok(())
}
