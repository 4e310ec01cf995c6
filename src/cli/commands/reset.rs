//! `vaultkeep reset` — move the current vault aside.
//!
//! Used when the passphrase is lost or the record no longer matches this
//! device.  The old record is renamed, never deleted.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{build_store, log_audit, Cli};
use crate::errors::{Result, VaultKeepError};

/// Execute the `reset` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let mut store = build_store(cli)?;

    if !store.is_initialized()? {
        output::info(&format!("No vault at {}", store.location()));
        return Ok(());
    }

    if !force {
        let confirmed = Confirm::new()
            .with_prompt("Move the current vault aside? It will no longer be opened.")
            .default(false)
            .interact()
            .map_err(|e| VaultKeepError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let moved = store.reset()?;
    let detail = moved.as_ref().map(|p| p.display().to_string());
    log_audit(cli, "reset", "ok", detail.as_deref());

    match moved {
        Some(path) => output::success(&format!("Old vault moved to {}", path.display())),
        None => output::success("Vault removed"),
    }
    output::tip("Run `vaultkeep init` to create a new vault.");

    Ok(())
}
