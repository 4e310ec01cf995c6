//! `vaultkeep init` — create a new, empty vault.

use crate::cli::output;
use crate::cli::{build_store, log_audit, prompt_new_passphrase, Cli, PASSPHRASE_ENV};
use crate::errors::{Result, VaultKeepError};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut store = build_store(cli)?;

    // Fail before prompting if a vault is already there.
    if store.is_initialized()? {
        output::tip("Use `vaultkeep reset` to start over.");
        return Err(VaultKeepError::VaultAlreadyExists(store.location()));
    }

    let passphrase = prompt_new_passphrase(PASSPHRASE_ENV)?;
    store.initialize(passphrase.as_bytes())?;

    log_audit(cli, "init", "ok", Some("vault created"));

    output::success(&format!("Vault created at {}", store.location()));
    if cli.device_id.is_some() {
        output::info("Vault is bound to this device id; pass the same --device-id to open it.");
    }
    output::tip("Run `vaultkeep set <KEY>` to add an entry.");

    Ok(())
}
