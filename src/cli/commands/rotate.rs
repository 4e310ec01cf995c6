//! `vaultkeep rotate` — change the vault passphrase.
//!
//! Opens the record with the current passphrase, generates a new salt,
//! derives a new key from the new passphrase and re-seals the same
//! contents.  The record is replaced atomically.

use crate::cli::output;
use crate::cli::{build_store, log_audit, prompt_new_passphrase, prompt_passphrase, Cli, NEW_PASSPHRASE_ENV};
use crate::errors::Result;

/// Execute the `rotate` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut store = build_store(cli)?;

    output::info("Enter your current vault passphrase.");
    let old_passphrase = prompt_passphrase()?;

    output::info("Choose your new vault passphrase.");
    let new_passphrase = prompt_new_passphrase(NEW_PASSPHRASE_ENV)?;

    match store.rotate_passphrase(old_passphrase.as_bytes(), new_passphrase.as_bytes()) {
        Ok(_) => log_audit(cli, "rotate", "ok", None),
        Err(e) => {
            if e.is_unlock_failure() {
                log_audit(cli, "rotate", "failed", None);
            }
            return Err(e);
        }
    }

    output::success(&format!("Passphrase rotated for vault at {}", store.location()));

    Ok(())
}
