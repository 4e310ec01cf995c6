//! `vaultkeep status` — show the vault location and sealing parameters.
//!
//! Reads only the record header; no passphrase is needed.

use crate::cli::output;
use crate::cli::{build_store, Cli};
use crate::errors::Result;

/// Execute the `status` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let store = build_store(cli)?;

    if !store.is_initialized()? {
        output::info(&format!("No vault at {}", store.location()));
        output::tip("Run `vaultkeep init` to create one.");
        return Ok(());
    }

    let record = store.load_record()?;
    output::info(&format!("Vault at {}", store.location()));
    println!("  format version : {}", record.format_version);
    println!(
        "  argon2id       : m={} KiB, t={}, p={}",
        record.params.memory_kib, record.params.iterations, record.params.parallelism
    );
    println!("  payload size   : {} bytes", record.ciphertext.len());
    println!("  state          : {}", store.state());

    Ok(())
}
