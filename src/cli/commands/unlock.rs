//! `vaultkeep unlock` — verify the passphrase and summarize the vault.

use crate::cli::output;
use crate::cli::{build_store, unlock_contents, Cli};
use crate::errors::Result;

/// Execute the `unlock` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut store = build_store(cli)?;
    let contents = unlock_contents(cli, &mut store)?;

    output::success(&format!(
        "Vault unlocked — {} entr{}",
        contents.len(),
        if contents.len() == 1 { "y" } else { "ies" }
    ));

    store.lock();
    Ok(())
}
