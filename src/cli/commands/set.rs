//! `vaultkeep set` — add or update an entry in the vault.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{build_store, log_audit, unlock_contents, Cli};
use crate::errors::{Result, VaultKeepError};

/// Execute the `set` command.
pub fn execute(cli: &Cli, key: &str, value: Option<&str>) -> Result<()> {
    // Determine the value from one of three sources.
    let entry_value = if let Some(v) = value {
        // Source 1: Inline value on the command line.
        output::warning("Value provided on command line — it may appear in shell history.");
        Zeroizing::new(v.to_string())
    } else if !io::stdin().is_terminal() {
        // Source 2: Piped input (stdin is not a terminal).
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        Zeroizing::new(buf.trim_end().to_string())
    } else {
        // Source 3: Interactive secure prompt (default).
        Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt(format!("Enter value for {key}"))
                .interact()
                .map_err(|e| VaultKeepError::CommandFailed(format!("input prompt: {e}")))?,
        )
    };

    let mut store = build_store(cli)?;
    let mut contents = unlock_contents(cli, &mut store)?;

    let existed = contents.get(key).is_ok();
    contents.set(key, &entry_value)?;
    store.save_contents(&contents)?;
    store.lock();

    let op_detail = if existed { "updated" } else { "added" };
    log_audit(cli, "set", "ok", Some(op_detail));

    output::success(&format!(
        "Entry '{key}' {op_detail} ({} total)",
        contents.len()
    ));

    Ok(())
}
