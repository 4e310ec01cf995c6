//! `vaultkeep list` — display all entries in a table.

use crate::cli::output;
use crate::cli::{build_store, unlock_contents, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut store = build_store(cli)?;
    let contents = unlock_contents(cli, &mut store)?;
    store.lock();

    let entries = contents.list();
    output::info(&format!("{} entr(ies)", entries.len()));
    output::print_entries_table(&entries);

    Ok(())
}
