//! `vaultkeep get` — print a single entry's value.

use crate::cli::{build_store, unlock_contents, Cli};
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(cli: &Cli, key: &str) -> Result<()> {
    let mut store = build_store(cli)?;
    let contents = unlock_contents(cli, &mut store)?;
    store.lock();

    println!("{}", contents.get(key)?);

    Ok(())
}
