//! CLI module — Clap argument parser, output helpers, and command implementations.
//!
//! The CLI is a thin collaborator over the vault core: every command
//! builds a `VaultStore`, drives one lifecycle operation and locks it
//! again before exiting.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{Result, VaultKeepError};
use crate::vault::{FileStorage, VaultContents, VaultStore};

/// Minimum passphrase length to prevent trivially weak passphrases.
const MIN_PASSPHRASE_LEN: usize = 8;

/// Environment variable consulted before prompting for the passphrase.
pub const PASSPHRASE_ENV: &str = "VAULTKEEP_PASSPHRASE";

/// Environment variable consulted for the new passphrase on `rotate`.
pub const NEW_PASSPHRASE_ENV: &str = "VAULTKEEP_NEW_PASSPHRASE";

/// VaultKeep CLI: local passphrase vault.
#[derive(Parser)]
#[command(
    name = "vaultkeep",
    about = "Local passphrase vault (Argon2id + XChaCha20-Poly1305)",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default from .vaultkeep.toml, else .vaultkeep)
    #[arg(long, global = true)]
    pub vault_dir: Option<String>,

    /// Device identifier the vault is bound to
    #[arg(long, env = "VAULTKEEP_DEVICE_ID", global = true)]
    pub device_id: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty vault
    Init,

    /// Show where the vault lives and how it is sealed
    Status,

    /// Verify the passphrase and show a summary of the vault
    Unlock,

    /// Set an entry (add or update)
    Set {
        /// Entry name (e.g. api-token)
        key: String,
        /// Entry value (omit for interactive prompt)
        value: Option<String>,
    },

    /// Print an entry's value
    Get {
        /// Entry name
        key: String,
    },

    /// List all entries
    List,

    /// Delete an entry
    Delete {
        /// Entry name
        key: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Change the vault passphrase
    Rotate,

    /// Move the current vault aside so a new one can be created
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// View the audit log of vault operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolve the vault directory: `--vault-dir`, then settings.
pub fn vault_dir(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let dir = cli.vault_dir.as_deref().unwrap_or(&settings.vault_dir);
    Ok(cwd.join(dir))
}

/// Build a locked `VaultStore` from the settings and CLI flags.
pub fn build_store(cli: &Cli) -> Result<VaultStore> {
    let cwd = std::env::current_dir()?;
    let mut settings = Settings::load(&cwd)?;
    if let Some(dir) = &cli.vault_dir {
        settings.vault_dir = dir.clone();
    }
    let path = settings.vault_path(&cwd);

    let mut store = VaultStore::new(FileStorage::new(path)).with_params(settings.argon2_params());
    if let Some(id) = &cli.device_id {
        store = store.with_binding(id.as_bytes());
    }
    Ok(store)
}

/// Prompt for the passphrase and unlock the vault contents.
///
/// Records the outcome in the audit log.
pub fn unlock_contents(cli: &Cli, store: &mut VaultStore) -> Result<VaultContents> {
    let passphrase = prompt_passphrase()?;
    match store.unlock_contents(passphrase.as_bytes()) {
        Ok(contents) => {
            log_audit(cli, "unlock", "ok", None);
            Ok(contents)
        }
        Err(e) => {
            if e.is_unlock_failure() {
                log_audit(cli, "unlock", "failed", None);
            }
            Err(e)
        }
    }
}

/// Get the vault passphrase from `VAULTKEEP_PASSPHRASE` or a prompt.
///
/// Returns `Zeroizing<String>` so the passphrase is wiped from memory on drop.
pub fn prompt_passphrase() -> Result<Zeroizing<String>> {
    if let Some(pw) = passphrase_from_env(PASSPHRASE_ENV) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter vault passphrase")
        .interact()
        .map_err(|e| VaultKeepError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new passphrase with confirmation.
///
/// `env_var` is checked first for scripted use.  Enforces a minimum
/// length either way.
pub fn prompt_new_passphrase(env_var: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = passphrase_from_env(env_var) {
        if pw.len() < MIN_PASSPHRASE_LEN {
            return Err(VaultKeepError::CommandFailed(format!(
                "passphrase must be at least {MIN_PASSPHRASE_LEN} characters"
            )));
        }
        return Ok(pw);
    }

    loop {
        let passphrase = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose vault passphrase")
                .with_confirmation(
                    "Confirm vault passphrase",
                    "Passphrases do not match, try again",
                )
                .interact()
                .map_err(|e| VaultKeepError::CommandFailed(format!("passphrase prompt: {e}")))?,
        );

        if passphrase.len() < MIN_PASSPHRASE_LEN {
            output::warning(&format!(
                "Passphrase must be at least {MIN_PASSPHRASE_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(passphrase);
    }
}

fn passphrase_from_env(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

/// Record an audit event next to the vault.
///
/// Never fails the parent operation; a no-op without the `audit-log`
/// feature.
pub fn log_audit(cli: &Cli, op: &str, status: &str, details: Option<&str>) {
    #[cfg(feature = "audit-log")]
    {
        let Ok(cwd) = std::env::current_dir() else {
            return;
        };
        let Ok(settings) = Settings::load(&cwd) else {
            return;
        };
        let Ok(dir) = vault_dir(cli, &settings) else {
            return;
        };
        if let Some(audit) = crate::audit::AuditLog::open(&dir) {
            audit.log(op, status, cli.device_id.as_deref(), details);
        }
    }

    #[cfg(not(feature = "audit-log"))]
    let _ = (cli, op, status, details);
}
