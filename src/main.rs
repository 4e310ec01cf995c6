use clap::Parser;
use tracing_subscriber::EnvFilter;
use vaultkeep::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Init => vaultkeep::cli::commands::init::execute(&cli),
        Commands::Status => vaultkeep::cli::commands::status::execute(&cli),
        Commands::Unlock => vaultkeep::cli::commands::unlock::execute(&cli),
        Commands::Set { ref key, ref value } => {
            vaultkeep::cli::commands::set::execute(&cli, key, value.as_deref())
        }
        Commands::Get { ref key } => vaultkeep::cli::commands::get::execute(&cli, key),
        Commands::List => vaultkeep::cli::commands::list::execute(&cli),
        Commands::Delete { ref key, force } => {
            vaultkeep::cli::commands::delete::execute(&cli, key, force)
        }
        Commands::Rotate => vaultkeep::cli::commands::rotate::execute(&cli),
        Commands::Reset { force } => vaultkeep::cli::commands::reset::execute(&cli, force),
        #[cfg(feature = "audit-log")]
        Commands::Audit { last, ref since } => {
            vaultkeep::cli::commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
        #[cfg(not(feature = "audit-log"))]
        Commands::Audit { .. } => Err(vaultkeep::errors::VaultKeepError::CommandFailed(
            "built without the audit-log feature".into(),
        )),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "command failed");
        // Unlock failures share one message so the cause is not leaked.
        if e.is_unlock_failure() {
            vaultkeep::cli::output::error("Unlock failed: wrong passphrase or damaged vault");
        } else {
            vaultkeep::cli::output::error(&e.to_string());
        }
        std::process::exit(1);
    }
}

/// Set up tracing based on verbosity; `RUST_LOG` wins when set.
fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
