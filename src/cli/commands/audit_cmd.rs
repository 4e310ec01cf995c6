//! `vaultkeep audit` — display the audit log.
//!
//! Usage:
//!   vaultkeep audit               # show last 50 entries
//!   vaultkeep audit --last 20     # show last 20
//!   vaultkeep audit --since 7d    # entries from last 7 days

use chrono::{DateTime, TimeDelta, Utc};

use crate::audit::{AuditEntry, AuditLog};
use crate::cli::output;
use crate::cli::{vault_dir, Cli};
use crate::config::Settings;
use crate::errors::{Result, VaultKeepError};

/// Execute the `audit` command.
pub fn execute(cli: &Cli, last: usize, since: Option<&str>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    let dir = vault_dir(cli, &settings)?;

    let since_dt = since.map(parse_duration).transpose()?;

    if !AuditLog::db_path(&dir).exists() {
        output::info("No audit entries found.");
        return Ok(());
    }

    let audit = AuditLog::open(&dir)
        .ok_or_else(|| VaultKeepError::Audit("failed to open audit database".into()))?;

    let entries = audit.query(last, since_dt)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);

    Ok(())
}

/// Parse a human-friendly duration string like "7d", "24h", "30m" into
/// the point in time that far in the past.
fn parse_duration(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    let invalid = || {
        VaultKeepError::CommandFailed(format!(
            "invalid duration '{input}' — use format like 7d, 24h, or 30m"
        ))
    };

    let (num_str, unit) = match input.char_indices().last() {
        Some((idx, unit @ ('d' | 'h' | 'm'))) => (&input[..idx], unit),
        _ => return Err(invalid()),
    };

    let num: i64 = num_str.parse().map_err(|_| invalid())?;

    let duration = match unit {
        'd' => TimeDelta::try_days(num),
        'h' => TimeDelta::try_hours(num),
        _ => TimeDelta::try_minutes(num),
    }
    .ok_or_else(invalid)?;

    Utc::now().checked_sub_signed(duration).ok_or_else(invalid)
}

/// Print audit entries in a formatted table.
pub fn print_audit_table(entries: &[AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Status", "Device", "Details"]);

    for entry in entries {
        table.add_row(vec![
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            colorize_operation(&entry.operation),
            colorize_status(&entry.status),
            entry.device.as_deref().unwrap_or("-").to_string(),
            entry.details.as_deref().unwrap_or("-").to_string(),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

fn colorize_operation(op: &str) -> String {
    use console::style;

    match op {
        "init" => style(op).green().to_string(),
        "unlock" => style(op).cyan().to_string(),
        "set" => style(op).blue().to_string(),
        "delete" | "reset" => style(op).red().to_string(),
        "rotate" => style(op).yellow().to_string(),
        _ => op.to_string(),
    }
}

fn colorize_status(status: &str) -> String {
    use console::style;

    match status {
        "ok" => style(status).green().to_string(),
        "failed" => style(status).red().bold().to_string(),
        _ => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_days() {
        let dt = parse_duration("7d").unwrap();
        let diff = Utc::now() - dt;
        assert!((diff.num_days() - 7).abs() <= 1);
    }

    #[test]
    fn parse_duration_hours() {
        let dt = parse_duration("24h").unwrap();
        let diff = Utc::now() - dt;
        assert!((diff.num_hours() - 24).abs() <= 1);
    }

    #[test]
    fn parse_duration_minutes() {
        let dt = parse_duration(" 30m ").unwrap();
        let diff = Utc::now() - dt;
        assert!((diff.num_minutes() - 30).abs() <= 1);
    }

    #[test]
    fn parse_duration_invalid() {
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("7x").is_err());
        assert!(parse_duration("d").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("9999999999999d").is_err());
        assert!(parse_duration("9223372036854775807m").is_err());
    }

    #[test]
    fn colorize_known_and_unknown() {
        assert!(!colorize_operation("unlock").is_empty());
        assert!(!colorize_operation("rotate").is_empty());
        assert_eq!(colorize_operation("other"), "other");
        assert_eq!(colorize_status("pending"), "pending");
    }

    #[test]
    fn since_filter_includes_recent_events() {
        let dir = tempfile::TempDir::new().unwrap();
        let audit = AuditLog::open(dir.path()).unwrap();

        audit.log("unlock", "failed", Some("laptop"), None);

        let since = parse_duration("1h").unwrap();
        let entries = audit.query(10, Some(since)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, "failed");
    }
}
