//! Integration tests for the VaultKeep CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Passphrases come from `VAULTKEEP_PASSPHRASE` so nothing prompts, and
//! a `.vaultkeep.toml` with the smallest Argon2 cost keeps them fast.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const FAST_CONFIG: &str = "argon2_memory_kib = 8192\nargon2_iterations = 1\nargon2_parallelism = 1\n";

/// Helper: get a Command pointing at the vaultkeep binary.
fn vaultkeep() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("vaultkeep").expect("binary should exist")
}

/// Helper: a project dir with a fast config and the given passphrase.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child(".vaultkeep.toml").write_str(FAST_CONFIG).unwrap();
    tmp
}

fn in_project(tmp: &TempDir, passphrase: &str) -> Command {
    let mut cmd = vaultkeep();
    cmd.current_dir(tmp.path())
        .env("VAULTKEEP_PASSPHRASE", passphrase)
        .env_remove("VAULTKEEP_NEW_PASSPHRASE")
        .env_remove("VAULTKEEP_DEVICE_ID")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_flag_shows_usage() {
    vaultkeep()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Local passphrase vault"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("unlock"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("rotate"))
        .stdout(predicate::str::contains("reset"));
}

#[test]
fn no_args_shows_help() {
    vaultkeep()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn status_without_vault_suggests_init() {
    let tmp = project();
    in_project(&tmp, "unused-pass")
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("vaultkeep init"));
}

#[test]
fn init_set_get_roundtrip() {
    let tmp = project();

    in_project(&tmp, "correct-horse")
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Vault created"));
    tmp.child(".vaultkeep/vault.bin").assert(predicate::path::exists());

    in_project(&tmp, "correct-horse")
        .args(["set", "api-token", "abc123"])
        .assert()
        .success();

    in_project(&tmp, "correct-horse")
        .args(["get", "api-token"])
        .assert()
        .success()
        .stdout(predicate::str::diff("abc123\n"));

    in_project(&tmp, "correct-horse")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("api-token"));
}

#[test]
fn wrong_passphrase_reports_unlock_failed() {
    let tmp = project();
    in_project(&tmp, "correct-horse").arg("init").assert().success();

    in_project(&tmp, "wrong-password")
        .arg("unlock")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unlock failed"));
}

#[test]
fn init_rejects_short_passphrase() {
    let tmp = project();
    in_project(&tmp, "short")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8"));
}

#[test]
fn init_twice_fails() {
    let tmp = project();
    in_project(&tmp, "correct-horse").arg("init").assert().success();
    in_project(&tmp, "correct-horse")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn rotate_switches_passphrase() {
    let tmp = project();
    in_project(&tmp, "old-passphrase").arg("init").assert().success();

    in_project(&tmp, "old-passphrase")
        .env("VAULTKEEP_NEW_PASSPHRASE", "new-passphrase")
        .arg("rotate")
        .assert()
        .success();

    in_project(&tmp, "old-passphrase").arg("unlock").assert().failure();
    in_project(&tmp, "new-passphrase").arg("unlock").assert().success();
}

#[test]
fn device_binding_is_enforced() {
    let tmp = project();
    in_project(&tmp, "correct-horse")
        .args(["init", "--device-id", "laptop-a"])
        .assert()
        .success();

    in_project(&tmp, "correct-horse")
        .args(["unlock", "--device-id", "laptop-b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unlock failed"));

    in_project(&tmp, "correct-horse")
        .args(["unlock", "--device-id", "laptop-a"])
        .assert()
        .success();
}

#[test]
fn reset_moves_vault_aside() {
    let tmp = project();
    in_project(&tmp, "correct-horse").arg("init").assert().success();

    in_project(&tmp, "unused-pass")
        .args(["reset", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mismatch_"));
    tmp.child(".vaultkeep/vault.bin").assert(predicate::path::missing());

    in_project(&tmp, "another-pass").arg("init").assert().success();
}

#[test]
fn get_missing_entry_fails() {
    let tmp = project();
    in_project(&tmp, "correct-horse").arg("init").assert().success();
    in_project(&tmp, "correct-horse")
        .args(["get", "nope"])
        .assert()
        .failure();
}

#[test]
fn unlock_on_missing_vault_fails() {
    let tmp = project();
    in_project(&tmp, "correct-horse")
        .arg("unlock")
        .write_stdin("")
        .assert()
        .failure();
}

#[cfg(feature = "audit-log")]
#[test]
fn audit_records_failed_unlock() {
    let tmp = project();
    in_project(&tmp, "correct-horse").arg("init").assert().success();
    in_project(&tmp, "wrong-password").arg("unlock").assert().failure();

    in_project(&tmp, "unused-pass")
        .arg("audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("unlock"))
        .stdout(predicate::str::contains("failed"));
}

#[cfg(feature = "audit-log")]
#[test]
fn audit_rejects_out_of_range_since() {
    let tmp = project();
    in_project(&tmp, "unused-pass")
        .args(["audit", "--since", "9999999999999d"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid duration"));
}

#[test]
fn vault_dir_flag_relocates_record() {
    let tmp = project();
    in_project(&tmp, "correct-horse")
        .args(["init", "--vault-dir", "custom"])
        .assert()
        .success();
    tmp.child("custom/vault.bin").assert(predicate::path::exists());
    tmp.child(".vaultkeep/vault.bin").assert(predicate::path::missing());

    in_project(&tmp, "correct-horse")
        .args(["unlock", "--vault-dir", "custom"])
        .assert()
        .success();
}
