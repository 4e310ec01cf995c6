//! One module per subcommand, each exposing `execute`.

#[cfg(feature = "audit-log")]
pub mod audit_cmd;
pub mod delete;
pub mod get;
pub mod init;
pub mod list;
pub mod reset;
pub mod rotate;
pub mod set;
pub mod status;
pub mod unlock;
