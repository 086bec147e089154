//! Classified failures and their process exit codes.
//!
//! Modules propagate `anyhow::Result` with context attached at each I/O
//! boundary. Failures that must map to a specific exit code are created as
//! [`ErrorKind`] values and recovered from the chain in `main` via
//! [`exit_code_for`]. Everything else is treated as an I/O-class failure.

use thiserror::Error;

/// A failure class with a defined process exit code.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("codec error: {0}")]
    Codec(String),
    #[error("XML error at byte {offset}: {reason}")]
    Xml { offset: u64, reason: String },
    #[error("unsupported schema version: {0}")]
    Schema(String),
    #[error("join desync: {0}")]
    JoinDesync(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Schema(_) => 1,
            ErrorKind::Io(_) | ErrorKind::Codec(_) | ErrorKind::Internal(_) => 2,
            ErrorKind::Xml { .. } => 3,
            ErrorKind::JoinDesync(_) => 4,
        }
    }
}

/// Map an error chain to a process exit code.
///
/// The first classified [`ErrorKind`] in the chain wins. Unclassified chains
/// fall back on the source: quick-xml failures exit 3, everything else 2.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(kind) = err.chain().find_map(|c| c.downcast_ref::<ErrorKind>()) {
        return kind.exit_code();
    }
    if err
        .chain()
        .any(|c| c.downcast_ref::<quick_xml::Error>().is_some())
    {
        return 3;
    }
    2
}
