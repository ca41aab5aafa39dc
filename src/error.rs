// Error types
// -----------
// Every library module reports failures through one of the enums below.
// The binary wraps them in `anyhow` and adds the user-facing context.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Remote or local operation a `BinError` happened in. Used only to give
/// error messages and log lines a readable prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Errors produced by the local store (`store::Store`).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying read, write or append failed.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `read_json` was asked for a file without a `.json` extension.
    #[error("{} isn't a .json file", .path.display())]
    NotJson { path: PathBuf },

    /// A text file (the saved-id list) holds bytes that are not UTF-8.
    #[error("{} is not valid UTF-8 text: {source}", .path.display())]
    NotText {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl StoreError {
    /// True when the file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Failure reported by a `transport::Transport` before any response was
/// received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be built (bad URL, bad header value).
    #[error("malformed request: {0}")]
    Malformed(String),

    /// DNS, connect, TLS, timeout or body read failure.
    #[error("{0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            TransportError::Malformed(err.to_string())
        } else {
            TransportError::Connection(Box::new(err))
        }
    }
}

/// Errors returned by `api::BinClient` and the bin model helpers.
#[derive(Debug, Error)]
pub enum BinError {
    #[error("cannot read file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("cannot write file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("failed to build {operation} request for {target}: {message}")]
    Request {
        operation: Operation,
        target: String,
        message: String,
    },

    #[error("{operation} request for {target} failed: {source}")]
    Network {
        operation: Operation,
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The service answered with an unexpected status code.
    #[error("{operation} failed for {target} (status {status}): {body}")]
    Api {
        operation: Operation,
        target: String,
        status: u16,
        body: String,
    },

    #[error("failed to parse {operation} response for {target}: {source}")]
    Parse {
        operation: Operation,
        target: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {operation} response for {target}: {message}")]
    InvalidResponse {
        operation: Operation,
        target: String,
        message: String,
    },

    #[error("bin name can't be empty")]
    EmptyName,

    #[error("failed to encode bin list: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl BinError {
    /// Status code of an `Api` error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            BinError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn from_transport(operation: Operation, target: &str, err: TransportError) -> Self {
        match err {
            TransportError::Malformed(message) => BinError::Request {
                operation,
                target: target.to_string(),
                message,
            },
            TransportError::Connection(source) => BinError::Network {
                operation,
                target: target.to_string(),
                source,
            },
        }
    }
}

/// Errors raised while assembling a `config::Config`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "{var} is not set. Export it or add it to a .env file \
         (get a free master key at https://jsonbin.io)"
    )]
    MissingKey { var: &'static str },

    #[error("env file {} not found", .path.display())]
    EnvFileMissing { path: PathBuf },

    #[error("failed to read env file {}: {source}", .path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
}
