use std::path::PathBuf;

use thiserror::Error;

use crate::model::game::GameKey;

/// The persisted schedule could not be turned into a valid `Schedule`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read schedule at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schedule at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate game key {key} (records {first_id} and {second_id})")]
    DuplicateKey {
        key: GameKey,
        first_id: String,
        second_id: String,
    },
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("failed to serialize schedule: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write temp file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to replace {path}: {source}")]
    Rename {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum RemoteFetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read response body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("malformed schedule payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid window anchor {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("unknown timezone {0:?}")]
    InvalidTimezone(String),

    #[error("unknown mode {0:?}, expected \"production\" or \"test\"")]
    InvalidMode(String),
}

/// Fatal outcomes of a sync run. Each one maps to a non-zero exit.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("schedule store is corrupt: {0}")]
    StoreCorrupt(#[from] StoreError),

    #[error("remote fetch failed: {0}")]
    RemoteFetch(#[from] RemoteFetchError),

    #[error("failed to persist schedule: {0}")]
    Persistence(#[from] PersistError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
