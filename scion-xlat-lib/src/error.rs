//! Error kinds and propagation policy.
//!
//! One enum per boundary: config loading, `IsdAsn` string parsing,
//! `MapKey` conversion, and the path service's control loop. Fast-path
//! errors (`ClassificationMiss`, `PathCacheMiss`, `MtuExceeded`, ...)
//! never cross into this crate - they are handled entirely inside the
//! kernel programs and never surface as a `Result`.

use thiserror::Error;

/// Configuration load/validate errors. Terminal before any attachment;
/// the daemon exits non-zero on this error.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// `IsdAsn::parse` failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IsdAsnError {
    #[error("invalid ISD-AS string {0:?}: expected `<isd>-<asn>`")]
    InvalidArgument(String),

    #[error("ISD {0} is out of range (must fit in 16 bits)")]
    IsdOutOfRange(u64),

    #[error("AS group {0:#x} is out of range (must fit in 16 bits)")]
    AsGroupOutOfRange(u64),
}

/// `IsdAsn::to_map_key` failures: a 48-bit AS that does not fit the
/// 20-bit truncated `MapKey` schema (DESIGN.md, Open Question OQ-1).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKeyError {
    #[error("AS number {0:#x} does not fit in the 20-bit MapKey schema")]
    AsnTooWide(u64),
}

/// Path service (component G) resolution/upsert errors.
#[derive(Error, Debug)]
pub enum PathServiceError {
    #[error("failed to connect to sciond at {addr} within {timeout_ms}ms: {source}")]
    InitError {
        addr: String,
        timeout_ms: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("path resolution for {dst} failed: {reason}")]
    ResolveFailed { dst: String, reason: String },

    #[error("upsert for {dst} failed: {reason}")]
    UpsertFailed { dst: String, reason: String },

    #[error(transparent)]
    MapKey(#[from] MapKeyError),
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
