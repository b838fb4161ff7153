#![forbid(unsafe_code)]
//! Control-plane library for the SCION<->IPv6 translator.
//!
//! This crate holds everything that is not inherently kernel-side:
//! `IsdAsn` string parsing, configuration loading/validation, the path
//! service (component G) that drains the miss ring and resolves paths
//! through a SCION daemon, and telemetry init. The shared path cache
//! (component E) and miss ring (component F) themselves live behind the
//! BPF attachment in `scion-xlat-ebpf`; this crate only defines the
//! traits the path service needs against them, so it can be tested
//! without a kernel.

pub mod config;
pub mod error;
pub mod isdasn;
pub mod miss_ring;
pub mod path_cache;
pub mod path_service;
pub mod sciond;
pub mod telemetry;

pub use config::{load_from_path, Config};
pub use error::{ConfigError, IsdAsnError, MapKeyError, PathServiceError, Result};
pub use isdasn::IsdAsn;
pub use miss_ring::{InMemoryMissRing, MissSource};
pub use path_cache::{InMemoryPathCache, PathCacheWriter};
pub use path_service::PathService;
pub use sciond::{Path, SciondClient};
