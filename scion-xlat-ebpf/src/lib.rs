// eBPF/TC/XDP attachment is Linux-only. This crate does not compile for
// other targets.
#![cfg(target_os = "linux")]

pub mod attachment;

pub use attachment::{EgressAttachment, IngressAttachment, MissRingHandle, PathCacheHandle, Translator};

#[derive(Debug, thiserror::Error)]
pub enum EbpfError {
    #[error("failed to load BPF object: {0}")]
    Load(#[source] aya::EbpfError),

    #[error("program '{0}' not found in BPF object")]
    ProgramNotFound(&'static str),

    #[error("BPF program '{0}' is not the expected program type: {1}")]
    ProgramType(&'static str, #[source] aya::programs::ProgramError),

    #[error("failed to load program '{0}' into the kernel: {1}")]
    ProgramLoad(&'static str, #[source] aya::programs::ProgramError),

    #[error("failed to attach program '{0}' to interface '{1}': {2}")]
    Attach(&'static str, String, #[source] aya::programs::ProgramError),

    #[error("map '{0}' not found in BPF object")]
    MapNotFound(&'static str),

    #[error("map '{0}' has an unexpected type: {1}")]
    MapType(&'static str, #[source] aya::maps::MapError),

    #[error("map operation on '{0}' failed: {1}")]
    MapOperation(&'static str, #[source] aya::maps::MapError),
}
