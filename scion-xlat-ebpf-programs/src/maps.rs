//! The shared path cache (component E) and the miss ring buffer
//! (component F), as seen from inside the kernel programs.
//!
//! Capacities mirror the original prototype's `path_map` (4096 entries)
//! and `path_req` ring (`1024 * sizeof(u32)` bytes).

use aya_ebpf::{
    macros::map,
    maps::{HashMap, RingBuf},
};
use scion_xlat_common::PathEntry;

pub const PATH_MAP_ENTRIES: u32 = 4096;
pub const PATH_REQ_RING_BYTES: u32 = 1024 * 4;

#[map]
#[allow(non_upper_case_globals)]
pub static PATH_MAP: HashMap<u32, PathEntry> = HashMap::with_max_entries(PATH_MAP_ENTRIES, 0);

#[map]
#[allow(non_upper_case_globals)]
pub static PATH_REQ: RingBuf = RingBuf::with_byte_size(PATH_REQ_RING_BYTES, 0);
