//! Bounds-checked packet pointer access, shared by the egress (TC) and
//! ingress (XDP) programs.
//!
//! Each helper computes the end of the access via `checked_add` twice
//! and compares against `data_end` before handing out a pointer, the
//! same pattern the fingerprinting XDP program uses. Per-iteration
//! bounds checks driven by pointer arithmetic (not integer addition)
//! keep the verifier's `PTR_TO_PACKET` tracking intact; see `egress.rs`'s
//! path-copy loop.

use core::mem;

use aya_ebpf::programs::{TcContext, XdpContext};

#[inline(always)]
pub unsafe fn ptr_at_tc<T>(ctx: &TcContext, offset: usize) -> Option<*const T> {
    let start = ctx.data();
    let end = ctx.data_end();
    let access_end = start.checked_add(offset)?.checked_add(mem::size_of::<T>())?;
    if access_end > end {
        return None;
    }
    Some(start.checked_add(offset)? as *const T)
}

#[inline(always)]
pub unsafe fn ptr_at_xdp<T>(ctx: &XdpContext, offset: usize) -> Option<*const T> {
    let start = ctx.data();
    let end = ctx.data_end();
    let access_end = start.checked_add(offset)?.checked_add(mem::size_of::<T>())?;
    if access_end > end {
        return None;
    }
    Some(start.checked_add(offset)? as *const T)
}
