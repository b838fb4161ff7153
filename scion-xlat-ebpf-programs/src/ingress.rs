//! Ingress translator (component D): reverses SCION-encapsulated
//! packets back into plain IPv6 before they reach the host stack.

use core::mem;

use aya_ebpf::{bindings::xdp_action, helpers, programs::XdpContext};
use scion_xlat_common::{classify, proto, ScionCommonHeader};

use crate::net::{EthHdr, Ipv6Hdr, ETH_P_IPV6};
use crate::ptr::ptr_at_xdp;

pub fn handle_ingress(ctx: XdpContext) -> u32 {
    match try_ingress(&ctx) {
        Ok(verdict) => verdict,
        Err(()) => xdp_action::XDP_PASS,
    }
}

fn try_ingress(ctx: &XdpContext) -> Result<u32, ()> {
    // 1: bounds through ethernet / IPv6 / SCION common header.
    let eth = unsafe { ptr_at_xdp::<EthHdr>(ctx, 0) }.ok_or(())?;
    if unsafe { (*eth).h_proto } != ETH_P_IPV6 {
        return Ok(xdp_action::XDP_PASS);
    }
    let ip6_off = mem::size_of::<EthHdr>();
    let ip6 = unsafe { ptr_at_xdp::<Ipv6Hdr>(ctx, ip6_off) }.ok_or(())?;

    // 2: skip ICMPv6 and TCP next-headers (not ours).
    let outer_next = unsafe { (*ip6).next_header };
    if outer_next == proto::ICMPV6 || outer_next == proto::TCP {
        return Ok(xdp_action::XDP_PASS);
    }

    // 3: prefix match on the (still SCION-overlay) destination.
    let daddr = unsafe { (*ip6).daddr };
    if !classify::is_scion_prefix(&daddr) {
        return Ok(xdp_action::XDP_PASS);
    }

    let udp_off = ip6_off + mem::size_of::<crate::net::UdpHdr>();
    let scion_off = udp_off + mem::size_of::<crate::net::UdpHdr>();
    let scion = unsafe { ptr_at_xdp::<ScionCommonHeader>(ctx, scion_off) }.ok_or(())?;

    // 4: the two embedded host addresses must lie within the frame.
    let host_off = scion_off + mem::size_of::<ScionCommonHeader>();
    let inner_daddr_ptr = unsafe { ptr_at_xdp::<[u8; 16]>(ctx, host_off) }.ok_or(())?;
    let inner_saddr_ptr = unsafe { ptr_at_xdp::<[u8; 16]>(ctx, host_off + 16) }.ok_or(())?;
    let inner_daddr = unsafe { *inner_daddr_ptr };
    let inner_saddr = unsafe { *inner_saddr_ptr };

    let scion_next = unsafe { (*scion).next_header };
    let scion_payload = unsafe { (*scion).payload() };
    let scion_tc = unsafe { (*scion).qos() };
    let scion_flow = unsafe { (*scion).flow() };
    let scion_len = unsafe { (*scion).len } as usize;

    // 5: recover the inner IPv6 header in place, at the position of the
    // original (outer) IPv6 header. Must happen before the memmove below:
    // the memmove's source and destination regions can overlap.
    unsafe {
        let ip6_mut = ip6 as *mut Ipv6Hdr;
        (*ip6_mut).daddr = inner_daddr;
        (*ip6_mut).saddr = inner_saddr;
        (*ip6_mut).next_header = scion_next;
        (*ip6_mut).payload_len = scion_payload.to_be();
        (*ip6_mut).hop_limit = 0xFF;
        (*ip6_mut).set_ver_tc_flow(6, scion_tc, scion_flow);
    }

    // 6: where the recovered eth+ipv6 block must end up: immediately
    // before the untouched inner UDP header + payload.
    let scion_end = scion_off + 4 * scion_len;
    let header_block_len = mem::size_of::<EthHdr>() + mem::size_of::<Ipv6Hdr>();
    if scion_end < header_block_len {
        return Err(());
    }
    let new_start = scion_end - header_block_len;

    // 7: bounds-check the destination range before moving, then move, then
    // shrink headroom. The copy writes `header_block_len` bytes ending at
    // `scion_end`, so `scion_end - 1` (not `new_start - 1`) is the last byte
    // the verifier needs to see as in-frame.
    let _ = unsafe { ptr_at_xdp::<u8>(ctx, scion_end.saturating_sub(1)) }.ok_or(())?;
    let data = ctx.data();
    unsafe {
        core::ptr::copy(data as *const u8, (data + new_start) as *mut u8, header_block_len);
    }
    let adjust_ret = unsafe { helpers::bpf_xdp_adjust_head(ctx.ctx, new_start as i32) };
    if adjust_ret != 0 {
        // The frame has already been mutated in place; there is no safe
        // way back, so the packet must be dropped rather than passed
        // half-translated.
        return Ok(xdp_action::XDP_DROP);
    }

    Ok(xdp_action::XDP_PASS)
}
