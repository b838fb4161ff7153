//! Egress translator (component C): rewrites outbound IPv6 packets
//! destined to the SCION ULA prefix into SCION-encapsulated packets
//! toward the local border router.

use core::mem;

use aya_ebpf::{bindings::TC_ACT_OK, bindings::TC_ACT_SHOT, helpers, programs::TcContext};
use scion_xlat_common::{classify, proto, ScionCommonHeader};

use crate::maps::PATH_MAP;
use crate::net::{EthHdr, Ipv6Hdr, UdpHdr, ETH_P_IPV6};
use crate::ptr::ptr_at_tc;

const BPF_ADJ_ROOM_NET: u32 = 0;

#[inline(always)]
fn publish_miss(key: u32) {
    if let Some(mut entry) = crate::maps::PATH_REQ.reserve::<u32>(0) {
        entry.write(key);
        entry.submit(0);
    }
    // Reservation failure means the ring is full; the miss is dropped
    // silently, matching the lossy single-producer contract (component F).
}

/// Entry point body. Returns `TC_ACT_OK` (pass, possibly rewritten) or
/// `TC_ACT_SHOT` (drop). Never panics; any short/malformed frame simply
/// passes through untouched.
pub fn handle_egress(ctx: TcContext) -> i32 {
    match try_egress(&ctx) {
        Ok(verdict) => verdict,
        Err(()) => TC_ACT_OK as i32,
    }
}

fn try_egress(ctx: &TcContext) -> Result<i32, ()> {
    // 1-2: bounds + ethertype.
    let eth = unsafe { ptr_at_tc::<EthHdr>(ctx, 0) }.ok_or(())?;
    if unsafe { (*eth).h_proto } != ETH_P_IPV6 {
        return Ok(TC_ACT_OK as i32);
    }

    // 3: bounds IPv6.
    let ip6_off = mem::size_of::<EthHdr>();
    let ip6 = unsafe { ptr_at_tc::<Ipv6Hdr>(ctx, ip6_off) }.ok_or(())?;

    // 4: exclude ICMPv6.
    if unsafe { (*ip6).next_header } == proto::ICMPV6 {
        return Ok(TC_ACT_OK as i32);
    }

    // 5: prefix match.
    let daddr = unsafe { (*ip6).daddr };
    let saddr = unsafe { (*ip6).saddr };
    if !classify::is_scion_prefix(&daddr) {
        return Ok(TC_ACT_OK as i32);
    }

    // 6: derive keys, reject intra-AS.
    let dst_key = classify::map_key(&daddr);
    let src_key = classify::map_key(&saddr);
    if dst_key == src_key {
        return Ok(TC_ACT_OK as i32);
    }

    // 7: bounds UDP.
    let udp_off = ip6_off + mem::size_of::<Ipv6Hdr>();
    let udp = unsafe { ptr_at_tc::<UdpHdr>(ctx, udp_off) }.ok_or(())?;
    let inner_src_port = unsafe { (*udp).source };

    // 8: path cache lookup.
    let entry = match unsafe { PATH_MAP.get(&dst_key.0) } {
        Some(e) => *e,
        None => {
            publish_miss(dst_key.0);
            return Ok(TC_ACT_SHOT as i32);
        }
    };

    // 9: MTU check.
    let header_len = entry.header.len as usize;
    let insertion_len = mem::size_of::<UdpHdr>() + 4 * header_len;
    let mtu_delta = insertion_len as u32;
    if unsafe { helpers::bpf_check_mtu(ctx.skb.skb, 0, &mut 0u32, mtu_delta as i32, 0) } != 0 {
        return Ok(TC_ACT_SHOT as i32);
    }

    let orig_next_header = unsafe { (*ip6).next_header };
    let orig_payload_len = unsafe { (*ip6).payload_len };
    let orig_tc = unsafe { (*ip6).traffic_class() };
    let orig_flow = unsafe { (*ip6).flow_label() };

    // 10: grow the packet between the IPv6 header and the inner UDP header.
    let grow_ret = unsafe {
        helpers::bpf_skb_adjust_room(
            ctx.skb.skb,
            insertion_len as i32,
            BPF_ADJ_ROOM_NET,
            0,
        )
    };
    if grow_ret != 0 {
        return Err(());
    }

    // Re-derive pointers: adjust_room invalidates all previously held ones.
    let ip6 = unsafe { ptr_at_tc::<Ipv6Hdr>(ctx, ip6_off) }.ok_or(())?;
    let new_udp_off = udp_off;
    let new_scion_off = new_udp_off + mem::size_of::<UdpHdr>();

    // 11: write underlay UDP (checksum left zero for hardware offload).
    // The underlay UDP datagram carries the SCION header, the embedded
    // path, and the original (untouched) inner UDP header + payload that
    // growth has shifted further into the frame.
    let udp = unsafe { ptr_at_tc::<UdpHdr>(ctx, new_udp_off) }.ok_or(())?;
    let underlay_udp_len = insertion_len as u16 + u16::from_be(orig_payload_len);
    unsafe {
        (*(udp as *mut UdpHdr)).source = inner_src_port;
        (*(udp as *mut UdpHdr)).dest = entry.router_port.to_be();
        (*(udp as *mut UdpHdr)).len = underlay_udp_len.to_be();
        (*(udp as *mut UdpHdr)).check = 0;
    }

    // 12: write SCION common+address header from the template.
    let scion = unsafe { ptr_at_tc::<ScionCommonHeader>(ctx, new_scion_off) }.ok_or(())?;
    let mut header = entry.header;
    header.set_ver_qos_flow(0, orig_tc, orig_flow);
    header.next_header = orig_next_header;
    header.set_payload(u16::from_be(orig_payload_len));
    unsafe {
        core::ptr::write_unaligned(scion as *mut ScionCommonHeader, header);
    }

    // 13: write host addresses immediately after the common header.
    let host_off = new_scion_off + mem::size_of::<ScionCommonHeader>();
    let dst_host = unsafe { ptr_at_tc::<[u8; 16]>(ctx, host_off) }.ok_or(())?;
    let src_host = unsafe { ptr_at_tc::<[u8; 16]>(ctx, host_off + 16) }.ok_or(())?;
    unsafe {
        core::ptr::write_unaligned(dst_host as *mut [u8; 16], daddr);
        core::ptr::write_unaligned(src_host as *mut [u8; 16], saddr);
    }

    // 14: copy raw path words. Every iteration re-checks bounds: a single
    // check ahead of the loop is not enough for the verifier to track
    // PTR_TO_PACKET across a dynamic-length copy.
    let path_off = host_off + 32;
    let path_len = entry.path_len as usize;
    for i in 0..scion_xlat_common::MAX_PATH_WORDS {
        if i >= path_len {
            break;
        }
        let word_ptr = match unsafe { ptr_at_tc::<u32>(ctx, path_off + i * 4) } {
            Some(p) => p,
            None => break,
        };
        unsafe {
            core::ptr::write_unaligned(word_ptr as *mut u32, entry.path[i]);
        }
    }

    // 15: rewrite the outer IPv6 header to forward intra-AS to the border router.
    // payload_len = underlay UDP header + SCION header/path + original payload,
    // mirroring the new underlay UDP length field exactly.
    let new_payload_len = underlay_udp_len;
    unsafe {
        (*(ip6 as *mut Ipv6Hdr)).daddr = entry.router_addr;
        (*(ip6 as *mut Ipv6Hdr)).next_header = proto::UDP;
        (*(ip6 as *mut Ipv6Hdr)).payload_len = new_payload_len.to_be();
    }

    Ok(TC_ACT_OK as i32)
}
