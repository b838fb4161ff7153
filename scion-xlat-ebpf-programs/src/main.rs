//! Kernel-side SCION<->IPv6 translator: egress rewrite (TC classifier)
//! and ingress rewrite (XDP), sharing the path cache and miss ring
//! defined in `maps.rs`.
#![no_std]
#![no_main]

mod egress;
mod ingress;
mod maps;
mod net;
mod ptr;

use aya_ebpf::{
    macros::{classifier, xdp},
    programs::{TcContext, XdpContext},
};

#[classifier]
pub fn scion_egress(ctx: TcContext) -> i32 {
    egress::handle_egress(ctx)
}

#[xdp]
pub fn scion_ingress(ctx: XdpContext) -> u32 {
    ingress::handle_ingress(ctx)
}

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}
