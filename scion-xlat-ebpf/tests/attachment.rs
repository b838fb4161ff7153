//! Loading and attaching BPF programs requires `CAP_BPF`/`CAP_NET_ADMIN`
//! and a kernel that accepts the compiled object, so these are marked
//! `#[ignore]` and meant to be run explicitly (`cargo test -- --ignored`)
//! as root in CI, mirroring how BPF-attaching tests are run elsewhere in
//! this codebase.
use scion_xlat_ebpf::Translator;

#[test]
#[ignore = "requires CAP_BPF and a loopback-safe test interface"]
fn load_translator_bpf_object() {
    let translator = Translator::load();
    assert!(translator.is_ok(), "failed to load translator BPF object: {:?}", translator.err());
}

#[test]
#[ignore = "requires CAP_NET_ADMIN to attach a clsact qdisc"]
fn attach_egress_to_loopback() {
    let mut translator = Translator::load().expect("load");
    let attachment = translator.attach_egress("lo");
    assert!(attachment.is_ok(), "failed to attach egress: {:?}", attachment.err());
}
