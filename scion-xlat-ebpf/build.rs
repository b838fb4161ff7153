use std::path::PathBuf;
use std::process::Command;

/// Compile the kernel programs (`scion-xlat-ebpf-programs`) using
/// `cargo +nightly build` for the `bpfel-unknown-none` target.
///
/// The resulting ELF binary is embedded into the loader binary via
/// `aya::include_bytes_aligned!` in `probe.rs`.
///
/// Requirements: Rust nightly toolchain with `rust-src` component. The
/// `rust-toolchain.toml` in `scion-xlat-ebpf-programs/` pins the channel.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?);
    let programs_dir = manifest_dir
        .parent()
        .ok_or("could not find workspace root")?
        .join("scion-xlat-ebpf-programs");

    println!("cargo:rerun-if-changed={}", programs_dir.join("src").display());
    println!("cargo:rerun-if-changed={}", programs_dir.join("Cargo.toml").display());

    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    let bpf_target_dir = out_dir.join("bpf-programs-target");

    // `cargo` running this build script sets RUSTC/RUSTDOC/RUSTUP_TOOLCHAIN
    // pointing at the *current* (stable) toolchain. Those would be inherited
    // by the child cargo process and override the nightly selection we need,
    // so they are removed and rustup picks the toolchain from
    // scion-xlat-ebpf-programs/rust-toolchain.toml instead.
    let status = Command::new("cargo")
        .args(["build", "--release", "--package", "scion-xlat-ebpf-programs"])
        .env("CARGO_TARGET_DIR", &bpf_target_dir)
        .env_remove("RUSTC")
        .env_remove("RUSTDOC")
        .env_remove("RUSTUP_TOOLCHAIN")
        .env_remove("RUSTC_WORKSPACE_WRAPPER")
        .env_remove("RUSTC_WRAPPER")
        .current_dir(&programs_dir)
        .status();

    match status {
        Ok(s) if s.success() => {}
        Ok(s) => {
            return Err(format!(
                "cargo build of scion-xlat-ebpf-programs failed (exit {:?}).\n\
                Ensure nightly toolchain and rust-src are installed:\n\
                  rustup toolchain install nightly\n\
                  rustup component add rust-src --toolchain nightly",
                s.code()
            )
            .into());
        }
        Err(e) => {
            return Err(format!("failed to run cargo: {e}").into());
        }
    }

    let bpf_bin = bpf_target_dir.join("bpfel-unknown-none/release/scion-xlat-ebpf-programs");
    if !bpf_bin.exists() {
        return Err(format!("BPF binary not found at {}", bpf_bin.display()).into());
    }

    let out_file = out_dir.join("translator.bpf.o");
    std::fs::copy(&bpf_bin, &out_file)?;

    println!("cargo:rustc-env=TRANSLATOR_BPF_OBJ={}", out_file.display());
    Ok(())
}
