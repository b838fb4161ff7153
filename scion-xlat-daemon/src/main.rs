#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use scion_xlat_ebpf::Translator;
use scion_xlat_lib::config::load_from_path;
use scion_xlat_lib::sciond::TcpSciondClient;
use scion_xlat_lib::telemetry::{init_metrics, init_tracing, start_observability_server};
use scion_xlat_lib::PathService;
use tracing::{error, info, warn};

/// Connect timeout for the initial `sciond` handshake (SPEC_FULL §4.G
/// `init(daemonAddress)`).
const SCIOND_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(author, version, about = "SCION<->IPv6 translator control plane")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(short, long, value_name = "FILE", default_value = "demos/config/basic.toml")]
    config: PathBuf,

    /// Host NIC to attach the ingress XDP translator to. Overrides
    /// `xdp.interface` from the config file.
    #[arg(short, long, value_name = "IFACE")]
    ingress: Option<String>,

    /// Host NIC to attach the egress TC translator to. Attaching egress
    /// requires a reachable `sciond` (via `-d` or `sciond.address`),
    /// since resolving a path-cache miss needs it.
    #[arg(short, long, value_name = "IFACE")]
    egress: Option<String>,

    /// `sciond` control-plane address (`host:port`). Overrides
    /// `sciond.address` from the config file.
    #[arg(short = 'd', long, value_name = "ADDR")]
    sciond: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            // Tracing isn't initialized yet (log.level lives in the
            // config itself), so this is the one place this binary
            // prints straight to stderr.
            eprintln!("failed to load configuration from {}: {err}", cli.config.display());
            std::process::exit(1);
        }
    };

    if let Err(err) = init_tracing(&cfg.log.level, cfg.log.show_target) {
        eprintln!("failed to initialize tracing: {err}");
        std::process::exit(1);
    }

    let ingress_iface = cli.ingress.clone().unwrap_or_else(|| cfg.xdp.interface.clone());
    let sciond_addr = cli.sciond.clone().unwrap_or_else(|| cfg.sciond.address.clone());

    if cli.egress.is_some() && sciond_addr.trim().is_empty() {
        error!("egress attachment requires a sciond address (pass -d/--sciond or set sciond.address)");
        std::process::exit(1);
    }

    info!(isd_asn = %cfg.translator.isd_asn, config = %cli.config.display(), "configuration loaded");

    let mut translator = match Translator::load() {
        Ok(t) => t,
        Err(err) => {
            error!(%err, "failed to load BPF object");
            std::process::exit(1);
        }
    };

    if let Err(err) = translator.attach_ingress(&ingress_iface) {
        error!(%err, iface = %ingress_iface, "failed to attach ingress translator");
        std::process::exit(1);
    }
    info!(iface = %ingress_iface, "ingress translator attached");

    let attached = Arc::new(AtomicBool::new(false));

    let mut metrics = None;
    let telemetry_task = if cfg.telemetry.enabled {
        match init_metrics() {
            Ok((m, registry)) => {
                metrics = Some(m);
                let listen = cfg.telemetry.listen;
                let attached = attached.clone();
                Some(tokio::spawn(async move {
                    if let Err(err) = start_observability_server(listen, registry, attached).await
                    {
                        error!(%err, "observability server exited with error");
                    }
                }))
            }
            Err(err) => {
                error!(%err, "failed to initialize metrics, telemetry server disabled");
                None
            }
        }
    } else {
        None
    };

    let mut shutdown_signal = Box::pin(wait_for_shutdown_signal());

    // The path service's handles borrow `translator`, so its loop runs
    // inline here rather than as a spawned (necessarily 'static) task;
    // `tokio::select!` lets it share the process with the shutdown wait.
    if let Some(egress_iface) = cli.egress.clone() {
        let mut egress = match translator.attach_egress(&egress_iface) {
            Ok(a) => a,
            Err(err) => {
                error!(%err, iface = %egress_iface, "failed to attach egress translator");
                std::process::exit(1);
            }
        };
        info!(iface = %egress_iface, "egress translator attached");

        let sciond = match TcpSciondClient::connect(&sciond_addr, SCIOND_CONNECT_TIMEOUT).await {
            Ok(client) => client,
            Err(err) => {
                error!(%err, addr = %sciond_addr, "failed to connect to sciond");
                std::process::exit(1);
            }
        };
        info!(addr = %sciond_addr, "connected to sciond");

        let path_cache = match egress.path_cache() {
            Ok(handle) => handle,
            Err(err) => {
                error!(%err, "failed to obtain path cache handle");
                std::process::exit(1);
            }
        };
        let miss_ring = match egress.miss_ring() {
            Ok(handle) => handle,
            Err(err) => {
                error!(%err, "failed to obtain miss ring handle");
                std::process::exit(1);
            }
        };

        let mut service =
            PathService::new(sciond, miss_ring, path_cache, cfg.translator.isd_asn);
        if let Some(m) = metrics {
            service = service.with_metrics(m);
        }
        attached.store(true, Ordering::Relaxed);

        loop {
            tokio::select! {
                _ = service.drain_once() => {}
                _ = &mut shutdown_signal => break,
            }
        }
    } else {
        warn!("no egress interface given (-e/--egress); path service is not running");
        attached.store(true, Ordering::Relaxed);
        shutdown_signal.await;
    }

    info!("shutdown signal received, detaching translator");
    if let Some(handle) = telemetry_task {
        handle.abort();
    }

    drop(translator);
    scion_xlat_lib::telemetry::shutdown_tracing();
}

/// Resolves on SIGINT or (on unix) SIGTERM. Dropping `translator`
/// afterward detaches every attached program and destroys every map
/// (SPEC_FULL §5).
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
