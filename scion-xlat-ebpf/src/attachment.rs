//! Attachment & lifecycle glue (component H): loads the translator's
//! kernel programs onto network interfaces and hands out owned
//! handles to the shared path cache and miss ring.

use aya::maps::{HashMap as BpfHashMap, MapData, RingBuf};
use aya::programs::tc;
use aya::programs::{SchedClassifier, TcAttachType, Xdp, XdpFlags};
use aya::{Ebpf, EbpfLoader};
use scion_xlat_common::{MapKey, PathEntry};
use scion_xlat_lib::{miss_ring::MissSource, path_cache::PathCacheWriter, PathServiceError};
use tokio::time::{self, Duration};
use tracing::{info, warn};

use crate::EbpfError;

/// Raw bytes of the compiled translator BPF object, embedded at build time.
/// `include_bytes_aligned!` ensures the 8-byte alignment aya's ELF parser needs.
static TRANSLATOR_BPF_BYTES: &[u8] =
    aya::include_bytes_aligned!(concat!(env!("OUT_DIR"), "/translator.bpf.o"));

const EGRESS_PROGRAM: &str = "scion_egress";
const INGRESS_PROGRAM: &str = "scion_ingress";
const PATH_MAP: &str = "PATH_MAP";
const PATH_REQ: &str = "PATH_REQ";

/// Owns the loaded BPF object for the lifetime of the process. Dropping
/// it detaches every attached program and destroys every map, which is
/// how this crate guarantees teardown on all exit paths: the caller
/// only needs to drop the `Translator` (or let the process exit).
pub struct Translator {
    ebpf: Ebpf,
    egress_iface: Option<String>,
    ingress_iface: Option<String>,
}

impl Translator {
    /// Load the translator's BPF object. Does not attach anything yet.
    pub fn load() -> Result<Self, EbpfError> {
        let ebpf = EbpfLoader::new().load(TRANSLATOR_BPF_BYTES).map_err(EbpfError::Load)?;
        Ok(Self { ebpf, egress_iface: None, ingress_iface: None })
    }

    /// Attach the egress translator to `iface` via a TC clsact qdisc.
    /// Qdisc creation is idempotent: an `EEXIST` from a prior attach (or
    /// another tool sharing the qdisc) is tolerated.
    pub fn attach_egress(&mut self, iface: &str) -> Result<EgressAttachment, EbpfError> {
        if let Err(e) = tc::qdisc_add_clsact(iface) {
            warn!(iface, error = %e, "qdisc_add_clsact failed (tolerated if clsact already exists)");
        }

        let program: &mut SchedClassifier = self
            .ebpf
            .program_mut(EGRESS_PROGRAM)
            .ok_or(EbpfError::ProgramNotFound(EGRESS_PROGRAM))?
            .try_into()
            .map_err(|e| EbpfError::ProgramType(EGRESS_PROGRAM, e))?;
        program.load().map_err(|e| EbpfError::ProgramLoad(EGRESS_PROGRAM, e))?;
        program
            .attach(iface, TcAttachType::Egress)
            .map_err(|e| EbpfError::Attach(EGRESS_PROGRAM, iface.to_string(), e))?;

        self.egress_iface = Some(iface.to_string());
        info!(iface, "egress translator attached");
        Ok(EgressAttachment { translator: self })
    }

    /// Attach the ingress translator to `iface` as an XDP program.
    pub fn attach_ingress(&mut self, iface: &str) -> Result<IngressAttachment, EbpfError> {
        let program: &mut Xdp = self
            .ebpf
            .program_mut(INGRESS_PROGRAM)
            .ok_or(EbpfError::ProgramNotFound(INGRESS_PROGRAM))?
            .try_into()
            .map_err(|e| EbpfError::ProgramType(INGRESS_PROGRAM, e))?;
        program.load().map_err(|e| EbpfError::ProgramLoad(INGRESS_PROGRAM, e))?;
        program
            .attach(iface, XdpFlags::default())
            .map_err(|e| EbpfError::Attach(INGRESS_PROGRAM, iface.to_string(), e))?;

        self.ingress_iface = Some(iface.to_string());
        info!(iface, "ingress translator attached");
        Ok(IngressAttachment { translator: self })
    }

    /// Owned handle to the shared path cache (component E): takes the
    /// map out of the `Ebpf` object rather than borrowing it, so the
    /// handle's lifetime is independent of `Translator`/`Ebpf` and does
    /// not keep either one mutably borrowed. Only meaningful once egress
    /// has been attached, but the map exists in the BPF object
    /// regardless of which programs are attached. Can only be taken
    /// once: a second call after the map has already been taken fails
    /// with `MapNotFound`.
    pub fn path_cache(&mut self) -> Result<PathCacheHandle, EbpfError> {
        let map = self.ebpf.take_map(PATH_MAP).ok_or(EbpfError::MapNotFound(PATH_MAP))?;
        let map = BpfHashMap::<_, u32, PathEntry>::try_from(map)
            .map_err(|e| EbpfError::MapType(PATH_MAP, e))?;
        Ok(PathCacheHandle { map })
    }

    /// Owned handle to the miss ring (component F). See `path_cache`'s
    /// doc comment for why this takes the map by value.
    pub fn miss_ring(&mut self) -> Result<MissRingHandle, EbpfError> {
        let map = self.ebpf.take_map(PATH_REQ).ok_or(EbpfError::MapNotFound(PATH_REQ))?;
        let ring = RingBuf::try_from(map).map_err(|e| EbpfError::MapType(PATH_REQ, e))?;
        Ok(MissRingHandle { ring })
    }
}

/// Proof that the egress translator is attached to an interface.
/// Detach happens when the underlying `Translator` (and with it the
/// `Ebpf` object) is dropped.
pub struct EgressAttachment<'a> {
    translator: &'a mut Translator,
}

impl EgressAttachment<'_> {
    pub fn interface(&self) -> &str {
        self.translator.egress_iface.as_deref().unwrap_or("")
    }

    pub fn path_cache(&mut self) -> Result<PathCacheHandle, EbpfError> {
        self.translator.path_cache()
    }

    pub fn miss_ring(&mut self) -> Result<MissRingHandle, EbpfError> {
        self.translator.miss_ring()
    }
}

pub struct IngressAttachment<'a> {
    translator: &'a mut Translator,
}

impl IngressAttachment<'_> {
    pub fn interface(&self) -> &str {
        self.translator.ingress_iface.as_deref().unwrap_or("")
    }
}

/// Writer-side view of the path cache map (component E). The fast path
/// only reads this map; only the path service writes it. Owns its
/// `MapData` (taken out of the `Ebpf` object by `Translator::path_cache`)
/// so it carries no borrow of `Translator` and can be moved into
/// `PathService` independently of `MissRingHandle`.
pub struct PathCacheHandle {
    map: BpfHashMap<MapData, u32, PathEntry>,
}

impl PathCacheHandle {
    /// Insert or replace the entry for `key`. `BPF_ANY` semantics: this
    /// always succeeds as a whole-entry replacement unless the map is at
    /// capacity, matching component E's atomicity invariant (a
    /// concurrent reader observes either the old or the new entry, never
    /// a torn one).
    pub fn upsert(&mut self, key: MapKey, entry: PathEntry) -> Result<(), EbpfError> {
        self.map.insert(key.0, entry, 0).map_err(|e| EbpfError::MapOperation(PATH_MAP, e))
    }
}

/// Consumer-side view of the miss ring (component F). Owns its
/// `MapData` for the same reason `PathCacheHandle` does.
pub struct MissRingHandle {
    ring: RingBuf<MapData>,
}

impl MissRingHandle {
    /// Drain whatever is currently available, calling `handler` for each
    /// missed key, then keep polling until `timeout` elapses. Mirrors
    /// `ring_buffer__poll(ring, timeout)`: a consumer that blocks up to
    /// `timeout` and returns as soon as something was seen or the budget
    /// is spent. `aya`'s `RingBuf::next` is non-blocking, so this
    /// approximates the poll with a short sleep between empty reads.
    pub async fn drain<F: FnMut(MapKey)>(&mut self, timeout: Duration, mut handler: F) -> usize {
        let mut count = 0usize;
        let deadline = time::Instant::now() + timeout;
        loop {
            let mut drained_any = false;
            while let Some(item) = self.ring.next() {
                if item.len() == 4 {
                    let bytes = [item[0], item[1], item[2], item[3]];
                    handler(MapKey(u32::from_ne_bytes(bytes)));
                    count += 1;
                    drained_any = true;
                } else {
                    warn!(len = item.len(), "miss ring record has unexpected size, discarding");
                }
            }
            if time::Instant::now() >= deadline {
                break;
            }
            if !drained_any {
                let remaining = deadline.saturating_duration_since(time::Instant::now());
                let step = remaining.min(Duration::from_millis(5));
                if step.is_zero() {
                    break;
                }
                time::sleep(step).await;
            }
        }
        count
    }
}

/// Lets `scion_xlat_lib::PathService` write into the real BPF path
/// cache without either crate depending on the other's concrete types.
impl PathCacheWriter for PathCacheHandle {
    fn upsert(&mut self, key: MapKey, entry: PathEntry) -> Result<(), PathServiceError> {
        PathCacheHandle::upsert(self, key, entry).map_err(|e| PathServiceError::UpsertFailed {
            dst: format!("{:#010x}", key.0),
            reason: e.to_string(),
        })
    }
}

/// Lets `scion_xlat_lib::PathService` drain the real BPF miss ring.
impl MissSource for MissRingHandle {
    async fn drain<F: FnMut(MapKey) + Send>(&mut self, timeout: Duration, handler: F) -> usize {
        MissRingHandle::drain(self, timeout, handler).await
    }
}
