//! Path service (component G): drains the miss ring, resolves paths
//! through `sciond`, and upserts resolved entries into the path cache.
//! See SPEC_FULL §4.G.

use std::sync::Arc;
use std::time::Duration;

use scion_xlat_common::{PathEntry, MAX_PATH_WORDS};
use tracing::{debug, warn};

use crate::error::PathServiceError;
use crate::isdasn::IsdAsn;
use crate::miss_ring::MissSource;
use crate::path_cache::PathCacheWriter;
use crate::sciond::{Path, QueryFlags, SciondClient};
use crate::telemetry::Metrics;

/// How long a single `drain` call is allowed to block (SPEC_FULL §4.G,
/// §5: "the control loop's `drain` call has its own 100ms timeout so
/// shutdown latency is bounded").
pub const DRAIN_TIMEOUT: Duration = Duration::from_millis(100);

/// Deadline for a single `queryPaths` RPC (SPEC_FULL §4.G step 2).
pub const QUERY_DEADLINE: Duration = Duration::from_millis(100);

/// Drains `miss_ring`, resolves each missed key against `sciond`, and
/// writes resolved entries into `cache`. Single-threaded and
/// cooperative: if resolution falls behind, misses pile up in the ring
/// until it starts oldest-dropping - redundant packet loss, never
/// cache inconsistency (SPEC_FULL §4.G "Back-pressure").
pub struct PathService<C, R, W> {
    sciond: C,
    miss_ring: R,
    cache: W,
    local_isd_asn: IsdAsn,
    metrics: Option<Arc<Metrics>>,
}

impl<C, R, W> PathService<C, R, W>
where
    C: SciondClient,
    R: MissSource,
    W: PathCacheWriter,
{
    pub fn new(sciond: C, miss_ring: R, cache: W, local_isd_asn: IsdAsn) -> Self {
        Self { sciond, miss_ring, cache, local_isd_asn, metrics: None }
    }

    /// Attach the ambient counters (SPEC_FULL §A.7). Optional: tests and
    /// any deployment without telemetry enabled simply skip this.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run forever, alternating `drain` calls. Intended to be spawned as
    /// a task and cancelled from the outside (the shutdown flag is
    /// polled by the caller between iterations - see
    /// `scion-xlat-daemon`'s main loop).
    pub async fn run(&mut self, mut should_continue: impl FnMut() -> bool) {
        while should_continue() {
            self.drain_once().await;
        }
    }

    /// Drain whatever is currently in the ring (bounded by
    /// [`DRAIN_TIMEOUT`]) and resolve each key. Exposed separately from
    /// `run` so tests and the daemon's shutdown path can call it once.
    pub async fn drain_once(&mut self) -> usize {
        let mut keys = Vec::new();
        self.miss_ring.drain(DRAIN_TIMEOUT, |key| keys.push(key)).await;
        if let Some(m) = &self.metrics {
            m.misses_drained_total.add(keys.len() as u64, &[]);
        }

        let mut resolved = 0;
        for key in keys {
            let dst = IsdAsn::from_map_key(key);
            match self.resolve(dst).await {
                Ok(entry) => {
                    if let Some(m) = &self.metrics {
                        m.resolutions_succeeded_total.add(1, &[]);
                    }
                    match self.cache.upsert(key, entry) {
                        Ok(()) => {
                            resolved += 1;
                            if let Some(m) = &self.metrics {
                                m.upserts_succeeded_total.add(1, &[]);
                            }
                        }
                        Err(e) => {
                            if let Some(m) = &self.metrics {
                                m.upserts_failed_total.add(1, &[]);
                            }
                            warn!(%dst, error = %e, "upsert failed, skipping key");
                        }
                    }
                }
                Err(e) => {
                    // ResolveFailed: log at warn, leave the key uncached.
                    // Subsequent packets to this destination will
                    // re-trigger a miss.
                    if let Some(m) = &self.metrics {
                        m.resolutions_failed_total.add(1, &[]);
                    }
                    warn!(%dst, error = %e, "path resolution failed");
                }
            }
        }
        resolved
    }

    /// SPEC_FULL §4.G steps 1-4: query, pick the first path (no
    /// path-quality policy), serialize to a `PathEntry`.
    async fn resolve(&self, dst: IsdAsn) -> Result<PathEntry, PathServiceError> {
        let paths = self
            .sciond
            .query_paths(dst, QueryFlags { include_interfaces: true }, QUERY_DEADLINE)
            .await?;

        let path = paths.into_iter().next().ok_or_else(|| PathServiceError::ResolveFailed {
            dst: dst.to_string(),
            reason: "sciond returned zero paths".to_string(),
        })?;

        debug!(%dst, dp_len = path.dp.len(), "resolved path");
        to_path_entry(dst, self.local_isd_asn, &path)
    }
}

/// SPEC_FULL §4.G step 4: `toPathEntry`.
fn to_path_entry(
    dst: IsdAsn,
    src: IsdAsn,
    path: &Path,
) -> Result<PathEntry, PathServiceError> {
    if path.dp.len() % 4 != 0 {
        return Err(PathServiceError::ResolveFailed {
            dst: dst.to_string(),
            reason: format!("dataplane path length {} is not 4-byte aligned", path.dp.len()),
        });
    }
    // `dp` is an opaque byte string (SPEC_FULL §3, §4.C step 14: "each
    // 4-byte word is copied verbatim"), not a big-endian integer - the
    // fast path writes each `PathEntry::path` word back out via
    // `write_unaligned`, i.e. in the host's native byte order. Packing
    // with `from_ne_bytes` here is what makes that round-trip byte-for-
    // byte identical to `dp` regardless of target endianness.
    let words: Vec<u32> = path
        .dp
        .chunks_exact(4)
        .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    if words.len() > MAX_PATH_WORDS {
        return Err(PathServiceError::ResolveFailed {
            dst: dst.to_string(),
            reason: format!("path has {} words, exceeds MAX_PATH_WORDS", words.len()),
        });
    }

    PathEntry::new(
        dst.0,
        src.0,
        &words,
        path.next_hop_addr.octets(),
        path.next_hop_port,
    )
    .ok_or_else(|| PathServiceError::ResolveFailed {
        dst: dst.to_string(),
        reason: "failed to build PathEntry template".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miss_ring::InMemoryMissRing;
    use crate::path_cache::InMemoryPathCache;
    use scion_xlat_common::MapKey;
    use std::net::Ipv6Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSciond {
        paths: Vec<Path>,
        calls: AtomicUsize,
    }

    impl SciondClient for FakeSciond {
        async fn query_paths(
            &self,
            _dst: IsdAsn,
            _flags: QueryFlags,
            _deadline: Duration,
        ) -> Result<Vec<Path>, PathServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.paths.clone())
        }
    }

    #[tokio::test]
    async fn miss_is_resolved_and_cached() {
        let mut ring = InMemoryMissRing::new(1024);
        let key = MapKey::new(1, 0x10);
        ring.publish(key);

        let dp: Vec<u8> = [1u32, 2, 3, 4].iter().flat_map(|w| w.to_ne_bytes()).collect();
        let sciond = FakeSciond {
            paths: vec![Path { dp, next_hop_addr: Ipv6Addr::LOCALHOST, next_hop_port: 30042 }],
            calls: AtomicUsize::new(0),
        };
        let cache = InMemoryPathCache::new();
        let mut service = PathService::new(sciond, ring, cache, IsdAsn::new(1, 1));

        let resolved = service.drain_once().await;
        assert_eq!(resolved, 1);

        let entry = service.cache.lookup(key).unwrap();
        assert_eq!(entry.path_slice(), &[1u32, 2, 3, 4]);
        assert_eq!(entry.router_port, 30042);
    }

    #[tokio::test]
    async fn empty_path_list_leaves_key_uncached() {
        let mut ring = InMemoryMissRing::new(1024);
        let key = MapKey::new(1, 0x10);
        ring.publish(key);

        let sciond = FakeSciond { paths: vec![], calls: AtomicUsize::new(0) };
        let cache = InMemoryPathCache::new();
        let mut service = PathService::new(sciond, ring, cache, IsdAsn::new(1, 1));

        let resolved = service.drain_once().await;
        assert_eq!(resolved, 0);
        assert!(service.cache.lookup(key).is_none());
    }

    #[tokio::test]
    async fn empty_dataplane_path_is_cached_as_intra_domain() {
        let mut ring = InMemoryMissRing::new(1024);
        let key = MapKey::new(1, 0x10);
        ring.publish(key);

        let sciond = FakeSciond {
            paths: vec![Path { dp: vec![], next_hop_addr: Ipv6Addr::LOCALHOST, next_hop_port: 30042 }],
            calls: AtomicUsize::new(0),
        };
        let cache = InMemoryPathCache::new();
        let mut service = PathService::new(sciond, ring, cache, IsdAsn::new(1, 1));

        service.drain_once().await;
        let entry = service.cache.lookup(key).unwrap();
        assert_eq!(entry.header.path_type, scion_xlat_common::proto::path_type::EMPTY);
    }
}
