//! The blocking `queryPaths(dst) -> sequence<Path>` call the path
//! service (component G) consumes. The real `sciond` RPC protocol is an
//! external collaborator - out of scope per SPEC_FULL §1 - so this
//! module defines the trait the rest of the crate depends on, plus one
//! concrete TCP-based implementation good enough to exercise the path
//! service end to end against a local daemon stand-in. Production
//! deployments substitute their own `SciondClient` (e.g. a generated
//! protobuf client for the real `sciond` gRPC API) without touching
//! `PathService`.

use std::net::Ipv6Addr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::error::PathServiceError;
use crate::isdasn::IsdAsn;

/// One resolved path: an opaque dataplane byte string (`dp`, already
/// 4-byte-word aligned) plus the underlay next hop. An empty `dp`
/// denotes the intra-domain `SC_PATH_TYPE_EMPTY` case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    pub dp: Vec<u8>,
    pub next_hop_addr: Ipv6Addr,
    pub next_hop_port: u16,
}

impl Path {
    pub fn is_empty_path(&self) -> bool {
        self.dp.is_empty()
    }
}

/// Query flags mirrored from the upstream `sciond` API; only
/// `include_interfaces` is meaningful to this translator (SPEC_FULL
/// §4.G step 2 always sets it).
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryFlags {
    pub include_interfaces: bool,
}

#[allow(async_fn_in_trait)]
pub trait SciondClient: Send {
    /// Resolve every known path toward `dst`. Any non-success status
    /// (unreachable daemon, no path, timeout) is reported as
    /// `PathServiceError::ResolveFailed`; the caller leaves the key
    /// uncached rather than treating this as fatal.
    async fn query_paths(
        &self,
        dst: IsdAsn,
        flags: QueryFlags,
        deadline: Duration,
    ) -> Result<Vec<Path>, PathServiceError>;
}

/// Minimal TCP-framed `sciond` client: a 1-byte request tag, the 8-byte
/// `IsdAsn`, a flags byte; the response is a 2-byte path count followed
/// by `(2-byte dp_len, dp bytes, 16-byte next-hop addr, 2-byte port)`
/// per path. This framing is this crate's own boundary stand-in, not
/// the real SCION daemon wire protocol (see module docs).
pub struct TcpSciondClient {
    addr: String,
    stream: Mutex<TcpStream>,
}

const REQUEST_TAG_QUERY_PATHS: u8 = 1;

impl TcpSciondClient {
    /// Establish a connection to `addr` within `timeout`. Matches
    /// SPEC_FULL §4.G's `init(daemonAddress)` contract: failure here is
    /// terminal (`InitError`), not retried.
    pub async fn connect(addr: &str, timeout: Duration) -> Result<Self, PathServiceError> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| PathServiceError::InitError {
                addr: addr.to_string(),
                timeout_ms: timeout.as_millis() as u64,
                source: std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
            })?
            .map_err(|source| PathServiceError::InitError {
                addr: addr.to_string(),
                timeout_ms: timeout.as_millis() as u64,
                source,
            })?;
        Ok(Self { addr: addr.to_string(), stream: Mutex::new(stream) })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl SciondClient for TcpSciondClient {
    async fn query_paths(
        &self,
        dst: IsdAsn,
        flags: QueryFlags,
        deadline: Duration,
    ) -> Result<Vec<Path>, PathServiceError> {
        let fut = async {
            let mut stream = self.stream.lock().await;

            let mut req = Vec::with_capacity(10);
            req.push(REQUEST_TAG_QUERY_PATHS);
            req.extend_from_slice(&dst.to_be_bytes());
            req.push(flags.include_interfaces as u8);
            stream.write_all(&req).await?;

            let count = stream.read_u16().await? as usize;
            let mut paths = Vec::with_capacity(count);
            for _ in 0..count {
                let dp_len = stream.read_u16().await? as usize;
                let mut dp = vec![0u8; dp_len];
                stream.read_exact(&mut dp).await?;
                let mut addr_bytes = [0u8; 16];
                stream.read_exact(&mut addr_bytes).await?;
                let port = stream.read_u16().await?;
                paths.push(Path {
                    dp,
                    next_hop_addr: Ipv6Addr::from(addr_bytes),
                    next_hop_port: port,
                });
            }
            Ok::<_, std::io::Error>(paths)
        };

        tokio::time::timeout(deadline, fut)
            .await
            .map_err(|_| PathServiceError::ResolveFailed {
                dst: dst.to_string(),
                reason: "sciond query timed out".to_string(),
            })?
            .map_err(|e| PathServiceError::ResolveFailed { dst: dst.to_string(), reason: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn query_paths_parses_single_path_response() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut tag = [0u8; 10];
            sock.read_exact(&mut tag).await.unwrap();

            // one path: dp = [1,2,3,4], next hop ::1, port 30042
            let mut resp = Vec::new();
            resp.extend_from_slice(&1u16.to_be_bytes());
            resp.extend_from_slice(&4u16.to_be_bytes());
            resp.extend_from_slice(&[1, 2, 3, 4]);
            resp.extend_from_slice(&Ipv6Addr::LOCALHOST.octets());
            resp.extend_from_slice(&30042u16.to_be_bytes());
            sock.write_all(&resp).await.unwrap();
        });

        let client = TcpSciondClient::connect(&addr.to_string(), Duration::from_millis(500))
            .await
            .unwrap();
        let paths = client
            .query_paths(
                IsdAsn::new(1, 10),
                QueryFlags { include_interfaces: true },
                Duration::from_millis(500),
            )
            .await
            .unwrap();

        server.await.unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].dp, vec![1, 2, 3, 4]);
        assert_eq!(paths[0].next_hop_addr, Ipv6Addr::LOCALHOST);
        assert_eq!(paths[0].next_hop_port, 30042);
    }

    #[tokio::test]
    async fn connect_fails_fast_when_nothing_listens() {
        let result = TcpSciondClient::connect("127.0.0.1:1", Duration::from_millis(200)).await;
        assert!(result.is_err());
    }
}
