//! In-memory substrate simulator
//!
//! One simulated router holding mem storages and live subscribers. Admin
//! puts/deletes drive storage creation and destruction exactly like the real
//! control plane; data puts are stored in every covering storage, stamped
//! with NTP64 wall-clock time, and delivered inline to matching subscribers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use parking_lot::Mutex;

use brill_core::{BrillError, BrillResult, Encoding, Ntp64, RouterId};
use brill_transport::{
    DeleteOptions, GetOptions, PutOptions, Reply, Sample, SampleHandler, Session, SessionConfig,
    SubscriberId, SubscriberOptions, Substrate,
};

use crate::keyexpr::matches;

#[derive(Clone)]
struct StoredSample {
    payload: Bytes,
    encoding: String,
    timestamp: Ntp64,
}

struct NamedStorage {
    name: String,
    key_expr: String,
    values: BTreeMap<String, StoredSample>,
}

struct SubscriberEntry {
    id: SubscriberId,
    session: u64,
    key_expr: String,
    handler: SampleHandler,
}

#[derive(Default)]
struct RouterState {
    storages: Vec<NamedStorage>,
    subscribers: Vec<SubscriberEntry>,
    /// Chronological control-plane operations, for teardown-order asserts
    admin_log: Vec<String>,
}

struct RouterInner {
    router: RouterId,
    reachable: AtomicBool,
    next_id: AtomicU64,
    state: Mutex<RouterState>,
}

/// Single-router in-memory substrate
#[derive(Clone)]
pub struct MemSubstrate {
    inner: Arc<RouterInner>,
}

impl MemSubstrate {
    pub fn new() -> Self {
        MemSubstrate {
            inner: Arc::new(RouterInner {
                router: RouterId::new(rand::random()),
                reachable: AtomicBool::new(true),
                next_id: AtomicU64::new(1),
                state: Mutex::new(RouterState::default()),
            }),
        }
    }

    /// Identity of the simulated router
    pub fn router_id(&self) -> RouterId {
        self.inner.router
    }

    /// Simulate router loss/return without closing open sockets
    pub fn set_reachable(&self, reachable: bool) {
        self.inner.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Names of currently existing mem storages, in creation order
    pub fn storage_names(&self) -> Vec<String> {
        self.inner
            .state
            .lock()
            .storages
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    /// Number of values held by a named storage
    pub fn storage_len(&self, name: &str) -> Option<usize> {
        self.inner
            .state
            .lock()
            .storages
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.values.len())
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers.len()
    }

    /// Control-plane operations seen so far, oldest first
    pub fn admin_log(&self) -> Vec<String> {
        self.inner.state.lock().admin_log.clone()
    }
}

impl Default for MemSubstrate {
    fn default() -> Self {
        Self::new()
    }
}

impl Substrate for MemSubstrate {
    fn open(&self, config: &SessionConfig) -> BrillResult<Arc<dyn Session>> {
        if config.connect.is_empty() {
            return Err(BrillError::Transport("no endpoint configured".into()));
        }
        let session_id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MemSession {
            inner: Arc::clone(&self.inner),
            session_id,
            closed: AtomicBool::new(false),
        }))
    }
}

struct MemSession {
    inner: Arc<RouterInner>,
    session_id: u64,
    closed: AtomicBool,
}

impl MemSession {
    fn ensure_open(&self) -> BrillResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrillError::SessionClosed);
        }
        Ok(())
    }

    fn now() -> Ntp64 {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Ntp64::from_unix_nanos(nanos)
    }
}

/// Split an admin key into (router hex, storage name); None for data keys
fn parse_admin_key(key_expr: &str) -> Option<(&str, &str)> {
    let rest = key_expr.strip_prefix("@/")?;
    let mut parts = rest.split('/');
    let zid = parts.next()?;
    for expected in ["router", "config", "plugins", "storage_manager", "storages"] {
        if parts.next()? != expected {
            return None;
        }
    }
    let name = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((zid, name))
}

impl Session for MemSession {
    fn put(
        &self,
        key_expr: &str,
        payload: &[u8],
        encoding: &Encoding,
        _options: PutOptions,
    ) -> BrillResult<()> {
        self.ensure_open()?;

        if let Some((zid, name)) = parse_admin_key(key_expr) {
            if zid != self.inner.router.to_string() {
                return Err(BrillError::ControlPlane(format!("unknown router {zid}")));
            }
            let request: serde_json::Value = serde_json::from_slice(payload)?;
            let storage_key = request
                .get("key_expr")
                .and_then(|v| v.as_str())
                .ok_or_else(|| BrillError::ControlPlane("missing key_expr".into()))?
                .to_string();
            match request.get("volume").and_then(|v| v.as_str()) {
                Some("memory") => {}
                other => {
                    return Err(BrillError::ControlPlane(format!(
                        "unsupported volume: {other:?}"
                    )))
                }
            }

            let mut state = self.inner.state.lock();
            state.admin_log.push(format!("create:{name}"));
            if let Some(pos) = state.storages.iter().position(|s| s.name == name) {
                let existing = &mut state.storages[pos];
                existing.key_expr = storage_key;
                existing.values.clear();
            } else {
                state.storages.push(NamedStorage {
                    name: name.to_string(),
                    key_expr: storage_key,
                    values: BTreeMap::new(),
                });
            }
            return Ok(());
        }

        let sample = StoredSample {
            payload: Bytes::copy_from_slice(payload),
            encoding: encoding.to_string(),
            timestamp: Self::now(),
        };

        let handlers: Vec<SampleHandler> = {
            let mut state = self.inner.state.lock();
            for storage in &mut state.storages {
                if matches(&storage.key_expr, key_expr) {
                    storage.values.insert(key_expr.to_string(), sample.clone());
                }
            }
            state
                .subscribers
                .iter()
                .filter(|s| matches(&s.key_expr, key_expr))
                .map(|s| Arc::clone(&s.handler))
                .collect()
        };

        // Deliver outside the state lock: handlers may query the substrate.
        for handler in handlers {
            handler(Sample {
                key_expr,
                payload,
                encoding: &sample.encoding,
                timestamp: sample.timestamp,
            });
        }
        Ok(())
    }

    fn get(&self, key_expr: &str, _options: GetOptions) -> BrillResult<Vec<Reply>> {
        self.ensure_open()?;
        let state = self.inner.state.lock();

        // Merge across storages so overlapping coverage yields one reply
        // per key, like a deduplicating query channel would.
        let mut merged: BTreeMap<&str, &StoredSample> = BTreeMap::new();
        for storage in &state.storages {
            for (key, sample) in &storage.values {
                if matches(key_expr, key) {
                    merged.insert(key, sample);
                }
            }
        }

        Ok(merged
            .into_iter()
            .map(|(key, sample)| Reply {
                key_expr: key.to_string(),
                payload: sample.payload.clone(),
                encoding: sample.encoding.clone(),
                timestamp: sample.timestamp,
            })
            .collect())
    }

    fn declare_subscriber(
        &self,
        key_expr: &str,
        handler: SampleHandler,
        _options: SubscriberOptions,
    ) -> BrillResult<SubscriberId> {
        self.ensure_open()?;
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));
        let mut state = self.inner.state.lock();
        state.admin_log.push(format!("subscribe:{key_expr}"));
        state.subscribers.push(SubscriberEntry {
            id,
            session: self.session_id,
            key_expr: key_expr.to_string(),
            handler,
        });
        Ok(id)
    }

    fn undeclare_subscriber(&self, subscriber: SubscriberId) -> BrillResult<()> {
        let mut state = self.inner.state.lock();
        let pos = state
            .subscribers
            .iter()
            .position(|s| s.id == subscriber)
            .ok_or_else(|| {
                BrillError::Transport(format!("unknown subscriber {subscriber:?}"))
            })?;
        let entry = state.subscribers.remove(pos);
        state.admin_log.push(format!("unsubscribe:{}", entry.key_expr));
        Ok(())
    }

    fn router_identities(&self) -> BrillResult<Vec<RouterId>> {
        self.ensure_open()?;
        if self.inner.reachable.load(Ordering::SeqCst) {
            Ok(vec![self.inner.router])
        } else {
            Ok(Vec::new())
        }
    }

    fn delete(&self, key_expr: &str, _options: DeleteOptions) -> BrillResult<()> {
        self.ensure_open()?;

        if let Some((zid, name)) = parse_admin_key(key_expr) {
            if zid != self.inner.router.to_string() {
                return Err(BrillError::ControlPlane(format!("unknown router {zid}")));
            }
            let mut state = self.inner.state.lock();
            let before = state.storages.len();
            state.storages.retain(|s| s.name != name);
            if state.storages.len() == before {
                return Err(BrillError::ControlPlane(format!("no such storage: {name}")));
            }
            state.admin_log.push(format!("delete:{name}"));
            return Ok(());
        }

        let mut state = self.inner.state.lock();
        for storage in &mut state.storages {
            storage.values.retain(|key, _| !matches(key_expr, key));
        }
        Ok(())
    }

    fn close(&self) -> BrillResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        let mut state = self.inner.state.lock();
        state.subscribers.retain(|s| s.session != self.session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(substrate: &MemSubstrate) -> Arc<dyn Session> {
        substrate
            .open(&SessionConfig::client("127.0.0.1", 7447))
            .unwrap()
    }

    fn create_storage(
        substrate: &MemSubstrate,
        session: &Arc<dyn Session>,
        name: &str,
        key_expr: &str,
    ) {
        let key = format!(
            "@/{}/router/config/plugins/storage_manager/storages/{name}",
            substrate.router_id()
        );
        let body = serde_json::json!({"key_expr": key_expr, "volume": "memory"}).to_string();
        session
            .put(
                &key,
                body.as_bytes(),
                &Encoding::APP_JSON,
                PutOptions::default(),
            )
            .unwrap();
    }

    #[test]
    fn test_admin_put_creates_storage() {
        let substrate = MemSubstrate::new();
        let session = open(&substrate);
        create_storage(&substrate, &session, "demo", "a/**");
        assert_eq!(substrate.storage_names(), ["demo"]);
    }

    #[test]
    fn test_put_get_through_storage() {
        let substrate = MemSubstrate::new();
        let session = open(&substrate);
        create_storage(&substrate, &session, "demo", "a/**");

        session
            .put("a/b", b"42", &Encoding::TEXT_PLAIN, PutOptions::default())
            .unwrap();
        session
            .put("x/y", b"9", &Encoding::TEXT_PLAIN, PutOptions::default())
            .unwrap();

        let replies = session.get("a/**", GetOptions::default()).unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].key_expr, "a/b");
        assert_eq!(&replies[0].payload[..], b"42");
    }

    #[test]
    fn test_admin_delete_destroys_storage() {
        let substrate = MemSubstrate::new();
        let session = open(&substrate);
        create_storage(&substrate, &session, "demo", "a/**");
        session
            .put("a/b", b"42", &Encoding::TEXT_PLAIN, PutOptions::default())
            .unwrap();

        let key = format!(
            "@/{}/router/config/plugins/storage_manager/storages/demo",
            substrate.router_id()
        );
        session.delete(&key, DeleteOptions::default()).unwrap();
        assert!(substrate.storage_names().is_empty());
        assert!(session.get("a/**", GetOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn test_subscriber_receives_matching_puts() {
        let substrate = MemSubstrate::new();
        let session = open(&substrate);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        session
            .declare_subscriber(
                "a/**",
                Arc::new(move |sample: Sample<'_>| {
                    sink.lock().push(sample.key_expr.to_string());
                }),
                SubscriberOptions::default(),
            )
            .unwrap();

        session
            .put("a/b", b"1", &Encoding::TEXT_PLAIN, PutOptions::default())
            .unwrap();
        session
            .put("z/z", b"2", &Encoding::TEXT_PLAIN, PutOptions::default())
            .unwrap();
        assert_eq!(seen.lock().as_slice(), ["a/b"]);
    }

    #[test]
    fn test_closed_session_rejects_ops() {
        let substrate = MemSubstrate::new();
        let session = open(&substrate);
        session.close().unwrap();
        assert!(session
            .put("a", b"1", &Encoding::TEXT_PLAIN, PutOptions::default())
            .is_err());
        assert!(session.router_identities().is_err());
    }

    #[test]
    fn test_unreachable_router_reports_no_identities() {
        let substrate = MemSubstrate::new();
        let session = open(&substrate);
        assert_eq!(session.router_identities().unwrap().len(), 1);
        substrate.set_reachable(false);
        assert!(session.router_identities().unwrap().is_empty());
    }
}
