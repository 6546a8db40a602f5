//! Client implementation
//!
//! The client owns one optional session plus the subscription and mem
//! storage registries. All of that state sits behind a single mutex;
//! live delivery never takes it, because delivery closures only share the
//! per-topic [`SubscriptionContext`]. Catch-up replay runs inline on the
//! subscriber's thread before `subscribe` returns.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use brill_core::{BrillError, BrillResult, Encoding, TypedValue, Variable};
use brill_transport::{
    DeleteOptions, GetOptions, PutOptions, Reply, Sample, SampleHandler, Session, SessionConfig,
    Substrate, SubscriberOptions,
};

use crate::storage::{admin_keyexpr, MemStorageRecord, StorageRequest, VOLUME_MEMORY};
use crate::subscription::{SubscribeCallback, SubscriptionContext, UserData};
use crate::{DEFAULT_HOST, DEFAULT_PORT};

/// Strip at most one leading separator; keys carry none on the wire
fn normalize_topic(topic: &str) -> &str {
    topic.strip_prefix('/').unwrap_or(topic)
}

fn reply_to_variable(reply: Reply) -> Variable<'static> {
    Variable::new(
        format!("/{}", reply.key_expr),
        Vec::from(reply.payload),
        reply.encoding,
        reply.timestamp.to_unix_nanos().to_string(),
    )
}

struct ClientState {
    session: Option<Arc<dyn Session>>,
    host: String,
    port: u16,
    /// Active subscriptions in creation order; torn down back to front
    subscriptions: Vec<Arc<SubscriptionContext>>,
    /// Created mem storages in creation order; torn down back to front
    mem_storages: Vec<MemStorageRecord>,
}

/// Typed publish/subscribe/query client over a dissemination substrate
///
/// All per-client state is encapsulated here; independent instances do not
/// interfere. `subscribe`/`unsubscribe`/`add_mem_storage`/
/// `remove_mem_storage`/`disconnect` serialize on an internal lock, but
/// `connect`/`reconnect`/`disconnect` are not reentrant with each other and
/// must be serialized by the caller.
pub struct Client {
    substrate: Arc<dyn Substrate>,
    state: Mutex<ClientState>,
}

impl Client {
    pub fn new(substrate: Arc<dyn Substrate>) -> Self {
        Client {
            substrate,
            state: Mutex::new(ClientState {
                session: None,
                host: String::new(),
                port: 0,
                subscriptions: Vec::new(),
                mem_storages: Vec::new(),
            }),
        }
    }

    fn session(&self) -> BrillResult<Arc<dyn Session>> {
        self.state
            .lock()
            .session
            .clone()
            .ok_or(BrillError::NotConnected)
    }

    /// Connect to the default router endpoint
    pub fn connect_default(&self) -> BrillResult<()> {
        self.connect(DEFAULT_HOST, DEFAULT_PORT)
    }

    /// Open a client-mode session against `host:port`
    ///
    /// Any previous session is torn down first, reachable router or not;
    /// a session abandoned without teardown would keep delivering into
    /// orphaned subscription contexts. Succeeds iff the new session opens
    /// and at least one router is reachable.
    pub fn connect(&self, host: &str, port: u16) -> BrillResult<()> {
        let has_session = self.state.lock().session.is_some();
        if has_session {
            let _ = self.disconnect();
        }
        {
            let mut state = self.state.lock();
            state.host = host.to_string();
            state.port = port;
        }

        let config = SessionConfig::client(host, port);
        let session = self.substrate.open(&config)?;
        self.state.lock().session = Some(session);

        if self.is_connected() {
            debug!(host, port, "session opened");
            Ok(())
        } else {
            Err(BrillError::NoRouter)
        }
    }

    /// Whether a session is open and at least one router is reachable
    ///
    /// A live socket with zero reachable routers counts as disconnected:
    /// no publish, subscribe or get could usefully proceed.
    pub fn is_connected(&self) -> bool {
        let session = self.state.lock().session.clone();
        match session {
            Some(session) => session
                .router_identities()
                .map(|ids| !ids.is_empty())
                .unwrap_or(false),
            None => false,
        }
    }

    /// Tear down and connect again with the stored host and port
    pub fn reconnect(&self) -> BrillResult<()> {
        let (host, port) = {
            let state = self.state.lock();
            (state.host.clone(), state.port)
        };
        let _ = self.disconnect();
        self.connect(&host, port)
    }

    /// Tear down every subscription and mem storage, then close the session
    ///
    /// Teardown runs most-recently-created first and is best-effort: step
    /// failures are logged and skipped, and the call always succeeds. Safe
    /// to call repeatedly.
    pub fn disconnect(&self) -> BrillResult<()> {
        let mut state = self.state.lock();

        while let Some(ctx) = state.subscriptions.pop() {
            if let (Some(session), Some(id)) = (state.session.as_ref(), ctx.subscriber()) {
                if let Err(err) = session.undeclare_subscriber(id) {
                    warn!(topic = ctx.topic(), error = %err, "undeclare during disconnect failed");
                }
            }
        }

        while let Some(record) = state.mem_storages.pop() {
            if let Some(session) = state.session.as_ref() {
                let key = admin_keyexpr(&record.router, &record.name);
                if let Err(err) = session.delete(&key, DeleteOptions::default()) {
                    warn!(name = %record.name, error = %err, "storage removal during disconnect failed");
                }
            }
        }

        if let Some(session) = state.session.take() {
            if let Err(err) = session.close() {
                warn!(error = %err, "session close failed");
            }
        }
        state.host.clear();
        state.port = 0;

        Ok(())
    }

    /// Publish a typed value; the payload is its canonical decimal text
    pub fn publish<T: TypedValue>(&self, topic: &str, value: T) -> BrillResult<()> {
        self.put_payload(topic, &value.to_payload(), value.encoding())
    }

    /// Publish raw bytes as `application/octet-stream`
    pub fn publish_raw(&self, topic: &str, payload: &[u8]) -> BrillResult<()> {
        self.put_payload(topic, payload, Encoding::APP_OCTET_STREAM)
    }

    /// Publish bytes under a caller-supplied encoding tag
    pub fn publish_custom(&self, topic: &str, payload: &[u8], encoding: &str) -> BrillResult<()> {
        self.put_payload(topic, payload, Encoding::parse(encoding))
    }

    // Gated on is_connected like get/subscribe: a put into a session with
    // no reachable router would silently go nowhere.
    fn put_payload(&self, topic: &str, payload: &[u8], encoding: Encoding) -> BrillResult<()> {
        if !self.is_connected() {
            return Err(BrillError::NotConnected);
        }
        let session = self.session()?;
        let key = normalize_topic(topic);
        if key.is_empty() {
            return Err(BrillError::InvalidKeyExpr(topic.to_string()));
        }
        session.put(key, payload, &encoding, PutOptions::default())
    }

    /// Subscribe to live data
    pub fn subscribe<F>(&self, topic: &str, callback: F) -> BrillResult<()>
    where
        F: Fn(&Variable<'_>) + Send + Sync + 'static,
    {
        self.subscribe_inner(topic, SubscribeCallback::Plain(Box::new(callback)))
    }

    /// Subscribe to live data with opaque user data
    pub fn subscribe_with<F>(
        &self,
        topic: &str,
        callback: F,
        data: Arc<UserData>,
    ) -> BrillResult<()>
    where
        F: Fn(&Variable<'_>, &UserData) + Send + Sync + 'static,
    {
        self.subscribe_inner(
            topic,
            SubscribeCallback::WithUserData {
                callback: Box::new(callback),
                data,
            },
        )
    }

    /// Register a context, declare the live subscription, replay current
    /// server state through the callback, then arm live delivery.
    fn subscribe_inner(&self, topic: &str, callback: SubscribeCallback) -> BrillResult<()> {
        if !self.is_connected() {
            return Err(BrillError::NotConnected);
        }
        let session = self.session()?;
        let key = normalize_topic(topic).to_string();

        let ctx = {
            let mut state = self.state.lock();
            if state.subscriptions.iter().any(|c| c.topic() == key) {
                return Err(BrillError::AlreadySubscribed(key));
            }
            let ctx = Arc::new(SubscriptionContext::new(key.clone(), callback));
            state.subscriptions.push(Arc::clone(&ctx));
            ctx
        };

        let handler: SampleHandler = {
            let ctx = Arc::clone(&ctx);
            Arc::new(move |sample: Sample<'_>| ctx.deliver(&sample))
        };
        match session.declare_subscriber(&key, handler, SubscriberOptions::default()) {
            Ok(id) => ctx.set_subscriber(id),
            Err(err) => {
                let mut state = self.state.lock();
                state.subscriptions.retain(|c| c.topic() != key);
                return Err(err);
            }
        }

        // Catch-up: live samples racing this replay are dropped by the
        // unarmed context rather than buffered.
        match session.get(&key, GetOptions::default()) {
            Ok(replies) => {
                for reply in replies {
                    if reply.key_expr.starts_with('@') {
                        continue;
                    }
                    let var = reply_to_variable(reply);
                    ctx.replay(&var);
                }
            }
            Err(err) => warn!(topic = %key, error = %err, "catch-up query failed"),
        }
        ctx.arm();
        debug!(topic = %key, "subscription armed");

        Ok(())
    }

    /// Drop the live subscription for a topic
    pub fn unsubscribe(&self, topic: &str) -> BrillResult<()> {
        let key = normalize_topic(topic);
        let (session, ctx) = {
            let mut state = self.state.lock();
            let pos = state
                .subscriptions
                .iter()
                .position(|c| c.topic() == key)
                .ok_or_else(|| BrillError::NoSuchSubscription(key.to_string()))?;
            let ctx = state.subscriptions.remove(pos);
            (state.session.clone(), ctx)
        };

        if let (Some(session), Some(id)) = (session, ctx.subscriber()) {
            if let Err(err) = session.undeclare_subscriber(id) {
                warn!(topic = %key, error = %err, "undeclare failed");
            }
        }
        Ok(())
    }

    /// Create an ephemeral memory-backed storage covering `topic` on a
    /// discovered router
    pub fn add_mem_storage(&self, name: &str, topic: &str) -> BrillResult<()> {
        let session = self.session()?;
        let mut state = self.state.lock();
        if state.mem_storages.iter().any(|r| r.name == name) {
            return Err(BrillError::StorageExists(name.to_string()));
        }

        let routers = session.router_identities()?;
        // First responder wins; no tie-break is defined among multiple
        // routers.
        let router = *routers.first().ok_or(BrillError::NoRouter)?;

        let request = StorageRequest {
            key_expr: normalize_topic(topic),
            volume: VOLUME_MEMORY,
        };
        let payload = serde_json::to_vec(&request)?;
        session.put(
            &admin_keyexpr(&router, name),
            &payload,
            &Encoding::APP_JSON,
            PutOptions::default(),
        )?;

        state.mem_storages.push(MemStorageRecord {
            name: name.to_string(),
            router,
        });
        debug!(name, router = %router, "mem storage created");
        Ok(())
    }

    /// Destroy a mem storage on the router recorded at creation time
    pub fn remove_mem_storage(&self, name: &str) -> BrillResult<()> {
        let session = self.session()?;
        let mut state = self.state.lock();
        let pos = state
            .mem_storages
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| BrillError::NoSuchStorage(name.to_string()))?;

        let router = state.mem_storages[pos].router;
        session.delete(&admin_keyexpr(&router, name), DeleteOptions::default())?;
        state.mem_storages.remove(pos);
        Ok(())
    }

    /// Blocking query of current stored values under a key pattern
    ///
    /// Admin-space replies are skipped. Returned variables are owned.
    pub fn get(&self, pattern: &str) -> BrillResult<Vec<Variable<'static>>> {
        if !self.is_connected() {
            return Err(BrillError::NotConnected);
        }
        let session = self.session()?;
        let key = normalize_topic(pattern);
        if key.is_empty() {
            return Err(BrillError::InvalidKeyExpr(pattern.to_string()));
        }

        let replies = session.get(key, GetOptions::default())?;
        let mut vars = Vec::with_capacity(replies.len());
        for reply in replies {
            if reply.key_expr.starts_with('@') {
                continue;
            }
            vars.push(reply_to_variable(reply));
        }
        Ok(vars)
    }

    /// Delete stored values under a topic
    pub fn erase(&self, topic: &str) -> BrillResult<()> {
        if !self.is_connected() {
            return Err(BrillError::NotConnected);
        }
        let session = self.session()?;
        session.delete(normalize_topic(topic), DeleteOptions::default())
    }
}
