//! Subscription contexts and callback dispatch
//!
//! One context exists per normalized topic. A context starts unarmed:
//! while the catch-up replay runs on the subscriber's thread, live samples
//! arriving on the substrate's delivery thread are dropped silently. The
//! context arms exactly once, permanently, after catch-up completes; from
//! then on every live sample reaches the callback once.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use brill_core::Variable;
use brill_transport::{Sample, SubscriberId};

/// Opaque user state passed through to context-taking callbacks
pub type UserData = dyn Any + Send + Sync;

/// Callback shapes: with or without opaque user data
///
/// Dispatched explicitly per variant; the user data travels with the
/// callback for the lifetime of the subscription.
pub enum SubscribeCallback {
    Plain(Box<dyn Fn(&Variable<'_>) + Send + Sync>),
    WithUserData {
        callback: Box<dyn Fn(&Variable<'_>, &UserData) + Send + Sync>,
        data: Arc<UserData>,
    },
}

impl SubscribeCallback {
    /// Invoke the callback for one delivered value
    pub fn invoke(&self, var: &Variable<'_>) {
        match self {
            SubscribeCallback::Plain(callback) => callback(var),
            SubscribeCallback::WithUserData { callback, data } => callback(var, data.as_ref()),
        }
    }
}

/// Per-topic subscription state shared with the delivery closure
pub struct SubscriptionContext {
    topic: String,
    subscriber: OnceLock<SubscriberId>,
    callback: SubscribeCallback,
    armed: AtomicBool,
}

impl SubscriptionContext {
    pub fn new(topic: String, callback: SubscribeCallback) -> Self {
        SubscriptionContext {
            topic,
            subscriber: OnceLock::new(),
            callback,
            armed: AtomicBool::new(false),
        }
    }

    /// Normalized topic (no leading separator)
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Record the transport handle once declaration succeeded
    pub fn set_subscriber(&self, id: SubscriberId) {
        let _ = self.subscriber.set(id);
    }

    pub fn subscriber(&self) -> Option<SubscriberId> {
        self.subscriber.get().copied()
    }

    /// Flip to live delivery; one-way, called after catch-up replay
    pub fn arm(&self) {
        self.armed.store(true, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Replay one caught-up value on the subscriber's thread
    pub fn replay(&self, var: &Variable<'_>) {
        self.callback.invoke(var);
    }

    /// Handle one live sample on the substrate's delivery thread
    ///
    /// Samples racing the catch-up replay are dropped.
    pub fn deliver(&self, sample: &Sample<'_>) {
        if !self.is_armed() {
            return;
        }
        let topic = format!("/{}", sample.key_expr);
        let timestamp = sample.timestamp.to_unix_nanos().to_string();
        let var = Variable::new(topic, sample.payload, sample.encoding, timestamp);
        self.callback.invoke(&var);
    }
}
