//! Session traits and wire-facing types

use std::sync::Arc;

use bytes::Bytes;

use brill_core::{BrillResult, Encoding, Ntp64, RouterId};

use crate::config::SessionConfig;

/// A live sample as seen on the substrate's delivery thread
///
/// All references point into substrate-owned memory and are only valid for
/// the duration of the handler invocation.
#[derive(Clone, Copy, Debug)]
pub struct Sample<'a> {
    /// Key the sample was published under (no leading separator)
    pub key_expr: &'a str,
    pub payload: &'a [u8],
    /// Encoding tag string as carried on the wire
    pub encoding: &'a str,
    /// Network timestamp, NTP64 fixed point
    pub timestamp: Ntp64,
}

/// One reply to a query, owned by the caller
#[derive(Clone, Debug)]
pub struct Reply {
    pub key_expr: String,
    pub payload: Bytes,
    pub encoding: String,
    pub timestamp: Ntp64,
}

/// Handle to a declared subscriber
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SubscriberId(pub u64);

/// Callback invoked per arriving sample, on the substrate's delivery thread
pub type SampleHandler = Arc<dyn Fn(Sample<'_>) + Send + Sync>;

/// Congestion behavior for outbound data
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CongestionControl {
    /// Block the publisher until the sample can be routed
    #[default]
    Block,
    /// Drop the sample under congestion
    Drop,
}

/// Delivery reliability for a subscriber
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Reliability {
    #[default]
    Reliable,
    BestEffort,
}

/// Which peers a query is routed to
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum QueryTarget {
    /// Every peer holding matching data
    #[default]
    All,
    BestMatching,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PutOptions {
    pub congestion: CongestionControl,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GetOptions {
    pub target: QueryTarget,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SubscriberOptions {
    pub reliability: Reliability,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeleteOptions {}

/// An open session against the substrate
pub trait Session: Send + Sync {
    /// Publish a payload under a key
    fn put(
        &self,
        key_expr: &str,
        payload: &[u8],
        encoding: &Encoding,
        options: PutOptions,
    ) -> BrillResult<()>;

    /// Blocking query: pull every reply before returning
    fn get(&self, key_expr: &str, options: GetOptions) -> BrillResult<Vec<Reply>>;

    /// Arm a live subscription; the handler runs on substrate threads
    fn declare_subscriber(
        &self,
        key_expr: &str,
        handler: SampleHandler,
        options: SubscriberOptions,
    ) -> BrillResult<SubscriberId>;

    /// Tear down a live subscription
    fn undeclare_subscriber(&self, subscriber: SubscriberId) -> BrillResult<()>;

    /// Identities of currently reachable routers
    fn router_identities(&self) -> BrillResult<Vec<RouterId>>;

    /// Remove a key (and, on admin keys, the resource it denotes)
    fn delete(&self, key_expr: &str, options: DeleteOptions) -> BrillResult<()>;

    /// Close the session; outstanding handles become inert
    fn close(&self) -> BrillResult<()>;
}

/// Factory for sessions; the substrate entry point handed to the client
pub trait Substrate: Send + Sync {
    fn open(&self, config: &SessionConfig) -> BrillResult<Arc<dyn Session>>;
}
