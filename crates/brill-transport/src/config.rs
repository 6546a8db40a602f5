//! Session configuration

/// Session mode relative to the substrate topology
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SessionMode {
    /// Connect to a known router, no routing duties of our own
    #[default]
    Client,
    /// Participate as a peer (unused by the client, kept for completeness)
    Peer,
}

/// Configuration handed to [`Substrate::open`](crate::Substrate::open)
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Endpoints to connect to, e.g. `tcp/127.0.0.1:7447`
    pub connect: Vec<String>,
    pub mode: SessionMode,
    /// Multicast peer scouting; off for unicast client sessions
    pub multicast_scouting: bool,
    /// Ask the substrate to stamp samples with network time
    pub timestamping: bool,
}

impl SessionConfig {
    /// Unicast client configuration against a single router endpoint
    pub fn client(host: &str, port: u16) -> Self {
        SessionConfig {
            connect: vec![format!("tcp/{host}:{port}")],
            mode: SessionMode::Client,
            multicast_scouting: false,
            timestamping: true,
        }
    }
}
