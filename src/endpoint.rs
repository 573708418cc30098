//! Session table, dispatch, and idle eviction shared by client and server

use crate::addr::Addr;
use crate::session::Session;
use crate::transport::UdpTransport;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};
use udpmux_core::{peek_conv_id, ConvId, Timestamp};

/// Strategy hooks specializing an [`Endpoint`] into a client or server
/// topology. Exactly two implementations exist in this crate; the trait
/// replaces subclassing, not open extensibility.
pub trait EndpointHooks: Send + Sync + 'static {
    /// Build the session for a conversation seen for the first time
    fn create_session(&self, conv: ConvId, peer: &Addr) -> Arc<Session>;

    /// Pick the dispatch key for an inbound datagram
    fn select_conv(&self, _from: &Addr, data: &[u8]) -> ConvId {
        peek_conv_id(data)
    }

    /// Called once right after a session enters the table
    fn on_session_created(&self, _session: &Arc<Session>) {}

    /// Called once right after a session leaves the table
    fn on_session_closed(&self, _session: &Arc<Session>) {}
}

/// Multiplexes an unbounded number of conversations over one socket.
///
/// Keyed by conversation id with a parallel last-activity map; both maps
/// always hold the same keys while a session is alive, and eviction removes
/// from both. All mutation happens from the owning driver context.
pub struct Endpoint {
    hooks: Arc<dyn EndpointHooks>,
    sessions: HashMap<ConvId, Arc<Session>>,
    last_active: HashMap<ConvId, u64>,
    idle_timeout: Duration,
}

impl Endpoint {
    pub fn new(hooks: Arc<dyn EndpointHooks>, idle_timeout: Duration) -> Self {
        Self {
            hooks,
            sessions: HashMap::new(),
            last_active: HashMap::new(),
            idle_timeout,
        }
    }

    /// Dispatch one inbound datagram.
    ///
    /// Datagrams too short to carry a conversation id are ignored. A
    /// previously unseen id creates its session on the spot; either way the
    /// bytes are fed in and the activity clock stamped.
    pub fn input(&mut self, from: &Addr, data: &[u8], now_ms: u64) {
        if data.len() < 4 {
            trace!(peer = %from, len = data.len(), "ignoring undersized datagram");
            return;
        }

        let conv = self.hooks.select_conv(from, data);
        let session = match self.sessions.get(&conv) {
            Some(session) => session.clone(),
            None => {
                let session = self.hooks.create_session(conv, from);
                self.sessions.insert(conv, session.clone());
                self.last_active.insert(conv, now_ms);
                debug!(conv = %conv, peer = %from, "session created on first datagram");
                self.hooks.on_session_created(&session);
                session
            }
        };

        session.input(data);
        self.last_active.insert(conv, now_ms);
    }

    /// Drive every session's retransmission timers, then evict sessions
    /// idle past the timeout. The closed hook fires exactly once per
    /// evicted session.
    pub fn update(&mut self, now_ms: u64) {
        for session in self.sessions.values() {
            session.update(now_ms as Timestamp);
        }

        let idle_ms = self.idle_timeout.as_millis() as u64;
        let expired: Vec<ConvId> = self
            .last_active
            .iter()
            .filter(|(_, &at)| now_ms.saturating_sub(at) > idle_ms)
            .map(|(&conv, _)| conv)
            .collect();

        for conv in expired {
            if let Some(session) = self.sessions.remove(&conv) {
                self.last_active.remove(&conv);
                session.close();
                debug!(conv = %conv, peer = %session.peer(), "evicted idle session");
                self.hooks.on_session_closed(&session);
            }
        }
    }

    /// Register a session eagerly, before any datagram arrives. Returns the
    /// existing session when the id is already present.
    pub fn open(&mut self, conv: ConvId, peer: &Addr, now_ms: u64) -> Arc<Session> {
        if let Some(session) = self.sessions.get(&conv) {
            return session.clone();
        }

        let session = self.hooks.create_session(conv, peer);
        self.sessions.insert(conv, session.clone());
        self.last_active.insert(conv, now_ms);
        self.hooks.on_session_created(&session);
        session
    }

    pub fn get(&self, conv: ConvId) -> Option<Arc<Session>> {
        self.sessions.get(&conv).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Close and remove every session, firing the closed hook for each
    pub fn close_all(&mut self) {
        for (conv, session) in self.sessions.drain() {
            session.close();
            debug!(conv = %conv, "session closed on shutdown");
            self.hooks.on_session_closed(&session);
        }
        self.last_active.clear();
    }
}

/// Wall-clock milliseconds, the activity/eviction clock
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Wire a transport's receive loop into an endpoint and start the periodic
/// update tick. Both topologies share this driver; returns the tick task.
pub(crate) fn start_driver(
    transport: &UdpTransport,
    endpoint: Arc<Mutex<Endpoint>>,
    update_interval: Duration,
) -> JoinHandle<()> {
    let ep = endpoint.clone();
    transport.start_recv_loop(move |from, data| {
        let mut ep = ep.lock().unwrap_or_else(PoisonError::into_inner);
        ep.input(&from, data, now_millis());
    });

    tokio::spawn(async move {
        let mut tick = tokio::time::interval(update_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tick.tick().await;
            let mut ep = endpoint.lock().unwrap_or_else(PoisonError::into_inner);
            ep.update(now_millis());
        }
    })
}
