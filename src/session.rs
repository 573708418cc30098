//! One reliable conversation bound to one peer address

use crate::addr::Addr;
use crate::config::MuxConfig;
use crate::error::{MuxError, Result};
use crate::transport::Transport;

use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use udpmux_core::{ConvId, ReliabilityEngine, Timestamp};

/// Reliable-delivery state machine for one conversation id and one peer.
///
/// The session owns its reliability engine and forwards everything the
/// engine wants on the wire through the shared [`Transport`]. Fully
/// reassembled payloads land in a bounded delivery channel; when the channel
/// is full the payload is dropped and counted — ingestion never blocks.
///
/// Driven from exactly two contexts: the owning endpoint (`input`/`update`)
/// and one consumer draining [`recv`](Self::recv). The `closed` and
/// `dropped` atomics are the only state shared beyond that.
pub struct Session {
    conv: ConvId,
    peer: Addr,
    engine: Mutex<ReliabilityEngine>,
    transport: Arc<dyn Transport>,

    delivery_tx: Mutex<Option<mpsc::Sender<Bytes>>>,
    delivery_rx: tokio::sync::Mutex<mpsc::Receiver<Bytes>>,

    closed: AtomicBool,
    dropped: AtomicU64,
}

impl Session {
    /// Create a session talking to `peer` over `transport`
    pub fn new(conv: ConvId, peer: Addr, transport: Arc<dyn Transport>, config: &MuxConfig) -> Self {
        let (delivery_tx, delivery_rx) = mpsc::channel(config.delivery_capacity);

        Self {
            conv,
            peer,
            engine: Mutex::new(ReliabilityEngine::new(conv, config.engine.clone())),
            transport,
            delivery_tx: Mutex::new(Some(delivery_tx)),
            delivery_rx: tokio::sync::Mutex::new(delivery_rx),
            closed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    /// Conversation id, stable for the session's lifetime
    pub fn conv(&self) -> ConvId {
        self.conv
    }

    /// Remote endpoint this session talks to
    pub fn peer(&self) -> Addr {
        self.peer
    }

    /// Feed one raw datagram into the reliability engine.
    ///
    /// Malformed input is dropped silently; a full delivery channel drops
    /// the newest payload and increments the counter. Never blocks, never
    /// errors across this boundary. No-op once closed.
    pub fn input(&self, data: &[u8]) {
        if self.is_closed() {
            return;
        }

        let dead = {
            let mut engine = self.lock_engine();
            if let Err(e) = engine.input(Bytes::copy_from_slice(data)) {
                trace!(conv = %self.conv, error = %e, "discarded malformed datagram");
                return;
            }
            let _ = engine.flush();
            self.pump(&mut engine);
            engine.is_dead()
        };

        if dead {
            self.close_dead();
        }
    }

    /// Queue a payload for reliable transmission. No-op `Ok` once closed.
    pub fn send(&self, data: Bytes) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }

        let dead = {
            let mut engine = self.lock_engine();
            engine.send(data)?;
            self.pump(&mut engine);
            engine.is_dead()
        };

        if dead {
            self.close_dead();
        }
        Ok(())
    }

    /// Wait for the next reassembled payload.
    ///
    /// Payloads come out in the order the engine reassembled them. Resolves
    /// `Err(SessionClosed)` immediately when called on a closed session, and
    /// for every pending receive once [`close`](Self::close) runs.
    pub async fn recv(&self) -> Result<Bytes> {
        if self.is_closed() {
            return Err(MuxError::SessionClosed);
        }

        let mut rx = self.delivery_rx.lock().await;
        rx.recv().await.ok_or(MuxError::SessionClosed)
    }

    /// Drive retransmission timers. Must be called at a bounded interval
    /// (the endpoint's update tick). No-op once closed.
    pub fn update(&self, now: Timestamp) {
        if self.is_closed() {
            return;
        }

        let dead = {
            let mut engine = self.lock_engine();
            let _ = engine.update(now);
            self.pump(&mut engine);
            engine.is_dead()
        };

        if dead {
            self.close_dead();
        }
    }

    /// Retransmission limit exceeded: the peer is unreachable, so tear down
    /// and let pending receives observe the cancellation.
    fn close_dead(&self) {
        warn!(conv = %self.conv, peer = %self.peer, "dead link, closing session");
        self.close();
    }

    /// When does the engine next need [`update`](Self::update)? Returns
    /// `now` itself when an update is already due.
    pub fn next_deadline(&self, now: Timestamp) -> Timestamp {
        if self.is_closed() {
            return now;
        }
        self.lock_engine().check(now)
    }

    /// Close the session. Idempotent: only the first caller (decided by
    /// compare-and-swap) tears down the delivery channel.
    pub fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            // Dropping the sender closes the channel; pending and future
            // receives resolve with SessionClosed.
            self.delivery_tx
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            debug!(conv = %self.conv, peer = %self.peer, "session closed");
        }
    }

    /// True once [`close`](Self::close) has run
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Payloads discarded because the delivery channel was full
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Forward pending wire packets to the transport and move reassembled
    /// payloads into the delivery channel.
    fn pump(&self, engine: &mut ReliabilityEngine) {
        for packet in engine.drain_output() {
            // A racing close must not produce late sends after teardown
            if self.is_closed() {
                break;
            }
            self.transport.send(&self.peer, &packet);
        }

        while let Ok(Some(payload)) = engine.recv() {
            let tx = self.delivery_tx.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(tx) = tx.as_ref() else { break };

            match tx.try_send(payload) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    trace!(conv = %self.conv, "delivery channel full, payload dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => break,
            }
        }
    }

    fn lock_engine(&self) -> std::sync::MutexGuard<'_, ReliabilityEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
