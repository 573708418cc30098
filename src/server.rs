//! Server topology: many inbound conversations, one task per session

use crate::addr::Addr;
use crate::config::MuxConfig;
use crate::endpoint::{start_driver, Endpoint, EndpointHooks};
use crate::error::Result;
use crate::session::Session;
use crate::transport::{Transport, UdpTransport};

use bytes::Bytes;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{info, trace};
use udpmux_core::ConvId;

/// Per-payload processing strategy injected into the server.
///
/// Runs inside the session's own task; responses go back through
/// [`Session::send`]. A panic here is confined to that session's task.
pub trait SessionHandler: Send + Sync + 'static {
    fn handle(&self, session: &Session, payload: Bytes);
}

impl<F> SessionHandler for F
where
    F: Fn(&Session, Bytes) + Send + Sync + 'static,
{
    fn handle(&self, session: &Session, payload: Bytes) {
        self(session, payload)
    }
}

/// Receive payloads from one session until it closes
async fn session_loop(session: Arc<Session>, handler: Arc<dyn SessionHandler>) {
    while let Ok(payload) = session.recv().await {
        handler.handle(&session, payload);
    }
    trace!(conv = %session.conv(), "session task finished");
}

struct ServerHooks {
    transport: Arc<UdpTransport>,
    config: MuxConfig,
    handler: Arc<dyn SessionHandler>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl EndpointHooks for ServerHooks {
    fn create_session(&self, conv: ConvId, peer: &Addr) -> Arc<Session> {
        let transport: Arc<dyn Transport> = self.transport.clone();
        Arc::new(Session::new(conv, *peer, transport, &self.config))
    }

    fn on_session_created(&self, session: &Arc<Session>) {
        // One independent lane per session: payloads for one conversation
        // are processed in order, distinct conversations in parallel across
        // the runtime's workers.
        let task = tokio::spawn(session_loop(session.clone(), self.handler.clone()));
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(task);
        }
        trace!(conv = %session.conv(), "session task spawned");
    }
}

/// Server endpoint: sessions appear on first datagram, each served by its
/// own processing task until closed or evicted.
pub struct Server {
    transport: Arc<UdpTransport>,
    endpoint: Arc<Mutex<Endpoint>>,
    update_task: Mutex<Option<JoinHandle<()>>>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Server {
    /// Bind a socket and start serving with `handler`
    pub async fn bind(
        local: &Addr,
        config: MuxConfig,
        handler: impl SessionHandler,
    ) -> Result<Self> {
        config.validate()?;

        let transport = Arc::new(UdpTransport::bind(local).await?);
        let tasks = Arc::new(Mutex::new(Vec::new()));
        let hooks = Arc::new(ServerHooks {
            transport: transport.clone(),
            config: config.clone(),
            handler: Arc::new(handler),
            tasks: tasks.clone(),
        });
        let endpoint = Arc::new(Mutex::new(Endpoint::new(hooks, config.idle_timeout)));

        let update_task = start_driver(&transport, endpoint.clone(), config.update_interval);

        info!(addr = %transport.local_addr(), "server started");

        Ok(Self {
            transport,
            endpoint,
            update_task: Mutex::new(Some(update_task)),
            tasks,
        })
    }

    pub fn local_addr(&self) -> Addr {
        self.transport.local_addr()
    }

    /// Currently live sessions
    pub fn session_count(&self) -> usize {
        self.lock_endpoint().session_count()
    }

    /// Stop the receive loop and update tick, close every session, and wait
    /// for all per-session tasks to observe the cancellation and exit.
    pub async fn stop(&self) {
        self.transport.stop();

        if let Ok(mut slot) = self.update_task.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }

        self.lock_endpoint().close_all();

        let tasks = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(_) => Vec::new(),
        };
        for task in tasks {
            // A task that panicked inside the handler just reports a
            // JoinError here; shutdown proceeds.
            let _ = task.await;
        }

        info!(addr = %self.transport.local_addr(), "server stopped");
    }

    fn lock_endpoint(&self) -> std::sync::MutexGuard<'_, Endpoint> {
        self.endpoint.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
