//! Client topology: a handful of outbound conversations, one driver

use crate::addr::Addr;
use crate::config::MuxConfig;
use crate::endpoint::{now_millis, start_driver, Endpoint, EndpointHooks};
use crate::error::Result;
use crate::session::Session;
use crate::transport::{Transport, UdpTransport};

use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::info;
use udpmux_core::ConvId;

struct ClientHooks {
    transport: Arc<UdpTransport>,
    config: MuxConfig,
}

impl EndpointHooks for ClientHooks {
    fn create_session(&self, conv: ConvId, peer: &Addr) -> Arc<Session> {
        let transport: Arc<dyn Transport> = self.transport.clone();
        Arc::new(Session::new(conv, *peer, transport, &self.config))
    }
}

/// Client endpoint: one socket, a single driving context, sessions created
/// eagerly by [`connect`](Self::connect) rather than by inbound traffic.
pub struct Client {
    transport: Arc<UdpTransport>,
    endpoint: Arc<Mutex<Endpoint>>,
    update_task: Mutex<Option<JoinHandle<()>>>,
}

impl Client {
    /// Bind a local socket and start the receive loop and update tick
    pub async fn bind(local: &Addr, config: MuxConfig) -> Result<Self> {
        config.validate()?;

        let transport = Arc::new(UdpTransport::bind(local).await?);
        let hooks = Arc::new(ClientHooks {
            transport: transport.clone(),
            config: config.clone(),
        });
        let endpoint = Arc::new(Mutex::new(Endpoint::new(hooks, config.idle_timeout)));

        let update_task = start_driver(&transport, endpoint.clone(), config.update_interval);

        info!(addr = %transport.local_addr(), "client started");

        Ok(Self {
            transport,
            endpoint,
            update_task: Mutex::new(Some(update_task)),
        })
    }

    /// Open (or fetch) the session for `conv` toward `server`.
    ///
    /// Creation is eager: the session exists and counts as active before
    /// any datagram has flowed.
    pub fn connect(&self, conv: ConvId, server: &Addr) -> Arc<Session> {
        let mut endpoint = self.lock_endpoint();
        let session = endpoint.open(conv, server, now_millis());
        info!(conv = %conv, peer = %server, "session connected");
        session
    }

    /// Session previously opened for `conv`, if still alive
    pub fn session(&self, conv: ConvId) -> Option<Arc<Session>> {
        self.lock_endpoint().get(conv)
    }

    pub fn local_addr(&self) -> Addr {
        self.transport.local_addr()
    }

    /// Stop the receive loop and update tick and close every session
    pub fn stop(&self) {
        self.transport.stop();

        if let Ok(mut slot) = self.update_task.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }

        self.lock_endpoint().close_all();
        info!(addr = %self.transport.local_addr(), "client stopped");
    }

    fn lock_endpoint(&self) -> std::sync::MutexGuard<'_, Endpoint> {
        self.endpoint.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.stop();
    }
}
