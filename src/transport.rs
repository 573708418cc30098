//! Abstract datagram transport
//!
//! The [`Transport`] trait is the one contract the multiplexing layers have
//! toward the socket: a best-effort, non-blocking `send`. The built-in
//! [`UdpTransport`] owns a bound `tokio::net::UdpSocket` plus the receive
//! loop that feeds datagrams upward.

use crate::addr::Addr;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{info, trace};

/// Outbound datagram contract.
///
/// `send` must not block the caller beyond a single non-blocking system
/// call; loss is the caller's problem — reliability is layered on top by
/// the session's engine. Object-safe so sessions can hold `Arc<dyn
/// Transport>`.
pub trait Transport: Send + Sync + 'static {
    /// Best-effort datagram send
    fn send(&self, target: &Addr, buf: &[u8]);
}

/// UDP transport: a bound socket plus an optional background receive loop.
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    local_addr: Addr,
    recv_task: Mutex<Option<JoinHandle<()>>>,
}

impl UdpTransport {
    /// Bind a new UDP socket to `addr`
    pub async fn bind(addr: &Addr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr.socket_addr()).await?;
        let local_addr = Addr::from(socket.local_addr()?);
        info!(addr = %local_addr, "UDP transport bound");

        Ok(Self {
            socket: Arc::new(socket),
            local_addr,
            recv_task: Mutex::new(None),
        })
    }

    /// Local address the socket ended up bound to
    pub fn local_addr(&self) -> Addr {
        self.local_addr
    }

    /// Spawn the receive loop.
    ///
    /// Repeatedly reads into a fixed 64 KiB buffer and invokes
    /// `handler(from, bytes)` with a view into that buffer; the handler must
    /// not retain the view past its own return. The loop ends silently when
    /// the read fails or [`stop`](Self::stop) runs.
    pub fn start_recv_loop<F>(&self, mut handler: F)
    where
        F: FnMut(Addr, &[u8]) + Send + 'static,
    {
        let socket = self.socket.clone();

        let task = tokio::spawn(async move {
            let mut buf = vec![0u8; 65536];
            loop {
                match socket.recv_from(&mut buf).await {
                    Ok((n, from)) => handler(Addr::from(from), &buf[..n]),
                    Err(e) => {
                        trace!(error = %e, "receive loop ended");
                        break;
                    }
                }
            }
        });

        if let Ok(mut slot) = self.recv_task.lock() {
            if let Some(old) = slot.replace(task) {
                old.abort();
            }
        }
    }

    /// Stop the receive loop; the pending read is cancelled and the loop
    /// exits without error.
    pub fn stop(&self) {
        if let Ok(mut slot) = self.recv_task.lock() {
            if let Some(task) = slot.take() {
                task.abort();
                trace!(addr = %self.local_addr, "receive loop stopped");
            }
        }
    }
}

impl Transport for UdpTransport {
    fn send(&self, target: &Addr, buf: &[u8]) {
        // try_send_to never blocks; a full socket buffer just drops the
        // datagram and the reliability layer retransmits.
        if let Err(e) = self.socket.try_send_to(buf, target.socket_addr()) {
            trace!(peer = %target, error = %e, "datagram send failed");
        }
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        self.stop();
    }
}
