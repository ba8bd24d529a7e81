//! Fundamental async datagram backend for nuggets.
//!
//! One nonblocking UDP socket per process, wrapped for readiness-based
//! single-threaded use. The [`drive`] loop realizes the handler
//! contracts of the game: an optional timeout hook and a message hook,
//! each of which may stop the loop. Everything a handler queues in its
//! [`Outbox`] is flushed to the network before the next datagram is
//! read.

#![warn(missing_docs)]

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::ops::ControlFlow;
use std::time::Duration;

use async_io::{Async, Timer};

/// Largest UDP payload the loop will read.
pub const MAX_DATAGRAM: usize = 65507;

/// The process-wide datagram socket.
#[derive(Debug)]
pub struct Handle {
    socket: Async<UdpSocket>,
}

impl Handle {
    /// Binds the socket. Port 0 asks the system for an ephemeral port.
    pub fn bind<A>(addr: A) -> io::Result<Self>
    where
        A: ToSocketAddrs,
    {
        let mut err = None;
        for addr in addr.to_socket_addrs()? {
            match UdpSocket::bind(addr) {
                Ok(socket) => {
                    socket.set_nonblocking(true)?;
                    return Ok(Self {
                        socket: Async::new_nonblocking(socket)?,
                    });
                }
                Err(e) => err = Some(e),
            }
        }

        Err(err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "no valid address found")
        }))
    }

    /// The locally bound address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.get_ref().local_addr()
    }

    /// Sends one datagram; the payload must fit [`MAX_DATAGRAM`].
    pub async fn send_to(&self, data: &[u8], addr: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(data, addr).await
    }

    /// Receives one datagram together with its sender.
    pub async fn recv_from(&self, data: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(data).await
    }
}

/// Replies and broadcasts queued by a handler, delivered in order
/// before the loop reads the next datagram.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: Vec<(SocketAddr, String)>,
}

impl Outbox {
    /// Queues one message for delivery.
    pub fn push(&mut self, to: SocketAddr, message: impl ToString) {
        self.queue.push((to, message.to_string()));
    }

    /// Whether anything is waiting to be sent.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued messages in delivery order.
    pub fn iter(&self) -> impl Iterator<Item = (SocketAddr, &str)> + '_ {
        self.queue.iter().map(|(to, message)| (*to, message.as_str()))
    }

    async fn flush(&mut self, handle: &Handle) {
        for (to, message) in self.queue.drain(..) {
            match handle.send_to(message.as_bytes(), to).await {
                Ok(_) => log::debug!("TO {to}: {} bytes", message.len()),
                // Datagram loss is tolerated; the game state stays
                // authoritative on this side.
                Err(err) => log::warn!("send to {to} failed: {err}"),
            }
        }
    }
}

/// Hooks supplied to [`drive`]. The timeout hook only runs when the
/// loop was given a period.
pub trait Handlers {
    /// A datagram arrived from `from`.
    fn on_message(&mut self, from: SocketAddr, text: &str, out: &mut Outbox) -> ControlFlow<()>;

    /// The period elapsed without traffic.
    fn on_timeout(&mut self, out: &mut Outbox) -> ControlFlow<()> {
        let _ = out;
        ControlFlow::Continue(())
    }
}

/// Runs the message loop until a hook breaks.
///
/// Each datagram is handled to completion before the next is read;
/// non-UTF-8 datagrams and receive errors are logged and skipped.
pub async fn drive<H>(handle: &Handle, period: Option<Duration>, handlers: &mut H) -> io::Result<()>
where
    H: Handlers,
{
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut out = Outbox::default();

    loop {
        let inbound = async { Some(handle.recv_from(&mut buf).await) };
        let event = match period {
            Some(period) => {
                futures_lite::future::race(inbound, async {
                    Timer::after(period).await;
                    None
                })
                .await
            }
            None => inbound.await,
        };

        let flow = match event {
            None => handlers.on_timeout(&mut out),
            Some(Ok((nread, from))) => match std::str::from_utf8(&buf[..nread]) {
                Ok(text) => {
                    log::debug!("FROM {from}: {nread} bytes");
                    handlers.on_message(from, text, &mut out)
                }
                Err(_) => {
                    log::warn!("dropping non-UTF-8 datagram from {from}");
                    ControlFlow::Continue(())
                }
            },
            Some(Err(err)) => {
                log::error!("receiving from socket: {err}");
                ControlFlow::Continue(())
            }
        };

        out.flush(handle).await;
        if flow.is_break() {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbox_keeps_queue_order() {
        let a = SocketAddr::from(([127, 0, 0, 1], 1));
        let b = SocketAddr::from(([127, 0, 0, 1], 2));
        let mut out = Outbox::default();
        assert!(out.is_empty());

        out.push(a, "first");
        out.push(b, "second");
        out.push(a, "third");
        assert_eq!(
            out.queue
                .iter()
                .map(|(_, m)| m.as_str())
                .collect::<Vec<_>>(),
            ["first", "second", "third"]
        );
    }
}
