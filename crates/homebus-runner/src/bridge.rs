//! RS-485 to TCP gateway input.
//!
//! Many installations tap the bus through a serial-to-Ethernet converter that
//! exposes the raw byte stream on a TCP port. This module connects to such a
//! gateway on a background tokio runtime and hands the bytes to the
//! synchronous decoder loop through a channel, reconnecting when the gateway
//! drops the connection.

use std::io::{self, Read};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Bytes read per socket read.
const READ_BUF_SIZE: usize = 1024;

/// Chunks buffered between the socket task and the decoder.
const CHANNEL_CAPACITY: usize = 256;

/// Message from the socket task to the reader.
#[derive(Debug)]
pub enum BridgeMessage {
    /// Bytes received from the gateway.
    Data(Vec<u8>),
    /// No more data will arrive.
    Closed,
}

/// Handle used to stop a running bridge from another thread.
#[derive(Clone)]
pub struct BridgeHandle {
    sender: mpsc::Sender<BridgeMessage>,
}

impl BridgeHandle {
    /// Make the reader report end of input. Safe to call from a signal handler thread.
    pub fn close(&self) {
        // A full channel means the reader is busy; it sees Closed once it drains.
        if self.sender.try_send(BridgeMessage::Closed).is_err() {
            let sender = self.sender.clone();
            std::thread::spawn(move || {
                let _ = sender.blocking_send(BridgeMessage::Closed);
            });
        }
    }
}

/// Blocking reader over a gateway connection.
///
/// Returns end of input when the gateway closes and reconnection is disabled,
/// or after [`BridgeHandle::close`]. With an idle timeout set, a read that
/// waits that long for data fails with [`io::ErrorKind::TimedOut`] and can be
/// retried.
pub struct BridgeReader {
    receiver: mpsc::Receiver<BridgeMessage>,
    pending: Vec<u8>,
    pos: usize,
    closed: bool,
    idle_timeout: Option<Duration>,
    // Dropped last: stops the socket task.
    runtime: Runtime,
}

impl BridgeReader {
    /// Start reading from `address`. `reconnect_delay` of `None` stops after
    /// the first connection ends.
    pub fn connect(
        address: &str,
        reconnect_delay: Option<Duration>,
    ) -> io::Result<(Self, BridgeHandle)> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("homebus-bridge")
            .enable_all()
            .build()?;

        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let handle = BridgeHandle {
            sender: sender.clone(),
        };
        runtime.spawn(run_bridge(address.to_string(), reconnect_delay, sender));

        Ok((
            BridgeReader {
                receiver,
                pending: Vec::new(),
                pos: 0,
                closed: false,
                idle_timeout: None,
                runtime,
            },
            handle,
        ))
    }
}

impl BridgeReader {
    /// Give up on a read after `timeout` without data. `None` waits forever.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    fn recv(&mut self) -> io::Result<Option<BridgeMessage>> {
        let Some(timeout) = self.idle_timeout else {
            return Ok(self.receiver.blocking_recv());
        };
        self.runtime
            .block_on(tokio::time::timeout(timeout, self.receiver.recv()))
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "no data from gateway"))
    }
}

impl Read for BridgeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.pending.len() {
            if self.closed {
                return Ok(0);
            }
            match self.recv()? {
                Some(BridgeMessage::Data(data)) => {
                    self.pending = data;
                    self.pos = 0;
                }
                Some(BridgeMessage::Closed) | None => {
                    self.closed = true;
                }
            }
        }

        let n = buf.len().min(self.pending.len() - self.pos);
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Connect, forward, and reconnect until the reader goes away.
async fn run_bridge(
    address: String,
    reconnect_delay: Option<Duration>,
    sender: mpsc::Sender<BridgeMessage>,
) {
    loop {
        match TcpStream::connect(&address).await {
            Ok(stream) => {
                info!(%address, "connected to gateway");
                match forward(stream, &sender).await {
                    Ok(()) => info!(%address, "gateway closed the connection"),
                    Err(e) => warn!(%address, error = %e, "gateway connection failed"),
                }
            }
            Err(e) => warn!(%address, error = %e, "cannot connect to gateway"),
        }

        if sender.is_closed() {
            return;
        }
        match reconnect_delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => {
                let _ = sender.send(BridgeMessage::Closed).await;
                return;
            }
        }
    }
}

/// Copy socket reads into the channel until EOF.
async fn forward(mut stream: TcpStream, sender: &mpsc::Sender<BridgeMessage>) -> io::Result<()> {
    let mut buf = [0u8; READ_BUF_SIZE];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        if sender.send(BridgeMessage::Data(buf[..n].to_vec())).await.is_err() {
            // Reader dropped.
            return Ok(());
        }
    }
}
