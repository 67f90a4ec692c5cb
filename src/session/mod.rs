//! Command session over one link.
//!
//! A session owns its transport from open to close and runs a strict
//! half-duplex exchange: one command out, one reply back, never more than
//! one command in flight. Replies carry nothing that identifies the command
//! they answer, so pairing relies entirely on that alternation.
//!
//! ```text
//! Closed --open--> AwaitingReady --"Arduino is ready"--> Ready --close--> Closed
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::error::{LinkError, Result};
use crate::protocol::{speed, Axis, Clamped, Command, FrameCodec, Markers, Reply};
use crate::transport::{open_serial, ByteSource, SerialSource};

pub mod handshake;
pub mod runner;

pub use handshake::{await_ready, READY_PHRASE};
pub use runner::{run_sequence, RunReport, SessionRunner, DEFAULT_PACING};

/// Link lifecycle as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Closed,
    AwaitingReady,
    Ready,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinkState::Closed => "closed",
            LinkState::AwaitingReady => "awaiting ready",
            LinkState::Ready => "ready",
        })
    }
}

/// Tunables for a session.
///
/// Both timeouts are off by default: a silent actuator blocks the session
/// until the operator intervenes.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub markers: Markers,
    /// Substring the firmware prints once it finished resetting.
    pub ready_phrase: String,
    pub ready_timeout: Option<Duration>,
    pub reply_timeout: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            markers: Markers::default(),
            ready_phrase: READY_PHRASE.to_string(),
            ready_timeout: None,
            reply_timeout: None,
        }
    }
}

/// One open link to the actuator.
pub struct Session<S> {
    source: S,
    codec: FrameCodec,
    state: LinkState,
    awaiting_reply: bool,
    options: SessionOptions,
}

impl<S: ByteSource> Session<S> {
    /// Take ownership of a freshly opened transport. The session starts in
    /// [`LinkState::AwaitingReady`]; run [`Session::await_ready`] before
    /// sending anything.
    pub fn new(source: S, options: SessionOptions) -> Self {
        Self {
            source,
            codec: FrameCodec::new(options.markers),
            state: LinkState::AwaitingReady,
            awaiting_reply: false,
            options,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// True while a command has been written but its reply not yet read.
    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    /// Wait for the actuator's readiness banner.
    pub async fn await_ready(&mut self) -> Result<Reply> {
        await_ready(self).await
    }

    /// Send one command and wait for its reply.
    ///
    /// A transport failure or reply timeout closes the link: every later
    /// call returns [`LinkError::NotReady`].
    pub async fn send(&mut self, command: &Command) -> Result<Reply> {
        if self.state != LinkState::Ready {
            return Err(LinkError::NotReady(self.state));
        }
        if self.awaiting_reply {
            return Err(LinkError::ReplyOutstanding);
        }

        // Set before writing: a send dropped mid-write leaves a partial frame.
        self.awaiting_reply = true;
        match self.exchange(command).await {
            Ok(reply) => {
                self.awaiting_reply = false;
                Ok(reply)
            }
            Err(e) => {
                if e.is_fatal() {
                    tracing::warn!(command = %command, "Link unusable, closing: {e}");
                    self.state = LinkState::Closed;
                }
                Err(e)
            }
        }
    }

    /// Clamp `requested` and send it to `axis`.
    pub async fn set_axis_speed(
        &mut self,
        axis: Axis,
        requested: i64,
    ) -> Result<(Reply, Clamped)> {
        let clamped = speed::clamp(requested);
        let command = Command::from_clamped(axis, clamped);
        let reply = self.send(&command).await?;
        Ok((reply, clamped))
    }

    /// Release the transport.
    pub async fn close(mut self) -> Result<()> {
        self.state = LinkState::Closed;
        self.source.shutdown().await?;
        tracing::info!("Link closed");
        Ok(())
    }

    async fn exchange(&mut self, command: &Command) -> Result<Reply> {
        let frame = self.codec.encode(command);
        self.source.write_bytes(&frame).await?;
        tracing::info!(command = %command, "Command sent");

        let timeout = self.options.reply_timeout;
        let reply = with_timeout(timeout, "reply", self.read_frame()).await?;
        tracing::info!(reply = %reply.text, "Reply received");
        Ok(reply)
    }

    /// Wait for bytes, then decode exactly one frame.
    pub(crate) async fn read_frame(&mut self) -> Result<Reply> {
        self.source.wait_readable().await?;
        self.codec.decode(&mut self.source).await
    }

    pub(crate) fn mark_ready(&mut self) {
        self.state = LinkState::Ready;
    }
}

impl Session<SerialSource> {
    /// Open a serial port and wait for the actuator to come up.
    pub async fn open(port: &str, baud_rate: u32, options: SessionOptions) -> Result<Self> {
        let source = open_serial(port, baud_rate)?;
        let mut session = Session::new(source, options);
        session.await_ready().await?;
        Ok(session)
    }
}

/// Serial-port session, as opened by [`open_link`].
pub type SerialSession = Session<SerialSource>;

/// Open `port`, complete the handshake, and return a ready session.
pub async fn open_link(
    port: &str,
    baud_rate: u32,
    options: SessionOptions,
) -> Result<SerialSession> {
    Session::open(port, baud_rate, options).await
}

/// Close a session and release its port.
pub async fn close_link<S: ByteSource>(session: Session<S>) -> Result<()> {
    session.close().await
}

pub(crate) async fn with_timeout<T, F>(
    limit: Option<Duration>,
    waiting_for: &'static str,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(waited) => tokio::time::timeout(waited, fut)
            .await
            .map_err(|_| LinkError::Timeout {
                waited,
                waiting_for,
            })?,
        None => fut.await,
    }
}
