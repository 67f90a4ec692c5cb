//! Integration tests for the actuator link against in-process mock actuators.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;
use tokio::time::Instant;

use scopelink::protocol::{Axis, Command};
use scopelink::session::{
    run_sequence, LinkState, Session, SessionOptions, SessionRunner, DEFAULT_PACING,
};
use scopelink::transport::{ByteSource, StreamSource};
use scopelink::{LinkError, Mount};

const READY: &[u8] = b"<Arduino is ready>";

/// Actuator that answers every complete command frame with `<OK>` and
/// records when each frame arrived.
fn spawn_echo_actuator(
    mut device: DuplexStream,
    banner: &'static [u8],
) -> tokio::task::JoinHandle<Vec<(String, Instant)>> {
    tokio::spawn(async move {
        device.write_all(banner).await.unwrap();

        let mut seen = Vec::new();
        let mut frame = Vec::new();
        let mut byte = [0u8; 1];
        while device.read_exact(&mut byte).await.is_ok() {
            frame.push(byte[0]);
            if byte[0] == b'>' {
                seen.push((
                    String::from_utf8(std::mem::take(&mut frame)).unwrap(),
                    Instant::now(),
                ));
                device.write_all(b"<OK>").await.unwrap();
            }
        }
        seen
    })
}

fn session_over(host: DuplexStream) -> Session<StreamSource<DuplexStream>> {
    Session::new(StreamSource::new(host), SessionOptions::default())
}

// =============================================================================
// Handshake
// =============================================================================

#[tokio::test]
async fn test_handshake_consumes_noise_and_banner() {
    let (host, device) = duplex(1024);
    let actuator = spawn_echo_actuator(device, b"\x13\x37<noise><Arduino is ready>");
    let mut session = session_over(host);

    assert_eq!(session.state(), LinkState::AwaitingReady);
    let banner = session.await_ready().await.unwrap();
    assert_eq!(banner.text, "Arduino is ready");
    assert_eq!(session.state(), LinkState::Ready);

    // Nothing from the reset is left to be mistaken for a reply.
    let reply = session
        .send(&Command::new(Axis::Declination, 0).unwrap())
        .await
        .unwrap();
    assert_eq!(reply.text, "OK");

    session.close().await.unwrap();
    let seen = actuator.await.unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "<DEC,0>");
}

#[tokio::test]
async fn test_send_before_handshake_is_rejected() {
    let (host, _device) = duplex(1024);
    let mut session = session_over(host);

    let err = session
        .send(&Command::stop(Axis::RightAscension))
        .await
        .unwrap_err();
    assert!(matches!(err, LinkError::NotReady(LinkState::AwaitingReady)));
}

// =============================================================================
// Sequences
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_run_sequence_end_to_end() {
    let (host, device) = duplex(1024);
    let actuator = spawn_echo_actuator(device, READY);
    let mut session = session_over(host);
    session.await_ready().await.unwrap();

    let pacing = Duration::from_secs(2);
    let commands = [
        Command::new(Axis::RightAscension, -255).unwrap(),
        Command::new(Axis::RightAscension, 0).unwrap(),
    ];
    let report = SessionRunner::new(pacing)
        .run(&mut session, &commands)
        .await
        .unwrap();

    let texts: Vec<&str> = report.replies().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, ["OK", "OK"]);
    assert_eq!(report.exchanges[0].0, commands[0]);
    assert_eq!(report.exchanges[1].0, commands[1]);

    session.close().await.unwrap();
    let seen = actuator.await.unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, "<RA,-255>");
    assert_eq!(seen[1].0, "<RA,0>");
    assert!(seen[1].1 - seen[0].1 >= pacing);
}

#[tokio::test(start_paused = true)]
async fn test_run_sequence_uses_default_pacing() {
    let (host, device) = duplex(1024);
    let actuator = spawn_echo_actuator(device, READY);
    let mut session = session_over(host);
    session.await_ready().await.unwrap();

    let commands = [
        Command::new(Axis::Declination, -255).unwrap(),
        Command::new(Axis::RightAscension, -255).unwrap(),
        Command::stop(Axis::RightAscension),
    ];
    let report = run_sequence(&mut session, &commands).await.unwrap();
    assert_eq!(report.len(), 3);
    assert!(report.replies().all(|r| r.text == "OK"));
    assert!(report.elapsed >= DEFAULT_PACING * 2);

    session.close().await.unwrap();
    let seen = actuator.await.unwrap();
    let frames: Vec<&str> = seen.iter().map(|(frame, _)| frame.as_str()).collect();
    assert_eq!(frames, ["<DEC,-255>", "<RA,-255>", "<RA,0>"]);
    assert!(seen[1].1 - seen[0].1 >= DEFAULT_PACING);
    assert!(seen[2].1 - seen[1].1 >= DEFAULT_PACING);
}

// =============================================================================
// Transport failures
// =============================================================================

enum WriteFault {
    /// Fail the first write with a broken pipe, succeed afterwards.
    FailOnce,
    /// Never finish a write.
    Stall,
}

/// Byte source with a scripted write fault and a fixed reply buffer.
struct FaultySource {
    fault: WriteFault,
    attempts: Arc<Mutex<usize>>,
    replies: VecDeque<u8>,
}

impl FaultySource {
    fn new(fault: WriteFault, attempts: Arc<Mutex<usize>>) -> Self {
        Self {
            fault,
            attempts,
            replies: READY.iter().chain(b"<OK><OK>").copied().collect(),
        }
    }
}

#[async_trait]
impl ByteSource for FaultySource {
    async fn write_bytes(&mut self, _data: &[u8]) -> io::Result<()> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };
        match self.fault {
            WriteFault::FailOnce if attempt == 1 => {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
            }
            WriteFault::FailOnce => Ok(()),
            WriteFault::Stall => std::future::pending().await,
        }
    }

    async fn read_byte(&mut self) -> io::Result<u8> {
        self.replies
            .pop_front()
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
    }

    fn bytes_available(&self) -> usize {
        self.replies.len()
    }

    async fn wait_readable(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_failed_write_closes_session() {
    let attempts = Arc::new(Mutex::new(0));
    let mut session = Session::new(
        FaultySource::new(WriteFault::FailOnce, attempts.clone()),
        SessionOptions::default(),
    );
    session.await_ready().await.unwrap();

    let err = session
        .send(&Command::new(Axis::RightAscension, 50).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, LinkError::Io(_)));
    assert!(err.is_fatal());
    assert_eq!(session.state(), LinkState::Closed);

    // The link would accept this write, but the session must not try.
    let err = session
        .send(&Command::stop(Axis::RightAscension))
        .await
        .unwrap_err();
    assert!(matches!(err, LinkError::NotReady(LinkState::Closed)));
    assert_eq!(*attempts.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_send_dropped_mid_write_blocks_further_commands() {
    let attempts = Arc::new(Mutex::new(0));
    let mut session = Session::new(
        FaultySource::new(WriteFault::Stall, attempts.clone()),
        SessionOptions::default(),
    );
    session.await_ready().await.unwrap();

    let first = Command::new(Axis::Declination, 30).unwrap();
    let abandoned = tokio::time::timeout(Duration::from_millis(50), session.send(&first)).await;
    assert!(abandoned.is_err());
    assert!(session.is_awaiting_reply());

    let err = session.send(&first).await.unwrap_err();
    assert!(matches!(err, LinkError::ReplyOutstanding));
    assert_eq!(*attempts.lock().unwrap(), 1);
}

// =============================================================================
// Single outstanding request
// =============================================================================

/// Byte source that records writes and only yields bytes pushed through its
/// feed channel.
struct GatedSource {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    feed: mpsc::UnboundedReceiver<u8>,
    pending: Option<u8>,
}

#[async_trait]
impl ByteSource for GatedSource {
    async fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.writes.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    async fn read_byte(&mut self) -> io::Result<u8> {
        if let Some(b) = self.pending.take() {
            return Ok(b);
        }
        self.feed
            .recv()
            .await
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
    }

    fn bytes_available(&self) -> usize {
        usize::from(self.pending.is_some())
    }

    async fn wait_readable(&mut self) -> io::Result<()> {
        if self.pending.is_none() {
            self.pending = Some(self.read_byte().await?);
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_abandoned_send_blocks_further_commands() {
    let writes = Arc::new(Mutex::new(Vec::new()));
    let (feed_tx, feed_rx) = mpsc::unbounded_channel();
    let source = GatedSource {
        writes: writes.clone(),
        feed: feed_rx,
        pending: None,
    };
    let mut session = Session::new(source, SessionOptions::default());

    for &b in READY {
        feed_tx.send(b).unwrap();
    }
    session.await_ready().await.unwrap();

    // The actuator never answers; the caller gives up on the first command.
    let first = Command::new(Axis::Declination, 100).unwrap();
    let abandoned = tokio::time::timeout(Duration::from_millis(50), session.send(&first)).await;
    assert!(abandoned.is_err());
    assert!(session.is_awaiting_reply());

    // The late reply arrives, but it belongs to the first command.
    for &b in b"<OK>" {
        feed_tx.send(b).unwrap();
    }
    let second = Command::new(Axis::Declination, -100).unwrap();
    let err = session.send(&second).await.unwrap_err();
    assert!(matches!(err, LinkError::ReplyOutstanding));

    let writes = writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0], b"<DEC,100>");
}

#[tokio::test]
async fn test_mount_over_custom_source() {
    let writes = Arc::new(Mutex::new(Vec::new()));
    let (feed_tx, feed_rx) = mpsc::unbounded_channel();
    let source = GatedSource {
        writes: writes.clone(),
        feed: feed_rx,
        pending: None,
    };
    let mut session = Session::new(source, SessionOptions::default());

    for &b in READY.iter().chain(b"<OK><OK><OK>") {
        feed_tx.send(b).unwrap();
    }
    session.await_ready().await.unwrap();

    let mut mount = Mount::new(session);
    mount.set_speed(Axis::RightAscension, 1000).await.unwrap();
    mount.nudge(Axis::RightAscension, -10).await.unwrap();
    mount.stop(Axis::RightAscension).await.unwrap();
    assert_eq!(mount.speed(Axis::RightAscension), 0);

    let writes = writes.lock().unwrap();
    let sent: Vec<&[u8]> = writes.iter().map(Vec::as_slice).collect();
    assert_eq!(sent, [&b"<RA,255>"[..], b"<RA,245>", b"<RA,0>"]);
}
