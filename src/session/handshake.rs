//! Start-up handshake.
//!
//! Opening the port resets the board, and the bootloader plus half-sent
//! frames leave noise on the line. The host waits for the firmware banner and
//! throws away everything that came before it.

use crate::error::{LinkError, Result};
use crate::protocol::Reply;
use crate::transport::ByteSource;

use super::{with_timeout, LinkState, Session};

/// Banner the actuator firmware prints once after reset.
pub const READY_PHRASE: &str = "Arduino is ready";

/// Block until the actuator reports ready, then mark the link ready.
///
/// Returns the banner frame. Frames that do not contain the ready phrase are
/// logged and dropped.
pub async fn await_ready<S: ByteSource>(session: &mut Session<S>) -> Result<Reply> {
    match session.state() {
        LinkState::AwaitingReady => {}
        LinkState::Ready => return Err(LinkError::AlreadyReady),
        LinkState::Closed => return Err(LinkError::NotReady(LinkState::Closed)),
    }

    let limit = session.options().ready_timeout;
    let banner = with_timeout(limit, "ready banner", wait_for_banner(session)).await?;

    session.mark_ready();
    tracing::info!(banner = %banner.text, "Actuator ready");
    Ok(banner)
}

async fn wait_for_banner<S: ByteSource>(session: &mut Session<S>) -> Result<Reply> {
    let phrase = session.options().ready_phrase.clone();
    let mut skipped = 0usize;

    loop {
        let reply = session.read_frame().await?;
        if reply.contains(&phrase) {
            if skipped > 0 {
                tracing::debug!(skipped, "Dropped frames before ready banner");
            }
            return Ok(reply);
        }
        skipped += 1;
        tracing::debug!(text = %reply.text, "Waiting for ready banner");
    }
}
