//! Frame codec: `<` payload `>`.

use bytes::{BufMut, Bytes, BytesMut};

use super::command::Command;
use crate::error::{LinkError, Result};
use crate::transport::ByteSource;

/// Byte opening every frame (`<`).
pub const START_MARKER: u8 = 0x3C;

/// Byte closing every frame (`>`).
pub const END_MARKER: u8 = 0x3E;

/// Longest encoded command: `<DEC,-255>`.
const MAX_COMMAND_LEN: usize = 10;

/// Frame delimiters shared by host and firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markers {
    start: u8,
    end: u8,
}

impl Markers {
    /// Distinct delimiters that never occur inside a payload.
    ///
    /// Payloads are axis labels, signed decimal speeds and plain-text
    /// replies, so letters, digits, `,`, `-` and space are rejected.
    pub fn new(start: u8, end: u8) -> Result<Self> {
        let in_payload = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b',' | b'-' | b' ');
        if start == end || in_payload(start) || in_payload(end) {
            return Err(LinkError::InvalidMarkers {
                start: char::from(start),
                end: char::from(end),
            });
        }
        Ok(Self { start, end })
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            start: START_MARKER,
            end: END_MARKER,
        }
    }
}

/// One decoded frame from the actuator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Bytes between the markers.
    pub text: String,
    /// Number of bytes captured between the markers.
    pub declared_byte_count: usize,
}

impl Reply {
    /// True when the reply text includes `phrase`.
    pub fn contains(&self, phrase: &str) -> bool {
        self.text.contains(phrase)
    }
}

/// Encodes commands and decodes replies between a pair of [`Markers`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec {
    markers: Markers,
}

impl FrameCodec {
    /// Codec using `markers` in both directions.
    pub fn new(markers: Markers) -> Self {
        Self { markers }
    }

    /// Encode a command as `<AXIS,SPEED>`.
    pub fn encode(&self, command: &Command) -> Bytes {
        let mut buf = BytesMut::with_capacity(MAX_COMMAND_LEN);
        buf.put_u8(self.markers.start);
        buf.put_slice(command.axis().label().as_bytes());
        buf.put_u8(b',');
        buf.put_slice(command.speed().to_string().as_bytes());
        buf.put_u8(self.markers.end);
        buf.freeze()
    }

    /// Read the next frame from `source`.
    ///
    /// Bytes before the start marker are dropped, which is how the link
    /// resynchronizes after noise or a half-received frame. Repeated start
    /// markers inside a frame are skipped. Waits without bound until the end
    /// marker arrives.
    pub async fn decode<S>(&self, source: &mut S) -> Result<Reply>
    where
        S: ByteSource + ?Sized,
    {
        let mut discarded = 0usize;
        while source.read_byte().await? != self.markers.start {
            discarded += 1;
        }
        if discarded > 0 {
            tracing::debug!(discarded, "Skipped bytes before start marker");
        }

        let mut payload = Vec::new();
        loop {
            let byte = source.read_byte().await?;
            if byte == self.markers.end {
                break;
            }
            if byte != self.markers.start {
                payload.push(byte);
            }
        }

        let reply = Reply {
            declared_byte_count: payload.len(),
            text: String::from_utf8_lossy(&payload).into_owned(),
        };
        tracing::debug!(text = %reply.text, bytes = reply.declared_byte_count, "Frame received");
        Ok(reply)
    }
}
