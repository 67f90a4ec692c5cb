//! Byte transports the link runs over.
//!
//! Framing and handshake only need a duplex byte stream that can hand out one
//! byte at a time, say how many bytes are buffered, and suspend until at least
//! one byte is readable.

use async_trait::async_trait;
use std::io;

pub mod serial;
pub mod stream;

pub use serial::{is_supported_baud_rate, open_serial, SerialSource, BAUD_RATES};
pub use stream::StreamSource;

/// Duplex byte stream owned by exactly one session.
#[async_trait]
pub trait ByteSource: Send {
    /// Write all of `data` and flush it to the device.
    async fn write_bytes(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read a single byte, suspending until one is available.
    async fn read_byte(&mut self) -> io::Result<u8>;

    /// Bytes that can be read right now without waiting.
    fn bytes_available(&self) -> usize;

    /// Suspend until `bytes_available() > 0`.
    async fn wait_readable(&mut self) -> io::Result<()>;

    /// Release the underlying device.
    async fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: ByteSource + ?Sized> ByteSource for Box<T> {
    async fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_bytes(data).await
    }

    async fn read_byte(&mut self) -> io::Result<u8> {
        (**self).read_byte().await
    }

    fn bytes_available(&self) -> usize {
        (**self).bytes_available()
    }

    async fn wait_readable(&mut self) -> io::Result<()> {
        (**self).wait_readable().await
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        (**self).shutdown().await
    }
}
