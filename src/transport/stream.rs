//! [`ByteSource`] over any tokio duplex stream.

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::ByteSource;

/// Read chunk size. Actuator frames are a dozen bytes at most.
const READ_CHUNK_SIZE: usize = 256;

/// Buffers reads from an `AsyncRead + AsyncWrite` so the decoder can pull
/// one byte at a time.
pub struct StreamSource<S> {
    inner: S,
    buf: BytesMut,
}

impl<S> StreamSource<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
        }
    }

    async fn fill(&mut self) -> io::Result<()> {
        self.buf.reserve(READ_CHUNK_SIZE);
        let n = self.inner.read_buf(&mut self.buf).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Transport closed by peer",
            ));
        }
        tracing::trace!(bytes = n, "Read chunk from transport");
        Ok(())
    }
}

#[async_trait]
impl<S> ByteSource for StreamSource<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.inner.write_all(data).await?;
        self.inner.flush().await
    }

    async fn read_byte(&mut self) -> io::Result<u8> {
        if self.buf.is_empty() {
            self.fill().await?;
        }
        Ok(self.buf.get_u8())
    }

    fn bytes_available(&self) -> usize {
        self.buf.len()
    }

    async fn wait_readable(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            self.fill().await?;
        }
        Ok(())
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        self.buf.clear();
        self.inner.shutdown().await
    }
}
