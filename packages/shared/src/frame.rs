//! Length-prefixed stream framing for packet payloads.
//!
//! TCP gives no message boundaries, so every payload is preceded by its
//! length as a `u32` big-endian integer. One frame carries exactly one
//! [`Packet`] payload.

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::packet::{MAX_PACKET_SIZE, Packet};

const LENGTH_PREFIX: usize = 4;

/// Reads framed payloads off a byte stream.
#[derive(Debug)]
pub struct PacketReader<R> {
    inner: R,
    buf: BytesMut,
    max_frame_len: usize,
}

impl<R> PacketReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(LENGTH_PREFIX + MAX_PACKET_SIZE),
            max_frame_len: MAX_PACKET_SIZE,
        }
    }
}

impl<R: AsyncRead + Unpin> PacketReader<R> {
    /// Read one payload.
    ///
    /// Returns:
    /// - `Ok(Some(payload))` for a complete frame,
    /// - `Ok(None)` on clean EOF with no buffered data.
    ///
    /// A declared length above the limit is `InvalidData`; EOF in the middle
    /// of a frame is `UnexpectedEof`.
    pub async fn read_frame(&mut self) -> std::io::Result<Option<Bytes>> {
        loop {
            if self.buf.len() >= LENGTH_PREFIX {
                let len = u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]])
                    as usize;
                if len > self.max_frame_len {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("frame of {len} bytes exceeds {} byte limit", self.max_frame_len),
                    ));
                }

                if self.buf.len() >= LENGTH_PREFIX + len {
                    self.buf.advance(LENGTH_PREFIX);
                    return Ok(Some(self.buf.split_to(len).freeze()));
                }
            }

            let n = self.inner.read_buf(&mut self.buf).await?;
            if n == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "eof while reading frame",
                ));
            }
        }
    }
}

/// Writes framed payloads onto a byte stream.
#[derive(Debug)]
pub struct PacketWriter<W> {
    inner: W,
}

impl<W> PacketWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: AsyncWrite + Unpin> PacketWriter<W> {
    /// Write one already-encoded payload and flush it.
    pub async fn write_frame(&mut self, payload: &[u8]) -> std::io::Result<()> {
        let len: u32 = payload
            .len()
            .try_into()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, "frame too big"))?;

        self.inner.write_all(&len.to_be_bytes()).await?;
        self.inner.write_all(payload).await?;
        self.inner.flush().await
    }

    /// Encode and write a packet.
    pub async fn send(&mut self, packet: &Packet) -> std::io::Result<()> {
        self.write_frame(&packet.encode()).await
    }

    /// Close the write direction of the stream.
    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        self.inner.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_survive_coalescing() {
        // テスト項目: two packets written back to back are read as two frames
        // given (前提条件):
        let (a, b) = tokio::io::duplex(64);
        let mut writer = PacketWriter::new(a);
        writer.send(&Packet::chat("alice", "one").unwrap()).await.unwrap();
        writer.send(&Packet::chat("alice", "two").unwrap()).await.unwrap();

        // when (操作):
        let mut reader = PacketReader::new(b);
        let first = reader.read_frame().await.unwrap().unwrap();
        let second = reader.read_frame().await.unwrap().unwrap();

        // then (期待する結果):
        assert_eq!(&first[..], b"calice>one");
        assert_eq!(&second[..], b"calice>two");
    }

    #[tokio::test]
    async fn test_frame_split_across_writes() {
        // テスト項目: a frame delivered in several pieces is reassembled
        // given (前提条件):
        let (mut a, b) = tokio::io::duplex(64);
        let mut reader = PacketReader::new(b);

        // when (操作):
        let writer = tokio::spawn(async move {
            a.write_all(&[0, 0, 0, 5]).await.unwrap();
            a.write_all(b"cx>").await.unwrap();
            tokio::task::yield_now().await;
            a.write_all(b"yz").await.unwrap();
            a
        });
        let frame = reader.read_frame().await.unwrap().unwrap();
        drop(writer.await.unwrap());

        // then (期待する結果):
        assert_eq!(&frame[..], b"cx>yz");
        assert!(reader.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_is_invalid_data() {
        // テスト項目: a declared length above the limit is refused before reading the body
        // given (前提条件):
        let (mut a, b) = tokio::io::duplex(64);
        let declared = (MAX_PACKET_SIZE as u32 + 1).to_be_bytes();
        a.write_all(&declared).await.unwrap();

        // when (操作):
        let mut reader = PacketReader::new(b);
        let err = reader.read_frame().await.unwrap_err();

        // then (期待する結果):
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_eof_mid_frame_is_unexpected() {
        // テスト項目: the peer closing inside a frame is an error, not a clean close
        // given (前提条件):
        let (mut a, b) = tokio::io::duplex(64);
        a.write_all(&[0, 0, 0, 9, b'c']).await.unwrap();
        drop(a);

        // when (操作):
        let mut reader = PacketReader::new(b);
        let err = reader.read_frame().await.unwrap_err();

        // then (期待する結果):
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_clean_eof_returns_none() {
        // テスト項目: a peer closing between frames yields Ok(None)
        // given (前提条件):
        let (a, b) = tokio::io::duplex(64);
        drop(a);

        // when (操作):
        let mut reader = PacketReader::new(b);
        let result = reader.read_frame().await.unwrap();

        // then (期待する結果):
        assert!(result.is_none());
    }
}
