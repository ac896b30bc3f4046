//! Git pkt-line format implementation.
//!
//! The pkt-line format is used for all git protocol communication.
//! Each line is prefixed with a 4-character hex length, or "0000" for flush.

use crate::{GitError, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum size of an encoded packet, length prefix included.
pub const MAX_PACKET_LENGTH: usize = 65520;

/// A pkt-line packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Data line with content.
    Data(Vec<u8>),
    /// Flush packet (0000).
    Flush,
    /// Delimiter packet (0001).
    Delimiter,
    /// Response-end packet (0002).
    ResponseEnd,
}

impl Packet {
    /// Creates a data packet from a string slice.
    pub fn from_string(s: &str) -> Self {
        Self::Data(s.as_bytes().to_vec())
    }

    /// Creates a data packet from bytes.
    pub fn from_bytes(b: impl Into<Vec<u8>>) -> Self {
        Self::Data(b.into())
    }

    /// Encodes the packet to bytes. The payload must leave room for the
    /// 4-byte prefix within [`MAX_PACKET_LENGTH`]; `PktLineWriter` checks.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Data(data) => {
                let len = data.len() + 4; // 4 bytes for the length prefix
                let mut result = format!("{len:04x}").into_bytes();
                result.extend_from_slice(data);
                result
            }
            Self::Flush => b"0000".to_vec(),
            Self::Delimiter => b"0001".to_vec(),
            Self::ResponseEnd => b"0002".to_vec(),
        }
    }

    /// Decodes one packet from the front of `buf`.
    ///
    /// Returns the packet and the number of bytes it occupied, or `None`
    /// when `buf` does not yet hold a complete packet.
    pub fn decode(buf: &[u8]) -> Result<Option<(Packet, usize)>> {
        if buf.len() < 4 {
            return Ok(None);
        }

        let len_str = std::str::from_utf8(&buf[..4])
            .map_err(|_| GitError::InvalidPktLine("invalid length prefix".to_string()))?;

        match len_str {
            "0000" => Ok(Some((Packet::Flush, 4))),
            "0001" => Ok(Some((Packet::Delimiter, 4))),
            "0002" => Ok(Some((Packet::ResponseEnd, 4))),
            _ => {
                let len = usize::from_str_radix(len_str, 16)
                    .map_err(|_| GitError::InvalidPktLine("invalid length".to_string()))?;

                if len < 4 {
                    return Err(GitError::InvalidPktLine("length too small".to_string()));
                }
                if len > MAX_PACKET_LENGTH {
                    return Err(GitError::InvalidPktLine("length too large".to_string()));
                }
                if buf.len() < len {
                    return Ok(None);
                }

                Ok(Some((Packet::Data(buf[4..len].to_vec()), len)))
            }
        }
    }

    /// Returns true if this is a flush packet.
    pub fn is_flush(&self) -> bool {
        matches!(self, Self::Flush)
    }

    /// Returns the data content, or None for special packets.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Self::Data(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the data as a string, trimming any trailing newline.
    pub fn as_str(&self) -> Option<&str> {
        self.data()
            .and_then(|d| std::str::from_utf8(d).ok())
            .map(|s| s.trim_end_matches('\n'))
    }
}

/// Reader for pkt-line format.
pub struct PktLineReader<R> {
    reader: R,
}

impl<R: AsyncRead + Unpin> PktLineReader<R> {
    /// Creates a new pkt-line reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Reads the next packet. Returns `None` on end of stream.
    pub async fn read(&mut self) -> Result<Option<Packet>> {
        let mut len_buf = [0u8; 4];
        match self.reader.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let len_str = std::str::from_utf8(&len_buf)
            .map_err(|_| GitError::InvalidPktLine("invalid length prefix".to_string()))?;

        match len_str {
            "0000" => Ok(Some(Packet::Flush)),
            "0001" => Ok(Some(Packet::Delimiter)),
            "0002" => Ok(Some(Packet::ResponseEnd)),
            _ => {
                let len = usize::from_str_radix(len_str, 16)
                    .map_err(|_| GitError::InvalidPktLine("invalid length".to_string()))?;

                if len < 4 {
                    return Err(GitError::InvalidPktLine("length too small".to_string()));
                }
                if len > MAX_PACKET_LENGTH {
                    return Err(GitError::InvalidPktLine("length too large".to_string()));
                }

                let mut data = vec![0u8; len - 4];
                self.reader.read_exact(&mut data).await?;

                Ok(Some(Packet::Data(data)))
            }
        }
    }

    /// Reads all packets until a flush packet or end of stream.
    pub async fn read_until_flush(&mut self) -> Result<Vec<Packet>> {
        let mut packets = Vec::new();
        loop {
            match self.read().await? {
                Some(Packet::Flush) | None => break,
                Some(pkt) => packets.push(pkt),
            }
        }
        Ok(packets)
    }

    /// Consumes the reader and returns the inner reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Writer for pkt-line format.
pub struct PktLineWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> PktLineWriter<W> {
    /// Creates a new pkt-line writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a packet.
    pub async fn write(&mut self, pkt: &Packet) -> Result<()> {
        if let Packet::Data(data) = pkt {
            if data.len() + 4 > MAX_PACKET_LENGTH {
                return Err(GitError::InvalidPktLine("payload too large".to_string()));
            }
        }
        self.writer.write_all(&pkt.encode()).await?;
        Ok(())
    }

    /// Writes a data line.
    pub async fn write_data(&mut self, data: &[u8]) -> Result<()> {
        self.write(&Packet::Data(data.to_vec())).await
    }

    /// Writes an error message the way `git daemon` reports one: a single
    /// data packet carrying the exact message bytes, then a flush packet.
    pub async fn write_error(&mut self, msg: &str) -> Result<()> {
        self.write_data(msg.as_bytes()).await?;
        self.flush_pkt().await?;
        self.flush().await
    }

    /// Writes a flush packet.
    pub async fn flush_pkt(&mut self) -> Result<()> {
        self.write(&Packet::Flush).await
    }

    /// Flushes the underlying writer.
    pub async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }

    /// Returns the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
