//! Application packets and their wire form.
//!
//! A packet payload starts with a one-byte tag. Chat payloads continue with
//! the sender name, a single `>` delimiter and the message body:
//!
//! ```text
//! c alice > hello        (shown with spaces for readability)
//! s                      (shutdown; any trailing bytes are ignored)
//! ```
//!
//! There is no escaping. The first `>` after the tag splits sender from body,
//! which is why sender names may never contain `>`. Payloads are carried over
//! the stream inside length-prefixed frames (see [`crate::frame`]).

use bytes::{BufMut, Bytes, BytesMut};
use memchr::memchr;
use thiserror::Error;

/// Largest payload, tag included, that either side will build or accept.
pub const MAX_PACKET_SIZE: usize = 4096;

/// Tag byte of a chat payload
pub const CHAT_TAG: u8 = b'c';

/// Tag byte of a shutdown payload
pub const SHUTDOWN_TAG: u8 = b's';

/// Delimiter between sender and body on the wire
pub const SENDER_DELIMITER: u8 = b'>';

/// Separator between sender and body when a chat is displayed
pub const RENDER_SEPARATOR: &str = " >> ";

/// Errors raised while building a packet to send
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("sender name '{0}' must not contain '>'")]
    SenderContainsDelimiter(String),

    #[error("packet of {len} bytes exceeds the {max} byte limit")]
    TooLarge { len: usize, max: usize },
}

/// Errors raised while decoding a received payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty packet")]
    Empty,

    #[error("unknown packet tag 0x{0:02x}")]
    UnknownTag(u8),

    #[error("chat packet has no '>' between sender and body")]
    MalformedChat,

    #[error("packet of {len} bytes exceeds the {max} byte limit")]
    TooLarge { len: usize, max: usize },

    #[error("chat packet is not valid UTF-8")]
    InvalidUtf8,
}

/// A chat line attributed to a sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPacket {
    sender: String,
    body: String,
}

impl ChatPacket {
    /// Build a chat packet, rejecting senders that contain the wire delimiter
    /// and payloads that would not fit in one packet.
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Result<Self, PacketError> {
        let sender = sender.into();
        let body = body.into();

        if sender.as_bytes().contains(&SENDER_DELIMITER) {
            return Err(PacketError::SenderContainsDelimiter(sender));
        }

        let len = 1 + sender.len() + 1 + body.len();
        if len > MAX_PACKET_SIZE {
            return Err(PacketError::TooLarge {
                len,
                max: MAX_PACKET_SIZE,
            });
        }

        Ok(Self { sender, body })
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Display form of the chat, e.g. `alice >> hello`
    pub fn render(&self) -> String {
        format!("{}{}{}", self.sender, RENDER_SEPARATOR, self.body)
    }
}

/// One discrete application-level message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Chat(ChatPacket),
    Shutdown,
}

impl Packet {
    /// Shorthand for `Packet::Chat(ChatPacket::new(..)?)`
    pub fn chat(sender: impl Into<String>, body: impl Into<String>) -> Result<Self, PacketError> {
        ChatPacket::new(sender, body).map(Packet::Chat)
    }

    /// Encode the packet into its wire payload.
    pub fn encode(&self) -> Bytes {
        match self {
            Packet::Chat(chat) => {
                let mut buf = BytesMut::with_capacity(2 + chat.sender.len() + chat.body.len());
                buf.put_u8(CHAT_TAG);
                buf.put_slice(chat.sender.as_bytes());
                buf.put_u8(SENDER_DELIMITER);
                buf.put_slice(chat.body.as_bytes());
                buf.freeze()
            }
            Packet::Shutdown => Bytes::from_static(&[SHUTDOWN_TAG]),
        }
    }

    /// Decode one wire payload.
    pub fn decode(payload: &[u8]) -> Result<Packet, DecodeError> {
        if payload.len() > MAX_PACKET_SIZE {
            return Err(DecodeError::TooLarge {
                len: payload.len(),
                max: MAX_PACKET_SIZE,
            });
        }

        let (&tag, rest) = payload.split_first().ok_or(DecodeError::Empty)?;
        match tag {
            CHAT_TAG => {
                let split = find_sender_delimiter(rest).ok_or(DecodeError::MalformedChat)?;
                let sender = std::str::from_utf8(&rest[..split])
                    .map_err(|_| DecodeError::InvalidUtf8)?;
                let body = std::str::from_utf8(&rest[split + 1..])
                    .map_err(|_| DecodeError::InvalidUtf8)?;
                Ok(Packet::Chat(ChatPacket {
                    sender: sender.to_string(),
                    body: body.to_string(),
                }))
            }
            SHUTDOWN_TAG => Ok(Packet::Shutdown),
            other => Err(DecodeError::UnknownTag(other)),
        }
    }
}

/// Position of the first sender/body delimiter, if any.
fn find_sender_delimiter(after_tag: &[u8]) -> Option<usize> {
    memchr(SENDER_DELIMITER, after_tag)
}
