use std::io;

use byteorder::{ReadBytesExt, WriteBytesExt};
use thiserror::Error;


pub trait McModernValue: Sized {
    fn read_from(data: &mut impl ReadBytesExt) -> Result<Self, ProtocolError>;

    fn write_to(&self, target: &mut impl WriteBytesExt) -> Result<(), ProtocolError>;
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt(pub u32);

impl VarInt {
    const SEGMENT_BITS: u32 = 0x7F;
    const CONTINUE_BIT: u8 = 0x80;
    pub const MAX_BYTES: usize = 5;

    /// Number of bytes `self` occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        match self.0 {
            0..=0x7F => 1,
            0x80..=0x3FFF => 2,
            0x4000..=0x1F_FFFF => 3,
            0x20_0000..=0xFFF_FFFF => 4,
            _ => 5,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        let mut value = self.0;
        loop {
            if (value & !Self::SEGMENT_BITS) == 0 {
                out.push(value as u8);
                return out;
            }
            out.push(((value & Self::SEGMENT_BITS) as u8) | Self::CONTINUE_BIT);
            value >>= 7;
        }
    }
}

impl McModernValue for VarInt {
    fn read_from(data: &mut impl ReadBytesExt) -> Result<Self, ProtocolError> {
        let mut value = 0u32;
        for position in 0..Self::MAX_BYTES {
            let current_byte = data.read_u8()?;
            let segment = (current_byte & Self::SEGMENT_BITS as u8) as u32;
            // the fifth byte only has room for the top four bits of a u32
            if position == Self::MAX_BYTES - 1 && segment > 0x0F {
                return Err(ProtocolError::VarIntTooLong);
            }
            value |= segment << (7 * position);
            if (current_byte & Self::CONTINUE_BIT) == 0 {
                return Ok(Self(value));
            }
        }
        Err(ProtocolError::VarIntTooLong)
    }

    fn write_to(&self, target: &mut impl WriteBytesExt) -> Result<(), ProtocolError> {
        target.write_all(&self.encode())?;
        Ok(())
    }
}

/// Writes `value` as a VarInt byte length followed by its UTF-8 bytes.
pub fn write_string(value: &str, target: &mut impl WriteBytesExt) -> Result<(), ProtocolError> {
    let string_data = value.as_bytes();

    VarInt(string_data.len() as u32).write_to(target)?;
    target.write_all(string_data)?;
    Ok(())
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("VarInt too long")]
    VarIntTooLong,

    #[error("received wrong packet id {0}, expected {1}")]
    WrongId(u32, u32),

    #[error("frame of {0} bytes exceeds the {1} byte limit")]
    FrameTooLarge(u32, usize),

    #[error("malformed frame: {0}")]
    MalformedFrame(&'static str),

    #[error("received invalid UTF-8 data")]
    InvalidUtf8,

    #[error("unexpected handshake reply {0:?}")]
    UnexpectedAck(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error while decoding")]
    IoError(#[from] io::Error),
}

impl ProtocolError {
    /// True when the input simply ended early and more bytes may complete it.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ProtocolError::IoError(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}
