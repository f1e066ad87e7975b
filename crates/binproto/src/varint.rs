//! Base-128 variable-length integers with optional zig-zag mapping
//!
//! Every byte carries 7 value bits, least significant group first, and a
//! continuation flag in its high bit.
//!
//! `VarLongZigZag` maps with a 62-bit shift, so its domain is the 63-bit
//! signed range `[-2^62, 2^62 - 1]`. Values outside it are rejected.

use crate::{
    errors::{Error, Result},
    protocol::BinaryProtocol,
    stream::Stream,
    value::Value,
    Codec,
};

/// Maximum groups of a 32-bit varint
pub const MAX_VARINT_LEN: usize = 5;
/// Maximum groups of a 64-bit varint
pub const MAX_VARLONG_LEN: usize = 10;

/// Number of bytes needed to encode an unsigned pattern
#[inline]
pub fn varint_size(pattern: u64) -> usize {
    let bits = (64 - pattern.leading_zeros()).max(1) as usize;
    (bits + 6) / 7
}

/// Zig-zag map a 32-bit signed value
#[inline]
pub fn zigzag_encode_32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag_encode_32`]
#[inline]
pub fn zigzag_decode_32(encoded: u32) -> i32 {
    ((encoded >> 1) as i32) ^ -((encoded & 1) as i32)
}

/// Zig-zag map a 63-bit signed value
#[inline]
pub fn zigzag_encode_63(value: i64) -> u64 {
    ((value << 1) ^ (value >> 62)) as u64
}

/// Inverse of [`zigzag_encode_63`]
#[inline]
pub fn zigzag_decode_63(encoded: u64) -> i64 {
    ((encoded >> 1) as i64) ^ -((encoded & 1) as i64)
}

/// Variable-length integer kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// 32-bit, negative values use their 32-bit two's complement pattern
    VarInt,
    /// 64-bit, negative values use their 64-bit two's complement pattern
    VarLong,
    /// 32-bit zig-zag
    VarIntZigZag,
    /// 63-bit zig-zag
    VarLongZigZag,
}

impl VarKind {
    /// Selector name
    pub fn name(self) -> &'static str {
        match self {
            VarKind::VarInt => "VarInt",
            VarKind::VarLong => "VarLong",
            VarKind::VarIntZigZag => "VarIntZigZag",
            VarKind::VarLongZigZag => "VarLongZigZag",
        }
    }

    /// Maximum encoded length
    pub fn max_len(self) -> usize {
        match self {
            VarKind::VarInt | VarKind::VarIntZigZag => MAX_VARINT_LEN,
            VarKind::VarLong | VarKind::VarLongZigZag => MAX_VARLONG_LEN,
        }
    }

    /// Value bits the last allowed group may carry
    fn last_group_mask(self) -> u8 {
        match self {
            VarKind::VarInt | VarKind::VarIntZigZag => 0x0F,
            VarKind::VarLong => 0x01,
            VarKind::VarLongZigZag => 0x00,
        }
    }

    fn domain(self) -> (i128, i128) {
        match self {
            VarKind::VarInt | VarKind::VarIntZigZag => (i32::MIN as i128, i32::MAX as i128),
            VarKind::VarLong => (i64::MIN as i128, i64::MAX as i128),
            VarKind::VarLongZigZag => (-(1i128 << 62), (1i128 << 62) - 1),
        }
    }

    /// Map a value of the domain to the unsigned pattern put on the wire
    fn to_pattern(self, value: i128) -> u64 {
        match self {
            VarKind::VarInt => value as i32 as u32 as u64,
            VarKind::VarLong => value as i64 as u64,
            VarKind::VarIntZigZag => zigzag_encode_32(value as i32) as u64,
            VarKind::VarLongZigZag => zigzag_encode_63(value as i64),
        }
    }

    fn from_pattern(self, pattern: u64) -> i64 {
        match self {
            VarKind::VarInt => pattern as u32 as i32 as i64,
            VarKind::VarLong => pattern as i64,
            VarKind::VarIntZigZag => zigzag_decode_32(pattern as u32) as i64,
            VarKind::VarLongZigZag => zigzag_decode_63(pattern),
        }
    }
}

/// Codec for one [`VarKind`]
#[derive(Debug, Clone, Copy)]
pub struct VarIntCodec {
    kind: VarKind,
}

impl VarIntCodec {
    /// Create a codec for the given kind
    pub fn new(kind: VarKind) -> Self {
        Self { kind }
    }

    fn pattern(&self, value: &Value, path: &str) -> Result<u64> {
        let number = value.as_i128().ok_or_else(|| Error::UnexpectedValue {
            codec: self.kind.name(),
            expected: "integer",
            actual: value.kind(),
            path: path.to_string(),
        })?;
        let (min, max) = self.kind.domain();
        if number < min || number > max {
            return Err(Error::ValueOutOfRange {
                codec: self.kind.name(),
                value: number.to_string(),
                path: path.to_string(),
            });
        }
        Ok(self.kind.to_pattern(number))
    }
}

impl Codec for VarIntCodec {
    fn read(&self, _protocol: &BinaryProtocol, stream: &mut dyn Stream, path: &str) -> Result<Value> {
        let mut pattern = 0u64;
        let last = self.kind.max_len() - 1;
        for group in 0..self.kind.max_len() {
            let byte = stream.read(1)?[0];
            pattern |= ((byte & 0x7F) as u64) << (7 * group);
            if byte & 0x80 == 0 {
                // bits past the pattern width would be dropped
                if group == last && byte & !self.kind.last_group_mask() != 0 {
                    return Err(Error::ValueOutOfRange {
                        codec: self.kind.name(),
                        value: format!("{byte:#04x} in group {}", group + 1),
                        path: path.to_string(),
                    });
                }
                return Ok(Value::Int(self.kind.from_pattern(pattern)));
            }
        }
        Err(Error::VarIntTooLong {
            max: self.kind.max_len(),
            path: path.to_string(),
        })
    }

    fn write(
        &self,
        _protocol: &BinaryProtocol,
        value: &Value,
        stream: &mut dyn Stream,
        path: &str,
    ) -> Result<()> {
        let mut pattern = self.pattern(value, path)?;
        let mut packet = [0u8; MAX_VARLONG_LEN];
        let mut len = 0;
        loop {
            let group = (pattern & 0x7F) as u8;
            pattern >>= 7;
            if pattern == 0 {
                packet[len] = group;
                len += 1;
                break;
            }
            packet[len] = group | 0x80;
            len += 1;
        }
        stream.write(&packet[..len]);
        Ok(())
    }

    fn size_of(&self, _protocol: &BinaryProtocol, value: &Value, path: &str) -> Result<usize> {
        Ok(varint_size(self.pattern(value, path)?))
    }
}
