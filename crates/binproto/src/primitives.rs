//! Fixed-width integer codecs and endian utilities

use crate::{
    errors::{Error, Result},
    protocol::BinaryProtocol,
    stream::Stream,
    value::Value,
    Codec,
};

/// Endianness for byte order handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    /// Byte order of the host machine
    Native,
    /// Little-endian byte order
    Little,
    /// Big-endian byte order
    Big,
}

impl Endian {
    /// Read a u8 value
    #[inline]
    pub(crate) fn read_u8(self, bytes: &[u8]) -> u8 {
        bytes[0]
    }

    /// Read a u16 value
    #[inline]
    pub(crate) fn read_u16(self, bytes: &[u8]) -> u16 {
        let bytes = [bytes[0], bytes[1]];
        match self {
            Endian::Native => u16::from_ne_bytes(bytes),
            Endian::Little => u16::from_le_bytes(bytes),
            Endian::Big => u16::from_be_bytes(bytes),
        }
    }

    /// Read a u32 value
    #[inline]
    pub(crate) fn read_u32(self, bytes: &[u8]) -> u32 {
        let bytes = [bytes[0], bytes[1], bytes[2], bytes[3]];
        match self {
            Endian::Native => u32::from_ne_bytes(bytes),
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        }
    }

    /// Read a u64 value
    #[inline]
    pub(crate) fn read_u64(self, bytes: &[u8]) -> u64 {
        let bytes = [
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ];
        match self {
            Endian::Native => u64::from_ne_bytes(bytes),
            Endian::Little => u64::from_le_bytes(bytes),
            Endian::Big => u64::from_be_bytes(bytes),
        }
    }

    /// Write a u16 value
    #[inline]
    pub(crate) fn write_u16(self, value: u16, buf: &mut [u8]) {
        let bytes = match self {
            Endian::Native => value.to_ne_bytes(),
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        };
        buf[..2].copy_from_slice(&bytes);
    }

    /// Write a u32 value
    #[inline]
    pub(crate) fn write_u32(self, value: u32, buf: &mut [u8]) {
        let bytes = match self {
            Endian::Native => value.to_ne_bytes(),
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        };
        buf[..4].copy_from_slice(&bytes);
    }

    /// Write a u64 value
    #[inline]
    pub(crate) fn write_u64(self, value: u64, buf: &mut [u8]) {
        let bytes = match self {
            Endian::Native => value.to_ne_bytes(),
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        };
        buf[..8].copy_from_slice(&bytes);
    }

    /// Read an unsigned integer of `width` bytes
    pub(crate) fn read_uint(self, bytes: &[u8], width: usize) -> u64 {
        match width {
            1 => self.read_u8(bytes) as u64,
            2 => self.read_u16(bytes) as u64,
            4 => self.read_u32(bytes) as u64,
            _ => self.read_u64(bytes),
        }
    }

    /// Write the low `width` bytes of an unsigned integer
    pub(crate) fn write_uint(self, value: u64, width: usize, buf: &mut [u8]) {
        match width {
            1 => buf[0] = value as u8,
            2 => self.write_u16(value as u16, buf),
            4 => self.write_u32(value as u32, buf),
            _ => self.write_u64(value, buf),
        }
    }
}

macro_rules! fixed_ints {
    ($($kind:ident => ($name:literal, $width:expr, $signed:expr, $endian:ident)),* $(,)?) => {
        /// Fixed-width integer kinds
        ///
        /// Kinds without an `BE`/`LE` suffix use the byte order of the host machine.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum FixedInt {
            $(
                #[doc = concat!("`", $name, "`: ", stringify!($width), " byte(s)")]
                $kind,
            )*
        }

        impl FixedInt {
            /// Every fixed-width kind
            pub const ALL: &'static [FixedInt] = &[$(FixedInt::$kind),*];

            /// Selector name of this kind
            pub fn name(self) -> &'static str {
                match self {
                    $(FixedInt::$kind => $name,)*
                }
            }

            /// Encoded width in bytes
            pub fn width(self) -> usize {
                match self {
                    $(FixedInt::$kind => $width,)*
                }
            }

            /// Whether values are two's complement signed
            pub fn is_signed(self) -> bool {
                match self {
                    $(FixedInt::$kind => $signed,)*
                }
            }

            /// Byte order of this kind
            pub fn endian(self) -> Endian {
                match self {
                    $(FixedInt::$kind => Endian::$endian,)*
                }
            }

            /// Look a kind up by selector name
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(FixedInt::$kind),)*
                    _ => None,
                }
            }
        }
    };
}

fixed_ints! {
    Int8 => ("Int8", 1, true, Native),
    UInt8 => ("UInt8", 1, false, Native),
    Int16 => ("Int16", 2, true, Native),
    Int16BE => ("Int16BE", 2, true, Big),
    Int16LE => ("Int16LE", 2, true, Little),
    UInt16 => ("UInt16", 2, false, Native),
    UInt16BE => ("UInt16BE", 2, false, Big),
    UInt16LE => ("UInt16LE", 2, false, Little),
    Int32 => ("Int32", 4, true, Native),
    Int32BE => ("Int32BE", 4, true, Big),
    Int32LE => ("Int32LE", 4, true, Little),
    UInt32 => ("UInt32", 4, false, Native),
    UInt32BE => ("UInt32BE", 4, false, Big),
    UInt32LE => ("UInt32LE", 4, false, Little),
    Int64 => ("Int64", 8, true, Native),
    Int64BE => ("Int64BE", 8, true, Big),
    Int64LE => ("Int64LE", 8, true, Little),
    UInt64 => ("UInt64", 8, false, Native),
    UInt64BE => ("UInt64BE", 8, false, Big),
    UInt64LE => ("UInt64LE", 8, false, Little),
}

impl FixedInt {
    fn bits(self) -> u32 {
        self.width() as u32 * 8
    }

    /// Smallest representable value
    pub fn min(self) -> i128 {
        if self.is_signed() {
            -(1i128 << (self.bits() - 1))
        } else {
            0
        }
    }

    /// Largest representable value
    pub fn max(self) -> i128 {
        if self.is_signed() {
            (1i128 << (self.bits() - 1)) - 1
        } else {
            (1i128 << self.bits()) - 1
        }
    }

    /// Interpret the first `width` bytes as a value of this kind
    pub fn decode(self, bytes: &[u8]) -> Result<Value> {
        if bytes.len() < self.width() {
            return Err(Error::OutOfBounds {
                requested: self.width(),
                available: bytes.len(),
            });
        }
        let raw = self.endian().read_uint(bytes, self.width());
        if !self.is_signed() {
            return Ok(Value::UInt(raw));
        }
        let top_bit = 1u64 << (self.bits() - 1);
        if raw & top_bit == 0 {
            Ok(Value::Int(raw as i64))
        } else {
            // base-2 complement over the declared width
            Ok(Value::Int((raw as i128 - (1i128 << self.bits())) as i64))
        }
    }

    /// Encode `value` into the first `width` bytes of `buf`
    pub(crate) fn encode(self, value: i128, buf: &mut [u8]) {
        let mask = if self.bits() == 64 {
            u64::MAX as i128
        } else {
            (1i128 << self.bits()) - 1
        };
        self.endian()
            .write_uint((value & mask) as u64, self.width(), buf);
    }
}

/// Codec for one [`FixedInt`] kind
#[derive(Debug, Clone, Copy)]
pub struct FixedIntCodec {
    kind: FixedInt,
}

impl FixedIntCodec {
    /// Create a codec for the given kind
    pub fn new(kind: FixedInt) -> Self {
        Self { kind }
    }

    fn checked(&self, value: &Value, path: &str) -> Result<i128> {
        let number = match value {
            Value::Int(v) => *v as i128,
            Value::UInt(v) => *v as i128,
            other => {
                return Err(Error::UnexpectedValue {
                    codec: self.kind.name(),
                    expected: "integer",
                    actual: other.kind(),
                    path: path.to_string(),
                })
            }
        };
        if number < self.kind.min() || number > self.kind.max() {
            return Err(Error::ValueOutOfRange {
                codec: self.kind.name(),
                value: number.to_string(),
                path: path.to_string(),
            });
        }
        Ok(number)
    }
}

impl Codec for FixedIntCodec {
    fn read(&self, _protocol: &BinaryProtocol, stream: &mut dyn Stream, _path: &str) -> Result<Value> {
        let packet = stream.read(self.kind.width())?;
        self.kind.decode(&packet)
    }

    fn write(
        &self,
        _protocol: &BinaryProtocol,
        value: &Value,
        stream: &mut dyn Stream,
        path: &str,
    ) -> Result<()> {
        let number = self.checked(value, path)?;
        let mut packet = [0u8; 8];
        self.kind.encode(number, &mut packet);
        stream.write(&packet[..self.kind.width()]);
        Ok(())
    }

    fn size_of(&self, _protocol: &BinaryProtocol, _value: &Value, _path: &str) -> Result<usize> {
        Ok(self.kind.width())
    }
}
