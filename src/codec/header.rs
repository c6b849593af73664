//! Header and tag constants shared by the text and binary codecs.

use std::fmt;

// == Text Format ==
/// Marker prefixed to every text blob written by the text codec.
///
/// Zero-width space followed by a word joiner: invisible, and practically
/// never the first two characters of real text.
pub const TEXT_HEADER: &str = "\u{200B}\u{2060}";

/// Characters occupied by the header plus its tag.
pub const TEXT_PREFIX_CHARS: usize = 3;

/// Encoding discriminator that follows [`TEXT_HEADER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTag {
    Structured,
    PlainString,
}

impl TextTag {
    pub const fn as_char(self) -> char {
        match self {
            TextTag::Structured => '0',
            TextTag::PlainString => '1',
        }
    }
}

impl TryFrom<char> for TextTag {
    type Error = char;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            '0' => Ok(TextTag::Structured),
            '1' => Ok(TextTag::PlainString),
            other => Err(other),
        }
    }
}

// == Binary Format ==
/// Marker prefixed to every byte blob written by the binary codec.
pub const BINARY_HEADER: [u8; 3] = [0xE2, 0x81, 0xA0];

/// Bytes occupied by the header plus its tag.
pub const BINARY_PREFIX_LEN: usize = BINARY_HEADER.len() + 1;

/// Encoding discriminator that follows [`BINARY_HEADER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BinaryTag {
    RawBinary = 0,
    Structured = 1,
    PlainString = 2,
}

impl TryFrom<u8> for BinaryTag {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(BinaryTag::RawBinary),
            1 => Ok(BinaryTag::Structured),
            2 => Ok(BinaryTag::PlainString),
            other => Err(other),
        }
    }
}

impl fmt::Display for BinaryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}
