//! ASCII integer parsing for kernel-generated fields.
//!
//! Decimal accepts an optional leading `+` (and `-` for signed types).
//! Hexadecimal accepts digits only; for signed types the digits are the
//! two's complement bit pattern of that width, so `"ffff"` as `i16` is `-1`.

use std::num::IntErrorKind;

use crate::error::{FormatError, FormatErrorKind};

/// Number base of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Radix {
    #[default]
    Decimal,
    Hex,
}

impl Radix {
    /// Maps a format character: `'x'`/`'X'` select hex, anything else decimal.
    pub fn from_format(format: char) -> Self {
        match format {
            'x' | 'X' => Radix::Hex,
            _ => Radix::Decimal,
        }
    }
}

/// Integer types the readers can produce.
pub trait AsciiInt: Copy + Sized {
    const TYPE_NAME: &'static str;

    fn try_parse_ascii(source: &[u8], radix: Radix) -> Result<Self, FormatErrorKind>;
}

fn kind_of(kind: &IntErrorKind) -> FormatErrorKind {
    match kind {
        IntErrorKind::Empty => FormatErrorKind::Empty,
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => FormatErrorKind::Overflow,
        _ => FormatErrorKind::InvalidDigit,
    }
}

fn ascii_text(source: &[u8]) -> Result<&str, FormatErrorKind> {
    if source.is_empty() {
        return Err(FormatErrorKind::Empty);
    }
    std::str::from_utf8(source).map_err(|_| FormatErrorKind::InvalidDigit)
}

macro_rules! impl_ascii_int {
    ($($int:ty => $bits:ty),* $(,)?) => {$(
        impl AsciiInt for $int {
            const TYPE_NAME: &'static str = stringify!($int);

            fn try_parse_ascii(source: &[u8], radix: Radix) -> Result<Self, FormatErrorKind> {
                let text = ascii_text(source)?;
                match radix {
                    Radix::Decimal => <$int>::from_str_radix(text, 10).map_err(|e| kind_of(e.kind())),
                    Radix::Hex => {
                        if !source[0].is_ascii_hexdigit() {
                            return Err(FormatErrorKind::InvalidDigit);
                        }
                        <$bits>::from_str_radix(text, 16)
                            .map(|bits| bits as $int)
                            .map_err(|e| kind_of(e.kind()))
                    }
                }
            }
        }
    )*};
}

impl_ascii_int! {
    u8 => u8,
    i8 => u8,
    u16 => u16,
    i16 => u16,
    u32 => u32,
    i32 => u32,
    u64 => u64,
    i64 => u64,
}

/// Parses `source` as `T`, failing with the offending text and target type.
#[inline]
pub fn parse<T: AsciiInt>(source: &[u8], radix: Radix) -> Result<T, FormatError> {
    T::try_parse_ascii(source, radix).map_err(|kind| FormatError::new(source, T::TYPE_NAME, kind))
}

/// Non-failing variant for fields that are allowed to be absent or odd.
#[inline]
pub fn try_parse<T: AsciiInt>(source: &[u8], radix: Radix) -> Option<T> {
    T::try_parse_ascii(source, radix).ok()
}
