//! Fixed-width scalar codec shared by the binary and text stream modes.
//!
//! Every scalar the stream can carry implements [`Scalar`]; the byte order is
//! chosen once per stream and passed down as a `byteorder::ByteOrder` type.

use byteorder::ByteOrder;
use num_traits::Num;

/// How a scalar's bits are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Signed,
    Unsigned,
    Float,
}

/// `(width in bytes, kind)` for every supported scalar, in declaration order.
pub const SCALAR_TABLE: [(usize, ScalarKind); 10] = [
    (1, ScalarKind::Signed),
    (1, ScalarKind::Unsigned),
    (2, ScalarKind::Signed),
    (2, ScalarKind::Unsigned),
    (4, ScalarKind::Signed),
    (4, ScalarKind::Unsigned),
    (8, ScalarKind::Signed),
    (8, ScalarKind::Unsigned),
    (4, ScalarKind::Float),
    (8, ScalarKind::Float),
];

/// Text encoding used for integers written in text mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextIntFormat {
    #[default]
    Decimal,
    /// `0x`-prefixed lowercase hexadecimal. Negative values stay decimal.
    Hex,
}

/// A fixed-width number the stream can read and write.
pub trait Scalar: Copy + Default + PartialEq + std::fmt::Debug {
    const WIDTH: usize;
    const KIND: ScalarKind;

    fn decode<B: ByteOrder>(buf: &[u8]) -> Self;
    fn encode<B: ByteOrder>(self, buf: &mut [u8]);
    fn parse_text(token: &str) -> Option<Self>;
    fn format_text(self, int_format: TextIntFormat) -> String;
}

fn parse_int<T: Num>(token: &str) -> Option<T> {
    let (sign, body) = match token.as_bytes().first() {
        Some(b'-') => ("-", &token[1..]),
        Some(b'+') => ("", &token[1..]),
        _ => ("", token),
    };
    match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(digits) if !digits.is_empty() => {
            T::from_str_radix(&format!("{}{}", sign, digits), 16).ok()
        }
        Some(_) => None,
        None => T::from_str_radix(&format!("{}{}", sign, body), 10).ok(),
    }
}

fn parse_float<T: std::str::FromStr + num_traits::Float>(token: &str) -> Option<T> {
    match token.to_ascii_uppercase().as_str() {
        "INF" | "+INF" => Some(T::infinity()),
        "-INF" => Some(T::neg_infinity()),
        "NAN" | "+NAN" | "-NAN" => Some(T::nan()),
        _ => token.parse().ok(),
    }
}

fn format_float<T: num_traits::Float + std::fmt::Display>(value: T) -> String {
    if value.is_nan() {
        "NAN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_negative() { "-INF" } else { "INF" }.to_string()
    } else {
        format!("{}", value)
    }
}

macro_rules! format_int {
    ($value:expr, $int_format:expr) => {{
        #[allow(unused_comparisons)]
        let negative = $value < 0;
        match $int_format {
            TextIntFormat::Hex if !negative => format!("{:#x}", $value),
            _ => format!("{}", $value),
        }
    }};
}

macro_rules! impl_byte_scalar {
    ($ty:ty, $kind:expr) => {
        impl Scalar for $ty {
            const WIDTH: usize = 1;
            const KIND: ScalarKind = $kind;

            #[inline]
            fn decode<B: ByteOrder>(buf: &[u8]) -> Self {
                buf[0] as $ty
            }

            #[inline]
            fn encode<B: ByteOrder>(self, buf: &mut [u8]) {
                buf[0] = self as u8;
            }

            fn parse_text(token: &str) -> Option<Self> {
                parse_int::<$ty>(token)
            }

            fn format_text(self, int_format: TextIntFormat) -> String {
                format_int!(self, int_format)
            }
        }
    };
}

macro_rules! impl_int_scalar {
    ($ty:ty, $width:expr, $kind:expr, $read:ident, $write:ident) => {
        impl Scalar for $ty {
            const WIDTH: usize = $width;
            const KIND: ScalarKind = $kind;

            #[inline]
            fn decode<B: ByteOrder>(buf: &[u8]) -> Self {
                B::$read(buf)
            }

            #[inline]
            fn encode<B: ByteOrder>(self, buf: &mut [u8]) {
                B::$write(buf, self)
            }

            fn parse_text(token: &str) -> Option<Self> {
                parse_int::<$ty>(token)
            }

            fn format_text(self, int_format: TextIntFormat) -> String {
                format_int!(self, int_format)
            }
        }
    };
}

macro_rules! impl_float_scalar {
    ($ty:ty, $width:expr, $read:ident, $write:ident) => {
        impl Scalar for $ty {
            const WIDTH: usize = $width;
            const KIND: ScalarKind = ScalarKind::Float;

            #[inline]
            fn decode<B: ByteOrder>(buf: &[u8]) -> Self {
                B::$read(buf)
            }

            #[inline]
            fn encode<B: ByteOrder>(self, buf: &mut [u8]) {
                B::$write(buf, self)
            }

            fn parse_text(token: &str) -> Option<Self> {
                parse_float::<$ty>(token)
            }

            fn format_text(self, _int_format: TextIntFormat) -> String {
                format_float(self)
            }
        }
    };
}

impl_byte_scalar!(i8, ScalarKind::Signed);
impl_byte_scalar!(u8, ScalarKind::Unsigned);
impl_int_scalar!(i16, 2, ScalarKind::Signed, read_i16, write_i16);
impl_int_scalar!(u16, 2, ScalarKind::Unsigned, read_u16, write_u16);
impl_int_scalar!(i32, 4, ScalarKind::Signed, read_i32, write_i32);
impl_int_scalar!(u32, 4, ScalarKind::Unsigned, read_u32, write_u32);
impl_int_scalar!(i64, 8, ScalarKind::Signed, read_i64, write_i64);
impl_int_scalar!(u64, 8, ScalarKind::Unsigned, read_u64, write_u64);
impl_float_scalar!(f32, 4, read_f32, write_f32);
impl_float_scalar!(f64, 8, read_f64, write_f64);

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, LittleEndian};

    fn width_and_kind<T: Scalar>() -> (usize, ScalarKind) {
        (T::WIDTH, T::KIND)
    }

    #[test]
    fn test_table_matches_impls() {
        let impls = [
            width_and_kind::<i8>(),
            width_and_kind::<u8>(),
            width_and_kind::<i16>(),
            width_and_kind::<u16>(),
            width_and_kind::<i32>(),
            width_and_kind::<u32>(),
            width_and_kind::<i64>(),
            width_and_kind::<u64>(),
            width_and_kind::<f32>(),
            width_and_kind::<f64>(),
        ];
        assert_eq!(impls, SCALAR_TABLE);
    }

    #[test]
    fn test_binary_codec() {
        let mut buf = [0u8; 4];
        0x1234_5678u32.encode::<LittleEndian>(&mut buf);
        assert_eq!(buf, [0x78, 0x56, 0x34, 0x12]);
        assert_eq!(u32::decode::<BigEndian>(&buf), 0x7856_3412);

        (-2i16).encode::<BigEndian>(&mut buf[..2]);
        assert_eq!(&buf[..2], &[0xFF, 0xFE]);
        assert_eq!(i16::decode::<BigEndian>(&buf[..2]), -2);
    }

    #[test]
    fn test_parse_text_integers() {
        assert_eq!(u16::parse_text("4660"), Some(4660));
        assert_eq!(u16::parse_text("0x1234"), Some(0x1234));
        assert_eq!(i32::parse_text("-0x10"), Some(-16));
        assert_eq!(i8::parse_text("-128"), Some(-128));
        assert_eq!(u8::parse_text("256"), None);
        assert_eq!(u8::parse_text("0x"), None);
        assert_eq!(u32::parse_text("abc"), None);
    }

    #[test]
    fn test_parse_text_floats() {
        assert_eq!(f32::parse_text("1.5"), Some(1.5));
        assert_eq!(f64::parse_text("INF"), Some(f64::INFINITY));
        assert_eq!(f32::parse_text("-inf"), Some(f32::NEG_INFINITY));
        assert!(f32::parse_text("NAN").map(f32::is_nan).unwrap_or(false));
        assert_eq!(f32::parse_text("x1"), None);
    }

    #[test]
    fn test_format_text() {
        assert_eq!(255u8.format_text(TextIntFormat::Hex), "0xff");
        assert_eq!((-5i32).format_text(TextIntFormat::Hex), "-5");
        assert_eq!(42u32.format_text(TextIntFormat::Decimal), "42");
        assert_eq!(f32::INFINITY.format_text(TextIntFormat::Decimal), "INF");
        assert_eq!(f64::NEG_INFINITY.format_text(TextIntFormat::Decimal), "-INF");
        assert_eq!(f32::NAN.format_text(TextIntFormat::Decimal), "NAN");
        assert_eq!(0.25f32.format_text(TextIntFormat::Decimal), "0.25");
    }
}
