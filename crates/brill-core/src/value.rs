//! Typed value serialization
//!
//! Values are published as canonical decimal text rather than raw binary so
//! peers on any platform decode them without endianness or width ambiguity:
//! booleans as "true"/"false", integers and floats as locale-independent
//! decimals. Strings pass through unmodified. Each supported type maps to
//! exactly one encoding tag, stable across versions.

use crate::encoding::{Encoding, KnownEncoding};

/// A value that knows its wire encoding tag and text serialization
pub trait TypedValue {
    /// The canonical encoding tag for this type
    fn encoding(&self) -> Encoding;

    /// Canonical text/byte payload
    fn to_payload(&self) -> Vec<u8>;
}

macro_rules! typed_number {
    ($($ty:ty => $subtype:literal),* $(,)?) => {
        $(
            impl TypedValue for $ty {
                fn encoding(&self) -> Encoding {
                    Encoding::with_suffix(KnownEncoding::TextPlain, concat!(";", $subtype))
                }

                fn to_payload(&self) -> Vec<u8> {
                    self.to_string().into_bytes()
                }
            }
        )*
    };
}

typed_number! {
    i8 => "int8",
    i16 => "int16",
    i32 => "int32",
    i64 => "int64",
    u8 => "uint8",
    u16 => "uint16",
    u32 => "uint32",
    u64 => "uint64",
    f32 => "float32",
    f64 => "float64",
}

impl TypedValue for bool {
    fn encoding(&self) -> Encoding {
        Encoding::with_suffix(KnownEncoding::TextPlain, ";bool")
    }

    fn to_payload(&self) -> Vec<u8> {
        if *self { b"true".to_vec() } else { b"false".to_vec() }
    }
}

impl TypedValue for &str {
    fn encoding(&self) -> Encoding {
        Encoding::TEXT_PLAIN
    }

    fn to_payload(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl TypedValue for String {
    fn encoding(&self) -> Encoding {
        Encoding::TEXT_PLAIN
    }

    fn to_payload(&self) -> Vec<u8> {
        self.clone().into_bytes()
    }
}

impl TypedValue for serde_json::Value {
    fn encoding(&self) -> Encoding {
        Encoding::APP_JSON
    }

    fn to_payload(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}
