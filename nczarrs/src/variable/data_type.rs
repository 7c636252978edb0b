//! Atomic data types.

use derive_more::Display;
use thiserror::Error;

/// An atomic netCDF data type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum DataType {
    /// `byte`: 8-bit signed integer (type code 1).
    #[display("byte")]
    Byte,
    /// `char`: 8-bit character (type code 2).
    #[display("char")]
    Char,
    /// `short`: 16-bit signed integer (type code 3).
    #[display("short")]
    Short,
    /// `int`: 32-bit signed integer (type code 4).
    #[display("int")]
    Int,
    /// `float`: 32-bit IEEE 754 floating point (type code 5).
    #[display("float")]
    Float,
    /// `double`: 64-bit IEEE 754 floating point (type code 6).
    #[display("double")]
    Double,
    /// `ubyte`: 8-bit unsigned integer (type code 7).
    #[display("ubyte")]
    UByte,
    /// `ushort`: 16-bit unsigned integer (type code 8).
    #[display("ushort")]
    UShort,
    /// `uint`: 32-bit unsigned integer (type code 9).
    #[display("uint")]
    UInt,
    /// `int64`: 64-bit signed integer (type code 10).
    #[display("int64")]
    Int64,
    /// `uint64`: 64-bit unsigned integer (type code 11).
    #[display("uint64")]
    UInt64,
}

/// An unknown atomic type code.
#[derive(Copy, Clone, Debug, Error)]
#[error("invalid atomic type code {0}")]
pub struct InvalidTypeError(i32);

impl InvalidTypeError {
    /// Return the invalid type code.
    #[must_use]
    pub const fn type_code(&self) -> i32 {
        self.0
    }
}

impl DataType {
    /// Look up the data type of a netCDF atomic type code.
    ///
    /// # Errors
    /// Returns [`InvalidTypeError`] if `type_code` is not in `1..=11`.
    pub const fn from_type_code(type_code: i32) -> Result<Self, InvalidTypeError> {
        Ok(match type_code {
            1 => Self::Byte,
            2 => Self::Char,
            3 => Self::Short,
            4 => Self::Int,
            5 => Self::Float,
            6 => Self::Double,
            7 => Self::UByte,
            8 => Self::UShort,
            9 => Self::UInt,
            10 => Self::Int64,
            11 => Self::UInt64,
            _ => return Err(InvalidTypeError(type_code)),
        })
    }

    /// Return the netCDF atomic type code.
    #[must_use]
    pub const fn type_code(&self) -> i32 {
        match self {
            Self::Byte => 1,
            Self::Char => 2,
            Self::Short => 3,
            Self::Int => 4,
            Self::Float => 5,
            Self::Double => 6,
            Self::UByte => 7,
            Self::UShort => 8,
            Self::UInt => 9,
            Self::Int64 => 10,
            Self::UInt64 => 11,
        }
    }

    /// Return the size of an element in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Byte | Self::Char | Self::UByte => 1,
            Self::Short | Self::UShort => 2,
            Self::Int | Self::UInt | Self::Float => 4,
            Self::Double | Self::Int64 | Self::UInt64 => 8,
        }
    }
}
