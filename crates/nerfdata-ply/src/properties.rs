use super::PlyError;

/// Scalar types a PLY property can be stored as.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PlyDataType {
    /// `char` / `int8`
    Int8,
    /// `uchar` / `uint8`
    UInt8,
    /// `short` / `int16`
    Int16,
    /// `ushort` / `uint16`
    UInt16,
    /// `int` / `int32`
    Int32,
    /// `uint` / `uint32`
    UInt32,
    /// `float` / `float32`
    Float32,
    /// `double` / `float64`
    Float64,
}

impl PlyDataType {
    /// Parse a type name as written in the header, e.g. `uchar` or `float32`.
    pub fn parse(type_str: &str) -> Result<Self, PlyError> {
        match type_str {
            "char" | "int8" => Ok(PlyDataType::Int8),
            "uchar" | "uint8" => Ok(PlyDataType::UInt8),
            "short" | "int16" => Ok(PlyDataType::Int16),
            "ushort" | "uint16" => Ok(PlyDataType::UInt16),
            "int" | "int32" => Ok(PlyDataType::Int32),
            "uint" | "uint32" => Ok(PlyDataType::UInt32),
            "float" | "float32" => Ok(PlyDataType::Float32),
            "double" | "float64" => Ok(PlyDataType::Float64),
            _ => Err(PlyError::UnsupportedType(type_str.to_string())),
        }
    }

    /// Size of one stored value in bytes.
    pub fn size(&self) -> usize {
        match self {
            PlyDataType::Float32 | PlyDataType::Int32 | PlyDataType::UInt32 => 4,
            PlyDataType::Float64 => 8,
            PlyDataType::Int16 | PlyDataType::UInt16 => 2,
            PlyDataType::Int8 | PlyDataType::UInt8 => 1,
        }
    }

    /// Whether values of this type are 8-bit integers.
    pub fn is_8bit(&self) -> bool {
        matches!(self, PlyDataType::Int8 | PlyDataType::UInt8)
    }
}

/// How a property is laid out in a record.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PlyPropertyKind {
    /// A single value.
    Scalar(PlyDataType),
    /// A count followed by that many items, e.g. face vertex indices.
    List {
        /// Type of the leading count.
        count: PlyDataType,
        /// Type of each item.
        item: PlyDataType,
    },
}

/// A named property of an element.
#[derive(Debug, PartialEq, Clone)]
pub struct PlyPropertyDefinition {
    /// Property name, compared case-sensitively.
    pub name: String,
    /// Storage layout of the property.
    pub kind: PlyPropertyKind,
}

/// One decoded scalar, keeping the type it was stored as.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlyScalar {
    /// Signed 8-bit value.
    Int8(i8),
    /// Unsigned 8-bit value.
    UInt8(u8),
    /// Signed 16-bit value.
    Int16(i16),
    /// Unsigned 16-bit value.
    UInt16(u16),
    /// Signed 32-bit value.
    Int32(i32),
    /// Unsigned 32-bit value.
    UInt32(u32),
    /// Single precision float.
    Float32(f32),
    /// Double precision float.
    Float64(f64),
}

impl PlyScalar {
    /// The value as `f32`, without any rescaling.
    pub fn as_f32(&self) -> f32 {
        match *self {
            PlyScalar::Int8(v) => v as f32,
            PlyScalar::UInt8(v) => v as f32,
            PlyScalar::Int16(v) => v as f32,
            PlyScalar::UInt16(v) => v as f32,
            PlyScalar::Int32(v) => v as f32,
            PlyScalar::UInt32(v) => v as f32,
            PlyScalar::Float32(v) => v,
            PlyScalar::Float64(v) => v as f32,
        }
    }

    /// The value as `f32`, with 8-bit integers mapped from `0..=255` to `0.0..=1.0`.
    ///
    /// Any other stored type is returned as is.
    pub fn as_normalized_f32(&self) -> f32 {
        match *self {
            PlyScalar::Int8(v) => v as f32 / 255.0,
            PlyScalar::UInt8(v) => v as f32 / 255.0,
            _ => self.as_f32(),
        }
    }

    /// The value as a list length.
    pub fn as_count(&self) -> Result<usize, PlyError> {
        let count = match *self {
            PlyScalar::Int8(v) => i64::from(v),
            PlyScalar::UInt8(v) => i64::from(v),
            PlyScalar::Int16(v) => i64::from(v),
            PlyScalar::UInt16(v) => i64::from(v),
            PlyScalar::Int32(v) => i64::from(v),
            PlyScalar::UInt32(v) => i64::from(v),
            PlyScalar::Float32(_) | PlyScalar::Float64(_) => {
                return Err(PlyError::InvalidValue(
                    "list count must be an integer".to_string(),
                ))
            }
        };
        usize::try_from(count)
            .map_err(|_| PlyError::InvalidValue(format!("negative list count: {count}")))
    }

    /// Parse a value from its ASCII representation.
    pub fn parse_ascii(token: &str, data_type: PlyDataType) -> Result<Self, PlyError> {
        fn parse<T: std::str::FromStr>(token: &str) -> Result<T, PlyError>
        where
            T::Err: std::fmt::Display,
        {
            token
                .parse::<T>()
                .map_err(|e| PlyError::InvalidValue(format!("{token}: {e}")))
        }

        Ok(match data_type {
            PlyDataType::Int8 => PlyScalar::Int8(parse(token)?),
            PlyDataType::UInt8 => PlyScalar::UInt8(parse(token)?),
            PlyDataType::Int16 => PlyScalar::Int16(parse(token)?),
            PlyDataType::UInt16 => PlyScalar::UInt16(parse(token)?),
            PlyDataType::Int32 => PlyScalar::Int32(parse(token)?),
            PlyDataType::UInt32 => PlyScalar::UInt32(parse(token)?),
            PlyDataType::Float32 => PlyScalar::Float32(parse(token)?),
            PlyDataType::Float64 => PlyScalar::Float64(parse(token)?),
        })
    }

    /// Decode a value from its binary representation.
    ///
    /// PRECONDITION: `bytes` holds exactly `data_type.size()` bytes.
    pub fn from_bytes(bytes: &[u8], data_type: PlyDataType, little_endian: bool) -> Self {
        macro_rules! decode {
            ($ty:ty, $n:expr) => {{
                let mut buf = [0u8; $n];
                buf.copy_from_slice(&bytes[..$n]);
                if little_endian {
                    <$ty>::from_le_bytes(buf)
                } else {
                    <$ty>::from_be_bytes(buf)
                }
            }};
        }

        match data_type {
            PlyDataType::Int8 => PlyScalar::Int8(bytes[0] as i8),
            PlyDataType::UInt8 => PlyScalar::UInt8(bytes[0]),
            PlyDataType::Int16 => PlyScalar::Int16(decode!(i16, 2)),
            PlyDataType::UInt16 => PlyScalar::UInt16(decode!(u16, 2)),
            PlyDataType::Int32 => PlyScalar::Int32(decode!(i32, 4)),
            PlyDataType::UInt32 => PlyScalar::UInt32(decode!(u32, 4)),
            PlyDataType::Float32 => PlyScalar::Float32(decode!(f32, 4)),
            PlyDataType::Float64 => PlyScalar::Float64(decode!(f64, 8)),
        }
    }
}

/// The value of one property in a record.
#[derive(Debug, Clone, PartialEq)]
pub enum PlyValue {
    /// A scalar property.
    Scalar(PlyScalar),
    /// The items of a list property.
    List(Vec<PlyScalar>),
}

impl PlyValue {
    /// The scalar held by this value, if it is not a list.
    pub fn as_scalar(&self) -> Option<PlyScalar> {
        match self {
            PlyValue::Scalar(v) => Some(*v),
            PlyValue::List(_) => None,
        }
    }
}
