use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use num_traits::AsPrimitive;

/// The scalar kinds a cell value or a coordinate can take.
///
/// The discriminant is the kind's tag in a serialized schema. Tags are never reused: a new kind
/// gets a new tag so that previously stored schemas keep decoding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum ScalarType {
    /// A single byte character
    Char = 0,
    /// A 32-bit signed integer
    Int32 = 1,
    /// A 64-bit signed integer
    Int64 = 2,
    /// A 32-bit IEEE-754 float
    Float32 = 3,
    /// A 64-bit IEEE-754 float
    Float64 = 4,
}

impl ScalarType {
    /// The width of a single value of this kind, in bytes.
    pub const fn byte_width(&self) -> usize {
        match self {
            Self::Char => size_of::<u8>(),
            Self::Int32 => size_of::<i32>(),
            Self::Int64 => size_of::<i64>(),
            Self::Float32 => size_of::<f32>(),
            Self::Float64 => size_of::<f64>(),
        }
    }

    /// Whether this is an integer kind.
    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }

    /// Whether this is a floating point kind.
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Whether values of this kind may be used as coordinates.
    pub const fn is_coordinate(&self) -> bool {
        !matches!(self, Self::Char)
    }
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Char => write!(f, "char"),
            Self::Int32 => write!(f, "int32"),
            Self::Int64 => write!(f, "int64"),
            Self::Float32 => write!(f, "float32"),
            Self::Float64 => write!(f, "float64"),
        }
    }
}

/// A native Rust type usable as the coordinate of a cell.
///
/// Implemented for every [`ScalarType`] except [`ScalarType::Char`].
pub trait Coordinate:
    Copy
    + PartialOrd
    + Debug
    + Display
    + FromStr
    + Send
    + Sync
    + AsPrimitive<f64>
    + AsPrimitive<i64>
    + 'static
{
    /// The scalar kind corresponding to this native type.
    const SCALAR_TYPE: ScalarType;

    /// Widens the coordinate to a double, the type domains are expressed in.
    fn to_f64(self) -> f64 {
        <Self as AsPrimitive<f64>>::as_(self)
    }

    /// Converts the coordinate to an integer, truncating toward zero.
    fn to_i64(self) -> i64 {
        <Self as AsPrimitive<i64>>::as_(self)
    }
}

macro_rules! coordinate {
    ($T:ty, $scalar:ident) => {
        impl Coordinate for $T {
            const SCALAR_TYPE: ScalarType = ScalarType::$scalar;
        }
    };
}

coordinate!(i32, Int32);
coordinate!(i64, Int64);
coordinate!(f32, Float32);
coordinate!(f64, Float64);

/// Binds `$T` to the native type of a coordinate [`ScalarType`] and evaluates the body with it.
///
/// Panics on [`ScalarType::Char`], which a constructed schema never uses for coordinates.
#[macro_export]
macro_rules! match_each_coordinate_type {
    ($self:expr, | $_:tt $enc:ident | $($body:tt)*) => ({
        macro_rules! __with__ {( $_ $enc:ident ) => ( $($body)* )}
        use $crate::ScalarType;
        use $crate::__private::tessera_panic;
        let scalar_type = $self;
        match scalar_type {
            ScalarType::Int32 => __with__! { i32 },
            ScalarType::Int64 => __with__! { i64 },
            ScalarType::Float32 => __with__! { f32 },
            ScalarType::Float64 => __with__! { f64 },
            ScalarType::Char => tessera_panic!("{} is not a coordinate type", scalar_type),
        }
    })
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use crate::{Coordinate, ScalarType};

    #[rstest]
    #[case(ScalarType::Char, 0, 1)]
    #[case(ScalarType::Int32, 1, 4)]
    #[case(ScalarType::Int64, 2, 8)]
    #[case(ScalarType::Float32, 3, 4)]
    #[case(ScalarType::Float64, 4, 8)]
    fn tags_and_widths(#[case] scalar: ScalarType, #[case] tag: u8, #[case] width: usize) {
        assert_eq!(u8::from(scalar), tag);
        assert_eq!(ScalarType::try_from(tag).unwrap(), scalar);
        assert_eq!(scalar.byte_width(), width);
    }

    #[test]
    fn unknown_tag() {
        assert!(ScalarType::try_from(5u8).is_err());
    }

    #[test]
    fn coordinate_conversions() {
        assert_eq!(7.9f32.to_i64(), 7);
        assert_eq!((-7.9f64).to_i64(), -7);
        assert_eq!(3i32.to_f64(), 3.0);
        assert_eq!(<f32 as Coordinate>::SCALAR_TYPE, ScalarType::Float32);
    }

    #[test]
    fn dispatch_on_coordinate_type() {
        let width = match_each_coordinate_type!(ScalarType::Float32, |$T| size_of::<$T>());
        assert_eq!(width, 4);
        assert!(!ScalarType::Char.is_coordinate());
    }
}
