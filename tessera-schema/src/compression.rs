use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The codec applied to the values of an attribute when its tiles are stored.
///
/// The schema only records the choice; encoding and decoding happen in the storage layer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum Compression {
    /// Run-length encoding
    Rle = 0,
    /// Deflate
    Zip = 1,
    /// LZ family
    Lz = 2,
    /// Stored uncompressed
    #[default]
    None = 3,
}

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rle => write!(f, "RLE"),
            Self::Zip => write!(f, "ZIP"),
            Self::Lz => write!(f, "LZ"),
            Self::None => write!(f, "NONE"),
        }
    }
}
