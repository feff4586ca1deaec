#![deny(missing_docs)]

//! The schema of a Tessera array
//!
//! An [`ArraySchema`] describes the dimensions and attributes of a multi-dimensional array and
//! how its cells and tiles are laid out. This crate builds and validates schemas, orders cells
//! and computes tile ids from them, converts them to and from their binary representation and
//! derives new schemas from existing ones.

pub use attribute::*;
pub use builder::*;
pub use compression::*;
pub use derive::*;
pub use dimension::*;
pub use order::*;
pub use scalar::*;
pub use schema::{ArraySchema, Tiling};
pub use tiling::RegularTiling;

mod attribute;
mod builder;
mod compression;
mod derive;
mod dimension;
mod display;
mod order;
mod ordering;
mod scalar;
mod schema;
mod serde;
mod tiling;

#[doc(hidden)]
pub mod __private {
    pub use tessera_error::tessera_panic;
}
