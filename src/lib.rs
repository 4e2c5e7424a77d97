//! Native acceleration core for a game-engine asset-bundle content pipeline.
//!
//! Five independent leaf components, sharing only the endian utilities in
//! [`endian`]:
//!
//! - [`typetree`]: the recursive, schema-driven binary deserializer.
//! - [`packed`]: bit-packed integer and normalized-float decoding.
//! - [`vertex`]: interleaved vertex-buffer channel gather.
//! - [`cipher`]: the UnityCN archive block decoder.
//! - [`swizzle`]: GOB/block texture deswizzling.
//!
//! Every entry point is a pure function over borrowed/owned byte buffers;
//! there is no persisted state across calls and no I/O.

pub mod cipher;
pub mod endian;
pub mod error;
pub mod packed;
pub mod swizzle;
pub mod typetree;
pub mod vertex;

#[cfg(test)]
mod test_support;

pub use cipher::decrypt_block;
pub use endian::Endian;
pub use error::Error;
pub use packed::{unpack_floats, unpack_ints};
pub use swizzle::switch_deswizzle;
pub use typetree::{read_typetree, AssetFile, ClassRegistry, Node, Value};
pub use vertex::unpack_vertexdata;
