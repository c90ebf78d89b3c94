#![doc = env!("CARGO_PKG_DESCRIPTION")]
#![deny(missing_docs)]

mod header;
mod pointcloud;
mod points;
mod properties;
mod reader;

pub use header::*;
pub use pointcloud::PointCloud;
pub use points::*;
pub use properties::*;
pub use reader::*;

/// Error types for the PLY module.
#[derive(Debug, thiserror::Error)]
pub enum PlyError {
    /// Failed to read PLY file
    #[error("Failed to read PLY file: {0}")]
    Io(#[from] std::io::Error),

    /// The header is not a valid PLY header
    #[error("Malformed PLY header: {0}")]
    MalformedHeader(String),

    /// The header declares a format this reader does not handle
    #[error("Unsupported PLY format: {0}")]
    UnsupportedFormat(String),

    /// The header declares a property type this reader does not handle
    #[error("Unsupported PLY property type: {0}")]
    UnsupportedType(String),

    /// A value in the body could not be decoded
    #[error("Invalid PLY value: {0}")]
    InvalidValue(String),

    /// The vertex element lacks one of the position or color properties
    #[error("missing x/y/z/red/green/blue")]
    MissingVertexFields,

    /// Position and color buffers do not describe the same points
    #[error("Point buffers are misaligned: {positions} positions, {colors} colors")]
    MisalignedBuffers {
        /// Number of position values.
        positions: usize,
        /// Number of color values.
        colors: usize,
    },
}
