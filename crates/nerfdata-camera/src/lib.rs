#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Camera intrinsics and their resolution from partial blocks.
pub mod intrinsics;

/// 4x4 homogeneous transform utilities.
pub mod transforms;

pub use intrinsics::{resolve_intrinsics, CameraIntrinsics, PartialIntrinsics};

/// Error types for the camera module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CameraError {
    /// An intrinsic field was found neither in the frame nor in the global block.
    #[error("Missing intrinsic field: {0}")]
    MissingIntrinsic(&'static str),

    /// The matrix has no inverse.
    #[error("Matrix is singular and cannot be inverted")]
    SingularMatrix,
}
