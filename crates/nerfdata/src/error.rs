use std::path::PathBuf;

use nerfdata_camera::CameraError;
use nerfdata_ply::PlyError;

/// An error type for loading NeRF datasets.
#[derive(Debug, thiserror::Error)]
pub enum NerfDataError {
    /// A file could not be read or written.
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The scene descriptor does not match the expected schema.
    #[error("Failed to parse scene descriptor {}: {source}", .path.display())]
    Parse {
        /// The descriptor file.
        path: PathBuf,
        /// The underlying error, with the offending field and position.
        source: serde_json::Error,
    },

    /// The scene descriptor could not be encoded.
    #[error("Failed to encode scene descriptor {}: {source}", .path.display())]
    Encode {
        /// The descriptor file.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },

    /// Camera resolution failed.
    #[error(transparent)]
    Camera(#[from] CameraError),

    /// The point file could not be read.
    #[error("Failed to read point file {}: {source}", .path.display())]
    PointCloud {
        /// The point file.
        path: PathBuf,
        /// The underlying error.
        source: PlyError,
    },

    /// A frame index past the last frame.
    #[error("Frame index {index} out of range for {num_frames} frames")]
    FrameOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of frames in the scene.
        num_frames: usize,
    },

    /// The scene descriptor does not reference a point file.
    #[error("no point file referenced")]
    NoPointFile,

    /// The point file has an extension no reader exists for.
    #[error("unsupported point file type: {}", .0.display())]
    UnsupportedPointFile(PathBuf),
}
