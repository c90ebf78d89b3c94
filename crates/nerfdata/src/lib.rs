#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Dataset assembly from a scene directory.
pub mod dataset;

/// The `transforms.json` scene descriptor.
pub mod descriptor;

mod error;

pub use dataset::{load_points, DatasetConfig, NerfDataset, PointFileKind};
pub use descriptor::{read_scene_descriptor, write_scene_descriptor, SceneDescriptor, SceneFrame};
pub use error::NerfDataError;

#[doc(inline)]
pub use nerfdata_camera as camera;

#[doc(inline)]
pub use nerfdata_ply as ply;
