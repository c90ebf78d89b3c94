use std::path::{Path, PathBuf};

use glam::Mat4;

use nerfdata_camera::CameraIntrinsics;
use nerfdata_ply::{read_ply_points, PointCloud};

use crate::{read_scene_descriptor, NerfDataError, SceneDescriptor, SceneFrame};

/// Options for loading a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    /// Root directory of the dataset.
    pub root: PathBuf,
    /// File name of the scene descriptor inside `root`.
    pub descriptor_file_name: String,
    /// Transform applied to every pose and every point.
    pub align_transform: Mat4,
}

impl DatasetConfig {
    /// Default file name of the scene descriptor.
    pub const DEFAULT_DESCRIPTOR_FILE_NAME: &'static str = "transforms.json";

    /// Create a config for the dataset at `root` with the default descriptor name and an
    /// identity alignment.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            descriptor_file_name: Self::DEFAULT_DESCRIPTOR_FILE_NAME.to_string(),
            align_transform: Mat4::IDENTITY,
        }
    }

    /// Use a different descriptor file name.
    pub fn with_descriptor_file_name(mut self, name: impl Into<String>) -> Self {
        self.descriptor_file_name = name.into();
        self
    }

    /// Re-express the dataset in another world frame.
    pub fn with_align_transform(mut self, transform: Mat4) -> Self {
        self.align_transform = transform;
        self
    }

    /// Full path of the scene descriptor.
    pub fn descriptor_path(&self) -> PathBuf {
        self.root.join(&self.descriptor_file_name)
    }
}

/// Point file formats that can be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointFileKind {
    /// Stanford PLY, ASCII or binary.
    Ply,
}

impl PointFileKind {
    /// Pick the reader for a point file from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, NerfDataError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ply") => Ok(PointFileKind::Ply),
            _ => Err(NerfDataError::UnsupportedPointFile(path.to_path_buf())),
        }
    }
}

/// Load the point file referenced by a descriptor.
///
/// # Arguments
///
/// * `root` - The dataset root that `ply_file_path` is relative to.
/// * `ply_file_path` - The point file referenced by the descriptor, if any.
/// * `transform` - Transform applied to every point.
///
/// # Returns
///
/// The point cloud, or an error when no file is referenced, its type is not supported, or
/// reading it fails. The file type is checked before the file is opened.
pub fn load_points(
    root: impl AsRef<Path>,
    ply_file_path: Option<&str>,
    transform: &Mat4,
) -> Result<PointCloud, NerfDataError> {
    let file_name = ply_file_path.ok_or(NerfDataError::NoPointFile)?;
    let path = root.as_ref().join(file_name);

    match PointFileKind::from_path(&path)? {
        PointFileKind::Ply => {
            read_ply_points(&path, Some(transform)).map_err(|source| NerfDataError::PointCloud {
                path: path.clone(),
                source,
            })
        }
    }
}

/// A loaded dataset: the scene descriptor with aligned poses and the seed points.
#[derive(Debug, Clone, PartialEq)]
pub struct NerfDataset {
    /// The scene descriptor, with every pose already aligned.
    pub descriptor: SceneDescriptor,
    /// The seed points, aligned with the same transform as the poses.
    pub points: PointCloud,
}

impl NerfDataset {
    /// Load the dataset at `root` as is.
    ///
    /// Example:
    ///
    /// ```no_run
    /// use nerfdata::NerfDataset;
    ///
    /// let dataset = NerfDataset::load("data/poster").unwrap();
    /// println!("{} frames, {} points", dataset.frames().len(), dataset.point_count());
    /// ```
    pub fn load(root: impl Into<PathBuf>) -> Result<Self, NerfDataError> {
        Self::load_with_config(&DatasetConfig::new(root))
    }

    /// Load the dataset at `root` and apply `align_transform` to all poses and points.
    pub fn load_with_transform(
        root: impl Into<PathBuf>,
        align_transform: &Mat4,
    ) -> Result<Self, NerfDataError> {
        Self::load_with_config(&DatasetConfig::new(root).with_align_transform(*align_transform))
    }

    /// Load a dataset as described by `config`.
    pub fn load_with_config(config: &DatasetConfig) -> Result<Self, NerfDataError> {
        let mut descriptor = read_scene_descriptor(config.descriptor_path())?;
        descriptor.apply_global_transform(&config.align_transform);

        let points = load_points(
            &config.root,
            descriptor.ply_file_path.as_deref(),
            &config.align_transform,
        )?;

        log::info!(
            "loaded dataset {}: {} frames, {} points",
            config.root.display(),
            descriptor.frames.len(),
            points.len()
        );

        Ok(Self { descriptor, points })
    }

    /// The frames, in descriptor order.
    pub fn frames(&self) -> &[SceneFrame] {
        &self.descriptor.frames
    }

    /// Resolved intrinsics of the frame at `index`.
    ///
    /// Fails with [`NerfDataError::FrameOutOfRange`] for an index past the last frame, and
    /// with [`NerfDataError::Camera`] when a field is set neither on the frame nor globally.
    pub fn camera_intrinsics(&self, index: usize) -> Result<CameraIntrinsics, NerfDataError> {
        let frame = self
            .descriptor
            .frames
            .get(index)
            .ok_or(NerfDataError::FrameOutOfRange {
                index,
                num_frames: self.descriptor.frames.len(),
            })?;
        Ok(self.descriptor.camera_intrinsics(frame)?)
    }

    /// Number of seed points.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}
