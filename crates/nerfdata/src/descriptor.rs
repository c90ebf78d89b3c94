use std::path::Path;

use glam::Mat4;
use serde::{Deserialize, Serialize};

use nerfdata_camera::transforms::{compose, matrix_to_rows, rows_to_matrix, MatrixRows};
use nerfdata_camera::{resolve_intrinsics, CameraError, CameraIntrinsics, PartialIntrinsics};

use crate::NerfDataError;

/// One camera observation of the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFrame {
    /// Path of the image, relative to the dataset root.
    pub file_path: String,
    // local to world, one inner array per row
    transform_matrix: MatrixRows,
    /// Per-frame intrinsic overrides.
    #[serde(flatten)]
    pub intrinsics: PartialIntrinsics,
}

impl SceneFrame {
    /// Create a frame with a pose and a complete set of intrinsics.
    pub fn new(
        file_path: impl Into<String>,
        local_to_world: &Mat4,
        intrinsics: CameraIntrinsics,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            transform_matrix: matrix_to_rows(local_to_world),
            intrinsics: intrinsics.into(),
        }
    }

    /// The pose rows exactly as stored in the descriptor.
    pub fn transform_rows(&self) -> &MatrixRows {
        &self.transform_matrix
    }

    /// The transform from camera-local space to world space.
    pub fn local_to_world(&self) -> Mat4 {
        rows_to_matrix(&self.transform_matrix)
    }

    /// Replace the pose.
    pub fn set_local_to_world(&mut self, local_to_world: &Mat4) {
        self.transform_matrix = matrix_to_rows(local_to_world);
    }
}

/// A whole scene as described by `transforms.json`.
///
/// Frames keep the order they have in the file. Fields the schema does not know about are
/// ignored when reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    /// Camera model tag, e.g. `OPENCV`. Passed through untouched.
    pub camera_model: String,
    /// The frames, in display order.
    pub frames: Vec<SceneFrame>,
    /// Path of the seed point cloud, relative to the dataset root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ply_file_path: Option<String>,
    /// Scene-wide intrinsic defaults.
    #[serde(flatten)]
    pub intrinsics: PartialIntrinsics,
}

impl SceneDescriptor {
    /// Create a descriptor without global intrinsics.
    pub fn new(
        camera_model: impl Into<String>,
        frames: Vec<SceneFrame>,
        ply_file_path: Option<String>,
    ) -> Self {
        Self {
            camera_model: camera_model.into(),
            frames,
            ply_file_path,
            intrinsics: PartialIntrinsics::default(),
        }
    }

    /// Resolve the intrinsics of `frame` against the scene-wide defaults.
    pub fn camera_intrinsics(&self, frame: &SceneFrame) -> Result<CameraIntrinsics, CameraError> {
        resolve_intrinsics(&frame.intrinsics, &self.intrinsics)
    }

    /// Resolve the intrinsics of every frame, in frame order.
    pub fn frame_intrinsics(&self) -> Result<Vec<CameraIntrinsics>, CameraError> {
        self.frames
            .iter()
            .map(|frame| self.camera_intrinsics(frame))
            .collect()
    }

    /// Re-express every pose in a new world frame.
    ///
    /// Each pose becomes `transform * pose`.
    pub fn apply_global_transform(&mut self, transform: &Mat4) {
        for frame in self.frames.iter_mut() {
            let local_to_world = compose(transform, &frame.local_to_world());
            frame.set_local_to_world(&local_to_world);
        }
    }

    /// Parse a descriptor from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Encode the descriptor as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Read a scene descriptor file.
///
/// # Arguments
///
/// * `path` - The path to the `transforms.json` file.
///
/// # Returns
///
/// The descriptor, [`NerfDataError::Io`] when the file cannot be read, or
/// [`NerfDataError::Parse`] when it does not match the schema.
pub fn read_scene_descriptor(path: impl AsRef<Path>) -> Result<SceneDescriptor, NerfDataError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| NerfDataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let descriptor =
        SceneDescriptor::from_json_slice(&bytes).map_err(|source| NerfDataError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    log::debug!(
        "read scene descriptor {}: camera model {}, {} frames",
        path.display(),
        descriptor.camera_model,
        descriptor.frames.len()
    );
    Ok(descriptor)
}

/// Write a scene descriptor file.
pub fn write_scene_descriptor(
    path: impl AsRef<Path>,
    descriptor: &SceneDescriptor,
) -> Result<(), NerfDataError> {
    let path = path.as_ref();
    let json = descriptor
        .to_json_string()
        .map_err(|source| NerfDataError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    std::fs::write(path, json).map_err(|source| NerfDataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    const SCENE_JSON: &str = r#"{
        "camera_model": "OPENCV",
        "fl_x": 1000, "fl_y": 1001, "cx": 320, "cy": 240, "w": 640, "h": 480,
        "k1": 0.01, "k2": 0.0, "k3": 0.0, "p1": 0.0, "p2": 0.0,
        "ply_file_path": "sparse_pc.ply",
        "applied_transform": [[1, 0, 0, 0], [0, 1, 0, 0], [0, 0, 1, 0]],
        "frames": [
            {
                "file_path": "images/frame_00002.png",
                "transform_matrix": [[1, 0, 0, 1], [0, 1, 0, 2], [0, 0, 1, 3], [0, 0, 0, 1]],
                "fl_x": 900,
                "colmap_im_id": 2
            },
            {
                "file_path": "images/frame_00001.png",
                "transform_matrix": [[1, 0, 0, 0], [0, 1, 0, 0], [0, 0, 1, 0], [0, 0, 0, 1]]
            }
        ]
    }"#;

    fn sample_pose() -> Mat4 {
        Mat4::from_rotation_translation(
            Quat::from_rotation_z(0.4) * Quat::from_rotation_x(1.2),
            Vec3::new(-0.5, 1.5, 2.0),
        )
    }

    #[test]
    fn test_parse_descriptor() -> Result<(), Box<dyn std::error::Error>> {
        let descriptor = SceneDescriptor::from_json_slice(SCENE_JSON.as_bytes())?;
        assert_eq!(descriptor.camera_model, "OPENCV");
        assert_eq!(descriptor.ply_file_path.as_deref(), Some("sparse_pc.ply"));
        assert_eq!(descriptor.intrinsics.fx, Some(1000.0));
        assert_eq!(descriptor.intrinsics.k1, Some(0.01));

        // order from the file, not sorted by name
        assert_eq!(descriptor.frames.len(), 2);
        assert_eq!(descriptor.frames[0].file_path, "images/frame_00002.png");
        assert_eq!(descriptor.frames[1].file_path, "images/frame_00001.png");

        // stored rows are kept as written, translation in the last column
        let rows = descriptor.frames[0].transform_rows();
        assert_eq!(rows[0], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(rows[2][3], 3.0);
        assert_eq!(rows[3], [0.0, 0.0, 0.0, 1.0]);

        let pose = descriptor.frames[0].local_to_world();
        assert_eq!(pose.w_axis.to_array(), [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(descriptor.frames[1].local_to_world(), Mat4::IDENTITY);

        let first = descriptor.camera_intrinsics(&descriptor.frames[0])?;
        assert_eq!(first.fx, 900.0);
        assert_eq!(first.fy, 1001.0);
        let all = descriptor.frame_intrinsics()?;
        assert_eq!(all[1].fx, 1000.0);
        assert_eq!(all[1].w, 640.0);
        Ok(())
    }

    #[test]
    fn test_missing_required_fields() {
        let no_model = r#"{"frames": []}"#;
        let err = SceneDescriptor::from_json_slice(no_model.as_bytes())
            .map(|_| ())
            .map_err(|e| e.to_string());
        assert!(matches!(err, Err(ref msg) if msg.contains("camera_model")));

        let no_frames = r#"{"camera_model": "OPENCV"}"#;
        let err = SceneDescriptor::from_json_slice(no_frames.as_bytes())
            .map(|_| ())
            .map_err(|e| e.to_string());
        assert!(matches!(err, Err(ref msg) if msg.contains("frames")));

        let no_file_path = r#"{"camera_model": "OPENCV", "frames": [{"transform_matrix": []}]}"#;
        assert!(SceneDescriptor::from_json_slice(no_file_path.as_bytes()).is_err());
    }

    #[test]
    fn test_malformed_pose_shape() {
        let three_rows = r#"{"camera_model": "OPENCV", "frames": [{"file_path": "a.png",
            "transform_matrix": [[1, 0, 0, 0], [0, 1, 0, 0], [0, 0, 1, 0]]}]}"#;
        assert!(SceneDescriptor::from_json_slice(three_rows.as_bytes()).is_err());

        let short_row = r#"{"camera_model": "OPENCV", "frames": [{"file_path": "a.png",
            "transform_matrix": [[1, 0, 0], [0, 1, 0, 0], [0, 0, 1, 0], [0, 0, 0, 1]]}]}"#;
        assert!(SceneDescriptor::from_json_slice(short_row.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_intrinsic_is_reported() -> Result<(), serde_json::Error> {
        let json = r#"{"camera_model": "PINHOLE", "fl_x": 1, "frames": [{"file_path": "a.png",
            "transform_matrix": [[1, 0, 0, 0], [0, 1, 0, 0], [0, 0, 1, 0], [0, 0, 0, 1]]}]}"#;
        let descriptor = SceneDescriptor::from_json_slice(json.as_bytes())?;
        assert_eq!(
            descriptor.frame_intrinsics(),
            Err(CameraError::MissingIntrinsic("w"))
        );
        Ok(())
    }

    #[test]
    fn test_identity_transform_leaves_poses() -> Result<(), serde_json::Error> {
        let mut descriptor = SceneDescriptor::from_json_slice(SCENE_JSON.as_bytes())?;
        let before: Vec<Mat4> = descriptor.frames.iter().map(|f| f.local_to_world()).collect();
        descriptor.apply_global_transform(&Mat4::IDENTITY);
        for (frame, pose) in descriptor.frames.iter().zip(before) {
            assert!(frame.local_to_world().abs_diff_eq(pose, 1e-6));
        }
        Ok(())
    }

    #[test]
    fn test_global_transform_composition() {
        let frame = SceneFrame::new("a.png", &sample_pose(), CameraIntrinsics::from_image_size(4, 4));
        let mut sequential = SceneDescriptor::new("OPENCV", vec![frame.clone()], None);
        let mut composed = SceneDescriptor::new("OPENCV", vec![frame], None);

        let a = Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0));
        let b = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);

        sequential.apply_global_transform(&a);
        sequential.apply_global_transform(&b);
        composed.apply_global_transform(&compose(&b, &a));

        let expected = b * a * sample_pose();
        assert!(sequential.frames[0].local_to_world().abs_diff_eq(expected, 1e-5));
        assert!(composed.frames[0]
            .local_to_world()
            .abs_diff_eq(sequential.frames[0].local_to_world(), 1e-5));
    }

    #[test]
    fn test_pose_roundtrip_through_json() -> Result<(), serde_json::Error> {
        let pose = sample_pose();
        let intrinsics = CameraIntrinsics::from_image_size(640, 480);
        let descriptor = SceneDescriptor::new(
            "OPENCV",
            vec![SceneFrame::new("images/0.png", &pose, intrinsics)],
            Some("points.ply".to_string()),
        );

        let json = descriptor.to_json_string()?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        // translation is the last entry of the first three rows on disk
        assert_eq!(value["frames"][0]["transform_matrix"][0][3], -0.5);
        assert_eq!(value["frames"][0]["transform_matrix"][2][3], 2.0);
        assert_eq!(value["frames"][0]["fl_x"], 640.0);
        assert!(value.get("fl_x").is_none());

        let decoded = SceneDescriptor::from_json_slice(json.as_bytes())?;
        assert_eq!(
            decoded.frames[0].transform_rows(),
            descriptor.frames[0].transform_rows()
        );
        assert!(decoded.frames[0].local_to_world().abs_diff_eq(pose, 1e-6));
        assert_eq!(
            decoded.frames[0].intrinsics,
            PartialIntrinsics::from(intrinsics)
        );
        assert_eq!(decoded, descriptor);
        Ok(())
    }

    #[test]
    fn test_read_write_descriptor_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("transforms.json");
        let descriptor = SceneDescriptor::from_json_slice(SCENE_JSON.as_bytes())?;
        write_scene_descriptor(&path, &descriptor)?;
        assert_eq!(read_scene_descriptor(&path)?, descriptor);
        Ok(())
    }

    #[test]
    fn test_read_descriptor_errors() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("transforms.json");
        assert!(matches!(
            read_scene_descriptor(&missing),
            Err(NerfDataError::Io { ref path, .. }) if path == &missing
        ));

        std::fs::write(&missing, "{not json")?;
        assert!(matches!(
            read_scene_descriptor(&missing),
            Err(NerfDataError::Parse { .. })
        ));
        Ok(())
    }
}
