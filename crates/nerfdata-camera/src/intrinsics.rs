use glam::{Mat4, Vec4};
use serde::{Deserialize, Serialize};

use crate::{transforms, CameraError};

/// Near plane of the projection built by [`intrinsics_to_projection`].
pub const PROJECTION_ZMIN: f32 = 0.0;

/// Depth scale of the projection built by [`intrinsics_to_projection`].
pub const PROJECTION_ZSCALE: f32 = 1.0;

/// A fully resolved camera model.
///
/// Values of this type only come out of a successful [`resolve_intrinsics`] or one of the
/// constructors below, so every field is always set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Image width in pixels.
    pub w: f32,
    /// Image height in pixels.
    pub h: f32,
    /// Focal length along x, in pixels.
    pub fx: f32,
    /// Focal length along y, in pixels.
    pub fy: f32,
    /// Principal point x, in pixels.
    pub cx: f32,
    /// Principal point y, in pixels.
    pub cy: f32,
    /// First radial distortion coefficient.
    pub k1: f32,
    /// Second radial distortion coefficient.
    pub k2: f32,
    /// Third radial distortion coefficient.
    pub k3: f32,
    /// First tangential distortion coefficient.
    pub p1: f32,
    /// Second tangential distortion coefficient.
    pub p2: f32,
}

impl CameraIntrinsics {
    /// Create a distortion-free pinhole camera for an image of the given size.
    ///
    /// The focal lengths equal the image dimensions and the principal point sits at the
    /// image center.
    pub fn from_image_size(width: u32, height: u32) -> Self {
        let w = width as f32;
        let h = height as f32;
        Self {
            w,
            h,
            fx: w,
            fy: h,
            cx: w / 2.0,
            cy: h / 2.0,
            k1: 0.0,
            k2: 0.0,
            k3: 0.0,
            p1: 0.0,
            p2: 0.0,
        }
    }

    /// The transform from camera-local space to pixel space.
    pub fn local_to_pixel(&self) -> Mat4 {
        intrinsics_to_projection(self)
    }

    /// The transform from pixel space back to camera-local space.
    pub fn pixel_to_local(&self) -> Result<Mat4, CameraError> {
        transforms::try_invert(&self.local_to_pixel())
    }
}

/// Build the projective transform of a camera.
///
/// The columns of the result are `(fx, 0, 0, 0)`, `(0, fy, 0, 0)`,
/// `(cx, cy, zscale, 0)` and `(0, 0, zmin, 1)`, with `zscale` = [`PROJECTION_ZSCALE`] and
/// `zmin` = [`PROJECTION_ZMIN`].
///
/// Distortion coefficients do not take part in the projection.
pub fn intrinsics_to_projection(intrinsics: &CameraIntrinsics) -> Mat4 {
    let CameraIntrinsics { fx, fy, cx, cy, .. } = *intrinsics;
    Mat4::from_cols(
        Vec4::new(fx, 0.0, 0.0, 0.0),
        Vec4::new(0.0, fy, 0.0, 0.0),
        Vec4::new(cx, cy, PROJECTION_ZSCALE, 0.0),
        Vec4::new(0.0, 0.0, PROJECTION_ZMIN, 1.0),
    )
}

/// A block of intrinsic values where any field may be missing.
///
/// This is the shape of both the scene-wide defaults and the per-frame overrides. On disk
/// the focal lengths are called `fl_x` and `fl_y`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialIntrinsics {
    /// Image width in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<f32>,
    /// Image height in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<f32>,
    /// Focal length along x, in pixels.
    #[serde(rename = "fl_x", skip_serializing_if = "Option::is_none")]
    pub fx: Option<f32>,
    /// Focal length along y, in pixels.
    #[serde(rename = "fl_y", skip_serializing_if = "Option::is_none")]
    pub fy: Option<f32>,
    /// Principal point x, in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cx: Option<f32>,
    /// Principal point y, in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cy: Option<f32>,
    /// First radial distortion coefficient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k1: Option<f32>,
    /// Second radial distortion coefficient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k2: Option<f32>,
    /// Third radial distortion coefficient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k3: Option<f32>,
    /// First tangential distortion coefficient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p1: Option<f32>,
    /// Second tangential distortion coefficient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p2: Option<f32>,
}

impl PartialIntrinsics {
    /// Check if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<CameraIntrinsics> for PartialIntrinsics {
    fn from(intrinsics: CameraIntrinsics) -> Self {
        Self {
            w: Some(intrinsics.w),
            h: Some(intrinsics.h),
            fx: Some(intrinsics.fx),
            fy: Some(intrinsics.fy),
            cx: Some(intrinsics.cx),
            cy: Some(intrinsics.cy),
            k1: Some(intrinsics.k1),
            k2: Some(intrinsics.k2),
            k3: Some(intrinsics.k3),
            p1: Some(intrinsics.p1),
            p2: Some(intrinsics.p2),
        }
    }
}

/// Resolve a complete camera model from a frame block and the global defaults.
///
/// Each field is taken from `frame` when present, otherwise from `global`. Fields are
/// resolved in declaration order and the first one missing from both aborts resolution.
///
/// # Arguments
///
/// * `frame` - The per-frame overrides.
/// * `global` - The scene-wide defaults.
///
/// # Returns
///
/// The resolved intrinsics, or [`CameraError::MissingIntrinsic`] naming the first field
/// that could not be resolved.
pub fn resolve_intrinsics(
    frame: &PartialIntrinsics,
    global: &PartialIntrinsics,
) -> Result<CameraIntrinsics, CameraError> {
    fn pick(
        frame: Option<f32>,
        global: Option<f32>,
        name: &'static str,
    ) -> Result<f32, CameraError> {
        frame.or(global).ok_or(CameraError::MissingIntrinsic(name))
    }

    Ok(CameraIntrinsics {
        w: pick(frame.w, global.w, "w")?,
        h: pick(frame.h, global.h, "h")?,
        fx: pick(frame.fx, global.fx, "fx")?,
        fy: pick(frame.fy, global.fy, "fy")?,
        cx: pick(frame.cx, global.cx, "cx")?,
        cy: pick(frame.cy, global.cy, "cy")?,
        k1: pick(frame.k1, global.k1, "k1")?,
        k2: pick(frame.k2, global.k2, "k2")?,
        k3: pick(frame.k3, global.k3, "k3")?,
        p1: pick(frame.p1, global.p1, "p1")?,
        p2: pick(frame.p2, global.p2, "p2")?,
    })
}
