use glam::Vec3;

use super::PlyError;

/// A point cloud stored as two flat, index-aligned buffers.
///
/// Point `i` occupies `positions[3i..3i + 3]` and `colors[3i..3i + 3]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    // xyz triplets
    positions: Vec<f32>,
    // rgb triplets, normalized to 0..1 for 8-bit sources
    colors: Vec<f32>,
}

impl PointCloud {
    /// Create a point cloud from flat position and color buffers.
    ///
    /// Fails unless both buffers have the same length and that length is a multiple of 3.
    pub fn new(positions: Vec<f32>, colors: Vec<f32>) -> Result<Self, PlyError> {
        if positions.len() != colors.len() || positions.len() % 3 != 0 {
            return Err(PlyError::MisalignedBuffers {
                positions: positions.len(),
                colors: colors.len(),
            });
        }
        Ok(Self { positions, colors })
    }

    /// Create an empty point cloud with room for `num_points` points.
    pub fn with_capacity(num_points: usize) -> Self {
        Self {
            positions: Vec::with_capacity(num_points * 3),
            colors: Vec::with_capacity(num_points * 3),
        }
    }

    /// Append one point.
    pub fn push(&mut self, position: Vec3, color: [f32; 3]) {
        self.positions.extend_from_slice(&position.to_array());
        self.colors.extend_from_slice(&color);
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Get as reference the flat xyz buffer.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Get as reference the flat rgb buffer.
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    /// Position of point `index`.
    pub fn point(&self, index: usize) -> Option<Vec3> {
        triplet(&self.positions, index).map(Vec3::from_slice)
    }

    /// Color of point `index`.
    pub fn color(&self, index: usize) -> Option<[f32; 3]> {
        triplet(&self.colors, index).map(|c| [c[0], c[1], c[2]])
    }

    /// Consume the point cloud and return the position and color buffers.
    pub fn into_parts(self) -> (Vec<f32>, Vec<f32>) {
        (self.positions, self.colors)
    }

    /// Get the minimum bound of the point cloud.
    pub fn min_bound(&self) -> Vec3 {
        self.positions
            .chunks_exact(3)
            .map(Vec3::from_slice)
            .reduce(Vec3::min)
            .unwrap_or(Vec3::ZERO)
    }

    /// Get the maximum bound of the point cloud.
    pub fn max_bound(&self) -> Vec3 {
        self.positions
            .chunks_exact(3)
            .map(Vec3::from_slice)
            .reduce(Vec3::max)
            .unwrap_or(Vec3::ZERO)
    }
}

// the `index`-th group of three values, `None` past the end or on overflow
fn triplet(buffer: &[f32], index: usize) -> Option<&[f32]> {
    let start = index.checked_mul(3)?;
    buffer.get(start..start.checked_add(3)?)
}
