use std::io::{BufRead, BufReader};
use std::path::Path;

use glam::{Mat4, Vec3};
use nerfdata_camera::transforms::apply_homogeneous;

use super::{PlyError, PlyHeader, PlyReader, PlyRecord, PlyValue, PointCloud};

/// Name of the element holding the points.
pub const VERTEX_ELEMENT: &str = "vertex";

// caps the up-front allocation when a header declares a huge vertex count
const MAX_PREALLOCATED_POINTS: usize = 1 << 20;

/// Where the position and color properties sit in a vertex record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Index of the vertex element in the header.
    pub element: usize,
    /// Number of vertex records declared.
    pub count: usize,
    /// Property indices of `x`, `y`, `z`.
    pub position: [usize; 3],
    /// Property indices of `red`, `green`, `blue`.
    pub color: [usize; 3],
}

impl VertexLayout {
    /// Locate the vertex element and its position/color properties.
    ///
    /// Returns `Ok(None)` when the file has no vertex element, and
    /// [`PlyError::MissingVertexFields`] when the vertex element lacks any of
    /// `x`, `y`, `z`, `red`, `green`, `blue`.
    pub fn from_header(header: &PlyHeader) -> Result<Option<Self>, PlyError> {
        let Some((element, vertex)) = header.element(VERTEX_ELEMENT) else {
            return Ok(None);
        };

        let index = |name: &str| vertex.property_index(name).ok_or(PlyError::MissingVertexFields);

        Ok(Some(Self {
            element,
            count: vertex.count,
            position: [index("x")?, index("y")?, index("z")?],
            color: [index("red")?, index("green")?, index("blue")?],
        }))
    }
}

fn scalar_at(record: &PlyRecord, index: usize) -> Result<f32, PlyError> {
    match record.values.get(index) {
        Some(PlyValue::Scalar(value)) => Ok(value.as_f32()),
        _ => Err(PlyError::InvalidValue(format!(
            "vertex property {index} is not a scalar"
        ))),
    }
}

fn normalized_at(record: &PlyRecord, index: usize) -> Result<f32, PlyError> {
    match record.values.get(index) {
        Some(PlyValue::Scalar(value)) => Ok(value.as_normalized_f32()),
        _ => Err(PlyError::InvalidValue(format!(
            "vertex property {index} is not a scalar"
        ))),
    }
}

/// Extract vertex positions and colors from an open PLY reader.
///
/// Records of other elements are read and discarded. Positions are transformed with
/// [`apply_homogeneous`] when `transform` is given and is not the identity. Colors stored
/// as 8-bit integers are normalized to `0..1`.
///
/// # Arguments
///
/// * `reader` - A reader whose header has been parsed.
/// * `transform` - Optional transform applied to every position.
///
/// # Returns
///
/// The points in record order.
pub fn extract_points<R: BufRead>(
    reader: PlyReader<R>,
    transform: Option<&Mat4>,
) -> Result<PointCloud, PlyError> {
    // fail on the schema before touching the body
    let Some(layout) = VertexLayout::from_header(reader.header())? else {
        log::warn!("ply file has no {VERTEX_ELEMENT} element, no points read");
        return Ok(PointCloud::default());
    };

    let transform = transform.filter(|m| **m != Mat4::IDENTITY);
    let mut pointcloud = PointCloud::with_capacity(layout.count.min(MAX_PREALLOCATED_POINTS));

    for record in reader {
        let record = record?;
        if record.element != layout.element {
            continue;
        }

        let [ix, iy, iz] = layout.position;
        let [ir, ig, ib] = layout.color;

        let mut position = Vec3::new(
            scalar_at(&record, ix)?,
            scalar_at(&record, iy)?,
            scalar_at(&record, iz)?,
        );
        if let Some(transform) = transform {
            position = apply_homogeneous(transform, position);
        }

        let color = [
            normalized_at(&record, ir)?,
            normalized_at(&record, ig)?,
            normalized_at(&record, ib)?,
        ];

        pointcloud.push(position, color);
    }

    Ok(pointcloud)
}

/// Read the vertex positions and colors of a PLY file.
///
/// The file may be ASCII or binary of either endianness. See [`extract_points`] for how
/// records are turned into points.
///
/// Example:
///
/// ```no_run
/// use nerfdata_ply::read_ply_points;
///
/// let pointcloud = read_ply_points("sparse_pc.ply", None).unwrap();
/// println!("{} points", pointcloud.len());
/// ```
pub fn read_ply_points(
    path: impl AsRef<Path>,
    transform: Option<&Mat4>,
) -> Result<PointCloud, PlyError> {
    let file = std::fs::File::open(path.as_ref())?;
    let reader = PlyReader::new(BufReader::new(file))?;
    let pointcloud = extract_points(reader, transform)?;
    log::debug!(
        "read {} points from {}",
        pointcloud.len(),
        path.as_ref().display()
    );
    Ok(pointcloud)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const XYZ_RGB_HEADER: &str = "ply\nformat binary_little_endian 1.0\nelement vertex 2\nproperty float x\nproperty float y\nproperty float z\nproperty uchar red\nproperty uchar green\nproperty uchar blue\nend_header\n";

    fn write_binary_xyz_rgb(file: &mut NamedTempFile) -> std::io::Result<()> {
        file.write_all(XYZ_RGB_HEADER.as_bytes())?;
        let mut data = Vec::new();
        for (xyz, rgb) in [([1.0f32, 2.0, 3.0], [255u8, 128, 0]), ([-1.0, 0.5, 4.0], [0, 0, 51])] {
            for v in xyz {
                data.extend_from_slice(&v.to_le_bytes());
            }
            data.extend_from_slice(&rgb);
        }
        file.write_all(&data)
    }

    #[test]
    fn test_read_binary_points() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        write_binary_xyz_rgb(&mut file)?;

        let pointcloud = read_ply_points(file.path(), None)?;
        assert_eq!(pointcloud.len(), 2);
        assert_eq!(pointcloud.positions().len(), 6);
        assert_eq!(pointcloud.colors().len(), 6);
        assert_eq!(pointcloud.positions(), &[1.0, 2.0, 3.0, -1.0, 0.5, 4.0]);
        let color = pointcloud.color(0).ok_or("missing color")?;
        assert_relative_eq!(color[0], 1.0);
        assert_relative_eq!(color[1], 128.0 / 255.0);
        assert_relative_eq!(color[2], 0.0);
        let color = pointcloud.color(1).ok_or("missing color")?;
        assert_relative_eq!(color[2], 0.2);
        Ok(())
    }

    #[test]
    fn test_read_ascii_points_with_faces_and_extra_properties() -> Result<(), PlyError> {
        let text = "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\nproperty float z\nproperty float nx\nproperty uchar red\nproperty uchar green\nproperty uchar blue\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n0 0 0 1 255 0 0\n1 0 0 1 0 255 0\n0 1 0 1 0 0 255\n3 0 1 2\n";
        let pointcloud = extract_points(PlyReader::new(text.as_bytes())?, None)?;
        assert_eq!(pointcloud.len(), 3);
        assert_eq!(pointcloud.point(1), Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(pointcloud.color(0), Some([1.0, 0.0, 0.0]));
        assert_eq!(pointcloud.color(2), Some([0.0, 0.0, 1.0]));
        Ok(())
    }

    #[test]
    fn test_vertex_after_other_element() -> Result<(), PlyError> {
        let text = "ply\nformat ascii 1.0\nelement camera 1\nproperty float fov\nelement vertex 1\nproperty uchar red\nproperty uchar green\nproperty uchar blue\nproperty double z\nproperty double y\nproperty double x\nend_header\n60\n10 20 30 3 2 1\n";
        let pointcloud = extract_points(PlyReader::new(text.as_bytes())?, None)?;
        assert_eq!(pointcloud.len(), 1);
        assert_eq!(pointcloud.point(0), Some(Vec3::new(1.0, 2.0, 3.0)));
        Ok(())
    }

    #[test]
    fn test_float_colors_pass_through() -> Result<(), PlyError> {
        let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nproperty float red\nproperty float green\nproperty float blue\nend_header\n0 0 0 0.25 0.5 0.75\n";
        let pointcloud = extract_points(PlyReader::new(text.as_bytes())?, None)?;
        assert_eq!(pointcloud.colors(), &[0.25, 0.5, 0.75]);
        Ok(())
    }

    #[test]
    fn test_missing_blue_fails_before_reading() -> Result<(), PlyError> {
        let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nproperty uchar red\nproperty uchar green\nend_header\n0 0 0 1 2\n";
        let result = extract_points(PlyReader::new(text.as_bytes())?, None);
        assert!(matches!(result, Err(PlyError::MissingVertexFields)));
        assert_eq!(
            PlyError::MissingVertexFields.to_string(),
            "missing x/y/z/red/green/blue"
        );
        Ok(())
    }

    #[test]
    fn test_undeclared_column_fails() -> Result<(), PlyError> {
        let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nproperty uchar red\nproperty uchar green\nproperty uchar blue\nend_header\n1 2 3 9 255 0 0\n";
        let result = extract_points(PlyReader::new(text.as_bytes())?, None);
        assert!(matches!(result, Err(PlyError::InvalidValue(_))));
        Ok(())
    }

    #[test]
    fn test_property_names_are_case_sensitive() -> Result<(), PlyError> {
        let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float X\nproperty float y\nproperty float z\nproperty uchar red\nproperty uchar green\nproperty uchar blue\nend_header\n0 0 0 1 2 3\n";
        let result = extract_points(PlyReader::new(text.as_bytes())?, None);
        assert!(matches!(result, Err(PlyError::MissingVertexFields)));
        Ok(())
    }

    #[test]
    fn test_no_vertex_element_gives_empty_cloud() -> Result<(), PlyError> {
        let text = "ply\nformat ascii 1.0\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n3 0 1 2\n";
        let pointcloud = extract_points(PlyReader::new(text.as_bytes())?, None)?;
        assert!(pointcloud.is_empty());
        Ok(())
    }

    #[test]
    fn test_transform_is_applied() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        write_binary_xyz_rgb(&mut file)?;

        let transform = Mat4::from_translation(Vec3::new(10.0, 0.0, -1.0));
        let pointcloud = read_ply_points(file.path(), Some(&transform))?;
        assert_eq!(pointcloud.point(0), Some(Vec3::new(11.0, 2.0, 2.0)));
        assert_eq!(pointcloud.point(1), Some(Vec3::new(9.0, 0.5, 3.0)));
        // colors are untouched by the transform
        assert_eq!(pointcloud.color(0).map(|c| c[0]), Some(1.0));

        let identity = read_ply_points(file.path(), Some(&Mat4::IDENTITY))?;
        assert_eq!(identity, read_ply_points(file.path(), None)?);
        Ok(())
    }

    #[test]
    fn test_truncated_body_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        file.write_all(XYZ_RGB_HEADER.as_bytes())?;
        file.write_all(&1.0f32.to_le_bytes())?;

        let result = read_ply_points(file.path(), None);
        assert!(matches!(result, Err(PlyError::Io(_))));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let result = read_ply_points("/nonexistent/points.ply", None);
        assert!(matches!(result, Err(PlyError::Io(_))));
    }
}
