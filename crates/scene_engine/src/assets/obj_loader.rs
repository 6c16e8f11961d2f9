//! OBJ loader for dynamic mesh assets
//!
//! Only geometry matters here: `v` positions and `f` faces. Normals and
//! texture coordinates are skipped. Polygons are fan-triangulated. When a
//! file holds several objects only the first one (up to the second `o`
//! statement) is loaded.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::foundation::math::Vec3;

use super::{AssetError, MeshAssetSource, MeshData};

/// Wavefront OBJ parser
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file from disk
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<MeshData, AssetError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::parse(BufReader::new(file), &path.display().to_string())
    }

    /// Parse OBJ text; `name` is only used in error messages
    pub fn parse<R: BufRead>(reader: R, name: &str) -> Result<MeshData, AssetError> {
        let mut positions: Vec<Vec3> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        let mut objects_seen = 0;

        for (line_index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_number = line_index + 1;
            let mut parts = line.split_whitespace();

            match parts.next() {
                Some("o") => {
                    objects_seen += 1;
                    if objects_seen > 1 {
                        break;
                    }
                }
                Some("v") => {
                    let mut coord = |axis: &str| -> Result<f32, AssetError> {
                        parts
                            .next()
                            .and_then(|value| value.parse().ok())
                            .ok_or_else(|| AssetError::Parse {
                                line: line_number,
                                message: format!("Invalid vertex {}", axis),
                            })
                    };
                    let x = coord("x")?;
                    let y = coord("y")?;
                    let z = coord("z")?;
                    positions.push(Vec3::new(x, y, z));
                }
                Some("f") => {
                    let face = parts
                        .map(|vertex| resolve_index(vertex, positions.len(), line_number))
                        .collect::<Result<Vec<u32>, AssetError>>()?;

                    if face.len() < 3 {
                        return Err(AssetError::InvalidFormat(format!(
                            "Face with {} vertices on line {}",
                            face.len(),
                            line_number
                        )));
                    }

                    // Fan triangulation
                    for i in 1..face.len() - 1 {
                        indices.extend_from_slice(&[face[0], face[i], face[i + 1]]);
                    }
                }
                _ => {}
            }
        }

        if indices.is_empty() {
            return Err(AssetError::EmptyMesh(name.to_string()));
        }

        log::debug!(
            "Loaded OBJ '{}': {} vertices, {} triangles",
            name,
            positions.len(),
            indices.len() / 3
        );
        Ok(MeshData::new(positions, indices))
    }
}

/// Resolve the position part of a face vertex (`7`, `7/2`, `7//3`, `-1`)
/// to a 0-based index
fn resolve_index(vertex: &str, position_count: usize, line: usize) -> Result<u32, AssetError> {
    let raw = vertex.split('/').next().unwrap_or_default();
    let index: i64 = raw.parse().map_err(|_| AssetError::Parse {
        line,
        message: format!("Invalid position index '{}'", raw),
    })?;

    // OBJ indices are 1-based; negative ones count back from the latest vertex
    let resolved = if index > 0 {
        index - 1
    } else {
        position_count as i64 + index
    };

    if index == 0 || resolved < 0 || resolved >= position_count as i64 {
        return Err(AssetError::InvalidFormat(format!(
            "Position index {} out of bounds on line {}",
            index, line
        )));
    }
    Ok(resolved as u32)
}

/// Filesystem asset source: asset ids are paths relative to a root directory
#[derive(Debug, Clone)]
pub struct ObjAssetSource {
    root: PathBuf,
}

impl ObjAssetSource {
    /// Create a source rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MeshAssetSource for ObjAssetSource {
    fn load(&self, asset_id: &str) -> Result<MeshData, AssetError> {
        let path = self.root.join(asset_id);
        if !path.is_file() {
            return Err(AssetError::NotFound(asset_id.to_string()));
        }
        ObjLoader::load_obj(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const QUAD: &str = "\
# a quad
o Quad
v 0 0 0
v 2 0 0
v 2 1 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1 4//1
";

    fn parse(text: &str) -> Result<MeshData, AssetError> {
        ObjLoader::parse(Cursor::new(text), "test.obj")
    }

    #[test]
    fn test_quad_is_fan_triangulated() {
        let mesh = parse(QUAD).unwrap();
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.bounds.max, Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_negative_indices() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n").unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_only_first_object_is_loaded() {
        let text = format!("{}o Second\nv 5 5 5\nv 6 5 5\nv 5 6 5\nf 5 6 7\n", QUAD);
        let mesh = parse(&text).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse("v 0 0 0\nf 1 2 3\n"), Err(AssetError::InvalidFormat(_))));
        assert!(matches!(parse("v 0 zero 0\n"), Err(AssetError::Parse { line: 1, .. })));
        assert!(matches!(parse("# nothing\nv 0 0 0\n"), Err(AssetError::EmptyMesh(_))));
        assert!(matches!(parse("v 0 0 0\nv 1 0 0\nf 1 2\n"), Err(AssetError::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let source = ObjAssetSource::new(std::env::temp_dir().join("scene_engine_missing_assets"));
        assert!(matches!(source.load("nope.obj"), Err(AssetError::NotFound(_))));
    }

    #[test]
    fn test_source_loads_from_disk() {
        let dir = std::env::temp_dir().join(format!("scene_engine_obj_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("quad.obj"), QUAD).unwrap();

        let mesh = ObjAssetSource::new(&dir).load("quad.obj").unwrap();
        assert_eq!(mesh.triangle_count(), 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
