//! Model scene conversion.
//!
//! A mod supplies a glTF scene; the pipeline converts it into native mesh,
//! material and prefab objects. The conversion goes through an intermediate
//! [`SceneData`] graph so the object builders are independent of the source
//! format.

use crate::media::MediaError;
use camino::Utf8Path;
use forge_bundle::aligned;

/// Index range of one primitive within a merged mesh index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubMesh {
    pub index_start: u32,
    pub index_count: u32,
    /// Index into [`SceneData::materials`], or `-1`.
    pub material: i32,
}

/// One mesh with all primitives merged into shared buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// Zero-filled when the source has no normals.
    pub normals: Vec<[f32; 3]>,
    /// Zero-filled when the source has no texture coordinates.
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubMesh>,
}

/// PBR material factors.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
}

/// One node of the scene hierarchy, flattened depth-first.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub name: String,
    /// Index of the parent node, or `-1` for roots.
    pub parent: i32,
    /// Index into [`SceneData::meshes`], or `-1`.
    pub mesh: i32,
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

/// Intermediate scene graph between the source format and object builders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneData {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
    pub nodes: Vec<NodeData>,
}

/// Parse a glTF/GLB scene into [`SceneData`].
pub fn load_scene(path: &Utf8Path) -> Result<SceneData, MediaError> {
    let (document, buffers, _images) = gltf::import(path.as_std_path())?;

    let materials: Vec<MaterialData> = document
        .materials()
        .enumerate()
        .map(|(i, material)| {
            let pbr = material.pbr_metallic_roughness();
            MaterialData {
                name: material
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("material_{i}")),
                base_color: pbr.base_color_factor(),
                metallic: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
            }
        })
        .collect();

    let mut meshes = Vec::new();
    for (i, mesh) in document.meshes().enumerate() {
        let name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{i}"));

        let mut data = MeshData {
            name,
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
            submeshes: Vec::new(),
        };

        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()][..]));

            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let vertex_base = data.positions.len() as u32;
            let positions: Vec<[f32; 3]> = positions.collect();
            let vertex_count = positions.len();
            data.positions.extend(positions);

            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|n| n.collect())
                .unwrap_or_default();
            data.normals.extend(pad_to(normals, vertex_count, [0.0; 3]));

            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|t| t.into_f32().collect())
                .unwrap_or_default();
            data.uvs.extend(pad_to(uvs, vertex_count, [0.0; 2]));

            let indices: Vec<u32> = reader
                .read_indices()
                .map(|i| i.into_u32().collect())
                .unwrap_or_else(|| (0..vertex_count as u32).collect());

            let index_start = data.indices.len() as u32;
            data.submeshes.push(SubMesh {
                index_start,
                index_count: indices.len() as u32,
                material: primitive
                    .material()
                    .index()
                    .map(|m| m as i32)
                    .unwrap_or(-1),
            });
            data.indices.extend(indices.iter().map(|i| i + vertex_base));
        }

        if !data.positions.is_empty() {
            meshes.push(data);
        }
    }

    if meshes.is_empty() {
        return Err(MediaError::EmptyScene);
    }

    let mut nodes = Vec::new();
    let scene = document.default_scene().or_else(|| document.scenes().next());
    if let Some(scene) = scene {
        for root in scene.nodes() {
            flatten_node(&root, -1, &mut nodes);
        }
    }

    Ok(SceneData {
        meshes,
        materials,
        nodes,
    })
}

fn pad_to<T: Copy>(mut values: Vec<T>, len: usize, fill: T) -> Vec<T> {
    values.truncate(len);
    values.resize(len, fill);
    values
}

fn flatten_node(node: &gltf::Node, parent: i32, out: &mut Vec<NodeData>) {
    let index = out.len() as i32;
    let (translation, rotation, scale) = node.transform().decomposed();

    out.push(NodeData {
        name: node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node_{index}")),
        parent,
        mesh: node.mesh().map(|m| m.index() as i32).unwrap_or(-1),
        translation,
        rotation,
        scale,
    });

    for child in node.children() {
        flatten_node(&child, index, out);
    }
}

/// Serialize a native mesh object.
///
/// Layout: `m_Name` aligned string, vertex count `u32`, index count `u32`,
/// submesh count `u32`, positions, normals, uvs (all `f32`), indices
/// (`u32`), then per submesh `index_start u32, index_count u32,
/// material_slot i32`.
pub fn build_mesh_object(mesh: &MeshData) -> Vec<u8> {
    let mut out = aligned::encode(&mesh.name);
    out.extend_from_slice(&(mesh.positions.len() as u32).to_le_bytes());
    out.extend_from_slice(&(mesh.indices.len() as u32).to_le_bytes());
    out.extend_from_slice(&(mesh.submeshes.len() as u32).to_le_bytes());

    for p in &mesh.positions {
        for v in p {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    for n in &mesh.normals {
        for v in n {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    for uv in &mesh.uvs {
        for v in uv {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    for index in &mesh.indices {
        out.extend_from_slice(&index.to_le_bytes());
    }
    for submesh in &mesh.submeshes {
        out.extend_from_slice(&submesh.index_start.to_le_bytes());
        out.extend_from_slice(&submesh.index_count.to_le_bytes());
        out.extend_from_slice(&submesh.material.to_le_bytes());
    }
    out
}

/// Serialize a native material object.
///
/// Layout: `m_Name` aligned string, base color (4 `f32`), metallic `f32`,
/// roughness `f32`, main texture object id `i64` (always 0 here — scene
/// textures are not imported).
pub fn build_material_object(material: &MaterialData) -> Vec<u8> {
    let mut out = aligned::encode(&material.name);
    for v in &material.base_color {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out.extend_from_slice(&material.metallic.to_le_bytes());
    out.extend_from_slice(&material.roughness.to_le_bytes());
    out.extend_from_slice(&0i64.to_le_bytes());
    out
}

/// Serialize a prefab object wiring the node hierarchy to staged meshes
/// and materials.
///
/// Layout: `m_Name` aligned string, material count `u32` + material object
/// ids (`i64`), node count `u32`, then per node: name aligned string,
/// parent `i32`, mesh object id `i64` (0 for none), translation (3 `f32`),
/// rotation (4 `f32`), scale (3 `f32`).
pub fn build_prefab_object(
    name: &str,
    nodes: &[NodeData],
    mesh_ids: &[i64],
    material_ids: &[i64],
) -> Vec<u8> {
    let mut out = aligned::encode(name);

    out.extend_from_slice(&(material_ids.len() as u32).to_le_bytes());
    for id in material_ids {
        out.extend_from_slice(&id.to_le_bytes());
    }

    out.extend_from_slice(&(nodes.len() as u32).to_le_bytes());
    for node in nodes {
        out.extend_from_slice(&aligned::encode(&node.name));
        out.extend_from_slice(&node.parent.to_le_bytes());
        let mesh_id = if node.mesh >= 0 {
            mesh_ids.get(node.mesh as usize).copied().unwrap_or(0)
        } else {
            0
        };
        out.extend_from_slice(&mesh_id.to_le_bytes());
        for v in &node.translation {
            out.extend_from_slice(&v.to_le_bytes());
        }
        for v in &node.rotation {
            out.extend_from_slice(&v.to_le_bytes());
        }
        for v in &node.scale {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{ByteOrder, LE};
    use camino::Utf8PathBuf;

    /// Single-triangle glTF with an external buffer file.
    fn write_triangle_gltf(dir: &std::path::Path) -> Utf8PathBuf {
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let mut bin = Vec::new();
        for p in &positions {
            for v in p {
                bin.extend_from_slice(&v.to_le_bytes());
            }
        }
        std::fs::write(dir.join("tri.bin"), &bin).unwrap();

        let gltf = r#"{
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [{"mesh": 0, "name": "tri_node"}],
            "meshes": [{"name": "triangle", "primitives": [{"attributes": {"POSITION": 0}}]}],
            "buffers": [{"uri": "tri.bin", "byteLength": 36}],
            "bufferViews": [{"buffer": 0, "byteOffset": 0, "byteLength": 36}],
            "accessors": [{
                "bufferView": 0,
                "byteOffset": 0,
                "componentType": 5126,
                "count": 3,
                "type": "VEC3",
                "min": [0.0, 0.0, 0.0],
                "max": [1.0, 1.0, 0.0]
            }]
        }"#;
        let path = dir.join("tri.gltf");
        std::fs::write(&path, gltf).unwrap();
        Utf8PathBuf::from_path_buf(path).unwrap()
    }

    #[test]
    fn test_load_triangle_scene() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_triangle_gltf(dir.path());

        let scene = load_scene(&path).unwrap();
        assert_eq!(scene.meshes.len(), 1);

        let mesh = &scene.meshes[0];
        assert_eq!(mesh.name, "triangle");
        assert_eq!(mesh.positions.len(), 3);
        // No index accessor: sequential indices are generated.
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        // Missing attributes are zero-filled per vertex.
        assert_eq!(mesh.normals.len(), 3);
        assert_eq!(mesh.uvs.len(), 3);

        assert_eq!(scene.nodes.len(), 1);
        assert_eq!(scene.nodes[0].name, "tri_node");
        assert_eq!(scene.nodes[0].parent, -1);
        assert_eq!(scene.nodes[0].mesh, 0);
    }

    #[test]
    fn test_load_missing_file_is_err() {
        assert!(load_scene(Utf8Path::new("/nonexistent/scene.gltf")).is_err());
    }

    #[test]
    fn test_mesh_object_layout() {
        let mesh = MeshData {
            name: "quad".to_string(),
            positions: vec![[0.0; 3], [1.0, 0.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 2],
            uvs: vec![[0.0; 2]; 2],
            indices: vec![0, 1],
            submeshes: vec![SubMesh {
                index_start: 0,
                index_count: 2,
                material: -1,
            }],
        };
        let blob = build_mesh_object(&mesh);

        assert_eq!(aligned::read_string_at(&blob, 0).unwrap(), "quad");
        let base = aligned::aligned_size(4);
        assert_eq!(LE::read_u32(&blob[base..]), 2); // vertices
        assert_eq!(LE::read_u32(&blob[base + 4..]), 2); // indices
        assert_eq!(LE::read_u32(&blob[base + 8..]), 1); // submeshes

        // header + counts + 2*(3+3+2)*4 + 2*4 + 12
        assert_eq!(blob.len(), base + 12 + 64 + 8 + 12);
    }

    #[test]
    fn test_prefab_resolves_mesh_ids() {
        let nodes = vec![
            NodeData {
                name: "root".to_string(),
                parent: -1,
                mesh: -1,
                translation: [0.0; 3],
                rotation: [0.0, 0.0, 0.0, 1.0],
                scale: [1.0; 3],
            },
            NodeData {
                name: "body".to_string(),
                parent: 0,
                mesh: 0,
                translation: [0.0; 3],
                rotation: [0.0, 0.0, 0.0, 1.0],
                scale: [1.0; 3],
            },
        ];
        let blob = build_prefab_object("golem", &nodes, &[501], &[601]);

        assert_eq!(aligned::read_string_at(&blob, 0).unwrap(), "golem");
        let mut offset = aligned::aligned_size(5);
        assert_eq!(LE::read_u32(&blob[offset..]), 1); // material count
        assert_eq!(LE::read_i64(&blob[offset + 4..]), 601);
        offset += 12;
        assert_eq!(LE::read_u32(&blob[offset..]), 2); // node count
        offset += 4;

        // root node: name "root", parent -1, no mesh
        assert_eq!(aligned::read_string_at(&blob, offset).unwrap(), "root");
        offset += aligned::aligned_size(4);
        assert_eq!(LE::read_i32(&blob[offset..]), -1);
        assert_eq!(LE::read_i64(&blob[offset + 4..]), 0);
        offset += 4 + 8 + 40;

        // body node references the staged mesh id
        assert_eq!(aligned::read_string_at(&blob, offset).unwrap(), "body");
        offset += aligned::aligned_size(4);
        assert_eq!(LE::read_i32(&blob[offset..]), 0);
        assert_eq!(LE::read_i64(&blob[offset + 4..]), 501);
    }
}
