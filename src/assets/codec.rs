//! Decoders run on the asset runtime's blocking pool.

use glam::{Quat, Vec3};

use super::model::{ModelAsset, ModelNode};
use crate::resources::geometry::{Geometry, Vertex};
use crate::resources::material::{Material, Side, StandardMaterial};
use crate::resources::mesh::Mesh;
use crate::resources::texture::EnvironmentMap;
use crate::scene::Transform;

/// Bytes -> model. Errors are human-readable causes.
pub trait ModelCodec: Send + Sync {
    fn decode(&self, bytes: &[u8], name: &str) -> Result<ModelAsset, String>;
}

/// Bytes -> equirectangular environment map.
pub trait EnvironmentCodec: Send + Sync {
    fn decode(&self, bytes: &[u8], name: &str) -> Result<EnvironmentMap, String>;
}

// ============================================================================
// glTF
// ============================================================================

/// Binary glTF, or glTF JSON with embedded (data URI) buffers.
#[derive(Debug, Default, Clone, Copy)]
pub struct GltfCodec;

impl ModelCodec for GltfCodec {
    fn decode(&self, bytes: &[u8], name: &str) -> Result<ModelAsset, String> {
        // Images are never sampled, so only the document and buffers are
        // resolved. Textures in formats `image` cannot read do not fail the load.
        let gltf::Gltf { document, blob } =
            gltf::Gltf::from_slice(bytes).map_err(|e| format!("invalid glTF: {e}"))?;
        let buffers = gltf::import_buffers(&document, None, blob)
            .map_err(|e| format!("{name}: unresolved glTF buffer: {e}"))?;

        let mut model = ModelAsset::new(name);

        for node in document.nodes() {
            let (t, r, s) = node.transform().decomposed();
            let mut transform = Transform::new();
            transform.position = Vec3::from_array(t);
            transform.rotation = Quat::from_array(r);
            transform.scale = Vec3::from_array(s);

            model.nodes.push(ModelNode {
                name: node
                    .name()
                    .map_or_else(|| format!("Node_{}", node.index()), str::to_string),
                transform,
                mesh: None,
                children: node.children().map(|c| c.index()).collect(),
            });
        }

        // Meshes: the first primitive lives on the node, further primitives
        // become identity-transformed children.
        for node in document.nodes() {
            let Some(mesh) = node.mesh() else {
                continue;
            };
            let mut primitives = Vec::new();
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    log::warn!("{name}: skipping non-triangle primitive in mesh {}", mesh.index());
                    continue;
                }
                let label = mesh.name().unwrap_or("gltf mesh");
                let geometry = read_geometry(&primitive, &buffers, label)?;
                primitives.push(Mesh::new(geometry, read_material(&primitive.material())));
            }

            let mut primitives = primitives.into_iter();
            if let Some(first) = primitives.next() {
                model.nodes[node.index()].mesh = Some(first);
            }
            for (i, extra) in primitives.enumerate() {
                let child = model.nodes.len();
                model.nodes.push(ModelNode {
                    name: format!("{}_primitive_{}", model.nodes[node.index()].name, i + 1),
                    transform: Transform::new(),
                    mesh: Some(extra),
                    children: Vec::new(),
                });
                model.nodes[node.index()].children.push(child);
            }
        }

        model.roots = match document.default_scene().or_else(|| document.scenes().next()) {
            Some(scene) => scene.nodes().map(|n| n.index()).collect(),
            None => {
                let mut is_child = vec![false; model.nodes.len()];
                for node in &model.nodes {
                    for &c in &node.children {
                        if let Some(flag) = is_child.get_mut(c) {
                            *flag = true;
                        }
                    }
                }
                (0..document.nodes().len()).filter(|&i| !is_child[i]).collect()
            }
        };

        if model.mesh_count() == 0 {
            return Err("glTF contains no triangle meshes".to_string());
        }

        log::debug!(
            "{name}: decoded {} node(s), {} mesh(es)",
            model.nodes.len(),
            model.mesh_count()
        );
        Ok(model)
    }
}

fn read_geometry(
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
    label: &str,
) -> Result<Geometry, String> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .map(Iterator::collect)
        .ok_or_else(|| format!("{label}: primitive without positions"))?;
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(Iterator::collect);
    let uvs: Option<Vec<[f32; 2]>> = reader.read_tex_coords(0).map(|tc| tc.into_f32().collect());

    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            Vertex::new(
                p,
                normals.as_ref().and_then(|n| n.get(i)).copied().unwrap_or([0.0, 1.0, 0.0]),
                uvs.as_ref().and_then(|u| u.get(i)).copied().unwrap_or([0.0, 0.0]),
            )
        })
        .collect();

    let mut geometry = match reader.read_indices() {
        Some(indices) => Geometry::new(label, vertices, indices.into_u32().collect()),
        None => Geometry::non_indexed(label, vertices),
    };
    if normals.is_none() {
        geometry.compute_vertex_normals();
    }
    Ok(geometry)
}

fn read_material(material: &gltf::Material<'_>) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();
    let standard = StandardMaterial {
        color: Vec3::new(r, g, b),
        roughness: pbr.roughness_factor(),
        metalness: pbr.metallic_factor(),
        side: if material.double_sided() {
            Side::Double
        } else {
            Side::Front
        },
    };

    let material_out = Material::standard(standard);
    match material.name() {
        Some(name) => material_out.with_name(name),
        None => material_out,
    }
}

// ============================================================================
// Equirectangular images
// ============================================================================

/// Radiance HDR, PNG or JPEG panoramas.
///
/// Only Radiance HDR keeps values above 1.0. JPEG and PNG decode to their
/// SDR pixels; an UltraHDR gain map inside a JPEG is not applied, so such an
/// environment lights the scene with its base layer clamped to [0, 1].
#[derive(Debug, Default, Clone, Copy)]
pub struct EquirectCodec;

impl EnvironmentCodec for EquirectCodec {
    fn decode(&self, bytes: &[u8], name: &str) -> Result<EnvironmentMap, String> {
        let img = image::load_from_memory(bytes).map_err(|e| format!("failed to decode image: {e}"))?;
        let (width, height) = (img.width(), img.height());
        let rgb32f = img.into_rgb32f();

        EnvironmentMap::from_rgb_f32(name, width, height, rgb32f.as_raw())
            .ok_or_else(|| format!("unexpected pixel count for {width}x{height} image"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(image: image::DynamicImage, format: image::ImageFormat) -> Vec<u8> {
        let mut bytes = std::io::Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    fn max_texel(map: &EnvironmentMap) -> f32 {
        map.texels().iter().map(|t| t.to_f32()).fold(0.0, f32::max)
    }

    #[test]
    fn radiance_hdr_keeps_values_above_one() {
        let hdr = image::Rgb32FImage::from_pixel(4, 2, image::Rgb([4.0, 2.0, 0.5]));
        let bytes = encoded(hdr.into(), image::ImageFormat::Hdr);
        let map = EquirectCodec.decode(&bytes, "studio.hdr").unwrap();
        assert!(max_texel(&map) > 3.5);
    }

    #[test]
    fn jpeg_decodes_to_its_sdr_base_layer() {
        let jpeg = image::RgbImage::from_pixel(8, 4, image::Rgb([255, 255, 255]));
        let bytes = encoded(jpeg.into(), image::ImageFormat::Jpeg);
        let map = EquirectCodec.decode(&bytes, "studio.jpg").unwrap();
        assert!(max_texel(&map) <= 1.0);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(GltfCodec.decode(b"not a gltf", "x").is_err());
        assert!(EquirectCodec.decode(b"not an image", "x").is_err());
    }
}
