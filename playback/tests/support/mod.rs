//! Synthetic glTF characters with an embedded base64 buffer.

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

/// Distance the hips travel along +Z over the clip.
pub const HIPS_TRAVEL: f32 = 2.0;

#[derive(Default)]
struct BufferBuilder {
    bytes: Vec<u8>,
    views: Vec<Value>,
}

impl BufferBuilder {
    fn push(&mut self, data: &[u8]) -> usize {
        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(data);
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": data.len(),
        }));
        self.views.len() - 1
    }
}

fn floats(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn shorts(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// A triangle skinned to `hips_name`, parented under an `Armature` node.
///
/// The hips rest at (0, 1, 0) and translate along +Z by [`HIPS_TRAVEL`] over
/// `keys` evenly spaced keyframes spanning `duration` seconds.
pub fn skinned_triangle_gltf(hips_name: &str, duration: f32, keys: usize) -> Vec<u8> {
    let keys = keys.max(2);
    let times: Vec<f32> = (0..keys)
        .map(|i| i as f32 / (keys - 1) as f32 * duration)
        .collect();
    skinned_triangle_with_key_times(hips_name, &times)
}

/// Same triangle, animated at the given key times verbatim.
pub fn skinned_triangle_with_key_times(hips_name: &str, times: &[f32]) -> Vec<u8> {
    let keys = times.len();
    let duration = times
        .iter()
        .copied()
        .filter(|t| t.is_finite())
        .fold(0.0f32, f32::max);
    let mut buffer = BufferBuilder::default();

    let positions = buffer.push(&floats(&[-0.5, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 2.0, 0.0]));
    let joints = buffer.push(&shorts(&[0; 12]));
    let weights = buffer.push(&floats(&[
        1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0,
    ]));
    let indices = buffer.push(&shorts(&[0, 1, 2]));
    #[rustfmt::skip]
    let inverse_bind = buffer.push(&floats(&[
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, -1.0, 0.0, 1.0,
    ]));
    let translations: Vec<f32> = (0..keys)
        .flat_map(|i| [0.0, 1.0, i as f32 / (keys - 1).max(1) as f32 * HIPS_TRAVEL])
        .collect();
    let input = buffer.push(&floats(times));
    let output = buffer.push(&floats(&translations));

    let uri = format!(
        "data:application/octet-stream;base64,{}",
        STANDARD.encode(&buffer.bytes)
    );
    let document = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 2] }],
        "nodes": [
            { "name": "Armature", "children": [1] },
            { "name": hips_name, "translation": [0.0, 1.0, 0.0] },
            { "name": "Body", "mesh": 0, "skin": 0 },
        ],
        "meshes": [{
            "name": "Body",
            "primitives": [{
                "attributes": { "POSITION": 0, "JOINTS_0": 1, "WEIGHTS_0": 2 },
                "indices": 3,
            }],
        }],
        "skins": [{ "joints": [1], "inverseBindMatrices": 4 }],
        "animations": [{
            "name": "Walk",
            "samplers": [{ "input": 5, "output": 6, "interpolation": "LINEAR" }],
            "channels": [{ "sampler": 0, "target": { "node": 1, "path": "translation" } }],
        }],
        "accessors": [
            {
                "bufferView": positions, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [-0.5, 0.0, 0.0], "max": [0.5, 2.0, 0.0],
            },
            { "bufferView": joints, "componentType": 5123, "count": 3, "type": "VEC4" },
            { "bufferView": weights, "componentType": 5126, "count": 3, "type": "VEC4" },
            { "bufferView": indices, "componentType": 5123, "count": 3, "type": "SCALAR" },
            { "bufferView": inverse_bind, "componentType": 5126, "count": 1, "type": "MAT4" },
            {
                "bufferView": input, "componentType": 5126, "count": keys, "type": "SCALAR",
                "min": [0.0], "max": [duration],
            },
            { "bufferView": output, "componentType": 5126, "count": keys, "type": "VEC3" },
        ],
        "bufferViews": buffer.views,
        "buffers": [{ "byteLength": buffer.bytes.len(), "uri": uri }],
    });
    serde_json::to_vec(&document).expect("glTF document serializes")
}
