//! Loads one character asset headlessly and prints what the explorer would
//! see: hierarchy, meshes, clips, normalization and keyframe estimate.
//!
//! ```text
//! clip_probe <file-or-url> [glb|fbx]
//! ```

use anyhow::{Context, Result, anyhow, bail};
use env_logger::Env;
use playback::normalize::AnchorKind;
use playback::{AssetFormat, AssetLoader, AssetRequest, estimate_keyframes, source_for_root};
use viewer::infra::assets::resolver::split_asset_target;

fn parse_format(raw: &str) -> Result<AssetFormat> {
    match raw.to_ascii_lowercase().as_str() {
        "glb" | "gltf" => Ok(AssetFormat::Glb),
        "fbx" => Ok(AssetFormat::Fbx),
        other => bail!("unknown format '{other}', expected glb or fbx"),
    }
}

fn main() -> Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let mut args = std::env::args().skip(1);
    let target = args
        .next()
        .ok_or_else(|| anyhow!("usage: clip_probe <file-or-url> [glb|fbx]"))?;
    let format = match args.next() {
        Some(raw) => parse_format(&raw)?,
        None => AssetFormat::from_path(&target)
            .with_context(|| format!("cannot tell the format of '{target}'; pass glb or fbx"))?,
    };

    let (root, path) = split_asset_target(&target);
    let source = source_for_root(&root).with_context(|| format!("cannot serve '{root}'"))?;
    let loader = AssetLoader::new(source);
    log::info!("Loading '{}' from '{}' as {:?}", path, root, format);
    let normalized = loader
        .load_normalized(&AssetRequest::new(path, format))
        .with_context(|| format!("failed to load '{target}'"))?;

    let model = &normalized.model;
    let scene = model.scene();
    println!("asset      {target} ({format:?})");
    println!(
        "nodes      {} ({} joints)",
        scene.nodes.len(),
        scene.nodes.iter().filter(|node| node.is_joint).count()
    );
    for mesh in &scene.meshes {
        println!(
            "mesh       {}: {} vertices, {} triangles, {} joints",
            mesh.name,
            mesh.vertex_count(),
            mesh.triangle_count(),
            mesh.joints.len()
        );
    }

    let anchor = match normalized.transform.anchor {
        AnchorKind::Joint(index) => format!("joint '{}'", scene.nodes[index].name),
        AnchorKind::Bounds => "bounds".to_string(),
    };
    println!(
        "normalize  scale {:.4}, translation {:?}, anchor {anchor}",
        normalized.transform.scale, normalized.transform.translation
    );

    if model.clips().is_empty() {
        println!("clips      none");
    }
    for clip in model.clips() {
        let estimate = estimate_keyframes(clip);
        println!(
            "clip       '{}': {:.3} s, {} tracks, {} keyframes{}",
            clip.name,
            clip.duration,
            clip.tracks.len(),
            estimate.keyframes,
            if estimate.fallback_used {
                " (duration estimate)"
            } else {
                ""
            }
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!(parse_format("GLB").unwrap(), AssetFormat::Glb);
        assert_eq!(parse_format("fbx").unwrap(), AssetFormat::Fbx);
        assert!(parse_format("obj").is_err());
    }
}
