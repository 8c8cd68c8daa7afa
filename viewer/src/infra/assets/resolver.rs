use std::path::{Path, PathBuf};

use bevy::log::{info, warn};
use catalog::Catalog;
use playback::{AssetLoader, FsAssetSource, LoadError, source_for_root};
use std::sync::Arc;

pub fn default_asset_root_path() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../assets"))
}

/// Trims whitespace and trailing separators; backslashes become slashes.
pub fn normalize_asset_root(raw_root: &str) -> String {
    let normalized = raw_root.trim().replace('\\', "/");
    let trimmed = normalized.trim_end_matches('/');
    if trimmed.is_empty() {
        if normalized.starts_with('/') {
            return "/".to_string();
        }
        return ".".to_string();
    }
    trimmed.to_string()
}

pub fn build_asset_loader(raw_root: &str) -> Result<AssetLoader, LoadError> {
    let root = normalize_asset_root(raw_root);
    let source = source_for_root(&root)?;
    info!("Serving motion assets from '{}'", root);
    Ok(AssetLoader::new(source))
}

/// Falls back to the local asset directory when the configured root cannot
/// be served, so the explorer still opens and shows its grids.
pub fn asset_loader_or_local(raw_root: &str) -> AssetLoader {
    match build_asset_loader(raw_root) {
        Ok(loader) => loader,
        Err(error) => {
            let fallback = default_asset_root_path();
            warn!(
                "Cannot serve assets from '{}': {}. Using '{}' instead.",
                raw_root,
                error,
                fallback.display()
            );
            AssetLoader::new(Arc::new(FsAssetSource::new(fallback)))
        }
    }
}

pub fn load_catalog(catalog_file: Option<&Path>) -> Catalog {
    let Some(path) = catalog_file else {
        return Catalog::builtin();
    };
    match Catalog::from_json_file(path) {
        Ok(catalog) => {
            info!("Loaded {} clips from '{}'", catalog.len(), path.display());
            catalog
        }
        Err(error) => {
            warn!(
                "Failed to load catalog '{}': {}. Using the built-in catalog.",
                path.display(),
                error
            );
            Catalog::builtin()
        }
    }
}

/// Splits a file path or URL into the root a source serves and the path
/// relative to it.
pub fn split_asset_target(target: &str) -> (String, String) {
    let normalized = target.trim().replace('\\', "/");
    match normalized.rfind('/') {
        Some(0) => ("/".to_string(), normalized[1..].to_string()),
        Some(index) => (
            normalized[..index].to_string(),
            normalized[index + 1..].to_string(),
        ),
        None => (".".to_string(), normalized),
    }
}
