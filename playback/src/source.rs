//! Where asset bytes come from, and the load → normalize pipeline on top.

use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use catalog::DownloadLink;

use crate::asset::{AssetFormat, LoadedModel};
use crate::error::{LoadError, ViewportError};
use crate::normalize::{NormalizedModel, normalize};

pub trait AssetSource: Send + Sync + Debug {
    /// Cheap existence probe run before the fetch, so a missing asset is
    /// reported as such instead of as a parse failure.
    fn exists(&self, path: &str) -> Result<bool, LoadError>;

    fn fetch(&self, path: &str) -> Result<Vec<u8>, LoadError>;
}

/// Serves paths relative to a directory; absolute paths are re-rooted.
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl AssetSource for FsAssetSource {
    fn exists(&self, path: &str) -> Result<bool, LoadError> {
        Ok(self.resolve(path).is_file())
    }

    fn fetch(&self, path: &str) -> Result<Vec<u8>, LoadError> {
        fs::read(self.resolve(path)).map_err(|source| match source.kind() {
            ErrorKind::NotFound => LoadError::NotFound {
                path: path.to_string(),
            },
            _ => LoadError::Io {
                path: path.to_string(),
                source,
            },
        })
    }
}

#[cfg(feature = "http")]
pub use http::HttpAssetSource;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use reqwest::StatusCode;
    use reqwest::blocking::Client;

    use super::AssetSource;
    use crate::error::LoadError;

    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Serves paths relative to an `http(s)://` base URL.
    #[derive(Debug, Clone)]
    pub struct HttpAssetSource {
        base_url: String,
        client: Client,
    }

    impl HttpAssetSource {
        pub fn new(base_url: impl Into<String>) -> Result<Self, LoadError> {
            let base_url = base_url.into();
            let client = Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|err| LoadError::Http {
                    path: base_url.clone(),
                    message: err.to_string(),
                })?;
            Ok(Self { base_url, client })
        }

        fn url(&self, path: &str) -> String {
            if path.starts_with("http://") || path.starts_with("https://") {
                return path.to_string();
            }
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        }

        fn transport_error(path: &str, err: reqwest::Error) -> LoadError {
            LoadError::Http {
                path: path.to_string(),
                message: err.to_string(),
            }
        }
    }

    impl AssetSource for HttpAssetSource {
        fn exists(&self, path: &str) -> Result<bool, LoadError> {
            let response = self
                .client
                .head(self.url(path))
                .send()
                .map_err(|err| Self::transport_error(path, err))?;
            Ok(response.status().is_success())
        }

        fn fetch(&self, path: &str) -> Result<Vec<u8>, LoadError> {
            let response = self
                .client
                .get(self.url(path))
                .send()
                .map_err(|err| Self::transport_error(path, err))?;
            match response.status() {
                StatusCode::NOT_FOUND => Err(LoadError::NotFound {
                    path: path.to_string(),
                }),
                status if !status.is_success() => Err(LoadError::Status {
                    path: path.to_string(),
                    status: status.as_u16(),
                }),
                _ => response
                    .bytes()
                    .map(|bytes| bytes.to_vec())
                    .map_err(|err| Self::transport_error(path, err)),
            }
        }
    }
}

/// Picks the source for a configured root: URL prefixes go over HTTP,
/// anything else is a directory.
pub fn source_for_root(root: &str) -> Result<Arc<dyn AssetSource>, LoadError> {
    if root.starts_with("http://") || root.starts_with("https://") {
        #[cfg(feature = "http")]
        {
            return Ok(Arc::new(HttpAssetSource::new(root)?));
        }
        #[cfg(not(feature = "http"))]
        {
            return Err(LoadError::Unsupported {
                path: root.to_string(),
            });
        }
    }
    Ok(Arc::new(FsAssetSource::new(root)))
}

/// One asset a viewport wants: its path relative to the source root and the
/// format to decode it with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRequest {
    pub path: String,
    pub format: AssetFormat,
}

impl AssetRequest {
    pub fn new(path: impl Into<String>, format: AssetFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
}

impl AssetLoader {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<dyn AssetSource> {
        &self.source
    }

    /// Existence check, fetch, decode. Never panics on bad input.
    pub fn load(&self, request: &AssetRequest) -> Result<LoadedModel, ViewportError> {
        if !self.source.exists(&request.path)? {
            return Err(LoadError::NotFound {
                path: request.path.clone(),
            }
            .into());
        }
        let bytes = self.source.fetch(&request.path)?;
        let model = request.format.decode(&bytes)?;
        log::debug!(
            "Loaded '{}' ({} bytes, {} clips)",
            request.path,
            bytes.len(),
            model.clips().len()
        );
        Ok(model)
    }

    /// The whole per-viewport pipeline. Runs off the render tick.
    pub fn load_normalized(&self, request: &AssetRequest) -> Result<NormalizedModel, ViewportError> {
        let model = self.load(request)?;
        Ok(normalize(model)?)
    }

    /// Fetches the file behind a download link into `dir`.
    pub fn download(&self, link: &DownloadLink, dir: &Path) -> Result<PathBuf, LoadError> {
        let bytes = self.source.fetch(&link.path)?;
        let destination = dir.join(&link.file_name);
        let write = |path: &Path| -> std::io::Result<()> {
            fs::create_dir_all(dir)?;
            fs::write(path, &bytes)
        };
        write(&destination).map_err(|source| LoadError::Io {
            path: destination.display().to_string(),
            source,
        })?;
        log::info!("Saved '{}' to {}", link.path, destination.display());
        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let loader = AssetLoader::new(Arc::new(FsAssetSource::new(std::env::temp_dir())));
        let request = AssetRequest::new("no/such/character.fbx.glb", AssetFormat::Glb);
        let err = loader.load(&request).unwrap_err();
        assert!(matches!(err, ViewportError::Load(LoadError::NotFound { .. })));
        assert_eq!(err.kind(), "not found");
    }

    #[test]
    fn unreadable_file_is_reported_as_parse_failure() {
        let dir = std::env::temp_dir().join(format!("playback-source-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("broken.fbx"), b"not really fbx").unwrap();

        let loader = AssetLoader::new(Arc::new(FsAssetSource::new(&dir)));
        let err = loader
            .load(&AssetRequest::new("/broken.fbx", AssetFormat::Fbx))
            .unwrap_err();
        assert!(matches!(err, ViewportError::Parse(_)));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn downloads_land_under_their_file_name() {
        let root = std::env::temp_dir().join(format!("playback-download-{}", std::process::id()));
        fs::create_dir_all(root.join("fbx/clip")).unwrap();
        fs::write(root.join("fbx/clip/Amy.fbx"), b"fbx bytes").unwrap();

        let loader = AssetLoader::new(Arc::new(FsAssetSource::new(&root)));
        let link = DownloadLink {
            path: "fbx/clip/Amy.fbx".to_string(),
            file_name: "Amy_clip.fbx".to_string(),
        };
        let saved = loader.download(&link, &root.join("downloads")).unwrap();
        assert_eq!(fs::read(&saved).unwrap(), b"fbx bytes");

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn roots_pick_their_transport() {
        let source = source_for_root("/tmp/assets").unwrap();
        assert!(format!("{source:?}").contains("FsAssetSource"));
    }
}
