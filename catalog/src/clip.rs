use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Source character every built-in clip was authored on.
pub const BUILTIN_SOURCE_CHARACTER: &str = "YBot";

const BUILTIN_TARGETS: [&str; 9] = [
    "Abe", "Aj", "Amy", "claire", "James", "Jolleen", "kaya", "Ortiz", "Ty",
];

const BUILTIN_CLIPS: [&str; 2] = ["Standing 1H Magic Attack 02", "Standing Torch Jump Running"];

/// One motion shown on a source character and retargeted onto a list of
/// target characters.
///
/// `id` is the folder name used in asset paths; the built-in catalog uses the
/// clip name as its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionClip {
    #[serde(alias = "uuid")]
    pub id: String,
    pub name: String,
    pub source: String,
    pub targets: Vec<String>,
}

impl MotionClip {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
        targets: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source: source.into(),
            targets,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog contains no clips")]
    Empty,
    #[error("duplicate clip id '{0}'")]
    DuplicateId(String),
    #[error("clip '{0}' has no target characters")]
    NoTargets(String),
    #[error("clip '{clip}' has an empty {field}")]
    EmptyField { clip: String, field: &'static str },
    #[error("failed to read catalog file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to decode JSON catalog: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Wrapped { clips: Vec<MotionClip> },
    Bare(Vec<MotionClip>),
}

/// Immutable, validated list of motion clips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    clips: Vec<MotionClip>,
}

impl Catalog {
    pub fn new(clips: Vec<MotionClip>) -> Result<Self, CatalogError> {
        validate(&clips)?;
        Ok(Self { clips })
    }

    /// The catalog compiled into the explorer.
    pub fn builtin() -> Self {
        let targets: Vec<String> = BUILTIN_TARGETS.iter().map(|t| t.to_string()).collect();
        let clips = BUILTIN_CLIPS
            .iter()
            .map(|name| MotionClip::new(*name, *name, BUILTIN_SOURCE_CHARACTER, targets.clone()))
            .collect();
        Self { clips }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let clips = match serde_json::from_str::<CatalogDocument>(raw)? {
            CatalogDocument::Wrapped { clips } | CatalogDocument::Bare(clips) => clips,
        };
        Self::new(clips)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json_str(&raw)?;
        log::info!(
            "Loaded catalog with {} clips from '{}'",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn clips(&self) -> &[MotionClip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MotionClip> {
        self.clips.get(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.clips.iter().position(|clip| clip.id == id)
    }

    /// Uniformly random clip index.
    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        if self.clips.len() <= 1 {
            return 0;
        }
        rng.gen_range(0..self.clips.len())
    }
}

fn validate(clips: &[MotionClip]) -> Result<(), CatalogError> {
    if clips.is_empty() {
        return Err(CatalogError::Empty);
    }

    let mut seen = HashSet::new();
    for clip in clips {
        if clip.id.trim().is_empty() {
            return Err(CatalogError::EmptyField {
                clip: clip.name.clone(),
                field: "id",
            });
        }
        if clip.source.trim().is_empty() {
            return Err(CatalogError::EmptyField {
                clip: clip.id.clone(),
                field: "source",
            });
        }
        if clip.targets.is_empty() {
            return Err(CatalogError::NoTargets(clip.id.clone()));
        }
        if !seen.insert(clip.id.as_str()) {
            return Err(CatalogError::DuplicateId(clip.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn builtin_catalog_has_two_clips_on_ybot() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 2);
        for clip in catalog.clips() {
            assert_eq!(clip.id, clip.name);
            assert_eq!(clip.source, "YBot");
            assert_eq!(clip.targets.len(), 9);
        }
        assert_eq!(catalog.position("Standing Torch Jump Running"), Some(1));
    }

    #[test]
    fn json_catalog_accepts_uuid_alias_and_bare_arrays() {
        let raw = r#"[{"uuid":"a1","name":"Wave","source":"YBot","targets":["Amy"]}]"#;
        let catalog = Catalog::from_json_str(raw).unwrap();
        assert_eq!(catalog.get(0).unwrap().id, "a1");

        let wrapped = r#"{"clips":[{"id":"b2","name":"Run","source":"YBot","targets":["Ty"]}]}"#;
        let catalog = Catalog::from_json_str(wrapped).unwrap();
        assert_eq!(catalog.get(0).unwrap().name, "Run");
    }

    #[test]
    fn validation_rejects_bad_catalogs() {
        assert!(matches!(Catalog::new(Vec::new()), Err(CatalogError::Empty)));

        let no_targets = MotionClip::new("x", "X", "YBot", Vec::new());
        assert!(matches!(
            Catalog::new(vec![no_targets]),
            Err(CatalogError::NoTargets(id)) if id == "x"
        ));

        let a = MotionClip::new("dup", "A", "YBot", vec!["Amy".into()]);
        let b = MotionClip::new("dup", "B", "YBot", vec!["Ty".into()]);
        assert!(matches!(
            Catalog::new(vec![a, b]),
            Err(CatalogError::DuplicateId(_))
        ));
    }

    #[test]
    fn random_pick_stays_in_range_and_covers_catalog() {
        let catalog = Catalog::builtin();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 2];
        for _ in 0..64 {
            let index = catalog.pick_random(&mut rng);
            seen[index] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
    }
}
