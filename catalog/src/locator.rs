use serde::{Deserialize, Serialize};

use crate::clip::MotionClip;

/// On-disk flavour of a character asset.
///
/// Mirrored assets are stored as binary glTF converted from the FBX original,
/// hence the double extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetExtension {
    #[default]
    Glb,
    Fbx,
}

impl AssetExtension {
    pub const ALL: [Self; 2] = [Self::Glb, Self::Fbx];

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Glb => "fbx.glb",
            Self::Fbx => "fbx",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Glb => "GLB",
            Self::Fbx => "FBX",
        }
    }
}

/// Where a viewport's "download" button points and the name the file is
/// saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub path: String,
    pub file_name: String,
}

/// Builds asset paths of the form `{root}/{base}/{clip_id}/{character}.{ext}`.
///
/// `root` is either a filesystem directory or an `http(s)://` prefix; it is
/// joined verbatim, so the locator stays agnostic of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLocator {
    root: String,
    extension: AssetExtension,
}

impl AssetLocator {
    pub fn new(root: impl Into<String>, extension: AssetExtension) -> Self {
        Self {
            root: root.into(),
            extension,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn extension(&self) -> AssetExtension {
        self.extension
    }

    pub fn asset_path(&self, base: &str, clip: &MotionClip, character: &str) -> String {
        self.path_with_suffix(base, clip, character, self.extension.suffix())
    }

    /// The FBX original next to the mirrored asset.
    ///
    /// `tag` distinguishes rows that share a character name, e.g. `mixamo`
    /// yields `Amy_mixamo_Wave.fbx`.
    pub fn download_link(
        &self,
        base: &str,
        clip: &MotionClip,
        character: &str,
        tag: Option<&str>,
    ) -> DownloadLink {
        let file_name = match tag {
            Some(tag) => format!("{character}_{tag}_{}.fbx", clip.name),
            None => format!("{character}_{}.fbx", clip.name),
        };
        DownloadLink {
            path: self.path_with_suffix(base, clip, character, AssetExtension::Fbx.suffix()),
            file_name: sanitize_file_name(&file_name),
        }
    }

    fn path_with_suffix(
        &self,
        base: &str,
        clip: &MotionClip,
        character: &str,
        suffix: &str,
    ) -> String {
        let file = format!("{character}.{suffix}");
        let mut path = self.root.trim_end_matches('/').to_string();
        for segment in [base, clip.id.as_str(), file.as_str()] {
            let segment = segment.trim_matches('/');
            if segment.is_empty() {
                continue;
            }
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(segment);
        }
        path
    }
}

/// Character label as shown under a viewport: `claire_v2` -> `CLAIRE V2`.
pub fn display_character(character: &str) -> String {
    character.replace('_', " ").to_uppercase()
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> MotionClip {
        MotionClip::new(
            "Standing Torch Jump Running",
            "Standing Torch Jump Running",
            "YBot",
            vec!["Amy".into()],
        )
    }

    #[test]
    fn glb_paths_use_double_extension() {
        let locator = AssetLocator::new("/MIRRORED-Anims", AssetExtension::Glb);
        assert_eq!(
            locator.asset_path("mixamo_fbx", &clip(), "YBot"),
            "/MIRRORED-Anims/mixamo_fbx/Standing Torch Jump Running/YBot.fbx.glb"
        );
    }

    #[test]
    fn root_and_base_slashes_are_normalised() {
        let locator = AssetLocator::new("https://host/assets/", AssetExtension::Fbx);
        assert_eq!(
            locator.asset_path("/fbx/", &clip(), "Amy"),
            "https://host/assets/fbx/Standing Torch Jump Running/Amy.fbx"
        );

        let relative = AssetLocator::new("", AssetExtension::Glb);
        assert_eq!(
            relative.asset_path("fbx", &clip(), "Ty"),
            "fbx/Standing Torch Jump Running/Ty.fbx.glb"
        );
    }

    #[test]
    fn download_links_point_at_fbx_originals() {
        let locator = AssetLocator::new("/MIRRORED-Anims", AssetExtension::Glb);
        let plain = locator.download_link("fbx", &clip(), "Amy", None);
        assert_eq!(
            plain.path,
            "/MIRRORED-Anims/fbx/Standing Torch Jump Running/Amy.fbx"
        );
        assert_eq!(plain.file_name, "Amy_Standing Torch Jump Running.fbx");

        let tagged = locator.download_link("mixamo_fbx", &clip(), "Amy", Some("mixamo"));
        assert_eq!(tagged.file_name, "Amy_mixamo_Standing Torch Jump Running.fbx");
    }

    #[test]
    fn character_labels_are_upper_case() {
        assert_eq!(display_character("claire"), "CLAIRE");
        assert_eq!(display_character("big_guy"), "BIG GUY");
    }
}
