//! Embedded asset lookup.

use std::path::{Path, PathBuf};

use notesite_config::Config;

/// Locates media referenced by `![[asset]]` embeds. Targets are tried
/// against the configured assets directory first, then the vault root.
pub struct AssetCatalog {
    root: PathBuf,
    assets_dir: PathBuf,
}

impl AssetCatalog {
    pub fn from_config(config: &Config) -> Self {
        AssetCatalog {
            root: config.site.root.clone(),
            assets_dir: config.content.assets.clone(),
        }
    }

    /// Resolve an embed target to the source file on disk, when it exists.
    pub fn locate(&self, target: &str) -> Option<PathBuf> {
        let candidate = self.root.join(&self.assets_dir).join(target);
        if candidate.is_file() {
            return Some(candidate);
        }
        let fallback = self.root.join(target);
        if fallback.is_file() {
            return Some(fallback);
        }
        None
    }

    /// Output-relative href for a located asset.
    pub fn href(target: &str) -> String {
        format!("assets/{}", crate::encode_href(target))
    }
}

/// True when the target looks like an image by extension.
pub fn is_image(target: &str) -> bool {
    Path::new(target)
        .extension()
        .map(|ext| {
            let lower = ext.to_string_lossy().to_lowercase();
            matches!(lower.as_str(), "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp")
        })
        .unwrap_or(false)
}
