use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use macroquad::texture::Texture2D;
use tile_explorer_core::VisualTag;
use tile_explorer_rendering::AssetCache;
use tracing::{debug, warn};

const SUPPORTED_MANIFEST_VERSION: u32 = 1;
const FALLBACK_TAG: VisualTag = VisualTag::Normal;

/// Textures loaded from a sprite manifest, keyed by visual tag.
///
/// Tags the manifest leaves out resolve to the image of the plain ground
/// tile; when that is missing too the renderer draws flat palette colors.
#[derive(Debug)]
pub struct SpriteAtlas {
    textures: AssetCache<Texture2D>,
}

impl SpriteAtlas {
    /// Loads sprites from the manifest located at the provided path.
    ///
    /// Must run inside the macroquad window context.
    pub fn from_manifest_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_manifest_with_loader(path, default_loader)
    }

    /// Texture drawn for `tag`, if any.
    #[must_use]
    pub fn texture(&self, tag: VisualTag) -> Option<Texture2D> {
        self.textures.get(tag).copied()
    }

    /// Returns whether the manifest provided an image for `tag`.
    #[must_use]
    pub fn contains(&self, tag: VisualTag) -> bool {
        self.textures.contains(tag)
    }

    /// Returns the number of textures stored in the atlas.
    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn from_manifest_with_loader(
        path: impl AsRef<Path>,
        mut loader: impl FnMut(VisualTag, &Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read sprite manifest at {}",
                manifest_path.display()
            )
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let entries = parse_manifest(&contents, &base)?;
        Self::from_entries(entries, &mut loader)
    }

    fn from_entries(
        entries: Vec<(VisualTag, PathBuf)>,
        loader: &mut impl FnMut(VisualTag, &Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let mut textures = AssetCache::new(FALLBACK_TAG);
        for (tag, path) in entries {
            let texture = match loader(tag, &path) {
                Ok(texture) => texture,
                Err(error) => {
                    warn!(tag = tag.name(), path = %path.display(), %error, "sprite failed to load");
                    continue;
                }
            };
            if textures.insert(tag, texture).is_some() {
                bail!("duplicate sprite entry for {}", tag.name());
            }
            debug!(tag = tag.name(), path = %path.display(), "sprite loaded");
        }

        for tag in VisualTag::ALL {
            if !textures.contains(tag) {
                warn!(
                    tag = tag.name(),
                    fallback = FALLBACK_TAG.name(),
                    "sprite missing from manifest"
                );
            }
        }

        Ok(Self { textures })
    }
}

fn default_loader(_tag: VisualTag, path: &Path) -> Result<Texture2D> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read sprite asset at {}", path.display()))?;
    Ok(Texture2D::from_file_with_format(&bytes, None))
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    sprites: HashMap<String, String>,
}

/// Resolves manifest entries in [`VisualTag::ALL`] order.
fn parse_manifest(contents: &str, base_path: &Path) -> Result<Vec<(VisualTag, PathBuf)>> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse sprite manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported sprite manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let mut resolved = HashMap::new();
    for (name, relative_path) in manifest.sprites {
        let Some(tag) = VisualTag::from_name(&name) else {
            bail!("unknown sprite key `{name}` in manifest");
        };
        let _ = resolved.insert(tag, base_path.join(relative_path));
    }

    Ok(VisualTag::ALL
        .into_iter()
        .filter_map(|tag| resolved.remove(&tag).map(|path| (tag, path)))
        .collect())
}
