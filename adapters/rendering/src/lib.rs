#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Tile Explorer adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use std::{collections::HashMap, error::Error, fmt, time::Duration};
use tile_explorer_core::{ActorId, Intent, TileCoord, VisualTag};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Flat color drawn for a visual tag when no image is available.
#[must_use]
pub const fn palette_color(tag: VisualTag) -> Color {
    match tag {
        VisualTag::Normal => Color::from_rgb_u8(0x5b, 0x8c, 0x3a),
        VisualTag::Impassable => Color::from_rgb_u8(0x4a, 0x44, 0x3f),
        VisualTag::Hazard => Color::from_rgb_u8(0xb8, 0x5c, 0x1f),
        VisualTag::Player => Color::from_rgb_u8(0x3f, 0x7f, 0xe8),
        VisualTag::Mob => Color::from_rgb_u8(0xc8, 0x2a, 0x36),
        VisualTag::Obstacle => Color::from_rgb_u8(0xff, 0xc1, 0x07),
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Intents observed since the previous frame, in arrival order.
    pub intents: Vec<Intent>,
}

/// Decision returned by the scene update callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameControl {
    /// Draw the scene and keep running.
    Continue,
    /// Stop immediately without drawing.
    Exit,
}

/// Terrain tile placed on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileSprite {
    /// Grid coordinate of the tile.
    pub coord: TileCoord,
    /// Upper-left corner in screen pixels.
    pub position: Vec2,
    /// Size in screen pixels.
    pub size: Vec2,
    /// Image key of the tile.
    pub visual: VisualTag,
}

/// Actor placed on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorSprite {
    /// Identifier of the actor.
    pub id: ActorId,
    /// Upper-left corner in screen pixels.
    pub position: Vec2,
    /// Size in screen pixels.
    pub size: Vec2,
    /// Image key of the actor.
    pub visual: VisualTag,
}

/// Everything a backend draws for one frame, back to front.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    /// Visible terrain.
    pub tiles: Vec<TileSprite>,
    /// Visible actors in spawn order.
    pub actors: Vec<ActorSprite>,
    /// Diagnostic overlay text, drawn only when present.
    pub diagnostics: Option<String>,
}

impl Scene {
    /// Removes every sprite and the overlay while keeping allocations.
    pub fn clear(&mut self) {
        self.tiles.clear();
        self.actors.clear();
        self.diagnostics = None;
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Window width in pixels.
    pub window_width: i32,
    /// Window height in pixels.
    pub window_height: i32,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed first.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    pub fn new<T>(
        window_title: T,
        window_width: i32,
        window_height: i32,
        clear_color: Color,
        scene: Scene,
    ) -> Result<Self, RenderingError>
    where
        T: Into<String>,
    {
        if window_width <= 0 || window_height <= 0 {
            return Err(RenderingError::InvalidWindowSize {
                width: window_width,
                height: window_height,
            });
        }

        Ok(Self {
            window_title: window_title.into(),
            window_width,
            window_height,
            clear_color,
            scene,
        })
    }
}

/// Rendering backend capable of presenting Tile Explorer scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// intents captured by the adapter, may mutate the scene, and decides
    /// whether the frame is drawn or the backend stops.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameControl + 'static;
}

/// Image lookup keyed by visual tag.
///
/// Lookups of a tag without an image fall back to the designated default tag.
#[derive(Clone, Debug)]
pub struct AssetCache<H> {
    images: HashMap<VisualTag, H>,
    fallback: VisualTag,
}

impl<H> AssetCache<H> {
    /// Creates an empty cache that falls back to `fallback`.
    #[must_use]
    pub fn new(fallback: VisualTag) -> Self {
        Self {
            images: HashMap::new(),
            fallback,
        }
    }

    /// Registers an image, returning the one it replaces.
    pub fn insert(&mut self, tag: VisualTag, image: H) -> Option<H> {
        self.images.insert(tag, image)
    }

    /// Image for `tag`, or for the fallback tag when `tag` has none.
    #[must_use]
    pub fn get(&self, tag: VisualTag) -> Option<&H> {
        self.images
            .get(&tag)
            .or_else(|| self.images.get(&self.fallback))
    }

    /// Reports whether `tag` has its own image.
    #[must_use]
    pub fn contains(&self, tag: VisualTag) -> bool {
        self.images.contains_key(&tag)
    }

    /// Tag used when a lookup misses.
    #[must_use]
    pub const fn fallback(&self) -> VisualTag {
        self.fallback
    }

    /// Number of registered images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Reports whether no image is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// Windows must cover at least one pixel along each axis.
    InvalidWindowSize {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWindowSize { width, height } => {
                write!(f, "window size must be positive (received {width}x{height})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentation_rejects_empty_window_without_panicking() {
        let error = Presentation::new(
            "Tile Explorer",
            0,
            600,
            Color::from_rgb_u8(0, 0, 0),
            Scene::default(),
        )
        .expect_err("zero width must be rejected");

        assert_eq!(
            error,
            RenderingError::InvalidWindowSize {
                width: 0,
                height: 600
            }
        );
    }

    #[test]
    fn asset_cache_falls_back_to_default_tag() {
        let mut cache = AssetCache::new(VisualTag::Normal);
        assert_eq!(cache.get(VisualTag::Hazard), None);

        assert_eq!(cache.insert(VisualTag::Normal, "grass"), None);
        assert_eq!(cache.insert(VisualTag::Player, "hero"), None);

        assert_eq!(cache.get(VisualTag::Player), Some(&"hero"));
        assert_eq!(cache.get(VisualTag::Hazard), Some(&"grass"));
        assert!(!cache.contains(VisualTag::Hazard));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn asset_cache_replaces_existing_images() {
        let mut cache = AssetCache::new(VisualTag::Normal);
        let _ = cache.insert(VisualTag::Mob, 1);
        assert_eq!(cache.insert(VisualTag::Mob, 2), Some(1));
        assert_eq!(cache.get(VisualTag::Mob), Some(&2));
    }

    #[test]
    fn palette_distinguishes_every_tag() {
        for (index, tag) in VisualTag::ALL.into_iter().enumerate() {
            for other in VisualTag::ALL.into_iter().skip(index + 1) {
                assert_ne!(palette_color(tag), palette_color(other), "{tag:?} vs {other:?}");
            }
        }
    }

    #[test]
    fn clearing_a_scene_drops_the_overlay() {
        let mut scene = Scene {
            diagnostics: Some("FPS: 60.000".to_owned()),
            ..Scene::default()
        };
        scene.tiles.push(TileSprite {
            coord: TileCoord::new(0, 0),
            position: Vec2::ZERO,
            size: Vec2::splat(32.0),
            visual: VisualTag::Normal,
        });

        scene.clear();

        assert_eq!(scene, Scene::default());
    }
}
