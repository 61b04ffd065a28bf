#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Tile Explorer.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.

mod sprites;

pub use self::sprites::SpriteAtlas;

use anyhow::{Context, Result};
use glam::Vec2;
use macroquad::{
    color::WHITE,
    input::{is_key_pressed, is_key_released, KeyCode},
    math::Vec2 as MacroquadVec2,
    texture::{self, DrawTextureParams},
};
use std::{path::PathBuf, sync::mpsc, time::Duration};
use tile_explorer_core::{Direction, Intent, VisualTag};
use tile_explorer_rendering::{
    palette_color, Color, FrameControl, FrameInput, Presentation, RenderingBackend, Scene,
};
use tracing::info;

const DIAGNOSTICS_FONT_SIZE: f32 = 24.0;
const DIAGNOSTICS_MARGIN: f32 = 8.0;

/// Keys translated into intents, in the order they are polled.
const TRACKED_KEYS: [KeyCode; 10] = [
    KeyCode::W,
    KeyCode::A,
    KeyCode::S,
    KeyCode::D,
    KeyCode::Up,
    KeyCode::Left,
    KeyCode::Down,
    KeyCode::Right,
    KeyCode::F1,
    KeyCode::Escape,
];

/// Edge of a key observed during a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyEdge {
    Pressed,
    Released,
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    sprite_manifest: Option<PathBuf>,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval
    /// and draws flat palette colors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Loads sprites from the manifest at `path` once the window exists.
    #[must_use]
    pub fn with_sprite_manifest(mut self, path: Option<PathBuf>) -> Self {
        self.sprite_manifest = path;
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameControl + 'static,
    {
        let Self {
            swap_interval,
            sprite_manifest,
        } = self;

        let Presentation {
            window_title,
            window_width,
            window_height,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width,
            window_height,
            window_resizable: false,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        let (atlas_init_sender, atlas_init_receiver) = mpsc::channel::<Result<()>>();

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let sprite_atlas = match sprite_manifest {
                Some(path) => match SpriteAtlas::from_manifest_path(&path)
                    .with_context(|| format!("failed to initialise sprites from {}", path.display()))
                {
                    Ok(atlas) => {
                        info!(textures = atlas.texture_count(), "sprite atlas ready");
                        Some(atlas)
                    }
                    Err(error) => {
                        let _ = atlas_init_sender.send(Err(error));
                        return;
                    }
                },
                None => None,
            };
            let _ = atlas_init_sender.send(Ok(()));

            let background = to_macroquad_color(clear_color);

            loop {
                let frame_input = FrameInput {
                    intents: poll_intents(),
                };
                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));

                if update_scene(frame_dt, frame_input, &mut scene) == FrameControl::Exit {
                    break;
                }

                macroquad::window::clear_background(background);
                draw_scene(&scene, sprite_atlas.as_ref());

                macroquad::window::next_frame().await;
            }
        });

        atlas_init_receiver.recv().unwrap_or_else(|_| Ok(()))?;

        Ok(())
    }
}

fn poll_intents() -> Vec<Intent> {
    let mut observations = Vec::new();
    for key in TRACKED_KEYS {
        if is_key_pressed(key) {
            observations.push((key, KeyEdge::Pressed));
        }
        if is_key_released(key) {
            observations.push((key, KeyEdge::Released));
        }
    }
    gather_intents_from_observations(&observations)
}

fn gather_intents_from_observations(observations: &[(KeyCode, KeyEdge)]) -> Vec<Intent> {
    observations
        .iter()
        .filter_map(|&(key, edge)| intent_for_key(key, edge))
        .collect()
}

fn intent_for_key(key: KeyCode, edge: KeyEdge) -> Option<Intent> {
    if let Some(direction) = movement_direction(key) {
        return Some(match edge {
            KeyEdge::Pressed => Intent::MoveStarted { direction },
            KeyEdge::Released => Intent::MoveStopped { direction },
        });
    }

    if edge != KeyEdge::Pressed {
        return None;
    }

    match key {
        KeyCode::Up => Some(Intent::Probe {
            direction: Direction::North,
        }),
        KeyCode::Left => Some(Intent::Probe {
            direction: Direction::West,
        }),
        KeyCode::Down => Some(Intent::Probe {
            direction: Direction::South,
        }),
        KeyCode::Right => Some(Intent::Probe {
            direction: Direction::East,
        }),
        KeyCode::F1 => Some(Intent::ToggleDiagnostics),
        KeyCode::Escape => Some(Intent::Quit),
        _ => None,
    }
}

fn movement_direction(key: KeyCode) -> Option<Direction> {
    match key {
        KeyCode::W => Some(Direction::North),
        KeyCode::A => Some(Direction::West),
        KeyCode::S => Some(Direction::South),
        KeyCode::D => Some(Direction::East),
        _ => None,
    }
}

fn draw_scene(scene: &Scene, sprite_atlas: Option<&SpriteAtlas>) {
    for tile in &scene.tiles {
        draw_sprite(tile.visual, tile.position, tile.size, sprite_atlas);
    }
    for actor in &scene.actors {
        draw_sprite(actor.visual, actor.position, actor.size, sprite_atlas);
    }

    if let Some(text) = &scene.diagnostics {
        let _ = macroquad::text::draw_text(
            text,
            DIAGNOSTICS_MARGIN,
            DIAGNOSTICS_MARGIN + DIAGNOSTICS_FONT_SIZE,
            DIAGNOSTICS_FONT_SIZE,
            WHITE,
        );
    }
}

fn draw_sprite(tag: VisualTag, position: Vec2, size: Vec2, sprite_atlas: Option<&SpriteAtlas>) {
    match sprite_atlas.and_then(|atlas| atlas.texture(tag)) {
        Some(texture) => texture::draw_texture_ex(
            texture,
            position.x,
            position.y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(MacroquadVec2::new(size.x, size.y)),
                ..DrawTextureParams::default()
            },
        ),
        None => macroquad::shapes::draw_rectangle(
            position.x,
            position.y,
            size.x,
            size.y,
            to_macroquad_color(palette_color(tag)),
        ),
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_report_press_and_release() {
        let intents = gather_intents_from_observations(&[
            (KeyCode::D, KeyEdge::Pressed),
            (KeyCode::W, KeyEdge::Pressed),
            (KeyCode::D, KeyEdge::Released),
        ]);

        assert_eq!(
            intents,
            vec![
                Intent::MoveStarted {
                    direction: Direction::East
                },
                Intent::MoveStarted {
                    direction: Direction::North
                },
                Intent::MoveStopped {
                    direction: Direction::East
                },
            ]
        );
    }

    #[test]
    fn arrow_keys_probe_only_on_press() {
        let intents = gather_intents_from_observations(&[
            (KeyCode::Left, KeyEdge::Pressed),
            (KeyCode::Left, KeyEdge::Released),
            (KeyCode::Down, KeyEdge::Pressed),
        ]);

        assert_eq!(
            intents,
            vec![
                Intent::Probe {
                    direction: Direction::West
                },
                Intent::Probe {
                    direction: Direction::South
                },
            ]
        );
    }

    #[test]
    fn function_keys_map_to_overlay_and_quit() {
        assert_eq!(
            intent_for_key(KeyCode::F1, KeyEdge::Pressed),
            Some(Intent::ToggleDiagnostics)
        );
        assert_eq!(
            intent_for_key(KeyCode::Escape, KeyEdge::Pressed),
            Some(Intent::Quit)
        );
        assert_eq!(intent_for_key(KeyCode::Escape, KeyEdge::Released), None);
        assert_eq!(intent_for_key(KeyCode::Q, KeyEdge::Pressed), None);
    }

    #[test]
    fn every_tracked_key_produces_an_intent_when_pressed() {
        for key in TRACKED_KEYS {
            assert!(
                intent_for_key(key, KeyEdge::Pressed).is_some(),
                "{key:?} should be mapped"
            );
        }
    }

    #[test]
    fn palette_colors_convert_channel_by_channel() {
        let converted = to_macroquad_color(Color::new(0.25, 0.5, 0.75, 1.0));
        assert_eq!(
            (converted.r, converted.g, converted.b, converted.a),
            (0.25, 0.5, 0.75, 1.0)
        );
    }
}
