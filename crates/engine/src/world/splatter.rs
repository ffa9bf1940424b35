use crate::app::DrawList;
use crate::geometry::{Color, Rect, Vec2};

/// Channel step applied to every splat each frame.
pub const SPLAT_FADE_STEP: u8 = 2;
/// Alpha a fresh splat starts with, whatever the ink color.
pub const SPLAT_ALPHA: u8 = 150;
const SIZE_FACTOR: f32 = 0.1;
const MIN_EXTENT: f32 = 5.0;

/// A fading ink mark left in world space. Draw-only: it never collides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splat {
    pub bounds: Rect,
    pub rotation: f32,
    pub color: Color,
}

impl Splat {
    /// Faster impacts stretch the mark along their axis. Rotation follows the velocity
    /// but never points downward.
    pub fn new(position: Vec2, size: Vec2, ink: Color, velocity: Vec2) -> Self {
        let stretch = |extent: f32, speed: f32| {
            let scaled = if speed.abs() > 0.0 {
                extent * speed.abs() * SIZE_FACTOR
            } else {
                extent * SIZE_FACTOR
            };
            scaled.max(MIN_EXTENT)
        };
        let extent = Vec2::new(stretch(size.x, velocity.x), stretch(size.y, velocity.y));
        let rotation = if velocity == Vec2::ZERO {
            0.0
        } else {
            (-velocity.y.abs()).atan2(velocity.x)
        };
        Self {
            bounds: Rect::from_position_size(position, extent),
            rotation,
            color: Color::rgba(ink.r, ink.g, ink.b, SPLAT_ALPHA),
        }
    }

    pub fn fade(&mut self) {
        self.color = self.color.push_towards(Color::TRANSPARENT, SPLAT_FADE_STEP);
    }

    pub fn is_visible(&self) -> bool {
        self.color != Color::TRANSPARENT
    }
}

/// Ink trail of a room, faded once per frame and dropped when fully transparent.
#[derive(Debug, Clone, Default)]
pub struct Splatter {
    splats: Vec<Splat>,
}

impl Splatter {
    pub fn add(&mut self, splat: Splat) {
        self.splats.push(splat);
    }

    pub fn update(&mut self) {
        for splat in &mut self.splats {
            splat.fade();
        }
        self.splats.retain(Splat::is_visible);
    }

    pub fn splats(&self) -> &[Splat] {
        &self.splats
    }

    pub fn len(&self) -> usize {
        self.splats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splats.is_empty()
    }

    pub fn draw(&self, draw_list: &mut DrawList, visible: Rect) {
        for splat in self.splats.iter().filter(|splat| splat.bounds.intersects(&visible)) {
            draw_list.push_world(splat.bounds, splat.color, splat.rotation);
        }
    }
}
