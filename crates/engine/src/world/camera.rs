use crate::app::ViewTransform;
use crate::geometry::{Vec2, Viewport};

use super::entity::EntityId;

pub const ZOOM_SPEED: f32 = 0.05;
pub const MIN_ZOOM: f32 = 0.1;
pub const PAN_SPEED: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraTarget {
    Follow(EntityId),
    Point(Vec2),
}

/// Two independent stepping axes: position eases toward a pending pan target and zoom eases
/// toward a pending zoom target. Both targets clear once reached.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec2,
    pan_target: Option<Vec2>,
    zoom: f32,
    zoom_target: Option<f32>,
    target: Option<CameraTarget>,
    level_size: Vec2,
}

impl Camera {
    pub fn new(position: Vec2, zoom: f32, level_size: Vec2) -> Self {
        Self {
            position,
            pan_target: None,
            zoom: zoom.max(MIN_ZOOM),
            zoom_target: None,
            target: None,
            level_size,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan_target(&self) -> Option<Vec2> {
        self.pan_target
    }

    pub fn zoom_target(&self) -> Option<f32> {
        self.zoom_target
    }

    pub fn target(&self) -> Option<CameraTarget> {
        self.target
    }

    pub fn is_panning(&self) -> bool {
        self.pan_target.is_some()
    }

    /// Tracks an entity; the camera pans from where it is to the entity's current position.
    pub fn follow(&mut self, id: EntityId, current_position: Vec2) {
        self.target = Some(CameraTarget::Follow(id));
        self.pan(current_position);
    }

    pub fn focus_on(&mut self, point: Vec2) {
        self.target = Some(CameraTarget::Point(point));
        self.pan(point);
    }

    pub fn pan(&mut self, destination: Vec2) {
        self.pan_target = (destination != self.position).then_some(destination);
    }

    pub fn zoom_to(&mut self, zoom: f32) {
        let zoom = zoom.max(MIN_ZOOM);
        self.zoom_target = (zoom != self.zoom).then_some(zoom);
    }

    /// Advances one frame. `tracked` is the followed entity's position, if it still exists.
    pub fn update(&mut self, tracked: Option<Vec2>) {
        match self.pan_target {
            None => {
                if let Some(position) = tracked {
                    self.position = position;
                }
            }
            Some(destination) => {
                let destination = tracked.unwrap_or(destination);
                self.position = self.position.push_towards(destination, Vec2::splat(PAN_SPEED));
                self.pan_target = (self.position != destination).then_some(destination);
            }
        }

        if let Some(target) = self.zoom_target {
            self.zoom = if target > self.zoom {
                (self.zoom + ZOOM_SPEED).min(target)
            } else {
                (self.zoom - ZOOM_SPEED).max(target)
            }
            .max(MIN_ZOOM);
            if self.zoom == target {
                self.zoom_target = None;
            }
        }
    }

    /// Render transform with the focus clamped so the view never shows past the level edges.
    /// A level narrower than the view is centered on that axis instead.
    pub fn view_transform(&self, viewport: Viewport) -> ViewTransform {
        let half_view = viewport.size() * (0.5 / self.zoom);
        let focus = Vec2::new(
            clamp_focus(self.position.x, half_view.x, self.level_size.x),
            clamp_focus(self.position.y, half_view.y, self.level_size.y),
        );
        ViewTransform {
            focus,
            zoom: self.zoom,
            viewport,
        }
    }
}

fn clamp_focus(value: f32, half_view: f32, level_extent: f32) -> f32 {
    if level_extent <= half_view * 2.0 {
        return level_extent * 0.5;
    }
    value.clamp(half_view, level_extent - half_view)
}
