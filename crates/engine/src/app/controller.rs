use std::time::Duration;

use crate::geometry::{Color, Rect, Viewport};

use super::fade::FadeRequest;
use super::input::InputSnapshot;
use super::rendering::ViewTransform;

/// Everything a controller may read or ask for during one frame.
///
/// The fade overlay belongs to the engine; controllers can only request a change.
#[derive(Debug)]
pub struct FrameContext<'a> {
    input: &'a InputSnapshot,
    elapsed: Duration,
    fade_request: Option<FadeRequest>,
}

impl<'a> FrameContext<'a> {
    pub fn new(input: &'a InputSnapshot, elapsed: Duration) -> Self {
        Self {
            input,
            elapsed,
            fade_request: None,
        }
    }

    pub fn input(&self) -> &InputSnapshot {
        self.input
    }

    /// Wall-clock time since the previous frame. Only countdowns read this.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Later requests in the same frame replace earlier ones.
    pub fn request_fade(&mut self, request: FadeRequest) {
        self.fade_request = Some(request);
    }

    pub fn take_fade_request(&mut self) -> Option<FadeRequest> {
        self.fade_request.take()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawSpace {
    /// Level coordinates, transformed by the active camera.
    World,
    /// Window pixels.
    Screen,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub bounds: Rect,
    pub tint: Color,
    pub rotation: f32,
    pub space: DrawSpace,
}

#[derive(Debug, Clone)]
pub struct DrawList {
    viewport: Viewport,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            commands: Vec::new(),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn push_world(&mut self, bounds: Rect, tint: Color, rotation: f32) {
        self.commands.push(DrawCommand {
            bounds,
            tint,
            rotation,
            space: DrawSpace::World,
        });
    }

    pub fn push_screen(&mut self, bounds: Rect, tint: Color) {
        self.commands.push(DrawCommand {
            bounds,
            tint,
            rotation: 0.0,
            space: DrawSpace::Screen,
        });
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// A full-screen mode that owns update and draw while it is active.
pub trait Controller {
    fn update(&mut self, ctx: &mut FrameContext<'_>);

    fn draw(&self, draw_list: &mut DrawList);

    fn finished(&self) -> bool;

    fn view_transform(&self, viewport: Viewport) -> ViewTransform {
        ViewTransform::screen(viewport)
    }
}
