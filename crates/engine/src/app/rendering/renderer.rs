use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::{DrawCommand, DrawSpace, EngineFrame};
use crate::geometry::{Color, Rect, Vec2, Viewport};

use super::ViewTransform;

const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn render(&mut self, engine_frame: &EngineFrame) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        rasterize_frame(self.pixels.frame_mut(), self.viewport, engine_frame);
        self.pixels.render()
    }
}

/// Clears `frame`, fills every draw command, then blends the fade overlay on top.
fn rasterize_frame(frame: &mut [u8], viewport: Viewport, engine_frame: &EngineFrame) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&CLEAR_COLOR);
    }
    let screen = ViewTransform::screen(viewport);
    for command in engine_frame.draw_list.commands() {
        let transform = match command.space {
            DrawSpace::World => &engine_frame.view,
            DrawSpace::Screen => &screen,
        };
        draw_command(frame, viewport, transform, command);
    }
    if engine_frame.fade.a > 0 {
        let full = Rect::new(0.0, 0.0, viewport.width as f32, viewport.height as f32);
        fill_rect(frame, viewport, full, engine_frame.fade);
    }
}

fn draw_command(
    frame: &mut [u8],
    viewport: Viewport,
    transform: &ViewTransform,
    command: &DrawCommand,
) {
    let bounds = transform.world_rect_to_screen(command.bounds);
    if command.rotation == 0.0 {
        fill_rect(frame, viewport, bounds, command.tint);
    } else {
        fill_rotated_rect(frame, viewport, bounds, command.rotation, command.tint);
    }
}

fn fill_rect(frame: &mut [u8], viewport: Viewport, rect: Rect, color: Color) {
    let Some((left, top, right, bottom)) = clipped_pixel_span(viewport, rect) else {
        return;
    };
    for y in top..bottom {
        for x in left..right {
            blend_pixel_clipped(frame, viewport.width as usize, x, y, color);
        }
    }
}

/// Fills `rect` rotated by `radians` around its center.
fn fill_rotated_rect(frame: &mut [u8], viewport: Viewport, rect: Rect, radians: f32, color: Color) {
    let center = rect.center();
    let half = rect.size() * 0.5;
    let (sin, cos) = radians.sin_cos();
    let reach = half.length();
    let hull = Rect::new(center.x - reach, center.y - reach, reach * 2.0, reach * 2.0);
    let Some((left, top, right, bottom)) = clipped_pixel_span(viewport, hull) else {
        return;
    };
    for y in top..bottom {
        for x in left..right {
            let offset = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
            let local_x = offset.x * cos + offset.y * sin;
            let local_y = -offset.x * sin + offset.y * cos;
            if local_x.abs() <= half.x && local_y.abs() <= half.y {
                blend_pixel_clipped(frame, viewport.width as usize, x, y, color);
            }
        }
    }
}

/// Pixel range `[left, right) x [top, bottom)` covered by `rect`, clipped to the viewport.
fn clipped_pixel_span(viewport: Viewport, rect: Rect) -> Option<(i32, i32, i32, i32)> {
    if !rect.x.is_finite() || !rect.y.is_finite() || rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    let left = rect.x.round().max(0.0) as i32;
    let top = rect.y.round().max(0.0) as i32;
    let right = rect.right().round().min(viewport.width as f32) as i32;
    let bottom = rect.bottom().round().min(viewport.height as f32) as i32;
    (left < right && top < bottom).then_some((left, top, right, bottom))
}

fn blend_pixel_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    let pixel = &mut frame[byte_offset..end];
    let alpha = color.a as u32;
    for (channel, source) in pixel.iter_mut().zip([color.r, color.g, color.b]) {
        *channel = ((source as u32 * alpha + *channel as u32 * (255 - alpha)) / 255) as u8;
    }
    pixel[3] = 255;
}
