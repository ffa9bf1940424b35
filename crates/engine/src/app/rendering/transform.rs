use crate::geometry::{Rect, Vec2, Viewport};

/// Maps level coordinates to window pixels: the focus point lands on the viewport center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub focus: Vec2,
    pub zoom: f32,
    pub viewport: Viewport,
}

impl ViewTransform {
    /// Identity mapping for screen-space content.
    pub fn screen(viewport: Viewport) -> Self {
        Self {
            focus: viewport.size() * 0.5,
            zoom: 1.0,
            viewport,
        }
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.focus) * self.zoom + self.viewport.size() * 0.5
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.viewport.size() * 0.5) * (1.0 / self.zoom) + self.focus
    }

    pub fn world_rect_to_screen(&self, rect: Rect) -> Rect {
        let top_left = self.world_to_screen(rect.position());
        Rect::from_position_size(top_left, rect.size() * self.zoom)
    }

    /// Level region currently visible through the viewport.
    pub fn visible_world(&self) -> Rect {
        let top_left = self.screen_to_world(Vec2::ZERO);
        Rect::from_position_size(top_left, self.viewport.size() * (1.0 / self.zoom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_maps_to_viewport_center() {
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let transform = ViewTransform {
            focus: Vec2::new(100.0, 50.0),
            zoom: 2.0,
            viewport,
        };
        assert_eq!(transform.world_to_screen(Vec2::new(100.0, 50.0)), Vec2::new(400.0, 300.0));
        assert_eq!(transform.world_to_screen(Vec2::new(110.0, 45.0)), Vec2::new(420.0, 290.0));
    }

    #[test]
    fn screen_transform_is_identity() {
        let viewport = Viewport {
            width: 640,
            height: 480,
        };
        let transform = ViewTransform::screen(viewport);
        assert_eq!(transform.world_to_screen(Vec2::new(12.0, 34.0)), Vec2::new(12.0, 34.0));
        assert_eq!(
            transform.world_rect_to_screen(Rect::new(1.0, 2.0, 3.0, 4.0)),
            Rect::new(1.0, 2.0, 3.0, 4.0)
        );
    }

    #[test]
    fn visible_world_shrinks_with_zoom() {
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let transform = ViewTransform {
            focus: Vec2::new(400.0, 300.0),
            zoom: 2.0,
            viewport,
        };
        assert_eq!(transform.visible_world(), Rect::new(200.0, 150.0, 400.0, 300.0));
    }
}
