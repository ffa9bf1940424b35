use crate::geometry::{Color, Rect, Vec2};

/// Horizontal inset of the collision box on each side, as a fraction of the body width.
pub const BOX_INSET_X: f32 = 0.2;
/// Vertical inset of the collision box, as a fraction of the body height.
pub const BOX_INSET_Y: f32 = 0.0;
/// Overlap needed for an object contact, as a fraction of the smaller box's area.
pub const CONTACT_FORGIVENESS: f32 = 0.5;

/// Kinematic state of anything that lives in a room.
///
/// `position` is the top-left of the drawn footprint. The collision box is derived from it and
/// is refreshed on every position write.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    position: Vec2,
    size: Vec2,
    bounding_box: Rect,
    pub velocity: Vec2,
    pub max_speed: Vec2,
    pub acceleration: Vec2,
    pub deceleration: Vec2,
    pub tint: Color,
    pub collidable: bool,
    pub applies_gravity: bool,
    grounded: bool,
}

impl Body {
    pub fn new(position: Vec2, size: Vec2, tint: Color) -> Self {
        let mut body = Self {
            position,
            size,
            bounding_box: Rect::default(),
            velocity: Vec2::ZERO,
            max_speed: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            deceleration: Vec2::ZERO,
            tint,
            collidable: true,
            applies_gravity: true,
            grounded: false,
        };
        body.refresh_box();
        body
    }

    pub fn with_motion(mut self, max_speed: Vec2, acceleration: Vec2, deceleration: Vec2) -> Self {
        self.max_speed = max_speed;
        self.acceleration = acceleration;
        self.deceleration = deceleration;
        self
    }

    pub fn without_gravity(mut self) -> Self {
        self.applies_gravity = false;
        self
    }

    pub fn non_collidable(mut self) -> Self {
        self.collidable = false;
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.refresh_box();
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_position_size(self.position, self.size)
    }

    pub fn bounding_box(&self) -> Rect {
        self.bounding_box
    }

    pub fn center(&self) -> Vec2 {
        self.bounds().center()
    }

    pub fn box_offset(&self) -> Vec2 {
        Vec2::new(BOX_INSET_X * self.size.x, BOX_INSET_Y * self.size.y)
    }

    /// Whether the body rested on a floor after its last move.
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub(crate) fn set_grounded(&mut self, grounded: bool) {
        self.grounded = grounded;
    }

    /// Moves the collision box to `box_position`, carrying the footprint with it.
    pub(crate) fn place_box_at(&mut self, box_position: Vec2) {
        self.set_position(box_position - self.box_offset());
    }

    /// Overlap test with forgiveness: grazing contacts below half the smaller box are ignored.
    pub fn touches(&self, other: &Body) -> bool {
        let Some(overlap) = self.bounding_box.intersection(&other.bounding_box) else {
            return false;
        };
        let smaller = if self.bounding_box.area() <= other.bounding_box.area() {
            self.bounding_box
        } else {
            other.bounding_box
        };
        overlap.area() > 0.0 && overlap.area() >= smaller.area() * CONTACT_FORGIVENESS
    }

    fn refresh_box(&mut self) {
        let offset = self.box_offset();
        self.bounding_box = Rect::new(
            self.position.x + offset.x,
            self.position.y + offset.y,
            (1.0 - 2.0 * BOX_INSET_X) * self.size.x,
            (1.0 - 2.0 * BOX_INSET_Y) * self.size.y,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_writes_keep_box_in_lockstep() {
        let mut body = Body::new(Vec2::new(10.0, 20.0), Vec2::new(50.0, 40.0), Color::WHITE);
        assert_eq!(body.bounding_box(), Rect::new(20.0, 20.0, 30.0, 40.0));

        body.set_position(Vec2::new(0.0, 0.0));
        assert_eq!(body.bounding_box(), Rect::new(10.0, 0.0, 30.0, 40.0));

        body.place_box_at(Vec2::new(30.0, 5.0));
        assert_eq!(body.position(), Vec2::new(20.0, 5.0));
    }

    #[test]
    fn grazing_overlap_is_forgiven() {
        let a = Body::new(Vec2::new(0.0, 0.0), Vec2::new(50.0, 50.0), Color::WHITE);
        let grazing = Body::new(Vec2::new(30.0, 40.0), Vec2::new(50.0, 50.0), Color::WHITE);
        let solid_hit = Body::new(Vec2::new(5.0, 5.0), Vec2::new(50.0, 50.0), Color::WHITE);
        assert!(!a.touches(&grazing));
        assert!(a.touches(&solid_hit));
        assert!(solid_hit.touches(&a));
    }
}
