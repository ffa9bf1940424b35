use crate::geometry::Color;

/// Channel step per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FadeSpeed {
    Slow,
    Medium,
    Fast,
}

impl FadeSpeed {
    pub const fn step(self) -> u8 {
        match self {
            FadeSpeed::Slow => 1,
            FadeSpeed::Medium => 3,
            FadeSpeed::Fast => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeRequest {
    /// Cover the screen with `color`.
    Out(Color, FadeSpeed),
    /// Clear the overlay back to transparent.
    In(FadeSpeed),
}

/// Full-screen overlay color easing toward a target. While it moves, mode transitions wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fade {
    current: Color,
    target: Color,
    step: u8,
}

impl Default for Fade {
    fn default() -> Self {
        Self {
            current: Color::TRANSPARENT,
            target: Color::TRANSPARENT,
            step: FadeSpeed::Fast.step(),
        }
    }
}

impl Fade {
    pub fn color(&self) -> Color {
        self.current
    }

    pub fn target(&self) -> Color {
        self.target
    }

    pub fn in_progress(&self) -> bool {
        self.current != self.target
    }

    pub fn apply(&mut self, request: FadeRequest) {
        let (target, speed) = match request {
            FadeRequest::Out(color, speed) => (color, speed),
            FadeRequest::In(speed) => (Color::TRANSPARENT, speed),
        };
        self.target = target;
        self.step = speed.step();
    }

    pub fn step(&mut self) {
        self.current = self.current.push_towards(self.target, self.step);
    }
}
