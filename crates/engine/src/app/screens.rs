use std::time::Duration;

use crate::geometry::{Color, Rect, Vec2};

use super::controller::{Controller, DrawList, FrameContext};
use super::fade::{FadeRequest, FadeSpeed};
use super::input::InputAction;

const PANEL_COLOR: Color = Color::rgba(16, 16, 24, 200);

fn centered(draw_list: &DrawList, size: Vec2, offset_y: f32) -> Rect {
    let center = draw_list.viewport().size() * 0.5;
    Rect::new(
        center.x - size.x * 0.5,
        center.y - size.y * 0.5 + offset_y,
        size.x,
        size.y,
    )
}

/// Splash shown once at startup. Ends after its duration or on confirm, fading to white.
#[derive(Debug, Clone)]
pub struct Intro {
    remaining: Duration,
    done: bool,
}

impl Intro {
    pub fn new(duration: Duration) -> Self {
        Self {
            remaining: duration,
            done: false,
        }
    }
}

impl Controller for Intro {
    fn update(&mut self, ctx: &mut FrameContext<'_>) {
        if self.done {
            return;
        }
        self.remaining = self.remaining.saturating_sub(ctx.elapsed());
        if self.remaining.is_zero() || ctx.input().was_pressed(InputAction::Confirm) {
            self.done = true;
            ctx.request_fade(FadeRequest::Out(Color::WHITE, FadeSpeed::Medium));
        }
    }

    fn draw(&self, draw_list: &mut DrawList) {
        let logo = centered(draw_list, Vec2::new(96.0, 96.0), 0.0);
        draw_list.push_screen(logo, Color::LIGHT_GREEN);
    }

    fn finished(&self) -> bool {
        self.done
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleChoice {
    Start,
    Exit,
}

#[derive(Debug, Clone)]
pub struct TitleScreen {
    highlighted: TitleChoice,
    chosen: Option<TitleChoice>,
}

impl Default for TitleScreen {
    fn default() -> Self {
        Self {
            highlighted: TitleChoice::Start,
            chosen: None,
        }
    }
}

impl TitleScreen {
    pub fn highlighted(&self) -> TitleChoice {
        self.highlighted
    }

    pub fn exit_selected(&self) -> bool {
        self.chosen == Some(TitleChoice::Exit)
    }
}

impl Controller for TitleScreen {
    fn update(&mut self, ctx: &mut FrameContext<'_>) {
        if self.chosen.is_some() {
            return;
        }
        let input = ctx.input();
        if input.was_pressed(InputAction::MoveLeft) {
            self.highlighted = TitleChoice::Start;
        } else if input.was_pressed(InputAction::MoveRight) {
            self.highlighted = TitleChoice::Exit;
        }

        if input.was_pressed(InputAction::Menu) {
            self.chosen = Some(TitleChoice::Exit);
        } else if input.was_pressed(InputAction::Confirm) {
            self.chosen = Some(self.highlighted);
        }
    }

    fn draw(&self, draw_list: &mut DrawList) {
        let banner = centered(draw_list, Vec2::new(320.0, 48.0), -96.0);
        draw_list.push_screen(banner, Color::LIGHT_GREEN);
        for (choice, offset_x) in [(TitleChoice::Start, -80.0), (TitleChoice::Exit, 80.0)] {
            let mut button = centered(draw_list, Vec2::new(120.0, 40.0), 48.0);
            button.x += offset_x;
            let tint = if choice == self.highlighted {
                Color::WHITE
            } else {
                Color::GRAY
            };
            draw_list.push_screen(button, tint);
        }
    }

    fn finished(&self) -> bool {
        self.chosen.is_some()
    }
}

/// Pause screen drawn over the suspended room.
#[derive(Debug, Clone, Default)]
pub struct InGameMenu {
    resumed: bool,
}

impl Controller for InGameMenu {
    fn update(&mut self, ctx: &mut FrameContext<'_>) {
        let input = ctx.input();
        if input.was_pressed(InputAction::Confirm) || input.was_pressed(InputAction::Menu) {
            self.resumed = true;
        }
    }

    fn draw(&self, draw_list: &mut DrawList) {
        let size = draw_list.viewport().size();
        draw_list.push_screen(Rect::new(0.0, 0.0, size.x, size.y), PANEL_COLOR);
        let resume = centered(draw_list, Vec2::new(160.0, 40.0), 0.0);
        draw_list.push_screen(resume, Color::WHITE);
    }

    fn finished(&self) -> bool {
        self.resumed
    }
}

#[derive(Debug, Clone)]
pub struct Credits {
    remaining: Duration,
    elapsed: Duration,
    done: bool,
}

impl Credits {
    pub fn new(duration: Duration) -> Self {
        Self {
            remaining: duration,
            elapsed: Duration::ZERO,
            done: false,
        }
    }
}

impl Controller for Credits {
    fn update(&mut self, ctx: &mut FrameContext<'_>) {
        if self.done {
            return;
        }
        self.elapsed += ctx.elapsed();
        self.remaining = self.remaining.saturating_sub(ctx.elapsed());
        if self.remaining.is_zero() || ctx.input().was_pressed(InputAction::Confirm) {
            self.done = true;
            ctx.request_fade(FadeRequest::Out(Color::BLACK, FadeSpeed::Medium));
        }
    }

    fn draw(&self, draw_list: &mut DrawList) {
        // Rows scroll upward as time passes.
        let scroll = self.elapsed.as_secs_f32() * 40.0;
        let height = draw_list.viewport().size().y;
        for (row, width) in [240.0, 180.0, 200.0, 140.0].into_iter().enumerate() {
            let mut line = centered(draw_list, Vec2::new(width, 16.0), 0.0);
            line.y = height - scroll + row as f32 * 48.0;
            draw_list.push_screen(line, Color::WHITE);
        }
    }

    fn finished(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{DrawSpace, InputSnapshot};
    use crate::geometry::Viewport;

    fn frame<C: Controller>(
        controller: &mut C,
        input: &InputSnapshot,
        elapsed: Duration,
    ) -> Option<FadeRequest> {
        let mut ctx = FrameContext::new(input, elapsed);
        controller.update(&mut ctx);
        ctx.take_fade_request()
    }

    #[test]
    fn intro_ends_after_duration_with_white_fade() {
        let mut intro = Intro::new(Duration::from_millis(40));
        let idle = InputSnapshot::empty();
        assert_eq!(frame(&mut intro, &idle, Duration::from_millis(20)), None);
        assert!(!intro.finished());
        assert_eq!(
            frame(&mut intro, &idle, Duration::from_millis(20)),
            Some(FadeRequest::Out(Color::WHITE, FadeSpeed::Medium))
        );
        assert!(intro.finished());
        assert_eq!(frame(&mut intro, &idle, Duration::from_millis(20)), None);
    }

    #[test]
    fn intro_skips_on_confirm() {
        let mut intro = Intro::new(Duration::from_secs(60));
        let confirm = InputSnapshot::empty().with_action_pressed(InputAction::Confirm);
        frame(&mut intro, &confirm, Duration::ZERO);
        assert!(intro.finished());
    }

    #[test]
    fn title_confirms_highlighted_choice() {
        let mut title = TitleScreen::default();
        let right = InputSnapshot::empty().with_action_pressed(InputAction::MoveRight);
        frame(&mut title, &right, Duration::ZERO);
        assert_eq!(title.highlighted(), TitleChoice::Exit);

        let left = InputSnapshot::empty().with_action_pressed(InputAction::MoveLeft);
        frame(&mut title, &left, Duration::ZERO);
        let confirm = InputSnapshot::empty().with_action_pressed(InputAction::Confirm);
        frame(&mut title, &confirm, Duration::ZERO);
        assert!(title.finished());
        assert!(!title.exit_selected());
    }

    #[test]
    fn title_menu_key_selects_exit() {
        let mut title = TitleScreen::default();
        let menu = InputSnapshot::empty().with_action_pressed(InputAction::Menu);
        frame(&mut title, &menu, Duration::ZERO);
        assert!(title.exit_selected());
    }

    #[test]
    fn held_confirm_without_press_edge_does_not_resume_menu() {
        let mut menu = InGameMenu::default();
        let held = InputSnapshot::empty().with_action_down(InputAction::Confirm, true);
        frame(&mut menu, &held, Duration::ZERO);
        assert!(!menu.finished());
        let pressed = InputSnapshot::empty().with_action_pressed(InputAction::Confirm);
        frame(&mut menu, &pressed, Duration::ZERO);
        assert!(menu.finished());
    }

    #[test]
    fn credits_draw_in_screen_space() {
        let credits = Credits::new(Duration::from_secs(5));
        let mut draw_list = DrawList::new(Viewport {
            width: 640,
            height: 480,
        });
        credits.draw(&mut draw_list);
        assert_eq!(draw_list.len(), 4);
        assert!(draw_list
            .commands()
            .iter()
            .all(|command| command.space == DrawSpace::Screen));
    }
}
