use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::content::{LevelData, LevelLoadError};
use crate::geometry::{Color, Viewport};
use crate::world::{Room, RoomSettings};

use super::controller::{Controller, DrawList, FrameContext};
use super::fade::{Fade, FadeRequest, FadeSpeed};
use super::input::{InputAction, InputSnapshot};
use super::rendering::ViewTransform;
use super::screens::{Credits, InGameMenu, Intro, TitleScreen};

pub const DEFAULT_INTRO_DURATION: Duration = Duration::from_secs(3);
pub const DEFAULT_CREDITS_DURATION: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameMode {
    Intro,
    TitleScreen,
    Room,
    InGameMenu,
    Credits,
    Exit,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot enter {to:?} from {from:?}")]
    InvalidStateTransition { from: GameMode, to: GameMode },
    #[error("no levels remain to start a room")]
    NoLevelsRemaining,
    #[error("failed to load level: {0}")]
    Load(#[from] LevelLoadError),
}

/// Ordered supply of levels for successive rooms.
pub trait LevelSource {
    fn has_more(&self) -> bool;

    fn next_level(&mut self) -> Result<Arc<LevelData>, LevelLoadError>;
}

/// In-memory level list.
#[derive(Debug, Clone, Default)]
pub struct LevelQueue {
    levels: VecDeque<Arc<LevelData>>,
}

impl LevelQueue {
    pub fn new(levels: impl IntoIterator<Item = LevelData>) -> Self {
        Self {
            levels: levels.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl LevelSource for LevelQueue {
    fn has_more(&self) -> bool {
        !self.levels.is_empty()
    }

    fn next_level(&mut self) -> Result<Arc<LevelData>, LevelLoadError> {
        self.levels
            .pop_front()
            .ok_or_else(|| LevelLoadError::MissingElement("level".to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub room: RoomSettings,
    pub intro_duration: Duration,
    pub credits_duration: Duration,
    /// Minimap visibility when the game starts; toggled in play and kept across rooms.
    pub show_minimap: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            room: RoomSettings::default(),
            intro_duration: DEFAULT_INTRO_DURATION,
            credits_duration: DEFAULT_CREDITS_DURATION,
            show_minimap: false,
        }
    }
}

/// What the frontend needs to present one frame.
#[derive(Debug, Clone)]
pub struct EngineFrame {
    pub draw_list: DrawList,
    pub view: ViewTransform,
    pub fade: Color,
}

/// Owns the active full-screen controller and the fade overlay that gates mode changes.
pub struct Engine {
    mode: GameMode,
    settings: EngineSettings,
    levels: Box<dyn LevelSource>,
    fade: Fade,
    intro: Option<Intro>,
    title: Option<TitleScreen>,
    room: Option<Room>,
    menu: Option<InGameMenu>,
    credits: Option<Credits>,
    minimap_visible: bool,
}

impl Engine {
    pub fn new(levels: Box<dyn LevelSource>, settings: EngineSettings) -> Self {
        Self {
            mode: GameMode::Intro,
            settings,
            levels,
            fade: Fade::default(),
            intro: Some(Intro::new(settings.intro_duration)),
            title: None,
            room: None,
            menu: None,
            credits: None,
            minimap_visible: settings.show_minimap,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn fade(&self) -> &Fade {
        &self.fade
    }

    pub fn minimap_visible(&self) -> bool {
        self.minimap_visible
    }

    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    pub fn room_mut(&mut self) -> Option<&mut Room> {
        self.room.as_mut()
    }

    /// Runs one frame. Returns the mode that is active afterwards.
    pub fn update(
        &mut self,
        input: &InputSnapshot,
        elapsed: Duration,
    ) -> Result<GameMode, EngineError> {
        if self.mode == GameMode::Exit {
            return Ok(GameMode::Exit);
        }
        if self.fade.in_progress() {
            self.fade.step();
            return Ok(self.mode);
        }

        let next = self.next_mode();
        if next != self.mode {
            let previous = self.mode;
            info!(from = ?previous, to = ?next, "mode_changed");
            self.mode = next;
            if next == GameMode::Exit {
                return Ok(GameMode::Exit);
            }
            self.setup_mode(previous)?;
        } else if self.mode == GameMode::Room && self.room.as_ref().is_some_and(Room::finished) {
            self.advance_room()?;
        }

        if self.mode == GameMode::Room && input.was_pressed(InputAction::Minimap) {
            self.minimap_visible = !self.minimap_visible;
            debug!(visible = self.minimap_visible, "minimap_toggled");
        }

        let mut ctx = FrameContext::new(input, elapsed);
        if let Some(controller) = self.active_controller() {
            controller.update(&mut ctx);
        }
        if let Some(request) = ctx.take_fade_request() {
            debug!(request = ?request, "fade_requested");
            self.fade.apply(request);
        }
        Ok(self.mode)
    }

    pub fn draw(&self, viewport: Viewport) -> EngineFrame {
        let mut draw_list = DrawList::new(viewport);
        let mut view = ViewTransform::screen(viewport);
        match self.mode {
            GameMode::Intro => draw_controller(self.intro.as_ref(), &mut draw_list),
            GameMode::TitleScreen => draw_controller(self.title.as_ref(), &mut draw_list),
            GameMode::Room => {
                if let Some(room) = &self.room {
                    view = room.view_transform(viewport);
                    room.draw(&mut draw_list);
                    if self.minimap_visible {
                        room.draw_minimap(&mut draw_list);
                    }
                }
            }
            GameMode::InGameMenu => {
                if let Some(room) = &self.room {
                    view = room.view_transform(viewport);
                    room.draw(&mut draw_list);
                }
                draw_controller(self.menu.as_ref(), &mut draw_list);
            }
            GameMode::Credits => draw_controller(self.credits.as_ref(), &mut draw_list),
            GameMode::Exit => {}
        }
        EngineFrame {
            draw_list,
            view,
            fade: self.fade.color(),
        }
    }

    fn next_mode(&self) -> GameMode {
        match self.mode {
            GameMode::Intro if is_finished(self.intro.as_ref()) => GameMode::TitleScreen,
            GameMode::TitleScreen => match &self.title {
                Some(title) if title.finished() && title.exit_selected() => GameMode::Exit,
                Some(title) if title.finished() => GameMode::Room,
                _ => GameMode::TitleScreen,
            },
            GameMode::Room => match &self.room {
                Some(room) if room.menu_requested() => GameMode::InGameMenu,
                Some(room) if room.finished() && !room.failed() && !self.levels.has_more() => {
                    GameMode::Credits
                }
                _ => GameMode::Room,
            },
            GameMode::InGameMenu if is_finished(self.menu.as_ref()) => GameMode::Room,
            GameMode::Credits if is_finished(self.credits.as_ref()) => GameMode::Exit,
            mode => mode,
        }
    }

    fn setup_mode(&mut self, previous: GameMode) -> Result<(), EngineError> {
        let invalid = EngineError::InvalidStateTransition {
            from: previous,
            to: self.mode,
        };
        match self.mode {
            GameMode::Intro => self.intro = Some(Intro::new(self.settings.intro_duration)),
            GameMode::TitleScreen => {
                self.intro = None;
                self.title = Some(TitleScreen::default());
            }
            GameMode::Room => match previous {
                GameMode::TitleScreen => {
                    self.title = None;
                    self.room = Some(self.load_next_room()?);
                }
                GameMode::InGameMenu => {
                    self.menu = None;
                    self.room.as_mut().ok_or(invalid)?.resume();
                }
                _ => return Err(invalid),
            },
            GameMode::InGameMenu => {
                if self.room.is_none() {
                    return Err(invalid);
                }
                self.menu = Some(InGameMenu::default());
            }
            GameMode::Credits => {
                self.room = None;
                self.credits = Some(Credits::new(self.settings.credits_duration));
            }
            GameMode::Exit => {}
        }
        self.fade.apply(FadeRequest::In(FadeSpeed::Fast));
        Ok(())
    }

    /// Replaces a finished room: a failed one is rebuilt from the same level, a cleared one
    /// gives way to the next level.
    fn advance_room(&mut self) -> Result<(), EngineError> {
        let restart = self
            .room
            .as_ref()
            .filter(|room| room.failed())
            .map(|room| Arc::clone(room.level()));
        let next = match restart {
            Some(level) => {
                info!(level = %level.name, "room_restarted");
                Room::new(level, self.settings.room)?
            }
            None => self.load_next_room()?,
        };
        self.room = Some(next);
        self.fade.apply(FadeRequest::In(FadeSpeed::Fast));
        Ok(())
    }

    fn load_next_room(&mut self) -> Result<Room, EngineError> {
        if !self.levels.has_more() {
            return Err(EngineError::NoLevelsRemaining);
        }
        let level = self.levels.next_level()?;
        Ok(Room::new(level, self.settings.room)?)
    }

    fn active_controller(&mut self) -> Option<&mut dyn Controller> {
        match self.mode {
            GameMode::Intro => self.intro.as_mut().map(|c| c as &mut dyn Controller),
            GameMode::TitleScreen => self.title.as_mut().map(|c| c as &mut dyn Controller),
            GameMode::Room => self.room.as_mut().map(|c| c as &mut dyn Controller),
            GameMode::InGameMenu => self.menu.as_mut().map(|c| c as &mut dyn Controller),
            GameMode::Credits => self.credits.as_mut().map(|c| c as &mut dyn Controller),
            GameMode::Exit => None,
        }
    }
}

fn is_finished<C: Controller>(controller: Option<&C>) -> bool {
    controller.is_some_and(Controller::finished)
}

fn draw_controller<C: Controller>(controller: Option<&C>, draw_list: &mut DrawList) {
    if let Some(controller) = controller {
        controller.draw(draw_list);
    }
}
