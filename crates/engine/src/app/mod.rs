mod controller;
mod fade;
mod input;
mod loop_runner;
mod mode;
mod rendering;
mod screens;

pub use controller::{Controller, DrawCommand, DrawList, DrawSpace, FrameContext};
pub use fade::{Fade, FadeRequest, FadeSpeed};
pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_app, run_headless, AppError, HeadlessReport, LoopConfig};
pub use mode::{
    Engine, EngineError, EngineFrame, EngineSettings, GameMode, LevelQueue, LevelSource,
    DEFAULT_CREDITS_DURATION, DEFAULT_INTRO_DURATION,
};
pub use rendering::{Renderer, ViewTransform};
pub use screens::{Credits, InGameMenu, Intro, TitleChoice, TitleScreen};
