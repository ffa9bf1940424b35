mod bootstrap;
mod catalog;
mod config;
mod loop_runner;

pub(crate) use bootstrap::build_app;
pub(crate) use loop_runner::run;
