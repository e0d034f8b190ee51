pub(crate) mod bootstrap;
mod content;
mod gameplay;
pub(crate) mod loop_runner;
mod settings;
