//! `tutorflow-events` — event and command abstractions.

pub mod command;
pub mod event;

pub use command::Command;
pub use event::Event;
