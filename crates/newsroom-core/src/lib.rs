pub mod config;
pub mod error;
pub mod event;

pub use config::NewsroomConfig;
pub use error::{NewsroomError, Result};
pub use event::EventFrame;
