//! Layout and interaction engine for Gantt timelines.
//!
//! [`engine::TimeScale`] maps timestamps to the visible window,
//! [`engine::TimelineLayout`] turns an [`model::ItemStore`] into bars,
//! connector routes and hit regions, and [`engine::DragEngine`] turns pointer
//! gestures on those bars into edits of the store.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;

pub use config::TimelineConfig;
pub use error::{Result, TimelineError};
