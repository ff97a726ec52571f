//! Data models for aamonitor

mod application;
mod envelope;
mod service;
mod user;

pub use application::*;
pub use envelope::*;
pub use service::*;
pub use user::*;
