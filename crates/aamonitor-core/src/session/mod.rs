//! Session context
//!
//! Holds the bearer token and user data for the lifetime of a dashboard run
//! (memory storage) or across CLI invocations (file storage). The context is
//! created once at startup and handed to every collaborator that needs the
//! token; nothing reads the storage behind its back.

mod context;
mod storage;

pub use context::{SessionContext, TOKEN_KEY, USER_DATA_KEY};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
