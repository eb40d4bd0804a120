//! Session/identity: who is signed in, persisted across restarts.

pub mod model;
pub mod storage;
pub mod store;

pub use model::{Session, User};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use store::SessionStore;
