pub mod api;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod engine;
pub mod realtime;
pub mod session;
pub mod store;

#[cfg(test)]
pub mod test_utils;

pub use config::ClientConfig;
pub use dispatch::{ActionDispatcher, DispatchError};
pub use session::{GameSession, SessionUpdate, UpdateSource};
pub use store::StateStore;
