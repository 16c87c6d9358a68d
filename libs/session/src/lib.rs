//! Cooperative word-search session coordination.
//!
//! Groups of 2–8 players jointly solve a shared word-search grid in real
//! time. All coordination state lives in a single session document held by
//! a [`store::SessionStore`]; every participating client runs the same
//! [`coordinator::SessionCoordinator`] logic against that shared document,
//! and the store fans each new document state out to every subscriber.
//! There is no server-side authority beyond the store's atomic update
//! primitives.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod room_code;
pub mod store;
pub mod words;

pub use config::CoordinatorConfig;
pub use coordinator::SessionCoordinator;
pub use error::{SessionError, StoreError};
