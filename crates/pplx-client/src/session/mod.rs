//! Session lifecycle.
//!
//! `SessionStore` serializes the single reusable `Session` record;
//! `SessionManager` owns the authentication state machine on top of it.

mod manager;
mod store;

pub use manager::{AuthState, SessionManager};
pub use store::SessionStore;
