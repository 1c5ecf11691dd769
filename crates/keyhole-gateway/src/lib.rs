//! HTTP gateway in front of the Keyhole shortening engine.

pub mod app;
pub mod cli;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;
pub mod wiring;

pub use app::App;
pub use state::AppState;
