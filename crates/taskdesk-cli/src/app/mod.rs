//! Application wiring.

mod init;
mod state;

pub use init::{bootstrap, BootstrapOptions};
pub use state::AppState;
