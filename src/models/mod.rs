pub use config::Config;
pub use error::Error;
pub use state::AppState;

mod config;
mod error;
mod state;
