pub mod cli;
pub mod config;
pub mod console;
pub mod render;

pub use cli::Args;
pub use config::{Config, LogFormat};
pub use console::{Command, Session};
