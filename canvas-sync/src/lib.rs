pub mod cli;
pub mod load_config;
pub mod notion;
pub mod telegram;

pub use cli::{run, Cli};
