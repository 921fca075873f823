pub mod utils;
pub use anyhow::Error;
pub type Result<T> = anyhow::Result<T>;

pub mod proc;
pub use proc::*;

pub mod cli;
pub mod settings;
