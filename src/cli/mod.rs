pub mod command;
mod display;
pub mod error;
pub mod install;
mod resolve;
