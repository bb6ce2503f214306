pub mod ast;
pub mod config;
pub mod defaults;
pub mod error;
mod process;
pub mod proof;
pub mod service;
pub mod store;
