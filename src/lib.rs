pub mod chat;
pub mod config;
pub mod console;
pub mod demo;
pub mod error;
pub mod forms;
pub mod items;
pub mod models;
pub mod qr;
pub mod session;
pub mod storage;

pub use error::{Error, Result};
