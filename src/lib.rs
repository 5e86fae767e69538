pub mod api;
pub mod config;
pub mod error;
pub mod init;
pub mod renderer;
pub mod sanitizer;
pub mod server;
