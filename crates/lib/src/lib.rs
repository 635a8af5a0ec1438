//! Parley core library — message channels, output rendering and response
//! streaming, shared by the CLI and any embedding application.

pub mod channels;
pub mod config;
pub mod server;
