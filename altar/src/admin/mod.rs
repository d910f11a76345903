//! Control plane: the admin command endpoint and its client

mod client;
mod messages;
mod server;

pub use client::AdminClient;
pub use messages::{AdminCommand, AdminRequest};
pub use server::{ADMIN_PATH, AdminState, ShutdownHook, exit_process, router, serve};
