pub mod client;
pub mod models;
pub mod server;

pub use client::{fan_out, HttpPeerClient, PeerClient};
pub use server::{configure_api_routes, run_server};
