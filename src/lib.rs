pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod network;
pub mod node;
pub mod utils;

pub use error::{Error, Result};
pub use node::{Node, NodeIdentity};
