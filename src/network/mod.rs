pub mod peers;

pub use peers::PeerRegistry;
