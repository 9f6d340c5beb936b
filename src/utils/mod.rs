pub mod hash;

pub use hash::{fingerprint, meets_difficulty, DIFFICULTY};
