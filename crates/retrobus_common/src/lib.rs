pub mod pacing;

pub use pacing::{FixedRate, NoPacing, Pacer};
