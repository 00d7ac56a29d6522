//! Stream pacing utilities.

mod pace;

pub use pace::{Pace, PaceExt};
