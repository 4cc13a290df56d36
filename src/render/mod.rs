//! Visual inspection of fingerprints as block images.

mod block;

pub use block::{grid_side, render_indexed, BlockRenderer};
