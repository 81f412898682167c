//! Data types for the template editor.

mod data;
mod geometry;
mod scene;

pub use data::*;
pub use geometry::*;
pub use scene::*;
