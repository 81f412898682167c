//! Rendering with pluggable backends.
//!
//! This module provides:
//! - A backend-agnostic draw list built from the session or an export frame
//! - Canvas 2D backend and `toBlob` rasterizer (wasm32)
//! - CPU backend and PNG rasterizer (native)
//! - Color parsing utilities

pub mod backend;
pub mod colors;

#[cfg(target_arch = "wasm32")]
pub mod canvas;
#[cfg(not(target_arch = "wasm32"))]
pub mod raster;

pub use backend::{editor_params, frame_params, DrawOp, RenderBackend, RenderParams};
pub use colors::{palette, parse_color, CssColor, Rgb};

#[cfg(target_arch = "wasm32")]
pub use canvas::{CanvasRasterizer, CanvasRenderer};
#[cfg(not(target_arch = "wasm32"))]
pub use raster::{FontBook, ImageRasterizer};
