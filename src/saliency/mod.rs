//! Gradient-weighted saliency heatmaps
//!
//! Turns a captured (activation, gradient) pair from one forward/backward
//! cycle into a normalized single-channel heatmap, then renders it over
//! the source image:
//!
//! - **activation**: tagged spatial/token activation maps
//! - **gradcam**: the importance-weighted combination rule
//! - **heatmap**: the normalized 2-D score grid
//! - **render**: resize, polarity inversion, colorize, overlay
//! - **colormap**: the fixed perceptual color ramp

mod activation;
mod colormap;
mod gradcam;
mod heatmap;
mod render;

pub use activation::{ActivationMap, CapturedPair};
pub use colormap::ramp;
pub use gradcam::compute;
pub use heatmap::Heatmap;
pub use render::{finalize, overlay};
