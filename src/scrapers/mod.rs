//! Page rendering and capture.

mod browser;

pub use browser::{capture_site, CaptureConfig};
