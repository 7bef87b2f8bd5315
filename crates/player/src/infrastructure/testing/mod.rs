//! Test helpers shared by unit tests.

mod log_capture;

pub use log_capture::LogCapture;
