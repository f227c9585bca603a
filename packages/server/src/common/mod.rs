// Common types shared by the kernel and the HTTP layer

pub mod format;
pub mod id;
pub mod platform;

pub use format::{AudioFormat, InvalidFormat, DEFAULT_QUALITY, QUALITY_PRESETS};
pub use id::JobId;
pub use platform::{classify, Platform};
