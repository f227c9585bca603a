// HTTP routes
pub mod downloads;
pub mod files;
pub mod health;
pub mod platforms;
pub mod status;

pub use downloads::*;
pub use files::*;
pub use health::*;
pub use platforms::*;
pub use status::*;
