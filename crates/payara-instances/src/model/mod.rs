//! Server instance descriptors and their persisted form.

pub mod instance;
pub mod record;

pub use instance::*;
pub use record::*;
