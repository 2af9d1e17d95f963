pub mod config;
pub mod env;
pub mod error;
pub mod escape;
pub mod fields;
pub mod host;
pub mod layout;
pub mod record;

pub mod sink;
pub mod layer;
pub mod file_sink;
pub mod init;
pub mod noop_sink;

pub use config::LayoutConfig;
pub use fields::{FieldDescriptor, FieldKey, FieldRegistry};
pub use layout::{JsonLayout, NoSinkPath, SinkPathResolver};
pub use record::{ErrorInfo, LocationInfo, LogRecord};
