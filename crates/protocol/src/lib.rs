mod request;
mod response;
mod types;
mod version;

pub use request::DaemonRequest;
pub use response::DaemonResponse;
pub use types::{DaemonStatus, NotificationEvent, ReadingSnapshot};
pub use version::{MIN_SUPPORTED_VERSION, PROTOCOL_VERSION};
