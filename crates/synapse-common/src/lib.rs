pub mod errors;
pub mod id;

pub use errors::{ConfigError, SessionError, SynapseError};
pub use id::{new_correlation_id, MessageId, SessionId};

pub type Result<T> = std::result::Result<T, SynapseError>;
