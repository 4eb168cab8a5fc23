pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod push;
pub mod runtime;
pub mod social;
pub mod store;
pub mod tracing_setup;

pub use config::{ConfigError, CoreConfig};
pub use error::CoreError;
pub use models::AggregateBadgeState;
pub use runtime::CoreRuntime;
pub use social::SocialCore;
