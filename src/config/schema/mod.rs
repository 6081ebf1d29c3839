mod credentials;
mod env_overrides;
mod loader;
#[cfg(test)]
pub(crate) mod test_env;
mod types;

pub use credentials::Credentials;
pub(crate) use credentials::normalize_number;
pub use types::{
    Config, MessagingConfig, NotifierConfig, ReliabilityConfig, ScheduleConfig, SourceConfig,
    StoreConfig,
};
