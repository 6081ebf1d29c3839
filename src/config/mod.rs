pub mod schema;

pub use schema::{
    Config, Credentials, MessagingConfig, NotifierConfig, ReliabilityConfig, ScheduleConfig,
    SourceConfig, StoreConfig,
};
pub(crate) use schema::normalize_number;
