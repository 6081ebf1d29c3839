#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod app;
pub mod channels;
pub mod cli;
pub mod clock;
pub mod config;
pub mod coupons;
pub mod dedup;
pub mod error;
pub mod fetcher;
pub mod notifier;
pub mod pipeline;
pub mod retry;
pub mod scheduler;
#[doc(hidden)]
pub mod tls;

pub use config::Config;
pub use error::{CouponError, Result};
