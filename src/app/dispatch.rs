use crate::app::status::render_status;
use crate::channels::{Channel, LogChannel, WhatsAppChannel};
use crate::cli::Cli;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, Credentials};
use crate::coupons::{Categorizer, ListingParser};
use crate::dedup::SeenStore;
use crate::fetcher::HttpFetcher;
use crate::notifier::{MessageFormatter, Notifier, NotifierSettings};
use crate::pipeline::Pipeline;
use crate::retry::RetryPolicy;
use crate::scheduler::Scheduler;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The delivery channel and who it sends to by default.
fn build_channel(config: &Config, dry_run: bool) -> Result<(Arc<dyn Channel>, String)> {
    if dry_run {
        let recipient = std::env::var("COUPONWATCH_TO_NUMBER")
            .map(|n| crate::config::normalize_number(&n))
            .unwrap_or_else(|_| "dry-run".into());
        return Ok((Arc::new(LogChannel::new()), recipient));
    }

    let credentials = Credentials::from_env().context("messaging credentials")?;
    let channel = WhatsAppChannel::new(&config.messaging.api_base_url, &credentials);
    Ok((Arc::new(channel), credentials.to_number.clone()))
}

/// Wire every component from `config` with the given clock.
pub fn build_pipeline(
    config: &Config,
    channel: Arc<dyn Channel>,
    default_recipient: String,
    clock: Arc<dyn Clock>,
) -> Result<Pipeline> {
    let retry = RetryPolicy::from_config(&config.reliability);
    let fetcher = HttpFetcher::new(&config.source, retry, clock.clone())
        .context("building HTTP fetcher")?;
    let parser = ListingParser::new(
        config.source.base_url()?,
        Categorizer::new(&config.category_keywords),
    );
    let store = SeenStore::open(config.store.resolved_path());
    let formatter = MessageFormatter::new(config.notifier.message_template.as_deref())?;
    let notifier = Notifier::new(
        channel,
        clock.clone(),
        formatter,
        NotifierSettings::from_config(config, default_recipient),
    );

    Ok(Pipeline::new(
        Arc::new(fetcher),
        parser,
        config.source.max_pages,
        store,
        notifier,
        clock,
    ))
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    let (channel, recipient) = build_channel(&config, cli.dry_run)?;
    if !cli.dry_run && !channel.health_check().await {
        tracing::warn!(channel = channel.name(), "channel health check failed, continuing");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let channel_name = channel.name().to_string();
    let mut pipeline = build_pipeline(&config, channel, recipient, clock.clone())?;
    info!(
        "\n{}",
        render_status(&config, &channel_name, pipeline.store().len())
    );

    let mut scheduler = Scheduler::new(
        Duration::from_secs(config.schedule.scrape_interval_secs),
        config.schedule.run_on_start || cli.once,
        clock,
    );
    let max_cycles = cli.once.then_some(1);
    scheduler.run(&mut pipeline, max_cycles).await;

    let stats = scheduler.stats();
    info!(
        runs = stats.runs,
        succeeded = stats.succeeded,
        failed = stats.failed,
        "scheduler stopped"
    );
    Ok(())
}
