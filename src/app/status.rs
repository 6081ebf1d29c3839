use crate::config::Config;

/// Startup summary of the effective configuration. Never includes secrets.
pub fn render_status(config: &Config, channel: &str, seen: usize) -> String {
    let recipients = if config.messaging.category_recipients.is_empty() {
        "default only".to_string()
    } else {
        config
            .messaging
            .category_recipients
            .keys()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    [
        format!("◆ couponwatch {}", env!("CARGO_PKG_VERSION")),
        format!("  config      {}", config.config_path.display()),
        format!(
            "  source      {}{}",
            config.source.base_url.trim_end_matches('/'),
            config.source.listing_path
        ),
        format!("  pages       {}", config.source.max_pages),
        format!("  interval    {}s", config.schedule.scrape_interval_secs),
        format!("  channel     {channel}"),
        format!("  overrides   {recipients}"),
        format!(
            "  store       {} ({seen} seen)",
            config.store.resolved_path().display()
        ),
    ]
    .join("\n")
}
