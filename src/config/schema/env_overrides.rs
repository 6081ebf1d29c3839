use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("COUPONWATCH_BASE_URL")
            && !url.is_empty()
        {
            self.source.base_url = url;
        }

        if let Ok(agent) = std::env::var("COUPONWATCH_USER_AGENT")
            && !agent.is_empty()
        {
            self.source.user_agent = agent;
        }

        if let Ok(secs_str) = std::env::var("COUPONWATCH_SCRAPE_INTERVAL_SECS")
            && let Ok(secs) = secs_str.parse::<u64>()
            && secs > 0
        {
            self.schedule.scrape_interval_secs = secs;
        }

        if let Ok(path) = std::env::var("COUPONWATCH_STORE_PATH")
            && !path.is_empty()
        {
            self.store.path = path;
        }
    }
}
