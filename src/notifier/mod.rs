mod format;

pub use format::{DEFAULT_TEMPLATE, MessageFormatter};

use crate::channels::Channel;
use crate::clock::Clock;
use crate::config::Config;
use crate::coupons::{Category, CouponRecord};
use crate::dedup::SeenStore;
use crate::error::NotifierError;
use crate::retry::{self, RetryPolicy};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Static notifier settings, built once from config at startup.
#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub rate_limit_delay: Duration,
    pub records_per_message: usize,
    pub retry: RetryPolicy,
    pub default_recipient: String,
    pub category_recipients: BTreeMap<Category, String>,
    /// Shown in the message footer.
    pub source_label: String,
}

impl NotifierSettings {
    pub fn from_config(config: &Config, default_recipient: impl Into<String>) -> Self {
        let source_label = config
            .source
            .base_url()
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
            .unwrap_or_else(|| config.source.base_url.clone());

        Self {
            rate_limit_delay: Duration::from_millis(config.notifier.rate_limit_delay_ms),
            records_per_message: config.notifier.records_per_message,
            retry: RetryPolicy::from_config(&config.reliability),
            default_recipient: default_recipient.into(),
            category_recipients: config.messaging.category_recipients.clone(),
            source_label,
        }
    }
}

/// Outcome of one [`Notifier::deliver`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub messages_sent: usize,
    pub messages_failed: usize,
    pub records_sent: usize,
    pub records_failed: usize,
}

/// Formats new records into messages and pushes them through a [`Channel`].
pub struct Notifier {
    channel: Arc<dyn Channel>,
    clock: Arc<dyn Clock>,
    formatter: MessageFormatter,
    settings: NotifierSettings,
    /// Time of the last send attempt, successful or not.
    last_attempt_at: Mutex<Option<DateTime<Utc>>>,
}

impl Notifier {
    pub fn new(
        channel: Arc<dyn Channel>,
        clock: Arc<dyn Clock>,
        formatter: MessageFormatter,
        settings: NotifierSettings,
    ) -> Self {
        Self {
            channel,
            clock,
            formatter,
            settings,
            last_attempt_at: Mutex::new(None),
        }
    }

    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }

    fn recipient_for(&self, category: Category) -> &str {
        self.settings
            .category_recipients
            .get(&category)
            .map_or(self.settings.default_recipient.as_str(), String::as_str)
    }

    /// Send every record, marking each one seen right after its message goes out.
    ///
    /// A message that still fails after the retry budget is skipped; its
    /// records stay unseen so the next run picks them up again.
    pub async fn deliver(
        &mut self,
        records: &[CouponRecord],
        store: &mut SeenStore,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for (category, group) in plan_messages(records, self.settings.records_per_message) {
            let group_len = group.len();
            let batches = match self.fit_to_channel(category, group) {
                Ok(batches) => batches,
                Err(e) => {
                    report.messages_failed += 1;
                    report.records_failed += group_len;
                    tracing::error!(
                        category = %category,
                        records = group_len,
                        "could not render message: {e}"
                    );
                    continue;
                }
            };

            for batch in batches {
                match self.send_batch(category, &batch).await {
                    Ok(()) => {
                        report.messages_sent += 1;
                        report.records_sent += batch.len();
                        let now = self.clock.now();
                        for record in &batch {
                            if let Err(e) = store.mark_seen(&record.id, now) {
                                tracing::error!(id = %record.id, "failed to persist seen set: {e}");
                            }
                        }
                    }
                    Err(e) => {
                        report.messages_failed += 1;
                        report.records_failed += batch.len();
                        tracing::error!(
                            category = %category,
                            records = batch.len(),
                            channel = self.channel.name(),
                            "skipping message after failed send: {e}"
                        );
                    }
                }
            }
        }

        report
    }

    /// Split `group` into batches whose full rendering fits the channel.
    /// A record too long on its own is still sent alone, cut to the limit.
    fn fit_to_channel<'r>(
        &self,
        category: Category,
        group: Vec<&'r CouponRecord>,
    ) -> Result<Vec<Vec<&'r CouponRecord>>, NotifierError> {
        let limit = self.channel.max_message_length();
        let mut batches = Vec::new();
        let mut current: Vec<&CouponRecord> = Vec::new();

        for record in group {
            current.push(record);
            if current.len() == 1 {
                continue;
            }
            let text = self
                .formatter
                .render_full(category, &self.settings.source_label, &current)?;
            if text.chars().count() > limit {
                current.pop();
                batches.push(std::mem::replace(&mut current, vec![record]));
            }
        }
        if !current.is_empty() {
            batches.push(current);
        }
        Ok(batches)
    }

    async fn send_batch(
        &self,
        category: Category,
        batch: &[&CouponRecord],
    ) -> Result<(), NotifierError> {
        let text = self.formatter.render(
            category,
            &self.settings.source_label,
            batch,
            self.channel.max_message_length(),
        )?;
        let recipient = self.recipient_for(category);

        let text = text.as_str();
        let result = retry::with_backoff(
            self.clock.as_ref(),
            self.settings.retry,
            "message send",
            move || async move {
                self.wait_for_rate_limit().await;
                let outcome = self.channel.send(text, recipient).await;
                self.note_attempt();
                outcome
            },
        )
        .await;

        if result.is_ok() {
            tracing::info!(
                category = %category,
                records = batch.len(),
                recipient = %recipient,
                "message sent"
            );
        }
        result
    }

    fn last_attempt(&self) -> Option<DateTime<Utc>> {
        *self
            .last_attempt_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn note_attempt(&self) {
        *self
            .last_attempt_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(self.clock.now());
    }

    /// Hold every attempt, retries included, `rate_limit_delay` after the last one.
    async fn wait_for_rate_limit(&self) {
        let Some(last) = self.last_attempt() else {
            return;
        };
        let delay = TimeDelta::from_std(self.settings.rate_limit_delay).unwrap_or(TimeDelta::MAX);
        let ready_at = last.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.clock.sleep_until(ready_at).await;
    }
}

/// Group records by category (first-appearance order) and split each group
/// into chunks of at most `per_message` records.
pub fn plan_messages(
    records: &[CouponRecord],
    per_message: usize,
) -> Vec<(Category, Vec<&CouponRecord>)> {
    let per_message = per_message.max(1);
    let mut groups: Vec<(Category, Vec<&CouponRecord>)> = Vec::new();

    for record in records {
        match groups.iter_mut().find(|(c, _)| *c == record.category) {
            Some((_, members)) => members.push(record),
            None => groups.push((record.category, vec![record])),
        }
    }

    groups
        .into_iter()
        .flat_map(|(category, members)| {
            members
                .chunks(per_message)
                .map(|chunk| (category, chunk.to_vec()))
                .collect::<Vec<_>>()
        })
        .collect()
}
