use crate::clock::Clock;
use crate::coupons::{CouponRecord, ListingParser, coupon_code_from_url};
use crate::dedup::SeenStore;
use crate::error::CouponError;
use crate::fetcher::{ListingSource, Pages};
use crate::notifier::Notifier;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Counters for one scrape-and-notify run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub fetched: usize,
    pub parsed: usize,
    pub dropped: usize,
    pub duplicates: usize,
    pub already_seen: usize,
    pub new: usize,
    pub sent: usize,
    pub failed: usize,
}

/// fetch → parse/categorize → dedupe → notify, once.
pub struct Pipeline {
    source: Arc<dyn ListingSource>,
    parser: ListingParser,
    max_pages: u32,
    store: SeenStore,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn ListingSource>,
        parser: ListingParser,
        max_pages: u32,
        store: SeenStore,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            parser,
            max_pages,
            store,
            notifier,
            clock,
        }
    }

    pub fn store(&self) -> &SeenStore {
        &self.store
    }

    /// Run once. Only a fetch failure fails the run; per-entry and
    /// per-message failures are logged and counted.
    pub async fn run_once(&mut self) -> Result<RunReport, CouponError> {
        let mut report = RunReport::default();

        let raw = Pages::new(self.source.as_ref(), self.max_pages)
            .collect_all()
            .await?;
        report.fetched = raw.len();

        let scraped_at = self.clock.now();
        let mut records = Vec::with_capacity(raw.len());
        for listing in &raw {
            match self.parser.parse(listing, scraped_at) {
                Ok(record) => records.push(record),
                Err(e) => {
                    report.dropped += 1;
                    tracing::warn!(page = listing.page, "dropping listing entry: {e}");
                }
            }
        }
        report.parsed = records.len();

        let mut batch_ids = HashSet::new();
        let mut fresh = Vec::new();
        for record in records {
            if !batch_ids.insert(record.id.clone()) {
                report.duplicates += 1;
            } else if self.store.is_new(&record.id) {
                fresh.push(record);
            } else {
                report.already_seen += 1;
            }
        }
        report.new = fresh.len();

        for record in &mut fresh {
            self.resolve_detail(record).await;
        }

        let delivery = self.notifier.deliver(&fresh, &mut self.store).await;
        report.sent = delivery.records_sent;
        report.failed = delivery.records_failed;

        tracing::info!(
            fetched = report.fetched,
            parsed = report.parsed,
            dropped = report.dropped,
            new = report.new,
            sent = report.sent,
            failed = report.failed,
            channel = self.notifier.channel_name(),
            "run complete"
        );
        Ok(report)
    }

    /// Swap the listing link for the destination link. Failure keeps the
    /// listing link.
    async fn resolve_detail(&self, record: &mut CouponRecord) {
        let Ok(listing_url) = Url::parse(&record.url) else {
            return;
        };
        match self.source.resolve_detail(&listing_url).await {
            Ok(Some(target)) => {
                if record.code.is_none() {
                    record.code = coupon_code_from_url(&target);
                }
                record.url = target.to_string();
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(id = %record.id, "could not resolve detail link: {e}");
            }
        }
    }
}
