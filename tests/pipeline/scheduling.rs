use std::time::Duration;

use chrono::TimeDelta;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use couponwatch::scheduler::{RunState, Scheduler};

use crate::pipeline_harness::{Harness, listing, mount_listing_page, python_listings};

const DAY: Duration = Duration::from_secs(86_400);

#[tokio::test]
async fn failed_cycle_is_followed_by_successful_one() {
    let h = Harness::new().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .with_priority(1)
        .mount(&h.server)
        .await;
    mount_listing_page(&h.server, &python_listings()).await;

    let mut pipeline = h.pipeline();
    let mut scheduler = Scheduler::new(DAY, true, h.clock.clone());
    scheduler.run(&mut pipeline, Some(2)).await;

    let stats = scheduler.stats();
    assert_eq!(stats.runs, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(scheduler.last_outcome(), Some(RunState::Succeeded));
    assert_eq!(scheduler.state(), RunState::Idle);
    assert_eq!(h.channel.sent().len(), 3);
    assert_eq!(h.persisted().len(), 3);
}

#[tokio::test]
async fn daily_cycles_only_send_new_arrivals() {
    let h = Harness::new().await;
    mount_listing_page(&h.server, &python_listings()).await;

    let mut pipeline = h.pipeline();
    let mut scheduler = Scheduler::new(DAY, true, h.clock.clone());
    scheduler.run(&mut pipeline, Some(1)).await;
    assert_eq!(h.channel.sent().len(), 3);

    // Next day the site lists one more offer.
    h.clock.advance(DAY);
    h.server.reset().await;
    let mut entries = python_listings();
    entries.push(listing("py-4", "Python Web Scraping"));
    mount_listing_page(&h.server, &entries).await;

    scheduler.run(&mut pipeline, Some(2)).await;
    assert_eq!(scheduler.stats().runs, 2);

    let sent = h.channel.sent();
    assert_eq!(sent.len(), 4);
    assert!(sent[3].text.contains("Python Web Scraping"));
    let second_run_at = sent[3].at.unwrap();
    assert!(second_run_at - sent[0].at.unwrap() >= TimeDelta::days(1));
}
