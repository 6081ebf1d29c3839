use std::time::Duration;

use chrono::TimeDelta;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use couponwatch::error::{CouponError, FetchError};

use crate::pipeline_harness::{
    Harness, RECIPIENT, listing, mount_listing_page, python_listings, start_time,
};

#[tokio::test]
async fn new_listings_are_each_sent_once_and_persisted() {
    let h = Harness::new().await;
    mount_listing_page(&h.server, &python_listings()).await;
    let mut pipeline = h.pipeline();

    let report = pipeline.run_once().await.unwrap();

    assert_eq!(report.fetched, 3);
    assert_eq!(report.new, 3);
    assert_eq!(report.sent, 3);
    let sent = h.channel.sent();
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|s| s.recipient == RECIPIENT));
    assert!(sent.iter().all(|s| s.text.contains("New Development Courses")));
    assert!(sent[0].text.contains("Complete Python Bootcamp"));
    assert!(sent[0].text.contains("Coupon: FREE-py-1"));

    let persisted = h.persisted();
    assert_eq!(persisted.len(), 3);
    for id in ["py-1", "py-2", "py-3"] {
        assert!(persisted.contains(id), "{id} missing from seen set");
    }
}

#[tokio::test]
async fn previously_seen_listings_are_skipped() {
    let h = Harness::new().await;
    h.seed_store(&["py-1", "py-2"]);
    mount_listing_page(&h.server, &python_listings()).await;
    let mut pipeline = h.pipeline();

    let report = pipeline.run_once().await.unwrap();

    assert_eq!(report.already_seen, 2);
    assert_eq!(report.sent, 1);
    let sent = h.channel.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("Automate Things with Python"));
}

#[tokio::test]
async fn rerun_with_unchanged_source_sends_nothing() {
    let h = Harness::new().await;
    mount_listing_page(&h.server, &python_listings()).await;

    h.pipeline().run_once().await.unwrap();
    // A fresh pipeline reloads the seen set from disk.
    let second = h.pipeline().run_once().await.unwrap();

    assert_eq!(second.new, 0);
    assert_eq!(second.sent, 0);
    assert_eq!(h.channel.sent().len(), 3);
    assert_eq!(h.persisted().len(), 3);
}

#[tokio::test]
async fn failed_send_is_retried_on_next_run() {
    let h = Harness::new().await;
    mount_listing_page(&h.server, &[listing("py-9", "Python Testing")]).await;
    let mut pipeline = h.pipeline();

    // One attempt plus two retries, all failing.
    h.channel.fail_next(3);
    let first = pipeline.run_once().await.unwrap();
    assert_eq!(first.failed, 1);
    assert!(h.channel.sent().is_empty());
    assert!(h.persisted().is_empty());

    let second = pipeline.run_once().await.unwrap();
    assert_eq!(second.sent, 1);
    assert_eq!(h.channel.sent().len(), 1);
    assert!(h.persisted().contains("py-9"));
}

#[tokio::test]
async fn transient_send_failure_recovers_within_run() {
    let h = Harness::new().await;
    mount_listing_page(&h.server, &[listing("py-9", "Python Testing")]).await;
    let mut pipeline = h.pipeline();

    h.channel.fail_next(2);
    let report = pipeline.run_once().await.unwrap();

    assert_eq!(report.sent, 1);
    assert!(h.clock.sleeps().contains(&Duration::from_millis(100)));
    assert!(h.clock.sleeps().contains(&Duration::from_millis(200)));
}

#[tokio::test]
async fn fetch_exhaustion_fails_run_and_leaves_store_untouched() {
    let h = Harness::new().await;
    h.seed_store(&["old-1"]);
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&h.server)
        .await;
    let mut pipeline = h.pipeline();

    let err = pipeline.run_once().await.unwrap_err();

    assert!(matches!(
        err,
        CouponError::Fetch(FetchError::Http { status: 503, .. })
    ));
    assert!(h.channel.sent().is_empty());
    let persisted = h.persisted();
    assert_eq!(persisted.len(), 1);
    assert!(persisted.contains("old-1"));
}

#[tokio::test]
async fn missing_store_file_treats_everything_as_new() {
    let h = Harness::new().await;
    assert!(!h.store_path().exists());
    mount_listing_page(&h.server, &python_listings()).await;

    let report = h.pipeline().run_once().await.unwrap();

    assert_eq!(report.new, 3);
    assert!(h.store_path().exists());
}

#[tokio::test]
async fn corrupt_store_file_treats_everything_as_new() {
    let h = Harness::new().await;
    std::fs::write(h.store_path(), "not json at all").unwrap();
    mount_listing_page(&h.server, &python_listings()).await;

    let report = h.pipeline().run_once().await.unwrap();

    assert_eq!(report.new, 3);
    assert_eq!(h.persisted().len(), 3);
}

#[tokio::test]
async fn sends_are_spaced_by_rate_limit() {
    let h = Harness::new().await;
    mount_listing_page(&h.server, &python_listings()).await;

    h.pipeline().run_once().await.unwrap();

    let times: Vec<_> = h.channel.sent().into_iter().filter_map(|s| s.at).collect();
    assert_eq!(times.len(), 3);
    assert_eq!(times[0], start_time());
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= TimeDelta::seconds(20));
    }
}

#[tokio::test]
async fn malformed_entries_are_dropped_not_fatal() {
    let h = Harness::new().await;
    let entries = vec![
        listing("py-1", "Complete Python Bootcamp"),
        r#"<li><a href="/offer/no-title"><h3>   </h3></a></li>"#.to_string(),
    ];
    mount_listing_page(&h.server, &entries).await;

    let report = h.pipeline().run_once().await.unwrap();

    assert_eq!(report.sent, 1);
    assert_eq!(h.channel.sent().len(), 1);
}

#[tokio::test]
async fn detail_page_link_replaces_listing_link() {
    let mut h = Harness::new().await;
    h.config.source.detail_link_host = Some("udemy.com".into());
    mount_listing_page(&h.server, &[listing("py-1", "Complete Python Bootcamp")]).await;
    Mock::given(method("GET"))
        .and(path("/offer/py-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <a href="/">home</a>
                <a href="https://www.udemy.com/course/python-bootcamp/?couponCode=APRIL25">Enroll</a>
            </body></html>"#,
        ))
        .mount(&h.server)
        .await;

    h.pipeline().run_once().await.unwrap();

    let sent = h.channel.sent();
    assert!(sent[0]
        .text
        .contains("https://www.udemy.com/course/python-bootcamp/?couponCode=APRIL25"));
}
