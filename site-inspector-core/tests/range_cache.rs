#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Provider range documents and the monthly cache.

mod common;

use std::sync::Arc;

use chrono::Utc;
use common::{AMAZON_RANGES, AZURE_RANGES, CannedDocuments};
use site_inspector_core::MonthlyFileCache;
use site_inspector_core::ranges::{Provider, RangeRegistry};

#[tokio::test]
async fn feeds_fetched_once_per_month() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let cache = MonthlyFileCache::new(dir.path());
    let documents = Arc::new(
        CannedDocuments::new()
            .document(&config.amazon_ranges_url, AMAZON_RANGES)
            .document(&config.azure_ranges_url, AZURE_RANGES),
    );

    let first = RangeRegistry::load(&config, &cache, documents.as_ref()).await;
    let second = RangeRegistry::load(&config, &cache, documents.as_ref()).await;

    assert_eq!(documents.fetches(), 2);
    for registry in [&first, &second] {
        assert!(registry.in_range("13.33.0.1", Provider::Amazon, Some("CLOUDFRONT")));
        assert!(registry.in_range("13.107.246.7", Provider::Azure, Some("AzureFrontDoor.Frontend")));
    }
    assert!(cache.path_for("amazon-ip-ranges", Utc::now()).exists());
    assert!(cache.path_for("azure-ip-ranges", Utc::now()).exists());
}

#[tokio::test]
async fn unavailable_feeds_leave_curated_ranges() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let cache = MonthlyFileCache::new(dir.path());
    let documents = CannedDocuments::new();

    let registry = RangeRegistry::load(&config, &cache, &documents).await;

    assert!(registry.registry(Provider::Amazon).unwrap().is_empty());
    assert!(registry.registry(Provider::Azure).unwrap().is_empty());
    assert!(registry.in_range("104.16.0.1", Provider::Cloudflare, None));
    assert!(!cache.path_for("amazon-ip-ranges", Utc::now()).exists());
}

#[tokio::test]
async fn previous_month_copy_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let cache = MonthlyFileCache::new(dir.path());
    std::fs::write(dir.path().join("amazon-ip-ranges-2000-01.json"), "{\"prefixes\": []}").unwrap();
    let documents = CannedDocuments::new().document(&config.amazon_ranges_url, AMAZON_RANGES);

    let registry = RangeRegistry::load(&config, &cache, &documents).await;

    assert!(registry.in_range("3.24.0.9", Provider::Amazon, Some("EC2")));
    assert!(!dir.path().join("amazon-ip-ranges-2000-01.json").exists());
}

#[tokio::test]
async fn maintenance_page_does_not_stick_for_the_month() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let cache = MonthlyFileCache::new(dir.path());
    let outage = CannedDocuments::new()
        .document(&config.amazon_ranges_url, "<html>maintenance</html>")
        .document(&config.azure_ranges_url, AZURE_RANGES);
    let recovered = CannedDocuments::new()
        .document(&config.amazon_ranges_url, AMAZON_RANGES)
        .document(&config.azure_ranges_url, AZURE_RANGES);

    let during = RangeRegistry::load(&config, &cache, &outage).await;
    assert!(during.registry(Provider::Amazon).unwrap().is_empty());
    assert!(!cache.path_for("amazon-ip-ranges", Utc::now()).exists());

    let after = RangeRegistry::load(&config, &cache, &recovered).await;
    assert!(after.in_range("13.33.0.1", Provider::Amazon, Some("CLOUDFRONT")));
    assert_eq!(recovered.fetches(), 1);
}
