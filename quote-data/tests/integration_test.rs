//! Integration tests for rate table loading against the SQLite stores.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use quote_core::db::LocalState;
use quote_core::{ConfigStore, RateCategory, RemoteStore, RemoteSync};
use quote_data::{LoadSummary, RateTableLoader, RateTableLoaderError};
use quote_db_sqlite::SqliteRepository;
use rust_decimal_macros::dec;
use sqlx::sqlite::SqlitePoolOptions;

const TEST_CSV_2025: &str = include_str!("../test-data/rates_2025.csv");

async fn setup_test_db() -> SqliteRepository {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    let repo = SqliteRepository::new_with_pool(pool).await;
    repo.run_migrations()
        .await
        .expect("Failed to run migrations");

    repo
}

#[tokio::test]
async fn test_parse_fixture() {
    let records = RateTableLoader::parse(TEST_CSV_2025.as_bytes()).expect("Failed to parse CSV");

    assert_eq!(records.len(), 8);
    assert_eq!(records[0].id, "l1");
    assert_eq!(records[0].rate, dec!(340));
    assert_eq!(records[5].rate, dec!(0.95));
    assert!(records[6].per_day);
    assert!(records[7].per_day);
}

#[tokio::test]
async fn test_load_updates_local_config() {
    let local = Arc::new(setup_test_db().await);
    let store = ConfigStore::new(LocalState::new(local.clone()), None);

    let records = RateTableLoader::parse(TEST_CSV_2025.as_bytes()).expect("Failed to parse CSV");
    let (summary, sync) = RateTableLoader::load(&store, &records)
        .await
        .expect("Failed to load rates");

    assert_eq!(summary, LoadSummary { updated: 6, added: 2 });
    assert_eq!(sync, RemoteSync::Disabled);

    let reloaded = ConfigStore::new(LocalState::new(local), None).load().await;
    let (_, l1) = reloaded.find("l1").expect("l1 should exist");
    assert_eq!(l1.rate, dec!(340));
    let (category, l6) = reloaded.find("l6").expect("l6 should be added");
    assert_eq!(category, RateCategory::Labour);
    assert_eq!(l6.label, "Night Supervisor");
    let (_, e5) = reloaded.find("e5").expect("e5 should be added");
    assert!(e5.per_day);
    assert_eq!(e5.rate, dec!(18));
}

#[tokio::test]
async fn test_load_publishes_to_shared_store() {
    let local = Arc::new(setup_test_db().await);
    let shared = Arc::new(setup_test_db().await);
    let remote: Arc<dyn RemoteStore> = shared.clone();
    let store = ConfigStore::new(LocalState::new(local), Some(remote));

    let records = RateTableLoader::parse(TEST_CSV_2025.as_bytes()).expect("Failed to parse CSV");
    let (_, sync) = RateTableLoader::load(&store, &records)
        .await
        .expect("Failed to load rates");

    assert_eq!(sync, RemoteSync::Synced);
    let blob = shared
        .fetch_settings()
        .await
        .expect("Failed to read shared settings")
        .expect("shared settings should exist");
    assert_eq!(blob["vehicles"][2]["rate"], serde_json::json!("245"));
}

#[tokio::test]
async fn test_reloading_same_table_adds_nothing() {
    let local = Arc::new(setup_test_db().await);
    let store = ConfigStore::new(LocalState::new(local), None);
    let records = RateTableLoader::parse(TEST_CSV_2025.as_bytes()).expect("Failed to parse CSV");

    RateTableLoader::load(&store, &records)
        .await
        .expect("Failed to load rates");
    let (summary, _) = RateTableLoader::load(&store, &records)
        .await
        .expect("Failed to reload rates");

    assert_eq!(summary, LoadSummary { updated: 8, added: 0 });
}

#[tokio::test]
async fn test_bad_category_leaves_config_untouched() {
    let local = Arc::new(setup_test_db().await);
    let store = ConfigStore::new(LocalState::new(local), None);
    let csv = "category,id,label,rate,per_day\nlabour,l1,X,999,\nplant,p1,Forklift,100,\n";
    let records = RateTableLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

    let err = RateTableLoader::load(&store, &records).await.unwrap_err();

    assert!(matches!(err, RateTableLoaderError::InvalidCategory { .. }));
    let config = store.load().await;
    assert_eq!(config.labour[0].rate, dec!(325));
}
