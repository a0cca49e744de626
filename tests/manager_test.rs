//! End-to-end tests: upload → catalog → download through `FileManager`.

use std::sync::Arc;

use bytes::Bytes;

use chunkvault::catalog::sqlite::SqliteCatalog;
use chunkvault::catalog::{Catalog, CatalogMode};
use chunkvault::config::Config;
use chunkvault::error::StorageError;
use chunkvault::manager::FileManager;
use chunkvault::storage::engine::ChunkEngine;
use chunkvault::storage::location::{MemoryLocation, StorageLocation};

fn memory_manager(catalog: Catalog) -> (FileManager, Vec<Arc<MemoryLocation>>) {
    let locs: Vec<Arc<MemoryLocation>> =
        (1..=3).map(|i| Arc::new(MemoryLocation::new(format!("node{i}")))).collect();
    let engine = ChunkEngine::new(
        1024,
        locs.iter().map(|l| l.clone() as Arc<dyn StorageLocation>).collect(),
    )
    .expect("engine");
    (FileManager::new(engine, catalog), locs)
}

#[tokio::test]
async fn test_upload_then_download() {
    let (manager, locs) = memory_manager(Catalog::fallback_only());
    let input: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();

    let manifest = manager
        .upload("data.bin", input.as_slice(), input.len() as u64, "application/octet-stream")
        .await
        .expect("upload");
    assert_eq!(manifest.total_chunks, 5);
    assert_eq!(manifest.placement(), vec!["node1", "node2", "node3", "node1", "node2"]);
    assert_eq!(locs[0].len(), 2);
    assert_eq!(locs[2].len(), 1);

    let data = manager.download("data.bin").await.expect("download");
    assert_eq!(data, Some(input));

    let files = manager.list().await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "data.bin");
    assert_eq!(files[0].size, 5000);
    assert_eq!(files[0].total_chunks, 5);
    assert_eq!(files[0].mime_type, "application/octet-stream");
}

#[tokio::test]
async fn test_download_unknown_name() {
    let (manager, _locs) = memory_manager(Catalog::fallback_only());
    assert_eq!(manager.download("nope").await.expect("download"), None);

    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("nope");
    assert_eq!(manager.export("nope", &out).await.expect("export"), None);
    assert!(!out.exists());
}

#[tokio::test]
async fn test_failed_upload_records_nothing() {
    let (manager, locs) = memory_manager(Catalog::fallback_only());
    let result = manager.upload("short.bin", &b"abc"[..], 4096, "x").await;

    assert!(matches!(result, Err(StorageError::Input(_))));
    assert!(manager.list().await.is_empty());
    assert!(locs.iter().all(|l| l.is_empty()));
}

#[tokio::test]
async fn test_export_writes_only_verified_output() {
    let (manager, locs) = memory_manager(Catalog::new(Arc::new(
        SqliteCatalog::open_in_memory().expect("sqlite"),
    )));
    let input = vec![0x5Au8; 3000];
    let manifest = manager.upload("a.bin", input.as_slice(), 3000, "x").await.expect("upload");

    let dir = tempfile::tempdir().expect("tempdir");
    let good = dir.path().join("a.out");
    assert_eq!(manager.export("a.bin", &good).await.expect("export"), Some(3000));
    assert_eq!(std::fs::read(&good).expect("read"), input);

    // Corrupt the last chunk; export must fail without creating the file.
    let last = manifest.chunks.iter().find(|c| c.index == 2).expect("chunk 2");
    locs[2].put(&last.id, Bytes::from(vec![0u8; last.size as usize])).await.expect("corrupt");

    let bad = dir.path().join("b.out");
    assert!(matches!(
        manager.export("a.bin", &bad).await,
        Err(StorageError::Corruption { index: 2, .. })
    ));
    assert!(!bad.exists());
}

#[tokio::test]
async fn test_status_and_from_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::from_toml(&format!(
        r#"
        [storage]
        base_path = "{base}"
        chunk_size = 8

        [catalog]
        database = "{base}/catalog.db"
        "#,
        base = dir.path().display()
    ))
    .expect("config");

    let manager = FileManager::from_config(&config).await.expect("manager");
    manager.upload("x.txt", &b"hello, chunks"[..], 13, "text/plain").await.expect("upload");

    let status = manager.status().await;
    assert_eq!(status.chunk_size, 8);
    assert_eq!(status.locations, vec!["node1", "node2", "node3"]);
    assert_eq!(status.catalog_mode, CatalogMode::Durable);
    assert_eq!(status.files, 1);

    for node in ["node1", "node2", "node3"] {
        assert!(dir.path().join(node).is_dir());
    }
    assert_eq!(
        manager.download("x.txt").await.expect("download"),
        Some(b"hello, chunks".to_vec())
    );
}

#[test]
fn test_config_defaults_and_validation() {
    let config = Config::from_toml("").expect("empty config");
    assert_eq!(config.storage.chunk_size, 1024 * 1024);
    assert_eq!(config.storage.locations, vec!["node1", "node2", "node3"]);
    assert!(config.catalog.database.is_none());

    assert!(matches!(
        Config::from_toml("[storage]\nchunk_size = 0"),
        Err(StorageError::Config(_))
    ));
    assert!(matches!(
        Config::from_toml("[storage]\nlocations = []"),
        Err(StorageError::Config(_))
    ));
    assert!(matches!(
        Config::from_toml("[storage]\nlocations = [\"a\", \"a\"]"),
        Err(StorageError::Config(_))
    ));
    assert!(matches!(
        Config::from_toml("[storage]\nlocations = [\"../up\"]"),
        Err(StorageError::Config(_))
    ));
    assert!(matches!(Config::from_toml("[storage"), Err(StorageError::Config(_))));
}
