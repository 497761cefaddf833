use std::sync::Arc;

use exercise_enrichment::providers::{AnalysisResult, FixtureAnalyzer, FixtureExtractor};
use exercise_enrichment::{
    AppError, BatchRunner, ContentStore, EnrichableItem, EnrichmentFlow, EnrichmentStatus,
    EnrichmentTimeouts, TomlStore,
};

const TAXONOMY: &str = r#"
[[themes]]
id = "algebra-1"
label = "Équations"

[[themes]]
id = "geo-2"
label = "Géométrie"
"#;

async fn seeded_store(dir: &tempfile::TempDir) -> Arc<TomlStore> {
    tokio::fs::write(dir.path().join("taxonomy.toml"), TAXONOMY)
        .await
        .unwrap();

    let store = Arc::new(TomlStore::new(dir.path()));
    for item in [
        EnrichableItem::new("bac-2023-ex1").with_source_url("https://example.org/bac-2023.pdf"),
        EnrichableItem::new("bac-2023-ex2").with_raw_text("Montrer que la suite converge."),
        EnrichableItem::new("brevet-2022-ex4"),
    ] {
        store.save_item(&item).await.unwrap();
    }
    store
}

#[tokio::test]
async fn test_batch_run_writes_items_back_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir).await;

    let flow = Arc::new(EnrichmentFlow::new(
        Arc::new(FixtureExtractor::new("Résoudre l'équation").failing_for("brevet-2022-ex4")),
        Arc::new(FixtureAnalyzer::new(AnalysisResult {
            title: Some("Exercice".to_string()),
            keywords: vec!["équation".to_string()],
            estimated_duration: Some(20),
            estimated_difficulty: Some(4),
            theme_ids: vec!["geo-2".to_string(), "stats-9".to_string()],
            ..Default::default()
        })),
        store.clone(),
        EnrichmentTimeouts::default(),
    ));
    let runner = BatchRunner::new(store.clone(), flow, 2);

    let summary = runner.run(Some(50)).await.unwrap();
    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);

    // 重新从磁盘读取
    let reopened = TomlStore::new(dir.path());
    let first = reopened.get_item("bac-2023-ex1").await.unwrap().unwrap();
    assert_eq!(first.enrichment_status, EnrichmentStatus::Completed);
    assert_eq!(first.raw_text.as_deref(), Some("Résoudre l'équation"));
    assert_eq!(first.theme_ids, vec!["geo-2".to_string()]);
    assert_eq!(first.estimated_difficulty, Some(4));

    let second = reopened.get_item("bac-2023-ex2").await.unwrap().unwrap();
    assert_eq!(
        second.raw_text.as_deref(),
        Some("Montrer que la suite converge.")
    );

    let third = reopened.get_item("brevet-2022-ex4").await.unwrap().unwrap();
    assert_eq!(third.enrichment_status, EnrichmentStatus::Failed);
    assert_eq!(third.title, None);

    // 第二次运行没有待处理题目
    assert!(reopened.find_pending_items(50).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_no_temp_files_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir).await;
    store
        .update_item(
            "bac-2023-ex1",
            &exercise_enrichment::EnrichmentPatch::Failed,
        )
        .await
        .unwrap();

    let mut entries = tokio::fs::read_dir(dir.path().join("items")).await.unwrap();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        let name = entry.file_name().to_string_lossy().into_owned();
        assert!(name.ends_with(".toml") && !name.ends_with(".tmp"), "{}", name);
    }
}

#[tokio::test]
async fn test_missing_taxonomy_file_aborts_run_and_keeps_themes() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(TomlStore::new(dir.path()));
    let mut item = EnrichableItem::new("bac-2021-ex3");
    item.theme_ids = vec!["algebra-1".to_string()];
    store.save_item(&item).await.unwrap();

    let flow = Arc::new(EnrichmentFlow::new(
        Arc::new(FixtureExtractor::new("Résoudre l'équation")),
        Arc::new(FixtureAnalyzer::new(AnalysisResult {
            theme_ids: vec!["algebra-1".to_string()],
            ..Default::default()
        })),
        store.clone(),
        EnrichmentTimeouts::default(),
    ));
    let runner = BatchRunner::new(store.clone(), flow, 1);

    assert!(matches!(runner.run(None).await, Err(AppError::Taxonomy(_))));

    let reopened = TomlStore::new(dir.path());
    let unchanged = reopened.get_item("bac-2021-ex3").await.unwrap().unwrap();
    assert!(unchanged.is_pending());
    assert_eq!(unchanged.theme_ids, vec!["algebra-1".to_string()]);
}
