#![allow(dead_code)]

use std::sync::Arc;

use exercise_enrichment::providers::{AnalysisProvider, AnalysisResult, ExtractionProvider};
use exercise_enrichment::{
    BatchRunner, EnrichableItem, EnrichmentFlow, EnrichmentTimeouts, InMemoryStore, TaxonomyEntry,
};

pub const FIXTURE_TEXT: &str = "Résoudre l'équation";

pub fn pending_items(count: usize) -> Vec<EnrichableItem> {
    (1..=count)
        .map(|i| {
            EnrichableItem::new(format!("ex-{}", i))
                .with_source_url(format!("https://example.org/sujets/ex-{}.pdf", i))
        })
        .collect()
}

pub fn algebra_only() -> Vec<TaxonomyEntry> {
    vec![TaxonomyEntry::new("algebra-1", "Équations et inéquations")]
}

/// 场景 A 的固定分析结果
pub fn scenario_analysis() -> AnalysisResult {
    AnalysisResult {
        title: Some("Équation du premier degré".to_string()),
        summary: Some("Résoudre une équation simple.".to_string()),
        keywords: vec!["équation".to_string(), "algèbre".to_string()],
        estimated_duration: Some(10),
        estimated_difficulty: Some(3),
        theme_ids: vec!["algebra-1".to_string(), "unknown-999".to_string()],
    }
}

pub fn flow_with(
    extractor: Arc<dyn ExtractionProvider>,
    analyzer: Arc<dyn AnalysisProvider>,
    store: Arc<InMemoryStore>,
) -> Arc<EnrichmentFlow> {
    Arc::new(EnrichmentFlow::new(
        extractor,
        analyzer,
        store,
        EnrichmentTimeouts::default(),
    ))
}

pub fn runner_with(
    extractor: Arc<dyn ExtractionProvider>,
    analyzer: Arc<dyn AnalysisProvider>,
    store: Arc<InMemoryStore>,
    max_concurrent: usize,
) -> BatchRunner {
    let flow = flow_with(extractor, analyzer, store.clone());
    BatchRunner::new(store, flow, max_concurrent)
}
