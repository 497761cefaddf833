pub mod enrichment_flow;
pub mod item_ctx;
pub mod taxonomy_filter;

pub use enrichment_flow::{EnrichmentFlow, EnrichmentOutcome};
pub use item_ctx::ItemCtx;
pub use taxonomy_filter::{filter_theme_ids, ThemeFilter};
