pub mod item;
pub mod loaders;
pub mod taxonomy;

pub use item::{CompletedFields, EnrichableItem, EnrichmentPatch, EnrichmentStatus};
pub use loaders::{load_all_item_files, load_item_file, load_taxonomy_file};
pub use taxonomy::{TaxonomyEntry, TaxonomySnapshot};
