pub mod toml_loader;

pub use toml_loader::{load_all_item_files, load_item_file, load_taxonomy_file, write_item_file, TaxonomyFile};
