pub mod json;

pub use json::{export_items_to_path, import_items};
