// Configuration model: industries, experts, formats and their fields.
// Read-only for prompt assembly; replaced wholesale through the admin endpoint.

pub mod handlers;
pub mod models;
pub mod store;

pub use models::{
    Catalog, CommonFields, Expert, ExtraField, ExtraFieldItem, FieldKind, Format, Industry,
    SubOption, STAFFING_FORMAT_ID, UNSELECTED_SENTINEL,
};
pub use store::{seed_catalog_file, CatalogError, CatalogStore};
