mod catalog_cache;
mod schema;

pub use self::{
    catalog_cache::CatalogCache,
    schema::{Column, DataType, Schema},
};
