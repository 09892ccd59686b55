//! Dynamic record endpoints and their OpenAPI documents

pub mod docs;
pub mod handlers;

pub use docs::openapi_document;
pub use handlers::{RecordState, api_docs, create_record, delete_record, list_records, update_record};
