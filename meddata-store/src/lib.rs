// meddata-store lib.rs
//
// Storage layer for the meddata API: object-store access, the dataset
// key layout, archive validation, and the service the API layer drives.

pub mod archive;
pub mod config;
pub mod errors;
pub mod keys;
pub mod object_store;
pub mod service;

pub use archive::DatasetShape;
pub use config::StoreConfig;
pub use errors::StoreError;
pub use object_store::{InMemoryStore, ObjectStore, S3ObjectStore};
pub use service::DatasetStore;
