//! Object-key conventions for the dataset layout.
//!
//! Datasets and classes are prefixes (`<dataset>/` and `<dataset>/<class>/`),
//! samples are keys below a class prefix. Name components never contain `/`.

use crate::errors::StoreError;

/// Validate a single key component (bucket, dataset, class, or sample name)
pub fn validate_component(kind: &str, name: &str) -> Result<(), StoreError> {
    if name.is_empty() {
        return Err(StoreError::InvalidName(format!(
            "{} name must not be empty",
            kind
        )));
    }
    if name.contains('/') {
        return Err(StoreError::InvalidName(format!(
            "{} name '{}' must not contain '/'",
            kind, name
        )));
    }
    Ok(())
}

/// Prefix under which a dataset's objects live
pub fn dataset_prefix(dataset: &str) -> String {
    format!("{}/", dataset.trim_end_matches('/'))
}

/// Prefix under which a class's samples live
pub fn class_prefix(dataset: &str, class: &str) -> String {
    format!(
        "{}{}/",
        dataset_prefix(dataset),
        class.trim_end_matches('/')
    )
}

/// Full key of a sample inside a class
pub fn sample_key(dataset: &str, class: &str, sample: &str) -> String {
    format!("{}{}", class_prefix(dataset, class), sample)
}

/// Strip a trailing `/` from a listed prefix to get the display name
pub fn prefix_name(prefix: &str) -> &str {
    prefix.trim_end_matches('/')
}
