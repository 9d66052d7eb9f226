//! Dataset archive validation.
//!
//! Uploaded datasets arrive as ZIP archives and are validated entirely
//! in memory before anything is written to the object store. Two layouts
//! are accepted:
//!
//! - nested: `<dataset>/<class>/<n>.<ext>`, every class complete;
//! - flat: `<dataset>/<CLASS>_<n>.<ext>`, regrouped into class folders
//!   and renamed to the bare number during validation.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use zip::ZipArchive;

use crate::errors::StoreError;

/// File extensions accepted for samples in nested archives
pub const VALID_IMAGE_EXTENSIONS: &[&str] = &["bmp", "jpg", "jpeg", "png", "gif"];

/// `<CLASS><sep><number>`: 1-6 uppercase alphanumerics, one or more
/// space/dash/underscore separators, 2-4 digits
static FLAT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z0-9]{1,6})[\s\-_]+([0-9]{2,4})$").unwrap());

/// Bare sample number: 2-4 digits
static BARE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{2,4}$").unwrap());

/// Expected shape of an uploaded dataset
#[derive(Debug, Clone, Copy)]
pub struct DatasetShape {
    pub expected_classes: usize,
    pub files_per_class: usize,
}

impl Default for DatasetShape {
    fn default() -> Self {
        Self {
            expected_classes: 4,
            files_per_class: 200,
        }
    }
}

/// One validated archive entry, ready for upload
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Object key relative to the bucket root
    pub key: String,
    pub data: Bytes,
}

struct RawEntry {
    /// Path components inside the archive
    components: Vec<String>,
    data: Bytes,
}

fn read_entries(archive_bytes: &[u8]) -> Result<Vec<RawEntry>, StoreError> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        let path = file.enclosed_name().ok_or_else(|| {
            StoreError::InvalidArchive(format!("Entry '{}' has an unsafe path.", file.name()))
        })?;
        let components: Vec<String> = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if components.is_empty() {
            continue;
        }

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        entries.push(RawEntry {
            components,
            data: Bytes::from(data),
        });
    }

    Ok(entries)
}

fn split_name(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => (&file_name[..pos], &file_name[pos + 1..]),
        _ => (file_name, ""),
    }
}

fn is_valid_image(file_name: &str) -> bool {
    let (_, ext) = split_name(file_name);
    VALID_IMAGE_EXTENSIONS
        .iter()
        .any(|valid| ext.eq_ignore_ascii_case(valid))
}

/// Check one class folder's files: valid images, numbered 1..=files_per_class
/// with nothing missing and nothing extra.
fn validate_class_files(
    class_name: &str,
    file_names: &[&str],
    files_per_class: usize,
) -> Result<(), StoreError> {
    if file_names.is_empty() {
        return Err(StoreError::InvalidArchive(format!(
            "Class folder '{}' contains no files.",
            class_name
        )));
    }

    let mut found = vec![false; files_per_class];
    for name in file_names {
        if !is_valid_image(name) {
            return Err(StoreError::InvalidArchive(format!(
                "File '{}' in class folder '{}' is not a valid image. Accepted file formats are: {}.",
                name,
                class_name,
                VALID_IMAGE_EXTENSIONS.join(", ")
            )));
        }
        let (stem, _) = split_name(name);
        if let Ok(number) = stem.parse::<usize>() {
            if (1..=files_per_class).contains(&number) {
                found[number - 1] = true;
            }
        }
    }

    let missing: Vec<usize> = found
        .iter()
        .enumerate()
        .filter(|(_, present)| !**present)
        .map(|(i, _)| i + 1)
        .collect();
    if !missing.is_empty() {
        return Err(StoreError::InvalidArchive(format!(
            "Missing files for expected numbers: {:?} in class folder '{}'.",
            missing, class_name
        )));
    }

    if file_names.len() != files_per_class {
        return Err(StoreError::InvalidArchive(format!(
            "Class folder '{}' contains {} files, but {} were expected.",
            class_name,
            file_names.len(),
            files_per_class
        )));
    }

    Ok(())
}

/// Validate a dataset archive and return the normalized upload entries.
///
/// The archive must have exactly one top-level folder (the dataset). The
/// layout is nested when that folder contains subfolders, flat otherwise.
pub fn validate_dataset_archive(
    archive_bytes: &[u8],
    shape: DatasetShape,
) -> Result<Vec<ArchiveEntry>, StoreError> {
    let entries = read_entries(archive_bytes)?;
    if entries.is_empty() {
        return Err(StoreError::InvalidArchive(
            "Archive contains no files.".to_string(),
        ));
    }

    let dataset = entries[0].components[0].clone();
    if entries.iter().any(|e| e.components[0] != dataset) {
        return Err(StoreError::InvalidArchive(
            "There should be exactly one top-level dataset folder.".to_string(),
        ));
    }
    if entries.iter().all(|e| e.components.len() == 1) {
        return Err(StoreError::InvalidArchive(
            "The dataset folder must contain class folders.".to_string(),
        ));
    }

    // Loose files directly in the dataset folder mark the flat layout;
    // a purely foldered archive is validated as nested.
    let flat = entries.iter().any(|e| e.components.len() == 2);
    if flat {
        validate_flat(&dataset, entries, shape)
    } else {
        validate_nested(&dataset, entries, shape)
    }
}

fn validate_nested(
    dataset: &str,
    entries: Vec<RawEntry>,
    shape: DatasetShape,
) -> Result<Vec<ArchiveEntry>, StoreError> {
    let mut classes: BTreeMap<String, Vec<RawEntry>> = BTreeMap::new();

    for entry in entries {
        match entry.components.len() {
            1 => {
                return Err(StoreError::InvalidArchive(
                    "There should be exactly one top-level dataset folder.".to_string(),
                ));
            }
            3 => {
                classes
                    .entry(entry.components[1].clone())
                    .or_default()
                    .push(entry);
            }
            _ => {
                return Err(StoreError::InvalidArchive(format!(
                    "Class folder '{}' contains subfolders, which is not allowed.",
                    entry.components[1]
                )));
            }
        }
    }

    if classes.len() != shape.expected_classes {
        return Err(StoreError::InvalidArchive(format!(
            "Expected {} class folders, but found {}.",
            shape.expected_classes,
            classes.len()
        )));
    }

    let mut output = Vec::new();
    for (class_name, class_entries) in classes {
        let file_names: Vec<&str> = class_entries
            .iter()
            .map(|e| e.components[2].as_str())
            .collect();
        validate_class_files(&class_name, &file_names, shape.files_per_class)?;

        for entry in class_entries {
            output.push(ArchiveEntry {
                key: format!("{}/{}/{}", dataset, class_name, entry.components[2]),
                data: entry.data,
            });
        }
    }

    Ok(output)
}

fn validate_flat(
    dataset: &str,
    entries: Vec<RawEntry>,
    shape: DatasetShape,
) -> Result<Vec<ArchiveEntry>, StoreError> {
    // class name -> normalized (file name, data)
    let mut classes: BTreeMap<String, Vec<(String, Bytes)>> = BTreeMap::new();

    for entry in entries {
        let file_name = match entry.components.last() {
            Some(name) => name.clone(),
            None => continue,
        };
        let (stem, ext) = split_name(&file_name);

        match entry.components.len() {
            1 => {
                return Err(StoreError::InvalidArchive(
                    "There should be exactly one top-level dataset folder.".to_string(),
                ));
            }
            // Loose file in the dataset folder: must carry its class in the name
            2 => {
                let captures = FLAT_NAME_RE.captures(stem).ok_or_else(|| {
                    StoreError::InvalidArchive(format!(
                        "File '{}' does not follow the CLASS_NNNN format.",
                        file_name
                    ))
                })?;
                let class = captures[1].to_string();
                let number = captures[2].to_string();
                classes
                    .entry(class)
                    .or_default()
                    .push((with_ext(&number, ext), entry.data));
            }
            // Pre-grouped class folder inside a flat archive
            3 => {
                let class = entry.components[1].clone();
                if BARE_NUMBER_RE.is_match(stem) {
                    classes.entry(class).or_default().push((file_name, entry.data));
                } else if let Some(captures) = FLAT_NAME_RE.captures(stem) {
                    if &captures[1] != class {
                        return Err(StoreError::InvalidArchive(format!(
                            "File '{}' is in class '{}', but its class part is '{}'.",
                            file_name, class, &captures[1]
                        )));
                    }
                    let number = captures[2].to_string();
                    classes
                        .entry(class)
                        .or_default()
                        .push((with_ext(&number, ext), entry.data));
                } else {
                    return Err(StoreError::InvalidArchive(format!(
                        "File '{}' in class folder '{}' does not follow the expected format.",
                        file_name, class
                    )));
                }
            }
            _ => {
                return Err(StoreError::InvalidArchive(format!(
                    "Class folder '{}' contains subfolders, which is not allowed.",
                    entry.components[1]
                )));
            }
        }
    }

    if classes.len() != shape.expected_classes {
        return Err(StoreError::InvalidArchive(format!(
            "Expected {} class folders, but found {}.",
            shape.expected_classes,
            classes.len()
        )));
    }
    for (class_name, files) in &classes {
        if files.len() != shape.files_per_class {
            return Err(StoreError::InvalidArchive(format!(
                "Class folder '{}' contains {} files, but {} were expected.",
                class_name,
                files.len(),
                shape.files_per_class
            )));
        }
    }

    let mut output = Vec::new();
    for (class_name, files) in classes {
        for (file_name, data) in files {
            output.push(ArchiveEntry {
                key: format!("{}/{}/{}", dataset, class_name, file_name),
                data,
            });
        }
    }
    Ok(output)
}

fn with_ext(stem: &str, ext: &str) -> String {
    if ext.is_empty() {
        stem.to_string()
    } else {
        format!("{}.{}", stem, ext)
    }
}

/// Validate an archive holding the samples of a single class.
///
/// Files may sit at the archive root or under one folder named after the
/// class. Returns `(file name, data)` pairs with names normalized to the
/// bare sample number.
pub fn validate_class_archive(
    archive_bytes: &[u8],
    class_name: &str,
    files_per_class: usize,
) -> Result<Vec<(String, Bytes)>, StoreError> {
    let entries = read_entries(archive_bytes)?;
    if entries.is_empty() {
        return Err(StoreError::InvalidArchive(
            "Archive contains no files.".to_string(),
        ));
    }

    let mut files = Vec::new();
    for entry in entries {
        let file_name = match entry.components.as_slice() {
            [name] => name.clone(),
            [folder, name] if folder == class_name => name.clone(),
            [folder, ..] => {
                return Err(StoreError::InvalidArchive(format!(
                    "Folder '{}' does not match class '{}'.",
                    folder, class_name
                )));
            }
            [] => continue,
        };

        let (stem, ext) = split_name(&file_name);
        let normalized = if BARE_NUMBER_RE.is_match(stem) {
            file_name
        } else if let Some(captures) = FLAT_NAME_RE.captures(stem) {
            if &captures[1] != class_name {
                return Err(StoreError::InvalidArchive(format!(
                    "File '{}' belongs to class '{}', not '{}'.",
                    file_name, &captures[1], class_name
                )));
            }
            with_ext(&captures[2], ext)
        } else {
            return Err(StoreError::InvalidArchive(format!(
                "File '{}' in class folder '{}' does not follow the expected format.",
                file_name, class_name
            )));
        };

        files.push((normalized, entry.data));
    }

    let file_names: Vec<&str> = files.iter().map(|(name, _)| name.as_str()).collect();
    validate_class_files(class_name, &file_names, files_per_class)?;

    Ok(files)
}

/// Extract every file below the top level of an archive without structure
/// validation, keyed by its archive-relative path.
pub fn collect_archive_entries(archive_bytes: &[u8]) -> Result<Vec<ArchiveEntry>, StoreError> {
    let entries = read_entries(archive_bytes)?;
    Ok(entries
        .into_iter()
        .filter(|e| e.components.len() > 1)
        .map(|e| ArchiveEntry {
            key: e.components.join("/"),
            data: e.data,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in files {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn nested_dataset_zip() -> Vec<u8> {
        build_zip(&[
            ("scans/benign/1.png", b"a"),
            ("scans/benign/2.png", b"b"),
            ("scans/malignant/1.png", b"c"),
            ("scans/malignant/2.png", b"d"),
        ])
    }

    const SHAPE_2X2: DatasetShape = DatasetShape {
        expected_classes: 2,
        files_per_class: 2,
    };

    #[test]
    fn test_nested_archive_accepted() {
        let entries = validate_dataset_archive(&nested_dataset_zip(), SHAPE_2X2).unwrap();
        let mut keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "scans/benign/1.png",
                "scans/benign/2.png",
                "scans/malignant/1.png",
                "scans/malignant/2.png",
            ]
        );
    }

    #[test]
    fn test_nested_archive_missing_number_rejected() {
        let zip = build_zip(&[
            ("scans/benign/1.png", b"a"),
            ("scans/benign/3.png", b"b"),
            ("scans/malignant/1.png", b"c"),
            ("scans/malignant/2.png", b"d"),
        ]);
        let err = validate_dataset_archive(&zip, SHAPE_2X2).unwrap_err();
        assert!(err.to_string().contains("Missing files"), "{}", err);
    }

    #[test]
    fn test_nested_archive_bad_extension_rejected() {
        let zip = build_zip(&[
            ("scans/benign/1.txt", b"a"),
            ("scans/benign/2.png", b"b"),
            ("scans/malignant/1.png", b"c"),
            ("scans/malignant/2.png", b"d"),
        ]);
        let err = validate_dataset_archive(&zip, SHAPE_2X2).unwrap_err();
        assert!(err.to_string().contains("not a valid image"), "{}", err);
    }

    #[test]
    fn test_nested_archive_wrong_class_count_rejected() {
        let err = validate_dataset_archive(
            &nested_dataset_zip(),
            DatasetShape {
                expected_classes: 3,
                files_per_class: 2,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("Expected 3 class folders"), "{}", err);
    }

    #[test]
    fn test_multiple_top_level_folders_rejected() {
        let zip = build_zip(&[("a/x/1.png", b"a"), ("b/x/1.png", b"b")]);
        let err = validate_dataset_archive(&zip, SHAPE_2X2).unwrap_err();
        assert!(
            err.to_string().contains("exactly one top-level"),
            "{}",
            err
        );
    }

    #[test]
    fn test_flat_archive_regrouped_and_renamed() {
        let zip = build_zip(&[
            ("scans/A1_01.png", b"a"),
            ("scans/A1_02.png", b"b"),
            ("scans/B2-01.png", b"c"),
            ("scans/B2-02.png", b"d"),
        ]);
        let entries = validate_dataset_archive(&zip, SHAPE_2X2).unwrap();
        let mut keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "scans/A1/01.png",
                "scans/A1/02.png",
                "scans/B2/01.png",
                "scans/B2/02.png",
            ]
        );
    }

    #[test]
    fn test_flat_archive_bad_name_rejected() {
        let zip = build_zip(&[("scans/lowercase_01.png", b"a")]);
        let err = validate_dataset_archive(&zip, SHAPE_2X2).unwrap_err();
        assert!(err.to_string().contains("CLASS_NNNN"), "{}", err);
    }

    #[test]
    fn test_flat_archive_class_mismatch_in_folder_rejected() {
        let zip = build_zip(&[
            ("scans/A1_01.png", b"a"),
            ("scans/A1/B2_02.png", b"b"),
            ("scans/B2/01.png", b"c"),
            ("scans/B2/02.png", b"d"),
        ]);
        let err = validate_dataset_archive(&zip, SHAPE_2X2).unwrap_err();
        assert!(err.to_string().contains("its class part is"), "{}", err);
    }

    #[test]
    fn test_class_archive_accepts_root_and_folder_layouts() {
        let flat = build_zip(&[("01.png", b"a"), ("02.png", b"b")]);
        let files = validate_class_archive(&flat, "A1", 2).unwrap();
        assert_eq!(files.len(), 2);

        let foldered = build_zip(&[("A1/A1_01.png", b"a"), ("A1/02.png", b"b")]);
        let files = validate_class_archive(&foldered, "A1", 2).unwrap();
        let mut names: Vec<&str> = files.iter().map(|(n, _)| n.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["01.png", "02.png"]);
    }

    #[test]
    fn test_class_archive_wrong_folder_rejected() {
        let zip = build_zip(&[("B2/01.png", b"a")]);
        let err = validate_class_archive(&zip, "A1", 1).unwrap_err();
        assert!(err.to_string().contains("does not match class"), "{}", err);
    }

    #[test]
    fn test_collect_entries_skips_top_level_files() {
        let zip = build_zip(&[("readme.txt", b"x"), ("dir/a.bin", b"y"), ("dir/sub/b.bin", b"z")]);
        let entries = collect_archive_entries(&zip).unwrap();
        let mut keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        keys.sort();
        assert_eq!(keys, vec!["dir/a.bin", "dir/sub/b.bin"]);
    }

    #[test]
    fn test_empty_archive_rejected() {
        let zip = build_zip(&[]);
        assert!(validate_dataset_archive(&zip, SHAPE_2X2).is_err());
    }
}
