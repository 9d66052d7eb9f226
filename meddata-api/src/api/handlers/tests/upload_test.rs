use crate::api::handlers::{require_zip, zip_stem};

#[test]
fn test_require_zip_checks_extension() {
    assert!(require_zip("scans.zip").is_ok());
    assert!(require_zip("SCANS.ZIP").is_ok());
    assert!(require_zip("scans.tar.gz").is_err());
    assert!(require_zip("scans").is_err());
}

#[test]
fn test_zip_stem_strips_extension() {
    assert_eq!(zip_stem("A1.zip"), "A1");
    assert_eq!(zip_stem("A1.ZIP"), "A1");
    assert_eq!(zip_stem("A1"), "A1");
}
