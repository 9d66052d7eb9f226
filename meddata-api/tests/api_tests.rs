use std::io::{Cursor, Write};
use std::sync::{Arc, Once};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use meddata_api::api::create_application;
use meddata_store::{DatasetStore, InMemoryStore};

// Ensure tracing is initialized only once
static INIT: Once = Once::new();

fn initialize() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}

fn create_test_app() -> (Router, tempfile::TempDir) {
    initialize();
    let export_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = DatasetStore::new(
        Arc::new(InMemoryStore::new()),
        export_dir.path().to_path_buf(),
    );
    (create_application(store), export_dir)
}

// Helper function to get body bytes from a response
async fn get_body_bytes(response: axum::response::Response) -> Vec<u8> {
    let body = response.into_body();
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    bytes.to_vec()
}

async fn get_body_json(response: axum::response::Response) -> Value {
    let bytes = get_body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("Response body should be JSON")
}

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

const BOUNDARY: &str = "meddata-test-boundary";

fn multipart_body(file_name: &str, data: &[u8], metadata: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
    if let Some(metadata) = metadata {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"metadata\"\r\n\r\n");
        body.extend_from_slice(metadata.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(uri: &str, file_name: &str, data: &[u8], metadata: Option<&str>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(file_name, data, metadata)))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn dataset_zip() -> Vec<u8> {
    build_zip(&[
        ("scans/benign/1.png", b"benign-1"),
        ("scans/benign/2.png", b"benign-2"),
        ("scans/malignant/1.png", b"malignant-1"),
        ("scans/malignant/2.png", b"malignant-2"),
    ])
}

async fn create_bucket(app: &Router, name: &str) {
    let response = app
        .clone()
        .oneshot(post(&format!("/create-bucket/{}", name)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

async fn upload_dataset(app: &Router, bucket: &str) {
    let response = app
        .clone()
        .oneshot(upload_request(
            &format!(
                "/upload-zip/{}?expected_num_classes=2&expected_num_files_per_class=2",
                bucket
            ),
            "scans.zip",
            &dataset_zip(),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = create_test_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["components"]["object_store"]["status"], "ok");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (app, _dir) = create_test_app();
    let response = app.oneshot(get("/docs/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["info"]["title"], "MedData API");
    assert!(json["paths"]["/upload-zip/{bucket_name}"].is_object());
}

#[tokio::test]
async fn test_bucket_lifecycle() {
    let (app, _dir) = create_test_app();
    create_bucket(&app, "medical").await;

    let response = app.clone().oneshot(get("/list-buckets")).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["buckets"], serde_json::json!(["medical"]));

    let response = app
        .clone()
        .oneshot(delete("/delete-bucket/medical"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Deleting again is a 404
    let response = app
        .clone()
        .oneshot(delete("/delete-bucket/medical"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_dataset_upload_and_browse() {
    let (app, _dir) = create_test_app();
    create_bucket(&app, "medical").await;
    upload_dataset(&app, "medical").await;

    let response = app
        .clone()
        .oneshot(get("/get-all-databases/medical"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["datasets"], serde_json::json!(["scans"]));

    let response = app
        .clone()
        .oneshot(get("/get-all-classes/medical/scans"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["classes"], serde_json::json!(["benign", "malignant"]));

    let response = app
        .clone()
        .oneshot(get("/get-all-samples-in-class/medical/scans/benign"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["samples"], serde_json::json!(["1.png", "2.png"]));
}

#[tokio::test]
async fn test_sample_download_and_delete() {
    let (app, _dir) = create_test_app();
    create_bucket(&app, "medical").await;
    upload_dataset(&app, "medical").await;

    let response = app
        .clone()
        .oneshot(get("/download-sample/medical/scans/benign/1.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"1.png\""
    );
    assert_eq!(get_body_bytes(response).await, b"benign-1");

    let response = app
        .clone()
        .oneshot(delete("/delete-sample/medical/scans/benign/1.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/download-sample/medical/scans/benign/1.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_archive_is_rejected() {
    let (app, _dir) = create_test_app();
    create_bucket(&app, "medical").await;

    // One class short of the expected two
    let bad_zip = build_zip(&[("scans/benign/1.png", b"a"), ("scans/benign/2.png", b"b")]);
    let response = app
        .clone()
        .oneshot(upload_request(
            "/upload-zip/medical?expected_num_classes=2&expected_num_files_per_class=2",
            "scans.zip",
            &bad_zip,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was written
    let response = app
        .clone()
        .oneshot(get("/get-all-databases/medical"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["datasets"], serde_json::json!([]));
}

#[tokio::test]
async fn test_non_zip_upload_is_rejected() {
    let (app, _dir) = create_test_app();
    create_bucket(&app, "medical").await;

    let response = app
        .clone()
        .oneshot(upload_request(
            "/upload-zip/medical",
            "scans.tar.gz",
            b"not a zip",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["message"], "File is not a zip.");
}

#[tokio::test]
async fn test_upload_to_missing_bucket_is_404() {
    let (app, _dir) = create_test_app();
    let response = app
        .clone()
        .oneshot(upload_request(
            "/upload-zip/missing?expected_num_classes=2&expected_num_files_per_class=2",
            "scans.zip",
            &dataset_zip(),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dataset_download_reports_location() {
    let (app, dir) = create_test_app();
    create_bucket(&app, "medical").await;
    upload_dataset(&app, "medical").await;

    let response = app
        .clone()
        .oneshot(get("/download-database/medical/scans"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let location = json["location"].as_str().unwrap();
    assert!(location.starts_with(dir.path().to_str().unwrap()));
    assert!(dir.path().join("scans/benign/1.png").exists());
}

#[tokio::test]
async fn test_class_upload_and_delete() {
    let (app, _dir) = create_test_app();
    create_bucket(&app, "medical").await;
    upload_dataset(&app, "medical").await;

    // Class name comes from the archive filename
    let class_zip = build_zip(&[("01.png", b"x"), ("02.png", b"y")]);
    let response = app
        .clone()
        .oneshot(upload_request(
            "/upload-class/medical/scans?expected_num_files_per_class=2",
            "A1.zip",
            &class_zip,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/get-all-classes/medical/scans"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(
        json["classes"],
        serde_json::json!(["A1", "benign", "malignant"])
    );

    let response = app
        .clone()
        .oneshot(delete("/delete-class/medical/scans/A1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(delete("/delete-class/medical/scans/A1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_file_round_trip() {
    let (app, dir) = create_test_app();
    create_bucket(&app, "medical").await;

    let response = app
        .clone()
        .oneshot(upload_request(
            "/upload-file/medical",
            "report.pdf",
            b"pdf bytes",
            Some("quarterly report"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["message"], "File uploaded successfully.");

    // Re-upload overwrites and says so
    let response = app
        .clone()
        .oneshot(upload_request(
            "/upload-file/medical",
            "report.pdf",
            b"pdf v2",
            None,
        ))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(
        json["message"],
        "File 'report.pdf' already existed and was overwritten."
    );

    let response = app
        .clone()
        .oneshot(get("/download-file/medical/report.pdf"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        std::fs::read(dir.path().join("report.pdf")).unwrap(),
        b"pdf v2"
    );

    let response = app
        .clone()
        .oneshot(delete("/delete-file/medical/report.pdf"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(delete("/delete-file/medical/report.pdf"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_directory_upload_is_unvalidated() {
    let (app, _dir) = create_test_app();
    create_bucket(&app, "medical").await;

    let zip = build_zip(&[("docs/readme.md", b"r"), ("docs/sub/plan.md", b"p")]);
    let response = app
        .clone()
        .oneshot(upload_request(
            "/upload-directory/medical",
            "docs.zip",
            &zip,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["uploaded"], 2);
}
