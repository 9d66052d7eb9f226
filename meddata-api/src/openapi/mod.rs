use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/docs/openapi.json", ApiDoc::openapi())
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoint
        crate::api::handlers::health::health_check,

        // Bucket endpoints
        crate::api::handlers::buckets::create_bucket,
        crate::api::handlers::buckets::delete_bucket,
        crate::api::handlers::buckets::list_buckets,

        // Dataset endpoints
        crate::api::handlers::datasets::upload_dataset,
        crate::api::handlers::datasets::upload_directory,
        crate::api::handlers::datasets::list_datasets,
        crate::api::handlers::datasets::download_dataset,
        crate::api::handlers::datasets::delete_dataset,

        // Class endpoints
        crate::api::handlers::classes::upload_class,
        crate::api::handlers::classes::list_classes,
        crate::api::handlers::classes::download_class,
        crate::api::handlers::classes::delete_class,

        // Sample endpoints
        crate::api::handlers::samples::list_samples,
        crate::api::handlers::samples::download_sample,
        crate::api::handlers::samples::delete_sample,

        // File endpoints
        crate::api::handlers::files::upload_file,
        crate::api::handlers::files::download_file,
        crate::api::handlers::files::delete_file,
    ),
    components(
        schemas(
            // Common envelopes
            crate::entities::common::ErrorResponse,
            crate::entities::common::MessageResponse,
            crate::entities::common::ExportResponse,
            crate::entities::common::UploadResponse,

            // Listings
            crate::entities::listings::BucketListResponse,
            crate::entities::listings::DatasetListResponse,
            crate::entities::listings::ClassListResponse,
            crate::entities::listings::SampleListResponse,

            // Health
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentStatus,
            crate::api::handlers::health::ComponentHealthStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "buckets", description = "Bucket management endpoints"),
        (name = "datasets", description = "Dataset archive upload, listing, download, and deletion"),
        (name = "classes", description = "Class-level operations inside a dataset"),
        (name = "samples", description = "Individual sample operations"),
        (name = "files", description = "Free-form file storage at the bucket root")
    ),
    info(
        title = "MedData API",
        version = "0.1.0",
        description = "API for storing and retrieving medical imaging datasets in object storage",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_doc_generation() {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "MedData API");
        assert_eq!(openapi.info.version, "0.1.0");

        let tags = openapi.tags.as_ref().expect("tags should be defined");
        assert!(tags.iter().any(|tag| tag.name == "buckets"));
        assert!(tags.iter().any(|tag| tag.name == "datasets"));

        // Every route of the service shows up in the document
        assert!(openapi.paths.paths.contains_key("/health"));
        assert!(openapi.paths.paths.contains_key("/create-bucket/{bucket_name}"));
        assert!(openapi.paths.paths.contains_key("/upload-zip/{bucket_name}"));
        assert!(openapi
            .paths
            .paths
            .contains_key("/download-database/{bucket_name}/{dataset_name}"));
        assert!(openapi
            .paths
            .paths
            .contains_key("/download-sample/{bucket_name}/{dataset_name}/{class_name}/{sample_name}"));
        assert!(openapi
            .paths
            .paths
            .contains_key("/delete-file/{bucket_name}/{file_name}"));
    }
}
