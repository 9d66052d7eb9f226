use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use meddata_store::DatasetStore;

use crate::api::handlers::{buckets, classes, datasets, files, health, samples};
use crate::openapi::configure_swagger_routes;

/// Upload cap for dataset archives (512 MB)
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Create the application router
pub fn create_app(store: DatasetStore) -> Router {
    debug!("Creating application router");

    let bucket_routes = Router::new()
        .route("/create-bucket/:bucket_name", post(buckets::create_bucket))
        .route("/delete-bucket/:bucket_name", delete(buckets::delete_bucket))
        .route("/list-buckets", get(buckets::list_buckets));

    let dataset_routes = Router::new()
        .route("/upload-zip/:bucket_name", post(datasets::upload_dataset))
        .route(
            "/upload-directory/:bucket_name",
            post(datasets::upload_directory),
        )
        .route(
            "/get-all-databases/:bucket_name",
            get(datasets::list_datasets),
        )
        .route(
            "/download-database/:bucket_name/:dataset_name",
            get(datasets::download_dataset),
        )
        .route(
            "/delete-database/:bucket_name/:dataset_name",
            delete(datasets::delete_dataset),
        );

    let class_routes = Router::new()
        .route(
            "/upload-class/:bucket_name/:dataset_name",
            post(classes::upload_class),
        )
        .route(
            "/get-all-classes/:bucket_name/:dataset_name",
            get(classes::list_classes),
        )
        .route(
            "/download-class/:bucket_name/:dataset_name/:class_name",
            get(classes::download_class),
        )
        .route(
            "/delete-class/:bucket_name/:dataset_name/:class_name",
            delete(classes::delete_class),
        );

    let sample_routes = Router::new()
        .route(
            "/get-all-samples-in-class/:bucket_name/:dataset_name/:class_name",
            get(samples::list_samples),
        )
        .route(
            "/download-sample/:bucket_name/:dataset_name/:class_name/:sample_name",
            get(samples::download_sample),
        )
        .route(
            "/delete-sample/:bucket_name/:dataset_name/:class_name/:sample_name",
            delete(samples::delete_sample),
        );

    let file_routes = Router::new()
        .route("/upload-file/:bucket_name", post(files::upload_file))
        .route(
            "/download-file/:bucket_name/:file_name",
            get(files::download_file),
        )
        .route(
            "/delete-file/:bucket_name/:file_name",
            delete(files::delete_file),
        );

    debug!("Resource routes configured");

    let app = Router::new()
        .route("/health", get(health::health_check))
        .merge(bucket_routes)
        .merge(dataset_routes)
        .merge(class_routes)
        .merge(sample_routes)
        .merge(file_routes)
        .with_state(store)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Configure the Swagger UI using the helper function
    let app = add_swagger_ui(app);
    debug!("Swagger UI merged");

    // Initialize health check uptime reporting
    health::initialize_server_start_time();

    app
}

/// Add Swagger UI to the router
pub fn add_swagger_ui(app: Router) -> Router {
    let swagger = configure_swagger_routes();
    app.merge(swagger)
}
