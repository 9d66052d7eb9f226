pub mod handlers;
pub mod routes;

use axum::Router;
use meddata_store::DatasetStore;

/// Create the application router
pub fn create_application(store: DatasetStore) -> Router {
    routes::create_app(store)
}
