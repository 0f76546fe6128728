// HTTP routes configuration

use crate::core::state::AppState;
use crate::handlers::{auth, collection, fallback, health, protected, sheets, table};
use crate::security::gate::auth_gate;
use crate::stores::active_collection::CLIENT_ID_HEADER;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, Method,
    },
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

/// Every API route lives under this prefix
pub const API_BASE_PATH: &str = "/api";

pub fn build_router(state: Arc<AppState>) -> Router {
    // Require a valid token or session, depending on the auth strategy
    let protected_routes = Router::new()
        .route("/index", get(protected::index_handler))
        .route("/protected-route", get(protected::index_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_gate));

    let api_routes = Router::new()
        // Sheet lifecycle
        .route("/setCollection", post(collection::set_collection_handler))
        .route("/addSheet", post(sheets::add_sheet_handler))
        .route("/getSheets", get(sheets::get_sheets_handler))
        .route("/deleteSheet", delete(sheets::delete_sheet_handler))
        .route("/getTable", get(table::get_table_handler))
        .route("/saveTable", post(table::save_table_handler))

        // Accounts
        .route("/signup", post(auth::signup_handler))
        .route("/login", post(auth::login_handler))
        .route("/logout", post(auth::logout_handler))

        .merge(protected_routes);

    Router::new()
        .route("/health", get(health::health_handler))
        .nest(API_BASE_PATH, api_routes)

        // 404 fallback for all unmatched routes
        .fallback(fallback::fallback_handler)

        .layer(build_cors_layer())
        .with_state(state)
}

fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(CLIENT_ID_HEADER),
        ])
        .max_age(Duration::from_secs(86400))
}
