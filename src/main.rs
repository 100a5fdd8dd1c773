use axum::{http::HeaderValue, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod repositories;
mod services;

use crate::config::Config;
use crate::db::DatabasePool;
use crate::error::{AppError, AppResult};
use crate::services::ColorService;

pub type AppState = Arc<ColorService>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "color_catalog_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting color catalog server...");

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded: {:?}", config);

    // Initialize database connection
    let db_pool = DatabasePool::new(&config.database).await?;
    info!("Database connection established");

    // Run migrations
    db_pool.migrate(&config.database.migrations_dir).await?;
    info!("Database migrations completed");

    let color_service = Arc::new(ColorService::new(
        db_pool,
        config.pagination.default_page_size,
    ));

    let app = build_router(color_service, config.server.cors_origin.as_deref())?;

    // Start server
    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(app_state: AppState, cors_origin: Option<&str>) -> AppResult<Router> {
    let cors = match cors_origin {
        Some(origin) => {
            let origin = origin.parse::<HeaderValue>().map_err(|e| {
                AppError::ConfigError(::config::ConfigError::Message(format!(
                    "Invalid CORS origin {}: {}",
                    origin, e
                )))
            })?;
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let api_routes = Router::new()
        .route(
            "/colors",
            get(handlers::list_colors).post(handlers::create_color),
        )
        .route("/colors/all", get(handlers::list_all_colors))
        .route("/colors/name/:name", get(handlers::get_color_by_name))
        .route(
            "/colors/:id",
            get(handlers::get_color)
                .put(handlers::update_color)
                .delete(handlers::delete_color),
        )
        .with_state(app_state);

    Ok(Router::new()
        .route("/", get(root))
        .route("/api/v1/health", get(health_check))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

async fn root() -> &'static str {
    "Color Catalog Server"
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app() -> Router {
        let service = Arc::new(ColorService::new(db::test_pool().await, 5));
        build_router(service, None).unwrap()
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn red() -> Value {
        json!({ "name": "Red", "hex": "#ff0000", "rgb": "rgb(255,0,0)" })
    }

    #[tokio::test]
    async fn create_and_fetch_over_http() {
        let app = app().await;

        let (status, created) = send(&app, Method::POST, "/api/v1/colors", Some(red())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["hex"], "#FF0000");

        let id = created["id"].as_i64().unwrap();
        let (status, fetched) = send(&app, Method::GET, &format!("/api/v1/colors/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, by_name) = send(&app, Method::GET, "/api/v1/colors/name/RED", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_name, created);

        let (status, all) = send(&app, Method::GET, "/api/v1/colors/all", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all, json!([created]));
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let app = app().await;
        send(&app, Method::POST, "/api/v1/colors", Some(red())).await;

        let (status, body) = send(&app, Method::POST, "/api/v1/colors", Some(red())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Color with name \"Red\" already exists");

        let bad = json!({ "name": "Green", "hex": "#GGGGGG", "rgb": "rgb(0,255,0)" });
        let (status, body) = send(&app, Method::POST, "/api/v1/colors", Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["fields"]["hex"].is_array());

        let (status, _) = send(&app, Method::GET, "/api/v1/colors/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::GET, "/api/v1/colors/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn paginated_listing_accepts_page_size_alias() {
        let app = app().await;
        send(&app, Method::POST, "/api/v1/colors", Some(red())).await;
        let blue = json!({ "name": "Blue", "hex": "#0000FF", "rgb": "rgb(0,0,255)" });
        send(&app, Method::POST, "/api/v1/colors", Some(blue)).await;

        let (status, body) = send(&app, Method::GET, "/api/v1/colors?page=0&pageSize=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["colors"].as_array().unwrap().len(), 1);
        assert_eq!(body["colors"][0]["name"], "Red");
        assert_eq!(body["total"], 2);
        assert_eq!(body["page"], 1);

        let (_, body) = send(&app, Method::GET, "/api/v1/colors?search=blu", None).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["page_size"], 5);
    }

    #[tokio::test]
    async fn update_and_delete_over_http() {
        let app = app().await;
        let (_, created) = send(&app, Method::POST, "/api/v1/colors", Some(red())).await;
        let uri = format!("/api/v1/colors/{}", created["id"]);

        let (status, updated) = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({ "rgb": "rgb(250, 0, 0)" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["rgb"], "rgb(250, 0, 0)");

        let (status, deleted) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted, updated);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_check_responds() {
        let app = app().await;
        let response = app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
