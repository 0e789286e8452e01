//! Accessibility monitoring platform - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use amp_lib::api;
use amp_lib::config::{Config, USER_ID_HEADER};
use amp_lib::db::DbPool;
use amp_lib::middleware;
use amp_lib::services::url_check::{PreviousCaseCheck, UrlChecker};
use amp_lib::services::{self, BlobStore, S3BlobStore};

/// Perform health check (for Docker healthcheck).
async fn health_check() -> bool {
    // Simple check - just verify we can load config
    Config::from_env().is_ok()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Check for --health-check flag (used by Docker HEALTHCHECK)
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|arg| arg == "--health-check") {
        dotenvy::dotenv().ok();
        if health_check().await {
            std::process::exit(0);
        } else {
            std::process::exit(1);
        }
    }

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and the S3_* variables must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Accessibility Monitoring Platform");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for DATABASE_URL and S3");
    }

    // Initialize database
    let pool = DbPool::new(&config)
        .await
        .expect("Failed to initialize database");
    info!("Database connection established");

    pool.run_migrations()
        .await
        .expect("Failed to run migrations");
    info!("Database migrations complete");

    // Published reports live in S3 (MinIO in development)
    let store: Arc<dyn BlobStore> = Arc::new(
        S3BlobStore::new(&config.s3)
            .await
            .expect("Failed to initialize S3 storage"),
    );

    let previous_case_check = PreviousCaseCheck {
        checker: UrlChecker::new(config.url_check_timeout_secs)
            .expect("Failed to build HTTP client"),
        platform_domain: config.platform_domain.clone(),
    };

    // Date-dependent statuses go stale without saves
    services::start_status_refresh_task(
        Arc::new(pool.clone()),
        services::StatusRefreshConfig {
            interval_secs: config.status_refresh_interval_secs,
        },
    );

    let bind_address = config.bind_address();
    let is_development = config.is_development();

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!("Starting server at http://{} ({} workers)", bind_address, cpus);
        cpus
    };

    let server = HttpServer::new(move || {
        let allowed_headers = vec![
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-user-id"),
        ];
        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
                .allowed_headers(allowed_headers)
                .max_age(3600)
        } else {
            // Same-origin only in production
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
                .allowed_headers(allowed_headers)
                .max_age(3600)
        };

        App::new()
            // CORS must wrap before other middleware
            .wrap(cors)
            .wrap(middleware::RequestLogger)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::from(store.clone()))
            .app_data(web::Data::new(previous_case_check.clone()))
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_case_routes)
                    .configure(api::configure_audit_routes)
                    .configure(api::configure_report_routes)
                    .configure(api::configure_contact_routes)
                    .configure(api::configure_comment_routes)
                    .configure(api::configure_task_routes)
                    .configure(api::configure_retest_routes)
                    .configure(api::configure_export_routes)
                    .configure(api::configure_catalogue_routes)
                    .configure(api::configure_sitemap_routes),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
            )
    });

    info!("Acting user header: {}", USER_ID_HEADER);

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
