//! Skyvidya Eval Server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use skyvidya_eval_lib::{api, middleware};

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{App, HttpRequest, HttpServer, Result as ActixResult, http::header, web};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use skyvidya_eval_lib::auth::AdminKey;
use skyvidya_eval_lib::config::Config;
use skyvidya_eval_lib::db::DbPool;
use skyvidya_eval_lib::services::validator::ScoringClient;
use skyvidya_eval_lib::services::{
    BatchRegistry, BatchRunner, DomainVerifier, EventBroadcaster, GeminiClient, HttpAgentClient,
};

/// SPA fallback handler - serves index.html for client-side routing.
async fn spa_fallback(req: HttpRequest) -> ActixResult<NamedFile> {
    let static_dir: &PathBuf = req
        .app_data::<web::Data<PathBuf>>()
        .expect("Static dir not configured")
        .get_ref();
    Ok(NamedFile::open(static_dir.join("index.html"))?)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and SVY_VALIDATOR_API_KEY must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Skyvidya Eval Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for DATABASE_URL and the validator API key");
    }

    // Connect to PostgreSQL
    let pool = match DbPool::connect(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };
    info!("Database connection established");

    // Run migrations
    if let Err(e) = pool.migrate().await {
        error!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }
    info!("Database migrations complete");

    // Shared state
    let broadcaster = EventBroadcaster::new();
    let registry = BatchRegistry::new();
    let scorer: Arc<dyn ScoringClient> = Arc::new(GeminiClient::new(&config.validator));
    let runner = BatchRunner::new(
        Arc::new(pool.clone()),
        Arc::new(HttpAgentClient::new()),
        scorer.clone(),
        broadcaster.clone(),
        registry.clone(),
    );
    let verifier = DomainVerifier::new();
    let admin_key = AdminKey::new(config.admin_key.clone());

    info!(
        "Dispatcher: default concurrency {}, max {}, security call delay {}ms",
        config.dispatch.default_concurrency,
        config.dispatch.max_concurrency,
        config.dispatch.security_call_delay_ms
    );
    info!(
        "Validator model: {} at {}",
        config.validator.model, config.validator.base_url
    );

    let bind_address = config.bind_address();
    let static_dir = config.static_dir.clone();
    let is_development = config.is_development();

    if static_dir.is_some() {
        info!("Static file serving enabled from {:?}", static_dir);
    }

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    // Start HTTP server
    let server = HttpServer::new(move || {
        // Configure CORS
        let cors = if is_development {
            // Permissive CORS for development
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
                .allowed_headers(vec![
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                    "X-API-Key".parse().unwrap(),
                    "X-Admin-Key".parse().unwrap(),
                ])
                .max_age(3600)
        } else {
            // Restrictive CORS for production (same-origin only)
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
                .allowed_headers(vec![
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                    "X-API-Key".parse().unwrap(),
                    "X-Admin-Key".parse().unwrap(),
                ])
                .max_age(3600)
        };

        let mut app = App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            // Add request logging middleware
            .wrap(middleware::RequestLogger)
            // Add shared state
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(admin_key.clone()))
            .app_data(web::Data::new(broadcaster.clone()))
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::new(runner.clone()))
            .app_data(web::Data::new(verifier.clone()))
            .app_data(web::Data::from(scorer.clone()))
            // Configure API routes
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_agent_routes)
                    .configure(api::configure_test_case_routes)
                    .configure(api::configure_batch_routes)
                    .configure(api::configure_validator_routes)
                    .configure(api::configure_execution_routes)
                    .configure(api::configure_benchmark_routes)
                    .configure(api::configure_report_routes)
                    .configure(api::configure_domain_routes)
                    .configure(api::configure_key_routes)
                    .configure(api::configure_websocket_routes),
            )
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
            );

        // Serve static files in production (when SVY_STATIC_DIR is set)
        if let Some(ref dir) = static_dir {
            app = app
                .app_data(web::Data::new(dir.clone()))
                // Serve static assets (js, css, images)
                .service(Files::new("/assets", dir.join("assets")).prefer_utf8(true))
                // Serve favicon
                .service(Files::new("/favicon", dir.clone()).index_file("favicon.ico"))
                // SPA fallback - serve index.html for all other routes
                .default_service(web::route().to(spa_fallback));
        }

        app
    });

    // Set worker count
    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
