use actix_cors::Cors;
use actix_middleware::{
    CorrelationIdMiddleware, JwtAuthMiddleware, JwtValidator, MetricsMiddleware,
};
use actix_web::{web, App, HttpServer};
use db_pool::create_pool as create_pg_pool;
use post_service::db::PgPostStore;
use post_service::handlers::{self, HealthState};
use post_service::identity::{ClerkClient, IdentityAdapter};
use post_service::rate_limit::{RateLimitConfig, RedisRateLimiter};
use post_service::services::{PostService, ProfileService};
use redis_utils::RedisPool;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn io_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

/// Post Service
///
/// # Routes
///
/// - `GET  /api/v1/posts` - global feed
/// - `POST /api/v1/posts` - create a post (authenticated)
/// - `GET  /api/v1/posts/{post_id}` - single post
/// - `GET  /api/v1/users/{user_id}/posts` - author feed
/// - `GET  /api/v1/profiles/{username}` - profile lookup
/// - `/api/v1/health`, `/api/v1/health/ready`, `/api/v1/health/live`, `/metrics`
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    // Container healthcheck via CLI subcommand
    {
        let mut args = std::env::args();
        let _bin = args.next();
        if let Some(cmd) = args.next() {
            if cmd == "healthcheck" {
                let port = std::env::var("POST_SERVICE_PORT").unwrap_or_else(|_| "8085".into());
                let url = format!("http://127.0.0.1:{}/api/v1/health", port);
                return match reqwest::Client::new().get(&url).send().await {
                    Ok(resp) if resp.status().is_success() => Ok(()),
                    Ok(resp) => {
                        eprintln!("healthcheck HTTP status: {}", resp.status());
                        Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"))
                    }
                    Err(e) => {
                        eprintln!("healthcheck HTTP error: {}", e);
                        Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"))
                    }
                };
            }
        }
    }

    init_tracing();

    let config = match post_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting post-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let jwt_middleware = match config.auth.jwt_public_key_pem.as_deref() {
        Some(pem) => {
            let validator = JwtValidator::rs256_from_pem(pem, config.auth.jwt_issuer.as_deref())
                .map_err(|e| io_error("Failed to initialize JWT validation", e))?;
            JwtAuthMiddleware::new(Arc::new(validator))
        }
        None if config.app.is_production() => {
            return Err(io_error(
                "JWT_PUBLIC_KEY_PEM",
                "must be set in production",
            ));
        }
        None => {
            tracing::warn!("JWT public key not configured; all requests are anonymous");
            JwtAuthMiddleware::disabled()
        }
    };

    let db_cfg = config.database.pool_config("post-service");
    db_cfg.log_config();

    let db_pool = match create_pg_pool(db_cfg).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {:#}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| io_error("Failed to run database migrations", e))?;
    tracing::info!("Database migrations applied");

    let redis_pool = RedisPool::connect(&config.redis.url)
        .await
        .map_err(|e| io_error("Failed to initialize Redis connection", e))?;

    let identity_client = ClerkClient::new(&config.identity)
        .map_err(|e| io_error("Failed to build identity provider client", e))?;
    let identity = IdentityAdapter::new(Arc::new(identity_client));

    let rate_limiter = RedisRateLimiter::new(
        redis_pool.manager(),
        RateLimitConfig::from(&config.rate_limit),
    );
    tracing::info!(
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        "Post rate limiter configured"
    );

    let posts_data = web::Data::new(PostService::new(
        Arc::new(PgPostStore::new(db_pool.clone())),
        identity.clone(),
        Arc::new(rate_limiter),
    ));
    let profiles_data = web::Data::new(ProfileService::new(identity));
    let health_state = web::Data::new(HealthState::new(db_pool.clone(), redis_pool.manager()));

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", http_bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(posts_data.clone())
            .app_data(profiles_data.clone())
            .app_data(health_state.clone())
            .wrap(jwt_middleware.clone())
            .wrap(MetricsMiddleware)
            .wrap(CorrelationIdMiddleware)
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(post_service::metrics::serve_metrics),
            )
            .route("/api/v1/health", web::get().to(handlers::health_summary))
            .route("/api/v1/health/ready", web::get().to(handlers::readiness_summary))
            .route("/api/v1/health/live", web::get().to(handlers::liveness_check))
            .configure(handlers::configure_routes)
            .default_service(web::route().to(handlers::route_not_found))
    })
    .bind(&http_bind_address)?
    .run();

    let server_handle = server.handle();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            if let Err(e) = &result {
                tracing::error!("HTTP server error: {}", e);
            }
            result
        }
        _ = &mut shutdown => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            db_pool.close().await;
            tracing::info!("Post service stopped");
            Ok(())
        }
    }
}
