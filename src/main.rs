mod config;
mod db;
mod error;
mod metrics;
mod middleware;
mod models;
mod routes;
mod services;
mod storage;

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::models::{AdminRole, AdminUser};
use crate::routes::{create_router, AppState};
use crate::services::{auth::hash_password, EmailService, RateLimiter};
use crate::storage::{LocalStorage, R2Storage, StorageBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freshom_admin=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    // lettre, redis and rust-s3 all negotiate TLS through rustls
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        tracing::debug!("rustls crypto provider already installed");
    }

    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;

    let db = db::create_database(&config.database_url, config.turso_auth_token.as_deref()).await?;
    let conn = db.connect()?;
    db::migrate(&conn).await?;
    tracing::info!("Connected to database");

    bootstrap_admin(&conn, &config).await?;

    let rate_limiter = match &config.upstash_redis_url {
        Some(url) => match RateLimiter::new(url, config.login_rate_limit) {
            Ok(limiter) => {
                tracing::info!("Login rate limiting enabled ({} per minute)", config.login_rate_limit);
                Some(limiter)
            }
            Err(e) => {
                tracing::error!("Failed to initialize rate limiter: {} - rate limiting disabled", e);
                None
            }
        },
        None => {
            tracing::warn!("Redis not configured - login rate limiting disabled");
            None
        }
    };

    let email = match &config.smtp_pass {
        Some(pass) => match EmailService::new(
            &config.smtp_host,
            config.smtp_port,
            &config.smtp_user,
            pass,
            &config.from_email,
            &config.frontend_url,
        ) {
            Ok(service) => {
                tracing::info!("Email service initialized");
                Some(service)
            }
            Err(e) => {
                tracing::warn!("Email service not available: {}", e);
                None
            }
        },
        None => {
            tracing::warn!("SMTP_PASS not set - order status emails disabled");
            None
        }
    };

    let storage = build_storage(&config).await?;

    let state = AppState {
        db: Arc::new(db),
        config: config.clone(),
        email,
        storage,
        rate_limiter,
    };

    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Dashboard: {}/", config.base_url);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Seeds the first SUPER_ADMIN so a fresh deployment can log in.
async fn bootstrap_admin(conn: &libsql::Connection, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(email), Some(password)) = (&config.bootstrap_admin_email, &config.bootstrap_admin_password)
    else {
        return Ok(());
    };

    if AdminUser::count_all(conn).await? > 0 {
        return Ok(());
    }

    let admin = AdminUser::create(conn, "Administrator", email, &hash_password(password)?, AdminRole::SuperAdmin).await?;
    tracing::info!("Bootstrapped super admin {}", admin.email);
    Ok(())
}

async fn build_storage(config: &Config) -> Result<Arc<dyn StorageBackend>, Box<dyn std::error::Error>> {
    if config.storage_type == "r2" {
        match (
            &config.r2_bucket,
            &config.r2_account_id,
            &config.r2_access_key,
            &config.r2_secret_key,
            &config.r2_public_url,
        ) {
            (Some(bucket), Some(account_id), Some(access_key), Some(secret_key), Some(public_url)) => {
                tracing::info!("Using R2 storage");
                let r2 = R2Storage::new(bucket, account_id, access_key, secret_key, public_url)?;
                return Ok(Arc::new(r2));
            }
            _ => tracing::warn!("R2 storage configured but missing credentials, falling back to local"),
        }
    }

    tracing::info!("Using local storage in {}", config.upload_dir);
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    Ok(Arc::new(LocalStorage::new(&config.upload_dir, &config.base_url)))
}
