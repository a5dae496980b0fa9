use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub turso_auth_token: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_pass: Option<String>,
    pub from_email: String,
    pub frontend_url: String,
    pub storage_type: String,
    pub upload_dir: String,
    pub r2_bucket: Option<String>,
    pub r2_account_id: Option<String>,
    pub r2_access_key: Option<String>,
    pub r2_secret_key: Option<String>,
    pub r2_public_url: Option<String>,
    pub upstash_redis_url: Option<String>,
    pub login_rate_limit: u32,
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
    pub base_url: String,
    pub port: u16,
    pub testing_mode: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            turso_auth_token: env::var("TURSO_AUTH_TOKEN").ok(),
            jwt_secret: env::var("JWT_SECRET")?,
            token_ttl_hours: env::var("TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(12),
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(587),
            smtp_user: env::var("SMTP_USER").unwrap_or_default(),
            smtp_pass: env::var("SMTP_PASS").ok(),
            from_email: env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "Freshom Produce Market <orders@freshom.co.ke>".to_string()),
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| base_url.clone()),
            storage_type: env::var("STORAGE_TYPE").unwrap_or_else(|_| "local".to_string()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "./static/uploads".to_string()),
            r2_bucket: env::var("R2_BUCKET").ok(),
            r2_account_id: env::var("R2_ACCOUNT_ID").ok(),
            r2_access_key: env::var("R2_ACCESS_KEY").ok(),
            r2_secret_key: env::var("R2_SECRET_KEY").ok(),
            r2_public_url: env::var("R2_PUBLIC_URL").ok(),
            upstash_redis_url: env::var("UPSTASH_REDIS_URL").ok(),
            login_rate_limit: env::var("LOGIN_RATE_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            bootstrap_admin_email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            bootstrap_admin_password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok(),
            base_url,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            testing_mode: env::var("TESTING_MODE")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase() == "true",
        })
    }
}
