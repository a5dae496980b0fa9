use redis::{AsyncCommands, Client};
use std::sync::Arc;
use tokio::sync::Mutex;
use thiserror::Error;

const WINDOW_SECONDS: i64 = 60;

/// Fixed-window login limiter backed by Upstash Redis.
#[derive(Clone)]
pub struct RateLimiter {
    client: Client,
    connection: Arc<Mutex<Option<redis::aio::MultiplexedConnection>>>,
    attempts_per_minute: u32,
}

#[derive(Error, Debug)]
pub enum RateLimitError {
    #[error("Redis connection error: {0}")]
    Connection(String),

    #[error("Redis error: {0}")]
    Redis(String),
}

impl RateLimiter {
    pub fn new(redis_url: &str, attempts_per_minute: u32) -> Result<Self, RateLimitError> {
        let client = Client::open(redis_url).map_err(|e| RateLimitError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            connection: Arc::new(Mutex::new(None)),
            attempts_per_minute,
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, RateLimitError> {
        let mut conn_guard = self.connection.lock().await;

        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| RateLimitError::Connection(e.to_string()))?;

        *conn_guard = Some(conn.clone());
        Ok(conn)
    }

    /// Counts one login attempt from `ip`. `Ok(false)` once the minute's budget is spent.
    pub async fn check_login(&self, ip: &str) -> Result<bool, RateLimitError> {
        let key = login_key(ip);
        let mut conn = self.get_connection().await?;

        let count: i64 = conn
            .incr(&key, 1)
            .await
            .map_err(|e| RateLimitError::Redis(e.to_string()))?;

        if count == 1 {
            let _: () = conn
                .expire(&key, WINDOW_SECONDS)
                .await
                .map_err(|e| RateLimitError::Redis(e.to_string()))?;
        }

        Ok(count <= self.attempts_per_minute as i64)
    }
}

fn login_key(ip: &str) -> String {
    format!("freshom:login:{}", ip)
}
