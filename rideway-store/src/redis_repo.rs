use redis::AsyncCommands;
use tracing::debug;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Revoke a token until it would have expired anyway.
    pub async fn blacklist_token(&self, token: &str, ttl_seconds: u64) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("blacklist:{}", token);
        conn.set_ex::<_, _, ()>(key, "1", ttl_seconds).await?;
        debug!("Token blacklisted");
        Ok(())
    }

    pub async fn is_token_blacklisted(&self, token: &str) -> Result<bool, redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("blacklist:{}", token);
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    /// Fixed-window counter: true while the caller is under `limit` hits
    /// per `window_seconds`.
    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: i64,
        window_seconds: i64,
    ) -> Result<bool, redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}
