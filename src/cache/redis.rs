//! کش مشترک روی Redis
//!
//! هر لینک به صورت JSON با کلید `url:{code}` و `SET EX` ذخیره میشه.

use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands};
use tracing::{debug, warn};

use super::{CacheResult, LinkCache};
use crate::models::ShortLink;

/// پیشوند کلیدها
const KEY_PREFIX: &str = "url:";

#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
    ttl: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").field("ttl", &self.ttl).finish()
    }
}

impl RedisCache {
    /// اتصال به Redis
    ///
    /// # Errors
    /// اگه آدرس نامعتبر باشه یا اتصال برقرار نشه
    pub async fn connect(redis_url: &str, ttl: Duration) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn, ttl })
    }

    fn key(code: &str) -> String {
        format!("{}{}", KEY_PREFIX, code)
    }
}

#[async_trait]
impl LinkCache for RedisCache {
    async fn get(&self, code: &str) -> CacheResult<Option<ShortLink>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::key(code)).await?;

        match raw {
            Some(json) => match serde_json::from_str(&json) {
                Ok(link) => Ok(Some(link)),
                Err(e) => {
                    // entry خراب رو پاک میکنیم تا دفعه بعد از دیتابیس پر بشه
                    warn!(code, error = %e, "Dropping undecodable cache entry");
                    let _: () = conn.del(Self::key(code)).await?;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn set(&self, link: &ShortLink) -> CacheResult<()> {
        let json = serde_json::to_string(link)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(Self::key(&link.short_code), json, self.ttl.as_secs())
            .await?;
        debug!(code = %link.short_code, "Cached link in Redis");
        Ok(())
    }

    async fn delete(&self, code: &str) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(Self::key(code)).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
