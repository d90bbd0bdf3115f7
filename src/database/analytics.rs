//! # Repository آمار
//!
//! query‌های تجمیعی روی جدول clicks. تبدیل خروجی خام به `Analytics`
//! (دسته‌بندی دامنه و مرورگر) در `AnalyticsService` انجام میشه.

use chrono::{DateTime, Utc};

use super::Database;
use crate::{error::Result, models::DailyClick};

/// Repository فقط‌خواندنی برای آمار کلیک‌ها
#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    db: Database,
}

impl AnalyticsRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// شناسه لینک با کد کوتاه (بدون عبور از کش)
    pub async fn find_link_id(&self, short_code: &str) -> Result<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM urls WHERE short_code = ?")
            .bind(short_code)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(id)
    }

    /// تعداد کلیک‌ها از یک لحظه به بعد
    pub async fn count_clicks_since(&self, url_id: i64, since: DateTime<Utc>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM clicks WHERE url_id = ? AND created_at > ?",
        )
        .bind(url_id)
        .bind(since)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }

    /// کلیک‌های هر روز از یک لحظه به بعد، جدیدترین روز اول
    pub async fn daily_clicks_since(
        &self,
        url_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyClick>> {
        let rows = sqlx::query_as::<_, DailyClick>(
            r#"
            SELECT strftime('%Y-%m-%d', created_at) AS date,
                   COUNT(*) AS count
            FROM clicks
            WHERE url_id = ? AND created_at >= ?
            GROUP BY date
            ORDER BY date DESC
            "#,
        )
        .bind(url_id)
        .bind(since)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    /// تعداد کلیک به ازای هر Referer خام
    pub async fn referer_counts(&self, url_id: i64) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT referer, COUNT(*) AS referer_count
            FROM clicks
            WHERE url_id = ?
            GROUP BY referer
            ORDER BY referer_count DESC
            "#,
        )
        .bind(url_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    /// تعداد کلیک به ازای هر User-Agent خام
    pub async fn user_agent_counts(&self, url_id: i64) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT user_agent, COUNT(*) AS agent_count
            FROM clicks
            WHERE url_id = ?
            GROUP BY user_agent
            ORDER BY agent_count DESC
            "#,
        )
        .bind(url_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }
}
