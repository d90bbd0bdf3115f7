//! # Repository Pattern
//!
//! این فایل قرارداد ذخیره‌سازی دائمی (`LinkStore`) و پیاده‌سازی SQLite اون
//! (`LinkRepository`) رو تعریف میکنه.
//!
//! ## Repository Pattern چیه؟
//! یه لایه انتزاعی بین منطق برنامه و دیتابیس.
//! - `UrlService` و `ClickPipeline` نمیدونن داده کجا ذخیره میشه
//! - تست کردن راحت‌تر میشه (با mockall میشه mock کرد)
//!
//! ## یکتایی
//! قید `UNIQUE` روی `short_code` و `original_url` داور نهایی هست.
//! چک‌های قبل از نوشتن در سرویس فقط احتمال رقابت رو کم میکنن؛ اگه رقابت
//! پیش بیاد، اینجا به `AppError::Conflict` تبدیل میشه.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use super::Database;
use crate::{
    error::{AppError, Result},
    models::{ClickEvent, NewShortLink, ShortLink},
};

/// ستون‌های جدول urls به ترتیب فیلدهای `ShortLink`
const LINK_COLUMNS: &str = "id, original_url, short_code, created_at, updated_at, click_count";

// =====================================
// Durable Store Trait
// =====================================
/// قرارداد ذخیره‌سازی دائمی
///
/// # مفاهیم:
/// - `#[async_trait]`: macro برای async در traits
/// - `Send + Sync`: امکان share بین worker‌ها
/// - `automock`: در تست‌ها `MockLinkStore` ساخته میشه
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// درج لینک جدید؛ شناسه رو دیتابیس تعیین میکنه
    ///
    /// نقض یکتایی → `AppError::Conflict`
    async fn insert_short_link(&self, link: &NewShortLink) -> Result<ShortLink>;

    /// پیدا کردن با کد کوتاه
    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortLink>>;

    /// پیدا کردن با URL اصلی (تطابق دقیق رشته)
    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<ShortLink>>;

    /// بازنویسی فیلدهای قابل تغییر؛ `updated_at` خودکار تنظیم میشه
    async fn update_short_link(&self, link: &ShortLink) -> Result<ShortLink>;

    /// حذف مدیریتی؛ کلیک‌های وابسته هم حذف میشن
    async fn delete_short_link(&self, short_code: &str) -> Result<bool>;

    /// ثبت کلیک و افزایش شمارنده در یک تراکنش
    ///
    /// اگه لینک صاحب کلیک وجود نداشته باشه، کل تراکنش rollback میشه.
    async fn record_click(&self, event: &ClickEvent) -> Result<()>;
}

// =====================================
// SQLite Implementation
// =====================================
/// Repository برای لینک‌ها و کلیک‌ها روی SQLite
#[derive(Debug, Clone)]
pub struct LinkRepository {
    db: Database,
}

impl LinkRepository {
    /// ساخت repository جدید
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// درج ردیف کلیک داخل تراکنش جاری
    async fn insert_click(conn: &mut SqliteConnection, event: &ClickEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO clicks (url_id, ip_address, user_agent, referer, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.short_link_id)
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(&event.referer)
        .bind(event.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// افزایش شمارنده کلیک داخل تراکنش جاری
    ///
    /// # Errors
    /// `NotFound` اگه هیچ ردیفی آپدیت نشه
    async fn increment_click_counter(conn: &mut SqliteConnection, link_id: i64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE urls SET click_count = click_count + 1, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(link_id)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("No short link with id {}", link_id)));
        }

        Ok(())
    }
}

/// تبدیل نقض قید UNIQUE به Conflict
fn map_unique_violation(err: sqlx::Error, what: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(format!("{} already exists", what))
        }
        _ => AppError::Storage(err),
    }
}

#[async_trait]
impl LinkStore for LinkRepository {
    async fn insert_short_link(&self, link: &NewShortLink) -> Result<ShortLink> {
        let now = Utc::now();

        let inserted = sqlx::query_as::<_, ShortLink>(&format!(
            r#"
            INSERT INTO urls (original_url, short_code, created_at, updated_at, click_count)
            VALUES (?, ?, ?, ?, 0)
            RETURNING {}
            "#,
            LINK_COLUMNS
        ))
        .bind(&link.original_url)
        .bind(&link.short_code)
        .bind(now)
        .bind(now)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| map_unique_violation(e, "short link"))?;

        debug!(id = inserted.id, short_code = %inserted.short_code, "Inserted short link");
        Ok(inserted)
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortLink>> {
        let link = sqlx::query_as::<_, ShortLink>(&format!(
            "SELECT {} FROM urls WHERE short_code = ?",
            LINK_COLUMNS
        ))
        .bind(short_code)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(link)
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<ShortLink>> {
        let link = sqlx::query_as::<_, ShortLink>(&format!(
            "SELECT {} FROM urls WHERE original_url = ?",
            LINK_COLUMNS
        ))
        .bind(original_url)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(link)
    }

    async fn update_short_link(&self, link: &ShortLink) -> Result<ShortLink> {
        let updated = sqlx::query_as::<_, ShortLink>(&format!(
            r#"
            UPDATE urls
            SET original_url = ?, short_code = ?, click_count = ?, updated_at = ?
            WHERE id = ?
            RETURNING {}
            "#,
            LINK_COLUMNS
        ))
        .bind(&link.original_url)
        .bind(&link.short_code)
        .bind(link.click_count)
        .bind(Utc::now())
        .bind(link.id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| map_unique_violation(e, "short link"))?;

        updated.ok_or_else(|| AppError::NotFound(format!("No short link with id {}", link.id)))
    }

    async fn delete_short_link(&self, short_code: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM urls WHERE short_code = ?")
            .bind(short_code)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_click(&self, event: &ClickEvent) -> Result<()> {
        let mut tx = self.db.begin().await?;

        // اگه یکی از این دو fail بشه، tx بدون commit drop میشه = rollback
        Self::insert_click(&mut tx, event).await?;
        Self::increment_click_counter(&mut tx, event.short_link_id).await?;

        tx.commit().await?;
        Ok(())
    }
}
