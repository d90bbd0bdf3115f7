//! # سرویس آمار
//!
//! خروجی خام `AnalyticsRepository` رو به `Analytics` تبدیل میکنه:
//! - کل کلیک‌های هفت روز اخیر
//! - کلیک‌های روزانه برای هفت روز تقویمی اخیر
//! - دامنه‌های ارجاع‌دهنده با درصد
//! - مرورگرها بر اساس نام و نسخه اصلی

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::instrument;

use crate::{
    database::AnalyticsRepository,
    error::{OptionExt, Result},
    models::{Analytics, BrowserStat, ReferrerStat},
    utils,
};

/// بازه آمار به روز
pub const ANALYTICS_WINDOW_DAYS: i64 = 7;

/// سرویس آمار کلیک‌ها
#[derive(Debug, Clone)]
pub struct AnalyticsService {
    repo: AnalyticsRepository,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(repo: AnalyticsRepository) -> Self {
        Self { repo }
    }

    /// آمار یک لینک با کد کوتاه
    ///
    /// آمار همیشه مستقیم از دیتابیس خونده میشه، نه از کش.
    ///
    /// # Errors
    /// - `NotFound`: کد ناشناخته
    #[instrument(skip(self))]
    pub async fn for_short_code(&self, short_code: &str) -> Result<Analytics> {
        let link_id = self
            .repo
            .find_link_id(short_code)
            .await?
            .ok_or_not_found(format!("Short code '{}' not found", short_code))?;

        self.for_link_id(link_id, Utc::now()).await
    }

    /// آمار یک لینک نسبت به لحظه `now`
    pub async fn for_link_id(&self, link_id: i64, now: DateTime<Utc>) -> Result<Analytics> {
        let window_start = now - Duration::days(ANALYTICS_WINDOW_DAYS);

        // شروع روز، شش روز قبل: امروز + شش روز گذشته
        let first_day = (now.date_naive() - Duration::days(ANALYTICS_WINDOW_DAYS - 1))
            .and_hms_opt(0, 0, 0)
            .map_or(window_start, |dt| dt.and_utc());

        let total_clicks = self.repo.count_clicks_since(link_id, window_start).await?;
        let daily_clicks = self.repo.daily_clicks_since(link_id, first_day).await?;
        let referrers = aggregate_referrers(self.repo.referer_counts(link_id).await?);
        let browsers = aggregate_browsers(self.repo.user_agent_counts(link_id).await?);

        Ok(Analytics {
            total_clicks,
            daily_clicks,
            referrers,
            browsers,
        })
    }
}

/// جمع Referer‌های خام بر اساس دامنه
fn aggregate_referrers(rows: Vec<(String, i64)>) -> Vec<ReferrerStat> {
    let mut by_domain: HashMap<String, i64> = HashMap::new();
    for (referer, count) in rows {
        *by_domain.entry(utils::referrer_domain(&referer)).or_default() += count;
    }

    let total: i64 = by_domain.values().sum();

    let mut stats: Vec<ReferrerStat> = by_domain
        .into_iter()
        .map(|(referrer, count)| ReferrerStat {
            percent: utils::format_percent(count, total),
            referrer,
            count,
        })
        .collect();

    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.referrer.cmp(&b.referrer)));
    stats
}

/// جمع User-Agent‌های خام بر اساس مرورگر و نسخه
fn aggregate_browsers(rows: Vec<(String, i64)>) -> Vec<BrowserStat> {
    let mut by_browser: HashMap<(String, String), i64> = HashMap::new();
    for (user_agent, count) in rows {
        *by_browser.entry(utils::parse_browser(&user_agent)).or_default() += count;
    }

    let mut stats: Vec<BrowserStat> = by_browser
        .into_iter()
        .map(|((browser, version), count)| BrowserStat {
            browser,
            version,
            count,
        })
        .collect();

    stats.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.browser.cmp(&b.browser))
            .then_with(|| a.version.cmp(&b.version))
    });
    stats
}
