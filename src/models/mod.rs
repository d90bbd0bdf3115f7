//! # ماژول مدل‌ها (Domain Models)
//!
//! این ماژول مدل‌های داده برنامه رو تعریف میکنه.
//!
//! ## تفاوت انواع مدل:
//! - **Entity**: داده‌ای که در دیتابیس ذخیره میشه (`ShortLink`)
//! - **Event**: داده‌ای که موقتا در صف زندگی میکنه (`ClickEvent`)
//! - **DTO (Data Transfer Object)**: برای ارسال/دریافت از API

mod short_link;
mod click;
mod analytics;
mod dto;

// Re-export همه مدل‌ها
pub use short_link::*;
pub use click::*;
pub use analytics::*;
pub use dto::*;
