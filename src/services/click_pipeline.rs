//! # صف کلیک‌ها (Click Pipeline)
//!
//! redirect نباید منتظر نوشتن در دیتابیس بمونه. handler رویداد رو داخل یک
//! صف محدود میندازه و چند worker پس‌زمینه اونا رو ثبت میکنن.
//!
//! ## قوانین:
//! - `submit` هیچوقت block نمیشه: صف پر = رویداد دور انداخته میشه
//! - رویدادی که ثبتش fail بشه لاگ میشه و دوباره امتحان نمیشه
//! - بعد از `shutdown` هیچ رویدادی قبول نمیشه، ولی همه رویدادهای قبلی
//!   (تا سقف timeout) ثبت میشن
//!
//! ```text
//! redirect ──try_send──▶ [ mpsc (bounded) ] ──▶ worker 1..N ──▶ LinkStore
//! ```

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use tokio::{
    sync::{mpsc, Mutex as AsyncMutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    database::LinkStore,
    error::{AppError, Result},
    models::ClickEvent,
};

/// نتیجه تحویل یک رویداد به صف
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// رویداد وارد صف شد
    Accepted,
    /// صف پر بود؛ رویداد دور انداخته شد
    QueueFull,
    /// pipeline بسته شده
    Closed,
}

type SharedReceiver = Arc<AsyncMutex<mpsc::Receiver<ClickEvent>>>;

// =====================================
// Click Pipeline
// =====================================
/// صف محدود + worker pool برای ثبت کلیک‌ها
///
/// # مفاهیم:
/// - `mpsc` یک مصرف‌کننده داره؛ worker‌ها receiver رو پشت یک `Mutex`
///   async به نوبت قرض میگیرن
/// - sender داخل `Option` هست: `None` یعنی بسته شده. برداشتنش کانال رو
///   میبنده و worker‌ها بعد از خالی شدن صف خارج میشن
/// - `queued` مستقل از sender شمرده میشه تا حین تخلیه هم درست باشه
pub struct ClickPipeline {
    sender: Mutex<Option<mpsc::Sender<ClickEvent>>>,
    receiver: SharedReceiver,
    queued: Arc<AtomicUsize>,
    store: Arc<dyn LinkStore>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    capacity: usize,
}

impl std::fmt::Debug for ClickPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickPipeline")
            .field("capacity", &self.capacity)
            .field("pending", &self.pending())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ClickPipeline {
    /// ساخت صف؛ worker‌ها با `start` راه میفتن
    ///
    /// # Panics
    /// اگه `capacity` صفر باشه (`Config::validate` جلوشو میگیره)
    #[must_use]
    pub fn new(store: Arc<dyn LinkStore>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);

        Self {
            sender: Mutex::new(Some(tx)),
            receiver: Arc::new(AsyncMutex::new(rx)),
            queued: Arc::new(AtomicUsize::new(0)),
            store,
            workers: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// راه‌اندازی `worker_count` worker روی runtime فعلی
    pub fn start(&self, worker_count: usize) {
        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        let first_id = workers.len();

        for id in first_id..first_id + worker_count {
            workers.push(self.spawn_worker(id));
        }

        info!(
            workers = workers.len(),
            capacity = self.capacity,
            "Click pipeline started"
        );
    }

    /// تحویل رویداد بدون انتظار
    pub fn submit(&self, event: ClickEvent) -> SubmitOutcome {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(tx) = sender.as_ref() else {
            debug!(link_id = event.short_link_id, "Click pipeline closed, dropping event");
            return SubmitOutcome::Closed;
        };

        // قبل از ارسال شمرده میشه؛ worker ممکنه بلافاصله برش داره
        self.queued.fetch_add(1, Ordering::AcqRel);

        match tx.try_send(event) {
            Ok(()) => SubmitOutcome::Accepted,
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.queued.fetch_sub(1, Ordering::AcqRel);
                warn!(
                    link_id = event.short_link_id,
                    capacity = self.capacity,
                    "Click queue is full, dropping event"
                );
                SubmitOutcome::QueueFull
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                self.queued.fetch_sub(1, Ordering::AcqRel);
                debug!(link_id = event.short_link_id, "Click channel closed, dropping event");
                SubmitOutcome::Closed
            }
        }
    }

    /// تعداد رویدادهایی که وارد صف شدن و هنوز هیچ worker‌ای برشون نداشته
    ///
    /// بعد از `close` هم تا تخلیه کامل صف مقدار واقعی رو برمیگردونه.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queued.load(Ordering::Acquire)
    }

    /// آیا shutdown شروع شده؟
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// بستن صف بدون صبر برای تخلیه؛ `submit` از این به بعد `Closed` میده
    pub fn close(&self) {
        let closed = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if closed.is_some() {
            info!(pending = self.pending(), "Click pipeline closed");
        }
    }

    /// بستن صف و صبر برای ثبت رویدادهای باقی‌مونده
    ///
    /// اگه هیچ worker‌ای راه نیفتاده باشه، یک worker فقط برای تخلیه صف
    /// ساخته میشه. صدا زدن دوباره بی‌اثره.
    ///
    /// # Errors
    /// `AppError::Internal` اگه تخلیه تا `timeout` تموم نشه
    pub async fn shutdown(&self, timeout: Duration) -> Result<()> {
        self.close();

        let handles: Vec<JoinHandle<()>> = {
            let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
            if workers.is_empty() {
                if self.pending() == 0 {
                    return Ok(());
                }
                workers.push(self.spawn_worker(0));
            }
            workers.drain(..).collect()
        };

        info!(workers = handles.len(), "Draining click pipeline");

        let drain = async {
            for handle in handles {
                if let Err(e) = handle.await {
                    error!(error = %e, "Click worker terminated abnormally");
                }
            }
        };

        tokio::time::timeout(timeout, drain).await.map_err(|_| {
            AppError::Internal(format!(
                "Click pipeline did not drain within {}s",
                timeout.as_secs()
            ))
        })?;

        info!("Click pipeline drained");
        Ok(())
    }

    fn spawn_worker(&self, id: usize) -> JoinHandle<()> {
        tokio::spawn(run_worker(
            id,
            self.receiver.clone(),
            self.queued.clone(),
            self.store.clone(),
        ))
    }
}

/// حلقه یک worker: گرفتن رویداد، ثبت، تکرار
///
/// قفل receiver فقط برای گرفتن رویداد نگه داشته میشه، نه موقع نوشتن.
async fn run_worker(
    id: usize,
    receiver: SharedReceiver,
    queued: Arc<AtomicUsize>,
    store: Arc<dyn LinkStore>,
) {
    debug!(worker = id, "Click worker started");

    loop {
        let next = receiver.lock().await.recv().await;
        let Some(event) = next else { break };
        queued.fetch_sub(1, Ordering::AcqRel);

        match store.record_click(&event).await {
            Ok(()) => debug!(worker = id, link_id = event.short_link_id, "Click recorded"),
            Err(e) => warn!(
                worker = id,
                link_id = event.short_link_id,
                error = %e,
                "Failed to record click, discarding event"
            ),
        }
    }

    debug!(worker = id, "Click worker stopped");
}
