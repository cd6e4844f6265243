use crate::core::DiscoveryWorkflow;
use crate::domain::model::SearchRadius;
use crate::domain::ports::PlacesProvider;
use crate::utils::error::{PickerError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// 一個使用者 session：獨佔的 workflow 與最後活動時間
pub struct SessionEntry {
    workflow: Mutex<DiscoveryWorkflow>,
    created_at: DateTime<Utc>,
    last_active_ms: AtomicI64,
}

impl SessionEntry {
    fn new(workflow: DiscoveryWorkflow) -> Self {
        let now = Utc::now();
        Self {
            workflow: Mutex::new(workflow),
            created_at: now,
            last_active_ms: AtomicI64::new(now.timestamp_millis()),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&self) {
        self.last_active_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        let idle_ms = now.timestamp_millis() - self.last_active_ms.load(Ordering::Relaxed);
        Duration::from_millis(idle_ms.max(0) as u64)
    }

    /// 同一個 session 已有請求進行中時直接拒絕，避免舊回應覆蓋新的選擇
    pub fn try_workflow(&self) -> Result<MutexGuard<'_, DiscoveryWorkflow>> {
        self.workflow.try_lock().map_err(|_| PickerError::Busy)
    }
}

pub struct SessionStore {
    sessions: DashMap<Uuid, Arc<SessionEntry>>,
    provider: Arc<dyn PlacesProvider>,
    default_radius: SearchRadius,
}

impl SessionStore {
    pub fn new(provider: Arc<dyn PlacesProvider>, default_radius: SearchRadius) -> Self {
        Self {
            sessions: DashMap::new(),
            provider,
            default_radius,
        }
    }

    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let mut workflow = DiscoveryWorkflow::new(self.provider.clone());
        workflow.set_radius(self.default_radius);

        self.sessions.insert(id, Arc::new(SessionEntry::new(workflow)));
        tracing::info!("Session created with ID: {}", id);
        id
    }

    pub fn get(&self, id: &str) -> Result<Arc<SessionEntry>> {
        let not_found = || PickerError::SessionNotFound { id: id.to_string() };
        let key = Uuid::parse_str(id).map_err(|_| not_found())?;

        let entry = self
            .sessions
            .get(&key)
            .map(|entry| entry.value().clone())
            .ok_or_else(not_found)?;
        entry.touch();
        Ok(entry)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        let not_found = || PickerError::SessionNotFound { id: id.to_string() };
        let key = Uuid::parse_str(id).map_err(|_| not_found())?;

        self.sessions.remove(&key).map(|_| ()).ok_or_else(not_found)?;
        tracing::info!("Session ended: {}", id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// 移除閒置過久的 session，回傳移除數量
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.idle_for(now) < max_idle);
        before.saturating_sub(self.sessions.len())
    }
}

pub fn spawn_idle_sweeper(store: Arc<SessionStore>, max_idle: Duration) -> JoinHandle<()> {
    let period = max_idle.clamp(Duration::from_secs(1), Duration::from_secs(60));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let evicted = store.evict_idle(max_idle);
            if evicted > 0 {
                tracing::info!("🧹 Evicted {} idle sessions ({} active)", evicted, store.len());
            }
        }
    })
}
