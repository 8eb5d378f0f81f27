//! The reminder delivery boundary and its in-process implementations.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::ScheduledReminder;
use crate::error::SchedulingError;

/// Something that can hold timed alerts.
///
/// Registering an id that is already pending replaces it. Delivery is best
/// effort; nothing here verifies that an alert was actually shown.
pub trait ReminderDelivery: Send + Sync {
    fn schedule(&self, reminder: &ScheduledReminder) -> Result<(), SchedulingError>;

    fn cancel(&self, id: &str) -> Result<(), SchedulingError>;

    fn cancel_all(&self) -> Result<(), SchedulingError>;
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Records pending reminders without delivering them.
#[derive(Debug, Default)]
pub struct MemoryDelivery {
    pending: Mutex<BTreeMap<String, ScheduledReminder>>,
}

impl MemoryDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending reminders ordered by fire time.
    pub fn pending(&self) -> Vec<ScheduledReminder> {
        let mut all: Vec<_> = lock(&self.pending).values().cloned().collect();
        all.sort_by_key(|r| r.fire_at);
        all
    }
}

impl ReminderDelivery for MemoryDelivery {
    fn schedule(&self, reminder: &ScheduledReminder) -> Result<(), SchedulingError> {
        lock(&self.pending).insert(reminder.id.clone(), reminder.clone());
        Ok(())
    }

    fn cancel(&self, id: &str) -> Result<(), SchedulingError> {
        lock(&self.pending).remove(id);
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), SchedulingError> {
        lock(&self.pending).clear();
        Ok(())
    }
}

/// Armed timer tasks by reminder id. The generation tells a task whether its
/// entry has since been replaced under the same id.
type PendingTasks = Arc<Mutex<BTreeMap<String, ArmedTask>>>;

struct ArmedTask {
    reminder: ScheduledReminder,
    generation: u64,
    task: JoinHandle<()>,
}

/// Remove `id` only if it is still the entry armed as `generation`.
fn take_if_current(
    pending: &Mutex<BTreeMap<String, ArmedTask>>,
    id: &str,
    generation: u64,
) -> bool {
    let mut tasks = lock(pending);
    match tasks.get(id) {
        Some(armed) if armed.generation == generation => {
            tasks.remove(id);
            true
        }
        _ => false,
    }
}

/// Delivers reminders while the host process runs.
///
/// Each reminder gets a tokio timer task that sends it on the channel at its
/// fire time. Must be used from within a tokio runtime.
pub struct TaskDelivery {
    tx: mpsc::UnboundedSender<ScheduledReminder>,
    pending: PendingTasks,
    generations: AtomicU64,
}

impl TaskDelivery {
    /// Create a delivery and the receiver fired reminders arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScheduledReminder>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let delivery = Self {
            tx,
            pending: Arc::new(Mutex::new(BTreeMap::new())),
            generations: AtomicU64::new(0),
        };
        (delivery, rx)
    }

    pub fn pending(&self) -> Vec<ScheduledReminder> {
        let mut all: Vec<_> = lock(&self.pending)
            .values()
            .map(|armed| armed.reminder.clone())
            .collect();
        all.sort_by_key(|r| r.fire_at);
        all
    }
}

impl ReminderDelivery for TaskDelivery {
    fn schedule(&self, reminder: &ScheduledReminder) -> Result<(), SchedulingError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| SchedulingError::DeliveryUnavailable(e.to_string()))?;
        if self.tx.is_closed() {
            return Err(SchedulingError::DeliveryUnavailable(
                "reminder receiver dropped".into(),
            ));
        }

        let delay = (reminder.fire_at - Utc::now())
            .to_std()
            .unwrap_or_default();
        let tx = self.tx.clone();
        let pending = Arc::clone(&self.pending);
        let fired = reminder.clone();
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);

        let mut tasks = lock(&self.pending);
        let task = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            // Replaced or cancelled after the sleep finished but before abort landed.
            if !take_if_current(&pending, &fired.id, generation) {
                return;
            }
            info!(id = %fired.id, "reminder fired");
            let _ = tx.send(fired);
        });
        let armed = ArmedTask {
            reminder: reminder.clone(),
            generation,
            task,
        };
        if let Some(previous) = tasks.insert(reminder.id.clone(), armed) {
            previous.task.abort();
        }
        debug!(id = %reminder.id, delay_secs = delay.as_secs(), "reminder armed");
        Ok(())
    }

    fn cancel(&self, id: &str) -> Result<(), SchedulingError> {
        if let Some(armed) = lock(&self.pending).remove(id) {
            armed.task.abort();
        }
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), SchedulingError> {
        let drained = std::mem::take(&mut *lock(&self.pending));
        for armed in drained.into_values() {
            armed.task.abort();
        }
        Ok(())
    }
}

impl Drop for TaskDelivery {
    fn drop(&mut self) {
        for armed in lock(&self.pending).values() {
            armed.task.abort();
        }
    }
}
