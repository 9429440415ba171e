use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rowport_store::{GridStore, RawGrid, StoreError, UpdateInstruction, WorksheetRef};

/// Fails the first `failures` calls with [`StoreError::RateLimited`], then
/// delegates to the wrapped store.
pub struct FlakyStore<S> {
    inner: S,
    remaining: AtomicU32,
    retry_after: Option<Duration>,
    permanent: Mutex<Option<String>>,
    attempts: AtomicU32,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S, failures: u32) -> Self {
        Self {
            inner,
            remaining: AtomicU32::new(failures),
            retry_after: None,
            permanent: Mutex::new(None),
            attempts: AtomicU32::new(0),
        }
    }

    /// Attach a server-provided wait to each injected rate-limit error.
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Fail every call with a non-transient backend error carrying `message`.
    pub fn fail_permanently(&self, message: impl Into<String>) {
        *self.permanent.lock() = Some(message.into());
    }

    /// Calls seen so far, failed ones included.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn gate(&self) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.permanent.lock().clone() {
            return Err(StoreError::from_backend("flaky", message));
        }
        let tripped = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if tripped {
            Err(StoreError::RateLimited {
                retry_after: self.retry_after,
            })
        } else {
            Ok(())
        }
    }
}

impl<S: GridStore> GridStore for FlakyStore<S> {
    fn list_worksheets(&self) -> Result<Vec<WorksheetRef>, StoreError> {
        self.gate()?;
        self.inner.list_worksheets()
    }

    fn worksheet_by_name(&self, name: &str) -> Result<WorksheetRef, StoreError> {
        self.gate()?;
        self.inner.worksheet_by_name(name)
    }

    fn read_cells(&self, worksheet: &WorksheetRef, span: &str) -> Result<RawGrid, StoreError> {
        self.gate()?;
        self.inner.read_cells(worksheet, span)
    }

    fn batch_write(
        &self,
        worksheet: &WorksheetRef,
        updates: &[UpdateInstruction],
    ) -> Result<(), StoreError> {
        self.gate()?;
        self.inner.batch_write(worksheet, updates)
    }

    fn clear(&self, worksheet: &WorksheetRef) -> Result<(), StoreError> {
        self.gate()?;
        self.inner.clear(worksheet)
    }
}
