use parking_lot::Mutex;
use rowport_store::{GridStore, RawGrid, StoreError, UpdateInstruction, WorksheetRef};

/// One call observed by a [`RecordingStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreCall {
    ListWorksheets,
    WorksheetByName(String),
    ReadCells { worksheet: String, span: String },
    BatchWrite { worksheet: String, updates: Vec<UpdateInstruction> },
    Clear(String),
}

/// Wraps a store and records every call made through it, in order.
pub struct RecordingStore<S> {
    inner: S,
    calls: Mutex<Vec<StoreCall>>,
}

impl<S> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn reset(&self) {
        self.calls.lock().clear();
    }

    pub fn read_count(&self) -> usize {
        self.count(|c| matches!(c, StoreCall::ReadCells { .. }))
    }

    pub fn write_count(&self) -> usize {
        self.count(|c| matches!(c, StoreCall::BatchWrite { .. }))
    }

    /// Updates of every recorded batch write, in call order.
    pub fn writes(&self) -> Vec<Vec<UpdateInstruction>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                StoreCall::BatchWrite { updates, .. } => Some(updates.clone()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&StoreCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().push(call);
    }
}

impl<S: GridStore> GridStore for RecordingStore<S> {
    fn list_worksheets(&self) -> Result<Vec<WorksheetRef>, StoreError> {
        self.record(StoreCall::ListWorksheets);
        self.inner.list_worksheets()
    }

    fn worksheet_by_name(&self, name: &str) -> Result<WorksheetRef, StoreError> {
        self.record(StoreCall::WorksheetByName(name.to_string()));
        self.inner.worksheet_by_name(name)
    }

    fn read_cells(&self, worksheet: &WorksheetRef, span: &str) -> Result<RawGrid, StoreError> {
        self.record(StoreCall::ReadCells {
            worksheet: worksheet.title.clone(),
            span: span.to_string(),
        });
        self.inner.read_cells(worksheet, span)
    }

    fn batch_write(
        &self,
        worksheet: &WorksheetRef,
        updates: &[UpdateInstruction],
    ) -> Result<(), StoreError> {
        self.record(StoreCall::BatchWrite {
            worksheet: worksheet.title.clone(),
            updates: updates.to_vec(),
        });
        self.inner.batch_write(worksheet, updates)
    }

    fn clear(&self, worksheet: &WorksheetRef) -> Result<(), StoreError> {
        self.record(StoreCall::Clear(worksheet.title.clone()));
        self.inner.clear(worksheet)
    }
}
