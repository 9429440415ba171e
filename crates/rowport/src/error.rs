use std::error::Error;

use rowport_common::AddressError;
use rowport_schema::ValidationError;
use rowport_store::StoreError;
use thiserror::Error;

/// Boxed failure raised by a caller-supplied transform or combine step.
pub type CallbackError = Box<dyn Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum RangeError {
    /// The store returned no rows at all, not even a header.
    #[error("range `{span}` returned no rows")]
    EmptyRange { span: String },

    #[error("row {row}, field `{field}`: {reason}")]
    FieldValidation {
        field: String,
        row: u32,
        reason: String,
    },

    #[error("row {row}: record conversion failed: {source}")]
    Record {
        row: u32,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot address row: {0}")]
    Address(#[from] AddressError),

    #[error("spreadsheet has no worksheets")]
    NoWorksheets,

    #[error("callback failed: {0}")]
    Callback(CallbackError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schema(#[from] ValidationError),
}

impl RangeError {
    pub(crate) fn field(field: &str, row: u32, reason: impl Into<String>) -> Self {
        RangeError::FieldValidation {
            field: field.to_string(),
            row,
            reason: reason.into(),
        }
    }

    pub(crate) fn callback(err: impl Into<CallbackError>) -> Self {
        RangeError::Callback(err.into())
    }

    /// Wrapped store failure, if this error came from the grid store.
    pub fn as_store(&self) -> Option<&StoreError> {
        match self {
            RangeError::Store(err) => Some(err),
            _ => None,
        }
    }
}
