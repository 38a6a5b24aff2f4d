use crate::file::FileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("No record at page {page}, slot {slot}")]
    RecordNotExist { page: usize, slot: usize },

    #[error("Slot {slot} out of range (data pages have {slots_per_page} slots)")]
    InvalidSlot { slot: usize, slots_per_page: usize },

    #[error("No attribute {0} in schema")]
    InvalidAttribute(usize),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("String of {len} bytes does not fit in STRING[{max}]")]
    StringTooLong { len: usize, max: usize },

    #[error("Record of {size} bytes does not fit in a {slot_size} byte slot")]
    RecordTooLarge { size: usize, slot_size: usize },

    #[error("Record is {actual} bytes, schema requires {expected}")]
    RecordSizeMismatch { expected: usize, actual: usize },

    #[error("Table file is corrupt: {0}")]
    Corrupt(String),
}

pub type RecordResult<T> = Result<T, RecordError>;
