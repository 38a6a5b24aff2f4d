pub mod file;
pub mod record;

pub use file::{
    BufferPool, FileError, FileResult, PAGE_SIZE, PageFile, PageHandle, PageId,
    ReplacementStrategy,
};
pub use record::{
    Attribute, CompareOp, DataType, Expr, Record, RecordError, RecordId, RecordResult, SLOT_SIZE,
    Schema, SlotId, Table, TableScan, Value,
};
