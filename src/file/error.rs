use std::io;
use thiserror::Error;

use super::PageId;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("File creation failed: {0}")]
    CreateFailed(String),

    #[error("Page {page} does not exist (file has {total} pages)")]
    NonExistingPage { page: i64, total: usize },

    #[error("Write failed at page {0}")]
    WriteFailed(PageId),

    #[error("Invalid page buffer size: expected {expected}, got {actual}")]
    InvalidPageSize { expected: usize, actual: usize },

    #[error("Page {0} is not resident in the buffer pool")]
    PageNotFound(PageId),

    #[error("All frames are pinned")]
    NoFreeFrame,

    #[error("{0} frames still pinned at shutdown")]
    ShutdownFailed(usize),
}

pub type FileResult<T> = Result<T, FileError>;
