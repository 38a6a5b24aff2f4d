use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::error::{FileError, FileResult};
use super::{PAGE_SIZE, PageId};

/// Handle to an open page file.
///
/// A page file is an ordered sequence of `PAGE_SIZE` blocks in a single
/// backing file. The handle tracks the page count and a current page
/// position used by the relative read methods.
pub struct PageFile {
    path: PathBuf,
    file: fs::File,
    total_pages: usize,
    current_position: usize,
}

impl PageFile {
    /// Create a page file containing a single zero-filled page, leaving
    /// it closed. An existing file at the same path is truncated.
    pub fn create<P: AsRef<Path>>(path: P) -> FileResult<()> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|_| FileError::CreateFailed(path.display().to_string()))?;

        if file.write_all(&[0u8; PAGE_SIZE]).is_err() {
            // Don't leave a partial file behind
            drop(file);
            let _ = fs::remove_file(path);
            return Err(FileError::CreateFailed(path.display().to_string()));
        }
        Ok(())
    }

    /// Open an existing page file. The current position starts at page 0.
    pub fn open<P: AsRef<Path>>(path: P) -> FileResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|_| FileError::FileNotFound(path.display().to_string()))?;
        let bytes = file.metadata()?.len() as usize;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            total_pages: bytes.div_ceil(PAGE_SIZE),
            current_position: 0,
        })
    }

    /// Close the handle. The page file does no caching of its own, so
    /// there is nothing to flush here.
    pub fn close(self) {}

    /// Remove the backing file.
    pub fn destroy<P: AsRef<Path>>(path: P) -> FileResult<()> {
        let path = path.as_ref();
        fs::remove_file(path).map_err(|_| FileError::FileNotFound(path.display().to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn current_position(&self) -> usize {
        self.current_position
    }

    /// Read page `page_num` into `buf` and move the current position to
    /// it. `buf` must be exactly `PAGE_SIZE` bytes.
    pub fn read_page(&mut self, page_num: PageId, buf: &mut [u8]) -> FileResult<()> {
        check_buffer(buf.len())?;
        if page_num >= self.total_pages {
            return Err(FileError::NonExistingPage {
                page: page_num as i64,
                total: self.total_pages,
            });
        }

        self.file
            .seek(SeekFrom::Start((page_num * PAGE_SIZE) as u64))?;
        // The final page of a file written by another tool may be short;
        // pad with zeros.
        let mut filled = 0;
        while filled < PAGE_SIZE {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf[filled..].fill(0);

        self.current_position = page_num;
        Ok(())
    }

    pub fn read_first(&mut self, buf: &mut [u8]) -> FileResult<()> {
        self.read_page(0, buf)
    }

    pub fn read_last(&mut self, buf: &mut [u8]) -> FileResult<()> {
        let last = self
            .total_pages
            .checked_sub(1)
            .ok_or(FileError::NonExistingPage { page: -1, total: 0 })?;
        self.read_page(last, buf)
    }

    pub fn read_current(&mut self, buf: &mut [u8]) -> FileResult<()> {
        self.read_page(self.current_position, buf)
    }

    pub fn read_next(&mut self, buf: &mut [u8]) -> FileResult<()> {
        self.read_page(self.current_position + 1, buf)
    }

    pub fn read_previous(&mut self, buf: &mut [u8]) -> FileResult<()> {
        if self.current_position == 0 {
            return Err(FileError::NonExistingPage {
                page: -1,
                total: self.total_pages,
            });
        }
        self.read_page(self.current_position - 1, buf)
    }

    /// Write `buf` at page `page_num`, growing the file first if it has
    /// fewer than `page_num + 1` pages. Moves the current position.
    pub fn write_page(&mut self, page_num: PageId, buf: &[u8]) -> FileResult<()> {
        check_buffer(buf.len())?;
        self.ensure_capacity(page_num + 1)?;

        self.file
            .seek(SeekFrom::Start((page_num * PAGE_SIZE) as u64))?;
        self.file
            .write_all(buf)
            .map_err(|_| FileError::WriteFailed(page_num))?;

        self.current_position = page_num;
        Ok(())
    }

    /// Write `buf` at the current position, which must name an existing
    /// page; this method never extends the file.
    pub fn write_current(&mut self, buf: &[u8]) -> FileResult<()> {
        check_buffer(buf.len())?;
        let page_num = self.current_position;
        if page_num >= self.total_pages {
            return Err(FileError::WriteFailed(page_num));
        }

        self.file
            .seek(SeekFrom::Start((page_num * PAGE_SIZE) as u64))?;
        self.file
            .write_all(buf)
            .map_err(|_| FileError::WriteFailed(page_num))?;
        Ok(())
    }

    /// Append one zero-filled page and return its page number.
    pub fn append_empty_page(&mut self) -> FileResult<PageId> {
        let page_num = self.total_pages;
        self.file
            .seek(SeekFrom::Start((page_num * PAGE_SIZE) as u64))?;
        self.file
            .write_all(&[0u8; PAGE_SIZE])
            .map_err(|_| FileError::WriteFailed(page_num))?;
        self.total_pages += 1;
        Ok(page_num)
    }

    /// Grow the file to at least `num_pages` pages, appending the
    /// missing zero pages in one contiguous write. No-op if the file is
    /// already large enough.
    pub fn ensure_capacity(&mut self, num_pages: usize) -> FileResult<()> {
        if self.total_pages >= num_pages {
            return Ok(());
        }

        let missing = num_pages - self.total_pages;
        let zeros = vec![0u8; missing * PAGE_SIZE];
        self.file
            .seek(SeekFrom::Start((self.total_pages * PAGE_SIZE) as u64))?;
        self.file
            .write_all(&zeros)
            .map_err(|_| FileError::WriteFailed(num_pages - 1))?;

        self.total_pages = num_pages;
        Ok(())
    }
}

fn check_buffer(len: usize) -> FileResult<()> {
    if len != PAGE_SIZE {
        return Err(FileError::InvalidPageSize {
            expected: PAGE_SIZE,
            actual: len,
        });
    }
    Ok(())
}
