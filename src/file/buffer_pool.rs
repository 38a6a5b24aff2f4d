use std::path::Path;

use log::{debug, warn};

use super::error::{FileError, FileResult};
use super::page_file::PageFile;
use super::{PAGE_SIZE, PageId};

/// Page replacement policy.
///
/// Both policies rank eviction candidates by a per-frame stamp: FIFO
/// stamps a frame once when its page is loaded, LRU refreshes the stamp
/// on every pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementStrategy {
    Fifo,
    Lru,
}

/// Stamps are rebased once the tick counter passes this threshold so
/// they stay small under long runs.
const TICK_REBASE_THRESHOLD: u32 = 32_000;

struct Frame {
    data: Vec<u8>,
    page: Option<PageId>,
    dirty: bool,
    fix_count: u32,
    stamp: u32,
}

impl Frame {
    fn empty() -> Self {
        Self {
            data: vec![0u8; PAGE_SIZE],
            page: None,
            dirty: false,
            fix_count: 0,
            stamp: 0,
        }
    }
}

/// View of a pinned page: the page number plus the index of the frame
/// it was resident in at pin time. The bytes are reached through
/// [`BufferPool::page`] / [`BufferPool::page_mut`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle {
    page_num: PageId,
    frame: usize,
}

impl PageHandle {
    pub fn page_num(&self) -> PageId {
        self.page_num
    }
}

/// Caches pages of one page file in a fixed set of frames.
///
/// The pool owns its file exclusively: higher layers reach the file's
/// bytes only through pinned pages, and the few file-level operations
/// they need (`total_pages`, `append_empty_page`) are forwarded here.
pub struct BufferPool {
    file: PageFile,
    frames: Vec<Frame>,
    strategy: ReplacementStrategy,
    tick: u32,
    read_io: usize,
    write_io: usize,
}

impl BufferPool {
    /// Open a pool of `capacity` frames over an existing page file.
    pub fn new<P: AsRef<Path>>(
        path: P,
        capacity: usize,
        strategy: ReplacementStrategy,
    ) -> FileResult<Self> {
        let file = PageFile::open(path)?;
        let frames = (0..capacity).map(|_| Frame::empty()).collect();
        Ok(Self {
            file,
            frames,
            strategy,
            tick: 0,
            read_io: 0,
            write_io: 0,
        })
    }

    /// Pin `page_num` into a frame, reading it from disk if it is not
    /// already resident, and return a handle to it.
    ///
    /// Fails with [`FileError::NoFreeFrame`] when the page is not
    /// resident and every frame is pinned. A write-back failure while
    /// evicting a dirty victim surfaces here and leaves the victim
    /// frame unchanged.
    pub fn pin_page(&mut self, page_num: PageId) -> FileResult<PageHandle> {
        if let Some(idx) = self.resident_frame(page_num) {
            self.frames[idx].fix_count += 1;
            if self.strategy == ReplacementStrategy::Lru {
                self.frames[idx].stamp = self.next_tick();
            }
            return Ok(PageHandle {
                page_num,
                frame: idx,
            });
        }

        let idx = match self.frames.iter().position(|f| f.page.is_none()) {
            Some(idx) => idx,
            None => self.evict_victim()?,
        };

        if let Err(e) = self.file.read_page(page_num, &mut self.frames[idx].data) {
            // The read may have clobbered the (empty) frame buffer
            self.frames[idx] = Frame::empty();
            return Err(e);
        }
        self.read_io += 1;

        let stamp = self.next_tick();
        let frame = &mut self.frames[idx];
        frame.page = Some(page_num);
        frame.dirty = false;
        frame.fix_count = 1;
        frame.stamp = stamp;

        Ok(PageHandle {
            page_num,
            frame: idx,
        })
    }

    /// Drop one pin from the frame holding the handle's page.
    ///
    /// Unpinning a page that is not resident, or whose fix count is
    /// already zero, is tolerated as a no-op (and logged); the fix
    /// count never underflows.
    pub fn unpin_page(&mut self, handle: &PageHandle) {
        match self.frame_index(handle) {
            Ok(idx) => {
                let frame = &mut self.frames[idx];
                if frame.fix_count == 0 {
                    warn!(
                        "unpin of page {} whose fix count is already zero",
                        handle.page_num
                    );
                } else {
                    frame.fix_count -= 1;
                }
            }
            Err(_) => warn!("unpin of non-resident page {}", handle.page_num),
        }
    }

    /// Mark the frame holding the handle's page as modified.
    pub fn mark_dirty(&mut self, handle: &PageHandle) -> FileResult<()> {
        let idx = self.frame_index(handle)?;
        self.frames[idx].dirty = true;
        Ok(())
    }

    /// Write the frame holding the handle's page to disk and clear its
    /// dirty flag. The fix count is untouched.
    pub fn force_page(&mut self, handle: &PageHandle) -> FileResult<()> {
        let idx = self.frame_index(handle)?;
        self.write_frame(idx, handle.page_num)
    }

    /// Write every dirty frame with a fix count of zero back to disk.
    /// The first failing frame ends the flush with its error.
    pub fn force_flush(&mut self) -> FileResult<()> {
        for idx in 0..self.frames.len() {
            if self.frames[idx].fix_count == 0 && self.frames[idx].dirty {
                if let Some(page_num) = self.frames[idx].page {
                    self.write_frame(idx, page_num)?;
                }
            }
        }
        Ok(())
    }

    /// Flush all dirty frames and empty the pool. Fails without
    /// touching any frame if a page is still pinned; the pool stays
    /// usable after a failed shutdown.
    pub fn shutdown(&mut self) -> FileResult<()> {
        let pinned = self.frames.iter().filter(|f| f.fix_count > 0).count();
        if pinned > 0 {
            return Err(FileError::ShutdownFailed(pinned));
        }
        self.force_flush()?;
        for frame in &mut self.frames {
            *frame = Frame::empty();
        }
        Ok(())
    }

    /// Bytes of a pinned page.
    pub fn page(&self, handle: &PageHandle) -> FileResult<&[u8]> {
        let idx = self.frame_index(handle)?;
        Ok(&self.frames[idx].data)
    }

    /// Mutable bytes of a pinned page. Callers that modify the page
    /// must still [`mark_dirty`](Self::mark_dirty) it.
    pub fn page_mut(&mut self, handle: &PageHandle) -> FileResult<&mut [u8]> {
        let idx = self.frame_index(handle)?;
        Ok(&mut self.frames[idx].data)
    }

    /// Pin `page_num`, expose its bytes to `f`, and unpin on all paths.
    pub fn with_page<R>(&mut self, page_num: PageId, f: impl FnOnce(&[u8]) -> R) -> FileResult<R> {
        let handle = self.pin_page(page_num)?;
        let result = self.page(&handle).map(f);
        self.unpin_page(&handle);
        result
    }

    /// Pin `page_num`, let `f` modify its bytes, mark the page dirty,
    /// and unpin on all paths.
    pub fn update_page<R>(
        &mut self,
        page_num: PageId,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> FileResult<R> {
        let handle = self.pin_page(page_num)?;
        let result = match self.page_mut(&handle) {
            Ok(data) => {
                let value = f(data);
                self.mark_dirty(&handle).map(|()| value)
            }
            Err(e) => Err(e),
        };
        self.unpin_page(&handle);
        result
    }

    /// Number of pages in the underlying file.
    pub fn total_pages(&self) -> usize {
        self.file.total_pages()
    }

    /// Append one zero page to the underlying file. The new page is not
    /// brought into a frame; pin it to access it.
    pub fn append_empty_page(&mut self) -> FileResult<PageId> {
        self.file.append_empty_page()
    }

    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    pub fn strategy(&self) -> ReplacementStrategy {
        self.strategy
    }

    /// Disk reads performed on behalf of `pin_page`.
    pub fn num_read_io(&self) -> usize {
        self.read_io
    }

    /// Disk writes performed by write-back, `force_page` and
    /// `force_flush`.
    pub fn num_write_io(&self) -> usize {
        self.write_io
    }

    /// Resident page number per frame, `None` for empty frames.
    pub fn frame_contents(&self) -> Vec<Option<PageId>> {
        self.frames.iter().map(|f| f.page).collect()
    }

    pub fn dirty_flags(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.dirty).collect()
    }

    pub fn fix_counts(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.fix_count).collect()
    }

    fn resident_frame(&self, page_num: PageId) -> Option<usize> {
        self.frames.iter().position(|f| f.page == Some(page_num))
    }

    /// Resolve a handle to its frame. The frame recorded in the handle
    /// is authoritative while the pin is held; a scan covers handles
    /// kept across an unpin.
    fn frame_index(&self, handle: &PageHandle) -> FileResult<usize> {
        if self
            .frames
            .get(handle.frame)
            .is_some_and(|f| f.page == Some(handle.page_num))
        {
            return Ok(handle.frame);
        }
        self.resident_frame(handle.page_num)
            .ok_or(FileError::PageNotFound(handle.page_num))
    }

    fn next_tick(&mut self) -> u32 {
        let tick = self.tick;
        self.tick += 1;
        tick
    }

    /// Choose the unpinned frame with the smallest stamp (ties broken
    /// by frame index), write it back if dirty, and vacate it.
    fn evict_victim(&mut self) -> FileResult<usize> {
        let idx = self
            .frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.fix_count == 0)
            .min_by_key(|(_, f)| f.stamp)
            .map(|(i, _)| i)
            .ok_or(FileError::NoFreeFrame)?;

        if let Some(page_num) = self.frames[idx].page {
            if self.frames[idx].dirty {
                debug!("evicting dirty page {page_num} from frame {idx}");
                self.write_frame(idx, page_num)?;
            }
        }

        let frame = &mut self.frames[idx];
        frame.page = None;
        frame.dirty = false;
        frame.stamp = 0;

        self.rebase_stamps();
        Ok(idx)
    }

    /// Keep stamps bounded: subtract the smallest stamp among occupied
    /// frames from every occupied frame and from the tick counter.
    fn rebase_stamps(&mut self) {
        if self.tick <= TICK_REBASE_THRESHOLD {
            return;
        }
        let min = self
            .frames
            .iter()
            .filter(|f| f.page.is_some())
            .map(|f| f.stamp)
            .min()
            .unwrap_or(self.tick);
        for frame in self.frames.iter_mut().filter(|f| f.page.is_some()) {
            frame.stamp -= min;
        }
        self.tick -= min;
    }

    fn write_frame(&mut self, idx: usize, page_num: PageId) -> FileResult<()> {
        self.file.write_page(page_num, &self.frames[idx].data)?;
        self.write_io += 1;
        self.frames[idx].dirty = false;
        Ok(())
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        // Best-effort flush of whatever is still dirty and unpinned
        let _ = self.force_flush();
    }
}
