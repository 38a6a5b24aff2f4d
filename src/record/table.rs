use std::path::Path;

use log::debug;

use super::error::{RecordError, RecordResult};
use super::expr::Expr;
use super::record::{Record, RecordId, SlotId};
use super::schema::Schema;
use crate::file::{BufferPool, PAGE_SIZE, PageFile, PageId, ReplacementStrategy};

/// Slot size in bytes: one live-flag byte plus the packed record.
pub const SLOT_SIZE: usize = 256;

/// Frames in a table's dedicated buffer pool.
const POOL_CAPACITY: usize = 10;

/// Fixed header at the start of page 0: four little-endian i32 fields.
const HEADER_LEN: usize = 16;

/// Byte width of one `(data_page, used_count)` metadata entry.
const ENTRY_SIZE: usize = 2 * 4;

/// Entries per page-metadata page, counting the final entry whose page
/// field is the forward pointer to the next metadata page.
const ENTRIES_PER_META_PAGE: usize = PAGE_SIZE / ENTRY_SIZE;

/// Index of the forward-pointer entry.
const LINK_ENTRY: usize = ENTRIES_PER_META_PAGE - 1;

/// Marks an unused entry slot and the end of the metadata chain.
const NO_ENTRY: i32 = -1;

/// Page 0 header fields.
#[derive(Debug, Clone, Copy)]
struct TableHeader {
    meta_size: usize,
    slots_per_page: usize,
    slot_size: usize,
    num_tuples: usize,
}

impl TableHeader {
    fn read(data: &[u8]) -> RecordResult<Self> {
        let field = |idx: usize| {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&data[idx * 4..idx * 4 + 4]);
            i32::from_le_bytes(bytes)
        };
        let meta_size = field(0);
        let slots_per_page = field(1);
        let slot_size = field(2);
        let num_tuples = field(3);

        if meta_size < 1 || slots_per_page < 1 || slot_size < 1 || num_tuples < 0 {
            return Err(RecordError::Corrupt(format!(
                "implausible table header: meta_size={meta_size}, slots_per_page={slots_per_page}, \
                 slot_size={slot_size}, num_tuples={num_tuples}"
            )));
        }
        Ok(Self {
            meta_size: meta_size as usize,
            slots_per_page: slots_per_page as usize,
            slot_size: slot_size as usize,
            num_tuples: num_tuples as usize,
        })
    }

    fn write(&self, data: &mut [u8]) {
        data[0..4].copy_from_slice(&(self.meta_size as i32).to_le_bytes());
        data[4..8].copy_from_slice(&(self.slots_per_page as i32).to_le_bytes());
        data[8..12].copy_from_slice(&(self.slot_size as i32).to_le_bytes());
        data[12..16].copy_from_slice(&(self.num_tuples as i32).to_le_bytes());
    }
}

fn read_entry(data: &[u8], idx: usize) -> (i32, i32) {
    let at = idx * ENTRY_SIZE;
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[at..at + 4]);
    let page = i32::from_le_bytes(bytes);
    bytes.copy_from_slice(&data[at + 4..at + 8]);
    let used = i32::from_le_bytes(bytes);
    (page, used)
}

fn write_entry(data: &mut [u8], idx: usize, page: i32, used: i32) {
    let at = idx * ENTRY_SIZE;
    data[at..at + 4].copy_from_slice(&page.to_le_bytes());
    data[at + 4..at + 8].copy_from_slice(&used.to_le_bytes());
}

fn next_meta_page(data: &[u8]) -> i32 {
    read_entry(data, LINK_ENTRY).0
}

/// Reset a fresh metadata page: every entry unused, no successor.
fn init_meta_page(data: &mut [u8]) {
    for idx in 0..ENTRIES_PER_META_PAGE {
        write_entry(data, idx, NO_ENTRY, NO_ENTRY);
    }
}

/// An open table.
///
/// The backing page file is reached exclusively through a dedicated
/// buffer pool; the table additionally holds the parsed schema and the
/// immutable layout fields from the header page.
pub struct Table {
    pool: BufferPool,
    schema: Schema,
    meta_size: usize,
    slots_per_page: usize,
    slot_size: usize,
}

impl Table {
    /// Create the page file for a new table: the header and schema text
    /// on the first `meta_size` pages, followed by one empty
    /// page-metadata page.
    pub fn create<P: AsRef<Path>>(path: P, schema: &Schema) -> RecordResult<()> {
        let record_size = schema.record_size();
        if record_size + 1 > SLOT_SIZE {
            return Err(RecordError::RecordTooLarge {
                size: record_size,
                slot_size: SLOT_SIZE,
            });
        }

        let text = schema.serialize();
        let text = text.as_bytes();
        let meta_size = (HEADER_LEN + text.len()).div_ceil(PAGE_SIZE);

        PageFile::create(&path)?;
        let mut file = PageFile::open(&path)?;

        let header = TableHeader {
            meta_size,
            slots_per_page: PAGE_SIZE / SLOT_SIZE,
            slot_size: SLOT_SIZE,
            num_tuples: 0,
        };

        let mut page = vec![0u8; PAGE_SIZE];
        header.write(&mut page);
        let first = text.len().min(PAGE_SIZE - HEADER_LEN);
        page[HEADER_LEN..HEADER_LEN + first].copy_from_slice(&text[..first]);
        file.write_page(0, &page)?;

        // Schema text spilling past page 0
        let mut written = first;
        let mut page_num = 1;
        while written < text.len() {
            page.fill(0);
            let chunk = (text.len() - written).min(PAGE_SIZE);
            page[..chunk].copy_from_slice(&text[written..written + chunk]);
            file.write_page(page_num, &page)?;
            written += chunk;
            page_num += 1;
        }

        // The first page-metadata page sits directly after the header pages
        init_meta_page(&mut page);
        file.write_page(meta_size, &page)?;
        file.close();

        debug!(
            "created table file {} ({meta_size} header pages)",
            path.as_ref().display()
        );
        Ok(())
    }

    /// Open an existing table, reconstructing the schema from its
    /// header pages.
    pub fn open<P: AsRef<Path>>(path: P) -> RecordResult<Self> {
        let mut pool = BufferPool::new(&path, POOL_CAPACITY, ReplacementStrategy::Lru)?;

        let (header, mut text) = pool.with_page(0, |data| {
            (TableHeader::read(data), data[HEADER_LEN..].to_vec())
        })?;
        let header = header?;
        for page_num in 1..header.meta_size {
            pool.with_page(page_num, |data| text.extend_from_slice(data))?;
        }

        let end = text.iter().position(|&b| b == 0).unwrap_or(text.len());
        text.truncate(end);
        let text = String::from_utf8(text)
            .map_err(|e| RecordError::InvalidSchema(format!("schema text is not UTF-8: {e}")))?;
        let schema = Schema::parse(&text)?;

        if header.slots_per_page * header.slot_size > PAGE_SIZE {
            return Err(RecordError::Corrupt(format!(
                "{} slots of {} bytes exceed the page size",
                header.slots_per_page, header.slot_size
            )));
        }
        if schema.record_size() + 1 > header.slot_size {
            return Err(RecordError::Corrupt(format!(
                "schema needs {} byte records but slots hold {}",
                schema.record_size(),
                header.slot_size - 1
            )));
        }

        Ok(Self {
            pool,
            schema,
            meta_size: header.meta_size,
            slots_per_page: header.slots_per_page,
            slot_size: header.slot_size,
        })
    }

    /// Flush and shut down the table's buffer pool.
    pub fn close(mut self) -> RecordResult<()> {
        self.pool.shutdown()?;
        Ok(())
    }

    /// Remove the table's backing file.
    pub fn destroy<P: AsRef<Path>>(path: P) -> RecordResult<()> {
        PageFile::destroy(path)?;
        Ok(())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Live record count, read from the header page.
    pub fn num_tuples(&mut self) -> RecordResult<usize> {
        Ok(self.read_header()?.num_tuples)
    }

    /// Insert `record` and return its new address.
    ///
    /// The page-metadata chain is walked for the first data page with a
    /// free slot; new data pages (and, when a chain page's entry array
    /// is exhausted, new metadata pages) are appended as needed.
    pub fn insert(&mut self, record: &Record) -> RecordResult<RecordId> {
        self.check_record(record)?;

        let (meta_page, entry_idx, data_page, used) = self.find_insert_target()?;
        let slot = self.claim_free_slot(data_page, record)?;

        self.pool.update_page(meta_page, |data| {
            write_entry(data, entry_idx, data_page as i32, used as i32 + 1);
        })?;
        self.update_header(|header| header.num_tuples += 1)?;

        Ok(RecordId::new(data_page, slot))
    }

    /// Remove the record at `rid`: clear its slot, drop the owning
    /// page's used count, and decrement the tuple counter.
    pub fn delete(&mut self, rid: RecordId) -> RecordResult<()> {
        self.check_rid(rid)?;
        let slot_size = self.slot_size;

        let live = self.pool.update_page(rid.page, |data| {
            let at = rid.slot * slot_size;
            if data[at] == 0 {
                return false;
            }
            data[at..at + slot_size].fill(0);
            true
        })?;
        if !live {
            return Err(RecordError::RecordNotExist {
                page: rid.page,
                slot: rid.slot,
            });
        }

        self.decrement_used(rid.page)?;
        self.update_header(|header| header.num_tuples = header.num_tuples.saturating_sub(1))?;
        Ok(())
    }

    /// Overwrite the record at `rid` in place.
    pub fn update(&mut self, rid: RecordId, record: &Record) -> RecordResult<()> {
        self.check_record(record)?;
        self.check_rid(rid)?;
        let slot_size = self.slot_size;
        let record_size = self.schema.record_size();

        let live = self.pool.update_page(rid.page, |data| {
            let at = rid.slot * slot_size;
            if data[at] == 0 {
                return false;
            }
            data[at + 1..at + 1 + record_size].copy_from_slice(record.data());
            true
        })?;
        if !live {
            return Err(RecordError::RecordNotExist {
                page: rid.page,
                slot: rid.slot,
            });
        }
        Ok(())
    }

    /// Fetch the record at `rid`.
    pub fn get(&mut self, rid: RecordId) -> RecordResult<Record> {
        self.check_rid(rid)?;
        let slot_size = self.slot_size;
        let record_size = self.schema.record_size();

        let data = self.pool.with_page(rid.page, |data| {
            let at = rid.slot * slot_size;
            if data[at] == 0 {
                None
            } else {
                Some(data[at + 1..at + 1 + record_size].to_vec())
            }
        })?;

        data.map(Record::from_bytes)
            .ok_or(RecordError::RecordNotExist {
                page: rid.page,
                slot: rid.slot,
            })
    }

    /// Begin a sequential scan yielding the records matching `expr`.
    pub fn scan(&mut self, expr: Expr) -> TableScan<'_> {
        let meta_page = self.meta_size;
        TableScan {
            table: self,
            expr,
            meta_page: Some(meta_page),
            entry: 0,
            slot: 0,
        }
    }

    fn read_header(&mut self) -> RecordResult<TableHeader> {
        self.pool.with_page(0, TableHeader::read)?
    }

    fn update_header(&mut self, f: impl FnOnce(&mut TableHeader)) -> RecordResult<()> {
        self.pool.update_page(0, |data| -> RecordResult<()> {
            let mut header = TableHeader::read(data)?;
            f(&mut header);
            header.write(data);
            Ok(())
        })?
    }

    fn check_record(&self, record: &Record) -> RecordResult<()> {
        let expected = self.schema.record_size();
        if record.data().len() != expected {
            return Err(RecordError::RecordSizeMismatch {
                expected,
                actual: record.data().len(),
            });
        }
        Ok(())
    }

    fn check_rid(&self, rid: RecordId) -> RecordResult<()> {
        if rid.slot >= self.slots_per_page {
            return Err(RecordError::InvalidSlot {
                slot: rid.slot,
                slots_per_page: self.slots_per_page,
            });
        }
        // Pages up to and including the first metadata page are never
        // data pages
        if rid.page <= self.meta_size {
            return Err(RecordError::RecordNotExist {
                page: rid.page,
                slot: rid.slot,
            });
        }
        Ok(())
    }

    /// Walk the metadata chain to the first entry whose data page still
    /// has room. An unused entry gets a fresh data page registered
    /// under it; a fully-used chain grows by one metadata page.
    ///
    /// Returns `(meta_page, entry_idx, data_page, used_count)`.
    fn find_insert_target(&mut self) -> RecordResult<(PageId, usize, PageId, usize)> {
        let slots_per_page = self.slots_per_page as i32;
        let mut meta_page = self.meta_size;

        loop {
            let (open_entry, next) = self.pool.with_page(meta_page, |data| {
                let open = (0..LINK_ENTRY)
                    .map(|idx| {
                        let (page, used) = read_entry(data, idx);
                        (idx, page, used)
                    })
                    .find(|&(_, _, used)| used != slots_per_page);
                (open, next_meta_page(data))
            })?;

            match open_entry {
                // Unused entry: register a brand-new data page under it
                Some((idx, _, used)) if used == NO_ENTRY => {
                    let data_page = self.pool.append_empty_page()?;
                    self.pool.update_page(meta_page, |data| {
                        write_entry(data, idx, data_page as i32, 0);
                    })?;
                    return Ok((meta_page, idx, data_page, 0));
                }
                // A data page with room to spare
                Some((idx, page, used)) => {
                    return Ok((meta_page, idx, page as PageId, used as usize));
                }
                // Every entry on this chain page is full
                None => {
                    if next == NO_ENTRY {
                        let new_meta = self.pool.append_empty_page()?;
                        self.pool.update_page(new_meta, init_meta_page)?;
                        self.pool.update_page(meta_page, |data| {
                            let used = read_entry(data, LINK_ENTRY).1;
                            write_entry(data, LINK_ENTRY, new_meta as i32, used);
                        })?;
                        debug!("grew metadata chain with page {new_meta}");
                        meta_page = new_meta;
                    } else {
                        meta_page = next as PageId;
                    }
                }
            }
        }
    }

    /// Claim the first dead slot on `page` and write the record there.
    /// Deletes punch holes anywhere in a page, so the used count alone
    /// cannot name the target slot.
    fn claim_free_slot(&mut self, page: PageId, record: &Record) -> RecordResult<SlotId> {
        let slots_per_page = self.slots_per_page;
        let slot_size = self.slot_size;
        let record_size = self.schema.record_size();

        let slot = self.pool.update_page(page, |data| {
            let slot = (0..slots_per_page).find(|&s| data[s * slot_size] == 0)?;
            let at = slot * slot_size;
            data[at] = 1;
            data[at + 1..at + 1 + record_size].copy_from_slice(record.data());
            Some(slot)
        })?;

        slot.ok_or_else(|| {
            RecordError::Corrupt(format!(
                "metadata reports free space on data page {page}, but every slot is live"
            ))
        })
    }

    /// Find the metadata entry describing `page` and decrement its used
    /// count.
    fn decrement_used(&mut self, page: PageId) -> RecordResult<()> {
        let mut meta_page = self.meta_size;
        loop {
            let (found, next) = self.pool.with_page(meta_page, |data| {
                let found = (0..LINK_ENTRY)
                    .map(|idx| (idx, read_entry(data, idx)))
                    .find(|&(_, (entry_page, _))| entry_page == page as i32);
                (found, next_meta_page(data))
            })?;

            if let Some((idx, (entry_page, used))) = found {
                if used <= 0 {
                    return Err(RecordError::Corrupt(format!(
                        "used count underflow for data page {page}"
                    )));
                }
                self.pool.update_page(meta_page, |data| {
                    write_entry(data, idx, entry_page, used - 1);
                })?;
                return Ok(());
            }
            if next == NO_ENTRY {
                return Err(RecordError::Corrupt(format!(
                    "data page {page} has no metadata entry"
                )));
            }
            meta_page = next as PageId;
        }
    }
}

/// Cursor over the metadata chain: the current metadata page, the entry
/// within it, and the next slot on that entry's data page.
pub struct TableScan<'t> {
    table: &'t mut Table,
    expr: Expr,
    meta_page: Option<PageId>,
    entry: usize,
    slot: usize,
}

impl TableScan<'_> {
    /// Advance to the next record satisfying the predicate; `None` once
    /// the chain is exhausted.
    pub fn next_matching(&mut self) -> RecordResult<Option<(RecordId, Record)>> {
        while let Some(meta_page) = self.meta_page {
            if self.entry >= LINK_ENTRY {
                let next = self.table.pool.with_page(meta_page, next_meta_page)?;
                self.meta_page = (next != NO_ENTRY).then_some(next as PageId);
                self.entry = 0;
                self.slot = 0;
                continue;
            }

            let entry = self.entry;
            let (page, used) = self
                .table
                .pool
                .with_page(meta_page, |data| read_entry(data, entry))?;
            if used == NO_ENTRY {
                // Entries fill in order and the chain only grows once a
                // page is full, so an unused entry ends the scan
                self.meta_page = None;
                break;
            }

            let slots_per_page = self.table.slots_per_page;
            while self.slot < slots_per_page {
                let slot = self.slot;
                self.slot += 1;

                let rid = RecordId::new(page as PageId, slot);
                let record = match self.table.get(rid) {
                    Ok(record) => record,
                    Err(RecordError::RecordNotExist { .. }) => continue,
                    Err(e) => return Err(e),
                };
                if self.expr.eval(&record, &self.table.schema)? {
                    return Ok(Some((rid, record)));
                }
            }

            self.entry += 1;
            self.slot = 0;
        }
        Ok(None)
    }
}

impl Iterator for TableScan<'_> {
    type Item = RecordResult<(RecordId, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_matching().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Attribute, CompareOp, DataType, Value};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn test_schema() -> Schema {
        Schema::new(
            vec![
                Attribute::new("a", DataType::Int),
                Attribute::new("b", DataType::String(4)),
            ],
            vec![0],
        )
        .unwrap()
    }

    fn setup_table() -> (TempDir, PathBuf, Table) {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("r.tbl");
        Table::create(&path, &test_schema()).unwrap();
        let table = Table::open(&path).unwrap();
        (temp_dir, path, table)
    }

    fn test_record(table: &Table, a: i32, b: &str) -> Record {
        Record::from_values(
            table.schema(),
            &[Value::Int(a), Value::String(b.to_string())],
        )
        .unwrap()
    }

    #[test]
    fn test_create_open_round_trips_schema() {
        let (_temp, _path, mut table) = setup_table();
        assert_eq!(*table.schema(), test_schema());
        assert_eq!(table.num_tuples().unwrap(), 0);
    }

    #[test]
    fn test_insert_and_get() {
        let (_temp, _path, mut table) = setup_table();

        let first = test_record(&table, 1, "abcd");
        let second = test_record(&table, 2, "efgh");
        let rid1 = table.insert(&first).unwrap();
        let rid2 = table.insert(&second).unwrap();
        assert_ne!(rid1, rid2);
        assert_eq!(table.num_tuples().unwrap(), 2);

        let fetched = table.get(rid1).unwrap();
        assert_eq!(fetched.get_attr(table.schema(), 0).unwrap(), Value::Int(1));
        assert_eq!(
            fetched.get_attr(table.schema(), 1).unwrap(),
            Value::String("abcd".to_string())
        );
        assert_eq!(table.get(rid2).unwrap(), second);
    }

    #[test]
    fn test_scan_with_predicate() {
        let (_temp, _path, mut table) = setup_table();

        table.insert(&test_record(&table, 1, "abcd")).unwrap();
        table.insert(&test_record(&table, 2, "efgh")).unwrap();

        let mut scan = table.scan(Expr::cmp(0, CompareOp::Gt, Value::Int(1)));
        let (_, record) = scan.next_matching().unwrap().unwrap();
        assert_eq!(record.get_attr(&test_schema(), 0).unwrap(), Value::Int(2));
        assert!(scan.next_matching().unwrap().is_none());
    }

    #[test]
    fn test_scan_all_on_empty_table() {
        let (_temp, _path, mut table) = setup_table();
        let mut scan = table.scan(Expr::All);
        assert!(scan.next_matching().unwrap().is_none());
    }

    #[test]
    fn test_scan_is_an_iterator() {
        let (_temp, _path, mut table) = setup_table();
        for a in 0..5 {
            table.insert(&test_record(&table, a, "xxxx")).unwrap();
        }

        let schema = test_schema();
        let values: Vec<i32> = table
            .scan(Expr::All)
            .map(|item| {
                let (_, record) = item.unwrap();
                match record.get_attr(&schema, 0).unwrap() {
                    Value::Int(n) => n,
                    other => panic!("unexpected value {other:?}"),
                }
            })
            .collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_delete() {
        let (_temp, _path, mut table) = setup_table();

        let rid1 = table.insert(&test_record(&table, 1, "abcd")).unwrap();
        let rid2 = table.insert(&test_record(&table, 2, "efgh")).unwrap();

        table.delete(rid1).unwrap();
        assert_eq!(table.num_tuples().unwrap(), 1);
        assert!(matches!(
            table.get(rid1),
            Err(RecordError::RecordNotExist { .. })
        ));
        assert!(table.get(rid2).is_ok());

        // Deleting twice fails
        assert!(matches!(
            table.delete(rid1),
            Err(RecordError::RecordNotExist { .. })
        ));
        assert_eq!(table.num_tuples().unwrap(), 1);
    }

    #[test]
    fn test_insert_reuses_deleted_slot() {
        let (_temp, _path, mut table) = setup_table();

        let rid1 = table.insert(&test_record(&table, 1, "aaaa")).unwrap();
        table.insert(&test_record(&table, 2, "bbbb")).unwrap();
        table.delete(rid1).unwrap();

        let rid3 = table.insert(&test_record(&table, 3, "cccc")).unwrap();
        assert_eq!(rid3, rid1);
        assert_eq!(table.num_tuples().unwrap(), 2);
    }

    #[test]
    fn test_update() {
        let (_temp, _path, mut table) = setup_table();

        let rid = table.insert(&test_record(&table, 1, "abcd")).unwrap();
        let replacement = test_record(&table, 9, "wxyz");
        table.update(rid, &replacement).unwrap();
        assert_eq!(table.get(rid).unwrap(), replacement);
        assert_eq!(table.num_tuples().unwrap(), 1);

        let missing = RecordId::new(rid.page, rid.slot + 1);
        assert!(matches!(
            table.update(missing, &replacement),
            Err(RecordError::RecordNotExist { .. })
        ));
    }

    #[test]
    fn test_inserts_spill_to_new_data_pages() {
        let (_temp, _path, mut table) = setup_table();
        let slots_per_page = PAGE_SIZE / SLOT_SIZE;

        let mut rids = Vec::new();
        for a in 0..(slots_per_page as i32 + 4) {
            rids.push(table.insert(&test_record(&table, a, "pppp")).unwrap());
        }

        // The first 16 records share one data page, the rest go to a second
        assert!(rids[..slots_per_page].iter().all(|r| r.page == rids[0].page));
        assert!(rids[slots_per_page..].iter().all(|r| r.page != rids[0].page));
        assert_eq!(table.num_tuples().unwrap(), slots_per_page + 4);

        for (a, rid) in rids.iter().enumerate() {
            let record = table.get(*rid).unwrap();
            assert_eq!(
                record.get_attr(table.schema(), 0).unwrap(),
                Value::Int(a as i32)
            );
        }
    }

    #[test]
    fn test_close_flushes_and_reopen_sees_records() {
        let (_temp, path, mut table) = setup_table();

        let rid = table.insert(&test_record(&table, 42, "keep")).unwrap();
        table.close().unwrap();

        let mut table = Table::open(&path).unwrap();
        assert_eq!(table.num_tuples().unwrap(), 1);
        let record = table.get(rid).unwrap();
        assert_eq!(record.get_attr(table.schema(), 0).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_schema_spanning_multiple_header_pages() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("wide.tbl");

        // 120 BOOL attributes with 40-byte names: the schema text runs
        // past one page while the record stays within a slot
        let attributes: Vec<Attribute> = (0..120)
            .map(|i| Attribute::new(format!("{:a>36}_{i:03}", ""), DataType::Bool))
            .collect();
        let schema = Schema::new(attributes, vec![0]).unwrap();
        assert!(schema.serialize().len() > PAGE_SIZE);

        Table::create(&path, &schema).unwrap();
        let mut table = Table::open(&path).unwrap();
        assert_eq!(*table.schema(), schema);

        let mut record = Record::new(&schema);
        record.set_attr(&schema, 77, &Value::Bool(true)).unwrap();
        let rid = table.insert(&record).unwrap();
        let fetched = table.get(rid).unwrap();
        assert_eq!(fetched.get_attr(&schema, 77).unwrap(), Value::Bool(true));
        assert_eq!(fetched.get_attr(&schema, 0).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_record_too_large_for_slot() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("big.tbl");

        let schema = Schema::new(vec![Attribute::new("s", DataType::String(300))], vec![]).unwrap();
        let result = Table::create(&path, &schema);
        assert!(matches!(result, Err(RecordError::RecordTooLarge { .. })));
    }

    #[test]
    fn test_wrong_record_size_rejected() {
        let (_temp, _path, mut table) = setup_table();

        let other = Schema::new(vec![Attribute::new("x", DataType::Int)], vec![]).unwrap();
        let record = Record::new(&other);
        assert!(matches!(
            table.insert(&record),
            Err(RecordError::RecordSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_rid_bounds_checked() {
        let (_temp, _path, mut table) = setup_table();
        let rid = table.insert(&test_record(&table, 1, "abcd")).unwrap();

        assert!(matches!(
            table.get(RecordId::new(rid.page, 999)),
            Err(RecordError::InvalidSlot { .. })
        ));
        // Header and metadata pages hold no records
        assert!(matches!(
            table.get(RecordId::new(0, 0)),
            Err(RecordError::RecordNotExist { .. })
        ));
    }

    #[test]
    fn test_destroy_removes_file() {
        let (_temp, path, table) = setup_table();
        table.close().unwrap();

        assert!(path.exists());
        Table::destroy(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_metadata_chain_grows_past_first_page() {
        let (_temp, _path, mut table) = setup_table();
        let slots_per_page = PAGE_SIZE / SLOT_SIZE;
        let first_chain_capacity = (ENTRIES_PER_META_PAGE - 1) * slots_per_page;

        // Fill every entry of the first metadata page, then two more
        let total = first_chain_capacity + 2;
        let record = test_record(&table, 7, "full");
        let mut last_rids = Vec::new();
        for i in 0..total {
            let rid = table.insert(&record).unwrap();
            if i >= first_chain_capacity - 1 {
                last_rids.push(rid);
            }
        }
        assert_eq!(table.num_tuples().unwrap(), total);

        // The overflow records landed on fresh data pages registered on
        // the second metadata page
        for rid in &last_rids {
            assert!(table.get(*rid).is_ok());
        }
        let matches = table
            .scan(Expr::cmp(0, CompareOp::Eq, Value::Int(7)))
            .count();
        assert_eq!(matches, total);
    }
}
