use crate::{
    catalog::{DataType, Schema},
    concurrency::TransactionId,
    storage::{
        consts::{PAGE_HEADER_SIZE, PAGE_SIZE, STRING_LEN},
        BufferPool, HeapPage, PageKey, Rid, Tuple, Value,
    },
    Error, Result,
};

use std::{
    fs::OpenOptions,
    io::{self, prelude::*, SeekFrom},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

pub type TablePtr = Arc<HeapFile>;

/// Write the page image at its offset in the backing file, extending the
/// file if the page lies past the current end.
pub(crate) fn write_page_at(path: &Path, page: &HeapPage) -> Result<()> {
    let data = page.serialize()?;
    let mut file = OpenOptions::new().write(true).create(true).open(path)?;
    file.seek(SeekFrom::Start((page.page_no() * PAGE_SIZE) as u64))?;
    file.write_all(&data)?;
    Ok(())
}

/// An unordered collection of tuples backed by one file of heap pages.
///
/// All page traffic goes through the buffer pool; the heap file itself only
/// touches the disk to read whole pages and write them back. The
/// `num_pages` mutex doubles as the writer lock that makes the
/// find-free-slot-or-append sequence atomic against concurrent writers, and
/// is always taken outside the buffer pool's own lock.
pub struct HeapFile {
    path: PathBuf,
    schema: Schema,
    pool: Arc<BufferPool>,
    num_pages: Mutex<usize>,
}

impl HeapFile {
    /// Open (or create) the backing file and bind it to the schema.
    pub fn open<P: AsRef<Path>>(path: P, schema: Schema, pool: Arc<BufferPool>) -> Result<TablePtr> {
        if schema.is_empty() || schema.tuple_size() + PAGE_HEADER_SIZE > PAGE_SIZE {
            return Err(Error::MalformedData(format!(
                "tuples of {} bytes do not fit a heap page",
                schema.tuple_size()
            )));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        let num_pages = file.metadata()?.len() as usize / PAGE_SIZE;

        Ok(Arc::new(HeapFile {
            path: path.as_ref().to_path_buf(),
            schema,
            pool,
            num_pages: Mutex::new(num_pages),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn num_pages(&self) -> usize {
        *self.num_pages.lock().unwrap()
    }

    pub fn page_key(&self, page_no: usize) -> PageKey {
        PageKey::new(&self.path, page_no)
    }

    /// Read the page image at `page_no` from disk.
    pub fn read_page(&self, page_no: usize) -> Result<HeapPage> {
        let mut file = OpenOptions::new().read(true).open(&self.path)?;
        file.seek(SeekFrom::Start((page_no * PAGE_SIZE) as u64))?;

        let mut buf = vec![0u8; PAGE_SIZE];
        if let Err(e) = file.read_exact(&mut buf) {
            return Err(if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::MalformedData(format!(
                    "could not read page {} of '{}': unexpected EOF",
                    page_no,
                    self.path.display()
                ))
            } else {
                Error::Io(e)
            });
        }

        HeapPage::deserialize(self.schema.clone(), page_no, &buf)
    }

    /// Write the page back to disk and clear its dirty flag.
    pub fn flush_page(&self, page: &mut HeapPage) -> Result<()> {
        write_page_at(&self.path, page)?;
        page.set_dirty(false);
        Ok(())
    }

    /// Insert the tuple into the first page with a free slot, appending a
    /// fresh page when every existing page is full.
    pub fn insert_tuple(&self, tuple: Tuple, tx: TransactionId) -> Result<Rid> {
        // rebind the tuple to the table schema; this also checks that the
        // value layout matches
        let tuple = Tuple::new(self.schema.clone(), tuple.into_values())?;

        let mut num_pages = self.num_pages.lock().unwrap();

        for page_no in 0..*num_pages {
            match self
                .pool
                .with_page_write(self, page_no, tx, |page| page.insert(tuple.clone()))
            {
                Err(Error::PageFull) => continue,
                result => return result,
            }
        }

        // every page is full: extend the file with an empty page, make it
        // visible through the pool, then insert through the normal path so
        // the access lands in this transaction's page set and write set
        let page_no = *num_pages;
        let page = HeapPage::new(self.schema.clone(), page_no);
        write_page_at(&self.path, &page)?;
        *num_pages += 1;
        self.pool.install_page(self.page_key(page_no), page)?;

        self.pool
            .with_page_write(self, page_no, tx, |page| page.insert(tuple))
    }

    /// Delete the tuple its rid names.
    pub fn delete_tuple(&self, tuple: &Tuple, tx: TransactionId) -> Result<()> {
        let rid = tuple
            .rid()
            .ok_or_else(|| Error::InvalidRid("tuple does not come from storage".to_string()))?;

        let num_pages = self.num_pages.lock().unwrap();
        if rid.page_no >= *num_pages {
            return Err(Error::InvalidRid(format!(
                "rid names page {} but '{}' has {} pages",
                rid.page_no,
                self.path.display(),
                *num_pages
            )));
        }

        self.pool
            .with_page_write(self, rid.page_no, tx, |page| page.delete(rid))
    }

    /// Iterate every tuple of the file in page-then-slot order.
    pub fn scan(&self, tx: TransactionId) -> HeapFileScan<'_> {
        HeapFileScan {
            file: self,
            tx,
            next_page: 0,
            tuples: Vec::new().into_iter(),
        }
    }

    /// Bulk-load rows of strings, one transaction for the whole batch. The
    /// commit flushes every page the load touched.
    pub fn load_rows<I>(&self, rows: I) -> Result<usize>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let tx = TransactionId::new();
        self.pool.begin(tx)?;

        let mut count = 0;
        for row in rows {
            let result = self
                .parse_row(&row)
                .and_then(|tuple| self.insert_tuple(tuple, tx));

            if let Err(e) = result {
                self.pool.abort(tx)?;
                return Err(e);
            }
            count += 1;
        }

        self.pool.commit(tx)?;
        Ok(count)
    }

    /// Load comma-separated text. `skip_last_field` drops a trailing
    /// separator field that some datasets carry on every line.
    pub fn load_csv<R: Read>(
        &self,
        mut reader: R,
        has_header: bool,
        sep: char,
        skip_last_field: bool,
    ) -> Result<usize> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;

        let rows = contents
            .lines()
            .skip(if has_header { 1 } else { 0 })
            .map(|line| {
                let mut fields: Vec<String> = line.split(sep).map(|f| f.to_string()).collect();
                if skip_last_field {
                    fields.pop();
                }
                fields
            });

        self.load_rows(rows)
    }

    fn parse_row(&self, row: &[String]) -> Result<Tuple> {
        if row.len() != self.schema.len() {
            return Err(Error::MalformedData(format!(
                "row has {} fields but the schema has {} columns",
                row.len(),
                self.schema.len()
            )));
        }

        let mut values = Vec::with_capacity(row.len());
        for (field, column) in row.iter().zip(self.schema.columns()) {
            let value = match column.data_type {
                DataType::Int => {
                    let v = field.trim().parse::<i64>().map_err(|_| {
                        Error::TypeMismatch(format!("cannot parse '{}' as an integer", field))
                    })?;
                    Value::Int(v)
                }
                DataType::Str => Value::Str(truncate_string(field)),
            };
            values.push(value);
        }

        Tuple::new(self.schema.clone(), values)
    }
}

/// Cut the string down to at most `STRING_LEN` bytes without splitting a
/// character.
fn truncate_string(s: &str) -> String {
    if s.len() <= STRING_LEN {
        return s.to_string();
    }

    let mut end = STRING_LEN;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

pub struct HeapFileScan<'a> {
    file: &'a HeapFile,
    tx: TransactionId,
    next_page: usize,
    tuples: std::vec::IntoIter<Tuple>,
}

impl<'a> Iterator for HeapFileScan<'a> {
    type Item = Result<Tuple>;

    fn next(&mut self) -> Option<Result<Tuple>> {
        loop {
            if let Some(tuple) = self.tuples.next() {
                return Some(Ok(tuple));
            }

            if self.next_page >= self.file.num_pages() {
                return None;
            }

            let page_no = self.next_page;
            self.next_page += 1;

            let page_tuples = self
                .file
                .pool
                .with_page_read(self.file, page_no, self.tx, |page| {
                    Ok(page.iter().collect::<Vec<_>>())
                });
            match page_tuples {
                Ok(tuples) => self.tuples = tuples.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
