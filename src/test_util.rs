#![cfg(test)]

use crate::{
    catalog::{Column, DataType, Schema},
    storage::{heap_file, BufferPool, HeapFile, HeapPage, TablePtr, Tuple, Value},
    DBConfig, DB,
};

use std::sync::Arc;

pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_schema() -> Schema {
    Schema::new(vec![
        Column::new("a", DataType::Int),
        Column::new("b", DataType::Str),
    ])
}

pub fn int_str_tuple(a: i64, b: &str) -> Tuple {
    Tuple::new(test_schema(), vec![Value::Int(a), Value::Str(b.to_string())]).unwrap()
}

pub fn get_temp_db() -> (DB, tempfile::TempDir) {
    init_test_logger();
    let db_dir = tempfile::tempdir().unwrap();
    let config = DBConfig::new().root_path(db_dir.path());
    let db = DB::new(config).unwrap();

    (db, db_dir)
}

/// An empty table over a fresh pool of the given capacity.
pub fn get_temp_table(capacity: usize) -> (TablePtr, Arc<BufferPool>, tempfile::TempDir) {
    init_test_logger();
    let db_dir = tempfile::tempdir().unwrap();
    let pool = Arc::new(BufferPool::new(capacity));
    let file = HeapFile::open(db_dir.path().join("t.tbl"), test_schema(), pool.clone()).unwrap();

    (file, pool, db_dir)
}

/// A table whose backing file already holds `num_pages` empty pages.
pub fn get_temp_table_with_pages(
    num_pages: usize,
    capacity: usize,
) -> (TablePtr, Arc<BufferPool>, tempfile::TempDir) {
    init_test_logger();
    let db_dir = tempfile::tempdir().unwrap();
    let path = db_dir.path().join("t.tbl");
    for page_no in 0..num_pages {
        let page = HeapPage::new(test_schema(), page_no);
        heap_file::write_page_at(&path, &page).unwrap();
    }

    let pool = Arc::new(BufferPool::new(capacity));
    let file = HeapFile::open(path, test_schema(), pool.clone()).unwrap();
    assert_eq!(file.num_pages(), num_pages);

    (file, pool, db_dir)
}
