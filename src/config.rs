use std::path::{Path, PathBuf};

const DEFAULT_ROOT_PATH: &str = "occdb";
const DEFAULT_CACHE_CAPACITY: usize = 4096;

pub struct DBConfig {
    pub cache_capacity: usize,
    pub root_path: PathBuf,
}

impl Default for DBConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            root_path: PathBuf::from(DEFAULT_ROOT_PATH),
        }
    }
}

impl DBConfig {
    pub fn new() -> Self {
        DBConfig::default()
    }

    pub fn root_path<P: AsRef<Path>>(mut self, p: P) -> Self {
        self.root_path = p.as_ref().to_path_buf();
        self
    }

    pub fn cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }

    pub fn get_table_path(&self, name: &str) -> PathBuf {
        let mut path = self.root_path.clone();
        path.push(format!("{}.tbl", name));
        path
    }

    pub fn get_lock_path(&self) -> PathBuf {
        let mut path = self.root_path.clone();
        path.push("LOCK");
        path
    }
}
