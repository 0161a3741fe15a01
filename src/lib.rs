pub mod catalog;
pub mod concurrency;
pub mod executor;
pub mod storage;

extern crate lru;

#[cfg(test)]
extern crate tempfile;

mod config;
mod db;
mod result;
mod test_util;

pub use self::{
    config::DBConfig,
    db::DB,
    result::{Error, Result},
};
