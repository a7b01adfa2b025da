extern crate flatfs;

use chrono::{DateTime, Utc};
use flatfs::{FlatFSErrorConvertible, ImageStore, OSManager};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {}

impl FlatFSErrorConvertible for Error {}

/// Keeps every saved image in memory, keyed by backing file name.
pub struct MemoryStore {
    pub files: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        return Self {
            files: HashMap::new(),
        };
    }
}

impl ImageStore<Error> for MemoryStore {
    fn read_image(&mut self, name: &str) -> Result<Vec<u8>, Error> {
        return match self.files.get(name) {
            Some(bytes) => Ok(bytes.clone()),
            None => Err(Error {}),
        };
    }

    fn write_image(&mut self, name: &str, bytes: &[u8]) -> Result<(), Error> {
        self.files.insert(name.to_string(), bytes.to_vec());

        return Ok(());
    }
}

#[derive(Debug)]
pub struct Manager {}

impl Manager {
    pub fn new() -> Self {
        return Self {};
    }
}

impl OSManager for Manager {
    fn current_time(&self) -> DateTime<Utc> {
        return Utc::now();
    }
}

/// Content that never repeats with the block size, so misplaced blocks are caught.
pub fn patterned_contents(len: usize) -> Vec<u8> {
    let mut contents = Vec::with_capacity(len);

    for i in 0..len {
        contents.push((i % 251) as u8);
    }

    return contents;
}
