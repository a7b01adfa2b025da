extern crate flatfs;

use flatfs::layout::{BLOCK_SIZE, MAX_FILES, MAX_FILE_SIZE};
use flatfs::{FileSystem, FlatFSError};

mod common;
use common::*;

#[test]
fn test_round_trip_boundary_sizes() {
    let mut store = MemoryStore::new();
    let mut manager = Manager::new();

    let mut fs = FileSystem::new(&mut store, &mut manager);
    fs.create_new_image("test.img").unwrap();

    let sizes = [0, 1, BLOCK_SIZE - 1, BLOCK_SIZE, BLOCK_SIZE + 1, MAX_FILE_SIZE];

    for (i, size) in sizes.iter().enumerate() {
        let name = format!("file_{}", i);
        let contents = patterned_contents(*size);

        fs.insert_file(&name, &contents).unwrap();

        assert_eq!(fs.read_file(&name).unwrap(), contents);
    }
}

#[test]
fn test_insert_updates_free_space_by_whole_blocks() {
    let mut store = MemoryStore::new();
    let mut manager = Manager::new();

    let mut fs = FileSystem::new(&mut store, &mut manager);
    fs.create_new_image("test.img").unwrap();

    let before = fs.free_bytes().unwrap();

    fs.insert_file("a.txt", b"hello").unwrap();

    // 5 bytes still cost one whole block.
    assert_eq!(fs.free_bytes().unwrap(), before - BLOCK_SIZE as u64);
}

#[test]
fn test_insert_rejects_oversized_file() {
    let mut store = MemoryStore::new();
    let mut manager = Manager::new();

    let mut fs = FileSystem::new(&mut store, &mut manager);
    fs.create_new_image("test.img").unwrap();

    let contents = patterned_contents(MAX_FILE_SIZE + 1);

    assert_eq!(
        fs.insert_file("big.bin", &contents).unwrap_err(),
        FlatFSError::FileTooLarge
    );
    assert_eq!(fs.read_file("big.bin").unwrap_err(), FlatFSError::FileNotFound);
}

#[test]
fn test_insert_rejects_invalid_names() {
    let mut store = MemoryStore::new();
    let mut manager = Manager::new();

    let mut fs = FileSystem::new(&mut store, &mut manager);
    fs.create_new_image("test.img").unwrap();

    let overlong: String = std::iter::repeat('x').take(64).collect();

    assert_eq!(
        fs.insert_file(&overlong, b"hello").unwrap_err(),
        FlatFSError::InvalidFileName
    );
    assert_eq!(
        fs.insert_file("", b"hello").unwrap_err(),
        FlatFSError::InvalidFileName
    );

    let longest: String = std::iter::repeat('x').take(63).collect();

    fs.insert_file(&longest, b"hello").unwrap();
    assert_eq!(fs.read_file(&longest).unwrap(), b"hello".to_vec());
}

#[test]
fn test_insert_rejects_when_space_exhausted() {
    let mut store = MemoryStore::new();
    let mut manager = Manager::new();

    let contents = patterned_contents(MAX_FILE_SIZE);

    {
        let mut fs = FileSystem::new(&mut store, &mut manager);
        fs.create_new_image("test.img").unwrap();

        // Fill the data region down to less than one maximum sized file.
        let mut count = 0;
        while fs.free_bytes().unwrap() >= MAX_FILE_SIZE as u64 {
            fs.insert_file(&format!("fill_{}", count), &contents).unwrap();
            count += 1;
        }

        fs.save_image().unwrap();
    }

    let before = store_snapshot(&store);

    {
        let mut fs = FileSystem::new(&mut store, &mut manager);
        fs.open_image("test.img").unwrap();

        assert_eq!(
            fs.insert_file("one_too_many", &contents).unwrap_err(),
            FlatFSError::NotEnoughFreeDataBlocks
        );

        // The rejected insert must not have touched any table.
        fs.save_image().unwrap();
    }

    assert_eq!(store_snapshot(&store), before);
}

#[test]
fn test_insert_rejects_when_directory_full() {
    let mut store = MemoryStore::new();
    let mut manager = Manager::new();

    let mut fs = FileSystem::new(&mut store, &mut manager);
    fs.create_new_image("test.img").unwrap();

    for i in 0..MAX_FILES {
        fs.insert_file(&format!("file_{}", i), b"x").unwrap();
    }

    assert_eq!(
        fs.insert_file("one_too_many", b"x").unwrap_err(),
        FlatFSError::NoFreeDirectoryEntry
    );
}

#[test]
fn test_first_fit_block_allocation_is_deterministic() {
    let mut store = MemoryStore::new();
    let mut manager = Manager::new();

    let mut fs = FileSystem::new(&mut store, &mut manager);
    fs.create_new_image("test.img").unwrap();

    // Two single block files then a two block file; with first-fit the contents land in
    // the first four data blocks in order, which the reads confirm.
    fs.insert_file("a", &patterned_contents(BLOCK_SIZE)).unwrap();
    fs.insert_file("b", &vec![0xaau8; BLOCK_SIZE]).unwrap();
    fs.insert_file("c", &vec![0xbbu8; 2 * BLOCK_SIZE]).unwrap();

    assert_eq!(fs.read_file("a").unwrap(), patterned_contents(BLOCK_SIZE));
    assert_eq!(fs.read_file("b").unwrap(), vec![0xaau8; BLOCK_SIZE]);
    assert_eq!(fs.read_file("c").unwrap(), vec![0xbbu8; 2 * BLOCK_SIZE]);
}

fn store_snapshot(store: &MemoryStore) -> Vec<u8> {
    return store.files.get("test.img").unwrap().clone();
}
