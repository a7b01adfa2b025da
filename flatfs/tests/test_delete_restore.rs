extern crate flatfs;

use flatfs::layout::{BLOCK_SIZE, INODE_MAP_OFFSET};
use flatfs::{FileSystem, FlatFSError, ListMode};

mod common;
use common::*;

#[test]
fn test_delete_hides_file() {
    let mut store = MemoryStore::new();
    let mut manager = Manager::new();

    let mut fs = FileSystem::new(&mut store, &mut manager);
    fs.create_new_image("test.img").unwrap();

    fs.insert_file("a.txt", b"hello").unwrap();
    fs.delete_file("a.txt").unwrap();

    assert_eq!(fs.list_files(ListMode::AllNames).unwrap().len(), 0);
    assert_eq!(fs.read_file("a.txt").unwrap_err(), FlatFSError::FileNotFound);
    assert_eq!(fs.delete_file("a.txt").unwrap_err(), FlatFSError::FileNotFound);
}

#[test]
fn test_delete_missing_file() {
    let mut store = MemoryStore::new();
    let mut manager = Manager::new();

    let mut fs = FileSystem::new(&mut store, &mut manager);
    fs.create_new_image("test.img").unwrap();

    assert_eq!(fs.delete_file("a.txt").unwrap_err(), FlatFSError::FileNotFound);
}

#[test]
fn test_delete_keeps_blocks_allocated() {
    let mut store = MemoryStore::new();
    let mut manager = Manager::new();

    let mut fs = FileSystem::new(&mut store, &mut manager);
    fs.create_new_image("test.img").unwrap();

    let before = fs.free_bytes().unwrap();

    fs.insert_file("a.bin", &patterned_contents(3 * BLOCK_SIZE)).unwrap();
    assert_eq!(fs.free_bytes().unwrap(), before - (3 * BLOCK_SIZE) as u64);

    // Soft delete: the chain's blocks stay allocated so the content survives.
    fs.delete_file("a.bin").unwrap();
    assert_eq!(fs.free_bytes().unwrap(), before - (3 * BLOCK_SIZE) as u64);
}

#[test]
fn test_restore_round_trip() {
    let mut store = MemoryStore::new();
    let mut manager = Manager::new();

    let mut fs = FileSystem::new(&mut store, &mut manager);
    fs.create_new_image("test.img").unwrap();

    let contents = patterned_contents(2 * BLOCK_SIZE + 7);

    fs.insert_file("a.bin", &contents).unwrap();
    fs.set_attribute("+r", "a.bin").unwrap();

    let before = fs.list_files(ListMode::Attributes).unwrap();

    fs.delete_file("a.bin").unwrap();
    fs.restore_file("a.bin").unwrap();

    // The restored file lists and reads exactly as before the delete.
    assert_eq!(fs.list_files(ListMode::Attributes).unwrap(), before);
    assert_eq!(fs.read_file("a.bin").unwrap(), contents);
}

#[test]
fn test_restore_missing_file() {
    let mut store = MemoryStore::new();
    let mut manager = Manager::new();

    let mut fs = FileSystem::new(&mut store, &mut manager);
    fs.create_new_image("test.img").unwrap();

    fs.insert_file("a.txt", b"hello").unwrap();

    // Only deleted entries qualify for a restore.
    assert_eq!(fs.restore_file("a.txt").unwrap_err(), FlatFSError::FileNotFound);
    assert_eq!(fs.restore_file("b.txt").unwrap_err(), FlatFSError::FileNotFound);
}

#[test]
fn test_reusing_the_directory_slot_makes_delete_permanent() {
    let mut store = MemoryStore::new();
    let mut manager = Manager::new();

    let mut fs = FileSystem::new(&mut store, &mut manager);
    fs.create_new_image("test.img").unwrap();

    fs.insert_file("a.txt", b"hello").unwrap();
    fs.delete_file("a.txt").unwrap();

    // The next insert claims the freed directory slot and overwrites the binding.
    fs.insert_file("b.txt", b"world").unwrap();

    assert_eq!(fs.restore_file("a.txt").unwrap_err(), FlatFSError::FileNotFound);
    assert_eq!(fs.read_file("b.txt").unwrap(), b"world".to_vec());
}

#[test]
fn test_restore_fails_when_inode_slot_was_reallocated() {
    let mut store = MemoryStore::new();
    let mut manager = Manager::new();

    {
        let mut fs = FileSystem::new(&mut store, &mut manager);
        fs.create_new_image("test.img").unwrap();

        fs.insert_file("a.txt", b"hello").unwrap();
        fs.delete_file("a.txt").unwrap();
        fs.save_image().unwrap();
    }

    // Mark the deleted file's inode slot as allocated again, as a foreign writer or a
    // crossed image would. The entry still names inode 0, so the restore must refuse.
    store.files.get_mut("test.img").unwrap()[INODE_MAP_OFFSET] |= 0x1;

    let mut fs = FileSystem::new(&mut store, &mut manager);
    fs.open_image("test.img").unwrap();

    assert_eq!(
        fs.restore_file("a.txt").unwrap_err(),
        FlatFSError::FileNotRecoverable
    );
}
