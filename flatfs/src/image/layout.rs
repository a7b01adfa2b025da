//! The fixed layout of the image. Nothing here is configurable; the image is always
//! `BLOCK_COUNT` blocks of `BLOCK_SIZE` bytes with the table regions at the block indices
//! below and every block from `FIRST_DATA_BLOCK` onward holding file content.

/// Size of each block in bytes.
pub const BLOCK_SIZE: usize = 1024;

/// Total number of blocks in the image.
pub const BLOCK_COUNT: usize = 65536;

/// Total image size in bytes.
pub const IMAGE_SIZE: usize = BLOCK_COUNT * BLOCK_SIZE;

/// Capacity of the directory and of the inode table.
pub const MAX_FILES: usize = 256;

/// Maximum chain length of a single inode.
pub const BLOCKS_PER_FILE: usize = 1024;

/// Largest file the image can track.
pub const MAX_FILE_SIZE: usize = BLOCK_SIZE * BLOCKS_PER_FILE;

/// Serialized size of one directory entry.
pub const DIRECTORY_ENTRY_SIZE: usize = 72;

/// Serialized size of one inode.
pub const INODE_SIZE: usize = 4112;

/// A filename may use at most this many bytes; the 64 byte name field keeps at least one
/// trailing NUL.
pub const MAX_FILENAME_BYTES: usize = 63;

/// First block of the directory table; 256 entries of 72 bytes fill 18 blocks exactly.
pub const DIRECTORY_BLOCK: usize = 0;

/// The inode free-map block. Only the first 256 bits are meaningful.
pub const INODE_MAP_BLOCK: usize = 19;

/// First block of the inode table; 256 inodes of 4112 bytes fill 1028 blocks exactly.
pub const INODE_TABLE_BLOCK: usize = 20;

/// First block of the data block free-map; 8 blocks, one bit per data block.
pub const BLOCK_MAP_BLOCK: usize = 1048;

/// First data block. Everything from here to the end of the image is file content.
pub const FIRST_DATA_BLOCK: usize = 1056;

/// Number of data blocks.
pub const DATA_BLOCK_COUNT: usize = BLOCK_COUNT - FIRST_DATA_BLOCK;

pub const DIRECTORY_OFFSET: usize = DIRECTORY_BLOCK * BLOCK_SIZE;
pub const INODE_MAP_OFFSET: usize = INODE_MAP_BLOCK * BLOCK_SIZE;
pub const INODE_TABLE_OFFSET: usize = INODE_TABLE_BLOCK * BLOCK_SIZE;
pub const BLOCK_MAP_OFFSET: usize = BLOCK_MAP_BLOCK * BLOCK_SIZE;

/// Bytes reserved for the inode free-map.
pub const INODE_MAP_BYTES: usize = BLOCK_SIZE;

/// Bytes reserved for the data block free-map.
pub const BLOCK_MAP_BYTES: usize = 8 * BLOCK_SIZE;

/// Byte offset of a block within the image.
pub fn block_offset(block: usize) -> usize {
    return block * BLOCK_SIZE;
}

// The regions must not overrun their reservations.
const _: () = assert!(MAX_FILES * DIRECTORY_ENTRY_SIZE <= (INODE_MAP_BLOCK - DIRECTORY_BLOCK) * BLOCK_SIZE);
const _: () = assert!(MAX_FILES <= INODE_MAP_BYTES * 8);
const _: () = assert!(MAX_FILES * INODE_SIZE <= (BLOCK_MAP_BLOCK - INODE_TABLE_BLOCK) * BLOCK_SIZE);
const _: () = assert!(DATA_BLOCK_COUNT <= BLOCK_MAP_BYTES * 8);
const _: () = assert!(BLOCK_MAP_BLOCK + BLOCK_MAP_BYTES / BLOCK_SIZE <= FIRST_DATA_BLOCK);
