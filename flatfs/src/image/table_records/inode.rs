use crate::image::layout::{BLOCKS_PER_FILE, INODE_SIZE};
use crate::{ByteSerializable, Checksum};
use alloc::{vec, vec::Vec};
use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, TimeZone, Utc};

const HIDDEN_FLAG: u8 = 0x1;
const READONLY_FLAG: u8 = 0x2;

/// On-disk encoding of an absent block chain entry.
const BLOCK_REF_NONE: u32 = 0xffff_ffff;

/// The attribute bits of a file. READONLY is advisory at this layer: the engine records it
/// but does not enforce it against overwrite or delete, that policy belongs to callers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FileAttributes {
    hidden: bool,
    read_only: bool,
}

impl FileAttributes {
    pub fn new(hidden: bool, read_only: bool) -> Self {
        return Self { hidden, read_only };
    }

    pub fn from_u8(n: u8) -> Self {
        return Self {
            hidden: (n & HIDDEN_FLAG) != 0,
            read_only: (n & READONLY_FLAG) != 0,
        };
    }

    pub fn to_u8(&self) -> u8 {
        let mut res = 0u8;

        if self.hidden {
            res |= HIDDEN_FLAG;
        }

        if self.read_only {
            res |= READONLY_FLAG;
        }

        return res;
    }

    #[inline]
    pub fn hidden(&self) -> bool {
        return self.hidden;
    }

    #[inline]
    pub fn read_only(&self) -> bool {
        return self.read_only;
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }
}

impl Default for FileAttributes {
    fn default() -> Self {
        return Self::new(false, false);
    }
}

/// Per-file metadata. 4112 bytes on disk:
/// 1024 block references (4 each), in_use (1), attributes (1), checksum (1), reserved (1),
/// file size (4), modified time (8, seconds since the Unix epoch).
#[derive(Clone)]
pub struct INode {
    /// The ordered block chain. Populated entries form a dense prefix.
    blocks: Vec<Option<u32>>,
    in_use: bool,
    attributes: FileAttributes,
    file_size: u32,
    modified_time: u64,
    checksum: u8,
}

impl INode {
    /// An unallocated inode slot.
    pub fn empty() -> Self {
        let mut inode = Self {
            blocks: vec![None; BLOCKS_PER_FILE],
            in_use: false,
            attributes: FileAttributes::default(),
            file_size: 0,
            modified_time: 0,
            checksum: 0,
        };

        inode.set_checksum();

        return inode;
    }

    /// A freshly allocated inode with an empty chain.
    pub fn new(file_size: u32, modified_time: DateTime<Utc>) -> Self {
        let mut inode = Self {
            blocks: vec![None; BLOCKS_PER_FILE],
            in_use: true,
            attributes: FileAttributes::default(),
            file_size,
            modified_time: modified_time.timestamp() as u64,
            checksum: 0,
        };

        inode.set_checksum();

        return inode;
    }

    /// The first absent chain entry, if any.
    pub fn first_free_chain_slot(&self) -> Option<usize> {
        return self.blocks.iter().position(|b| b.is_none());
    }

    /// Stores a block reference in a chain slot.
    pub fn set_block(&mut self, slot: usize, block: u32) {
        self.blocks[slot] = Some(block);
        self.set_checksum();
    }

    /// The block reference at a chain position, None when absent or out of range.
    pub fn block_at(&self, position: usize) -> Option<u32> {
        return match self.blocks.get(position) {
            Some(block) => *block,
            None => None,
        };
    }

    /// The number of populated chain entries.
    pub fn chain_length(&self) -> usize {
        return self.blocks.iter().filter(|b| b.is_some()).count();
    }

    #[inline]
    pub fn in_use(&self) -> bool {
        return self.in_use;
    }

    #[inline]
    pub fn file_size(&self) -> u32 {
        return self.file_size;
    }

    #[inline]
    pub fn attributes(&self) -> FileAttributes {
        return self.attributes;
    }

    pub fn modified_time(&self) -> DateTime<Utc> {
        return Utc
            .timestamp_opt(self.modified_time as i64, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
    }

    pub fn set_in_use(&mut self, in_use: bool) {
        self.in_use = in_use;
        self.set_checksum();
    }

    pub fn set_attributes(&mut self, attributes: FileAttributes) {
        self.attributes = attributes;
        self.set_checksum();
    }

    #[allow(dead_code)]
    pub fn size() -> u64 {
        return INODE_SIZE as u64;
    }
}

impl Checksum for INode {
    fn set_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = self.calculate_checksum();
    }
}

impl ByteSerializable for INode {
    type BytesArrayType = [u8; INODE_SIZE];

    fn to_bytes(&self) -> Self::BytesArrayType {
        let mut bytes = [0u8; INODE_SIZE];
        let mut offset = 0;

        for block in self.blocks.iter() {
            LittleEndian::write_u32(&mut bytes[offset..], block.unwrap_or(BLOCK_REF_NONE));
            offset += 4;
        }

        bytes[offset] = self.in_use as u8;
        offset += 1;
        bytes[offset] = self.attributes.to_u8();
        offset += 1;
        bytes[offset] = self.checksum;
        offset += 2; // checksum plus one reserved byte

        LittleEndian::write_u32(&mut bytes[offset..], self.file_size);
        offset += 4;
        LittleEndian::write_u64(&mut bytes[offset..], self.modified_time);

        return bytes;
    }

    /// Performs the checksum check.
    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < INODE_SIZE {
            return None;
        }

        let mut blocks = Vec::with_capacity(BLOCKS_PER_FILE);
        let mut offset = 0;

        for _ in 0..BLOCKS_PER_FILE {
            blocks.push(match LittleEndian::read_u32(&bytes[offset..]) {
                BLOCK_REF_NONE => None,
                block => Some(block),
            });

            offset += 4;
        }

        let in_use = bytes[offset] != 0;
        offset += 1;
        let attributes = FileAttributes::from_u8(bytes[offset]);
        offset += 1;
        let checksum = bytes[offset];
        offset += 2; // checksum plus one reserved byte

        let file_size = LittleEndian::read_u32(&bytes[offset..]);
        offset += 4;
        let modified_time = LittleEndian::read_u64(&bytes[offset..]);

        let inode = Self {
            blocks,
            in_use,
            attributes,
            file_size,
            modified_time,
            checksum,
        };

        if inode.perform_checksum() {
            return Some(inode);
        } else {
            return None;
        }
    }

    fn generic_bytes_rep(bytes: &Self::BytesArrayType) -> &[u8] {
        return bytes;
    }
}

impl core::cmp::PartialEq for INode {
    fn eq(&self, other: &Self) -> bool {
        return self.blocks == other.blocks
            && self.in_use == other.in_use
            && self.attributes == other.attributes
            && self.file_size == other.file_size
            && self.modified_time == other.modified_time
            && self.checksum == other.checksum;
    }
}

impl core::fmt::Debug for INode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        return f
            .debug_struct("INode")
            .field("chain_length", &self.chain_length())
            .field("in_use", &self.in_use)
            .field("attributes", &self.attributes)
            .field("file_size", &self.file_size)
            .field("modified_time", &self.modified_time)
            .field("checksum", &self.checksum)
            .finish();
    }
}
