use crate::image::layout::{DIRECTORY_ENTRY_SIZE, MAX_FILENAME_BYTES};
use crate::{ByteSerializable, Checksum};
use alloc::string::String;
use byteorder::{ByteOrder, LittleEndian};

/// On-disk encoding of an unbound inode reference.
const INODE_REF_NONE: u32 = 0xffff_ffff;

/// A name to inode binding. 72 bytes on disk:
/// name (64, NUL padded), in_use (1), checksum (1), reserved (2), inode reference (4).
#[derive(Copy, Clone)]
pub struct DirectoryEntry {
    /// NUL padded, at most 63 bytes of name so the field always ends with a NUL.
    name: [u8; 64],
    in_use: bool,
    inode: Option<u32>,
    checksum: u8,
}

/// Validates a filename and encodes it into a NUL padded name field. Returns None when the
/// name is empty, longer than `MAX_FILENAME_BYTES`, or contains a NUL byte. Overlong names
/// are rejected, never truncated.
pub(crate) fn encode_filename(name: &str) -> Option<[u8; 64]> {
    let bytes = name.as_bytes();

    if bytes.is_empty() || bytes.len() > MAX_FILENAME_BYTES {
        return None;
    }

    if bytes.iter().any(|b| *b == 0) {
        return None;
    }

    let mut field = [0u8; 64];
    field[..bytes.len()].copy_from_slice(bytes);

    return Some(field);
}

impl DirectoryEntry {
    /// An unbound slot.
    pub fn empty() -> Self {
        let mut entry = Self {
            name: [0u8; 64],
            in_use: false,
            inode: None,
            checksum: 0,
        };

        entry.set_checksum();

        return entry;
    }

    /// Binds `name` (already encoded) to `inode` as a live entry.
    pub fn new(name: [u8; 64], inode: u32) -> Self {
        let mut entry = Self {
            name,
            in_use: true,
            inode: Some(inode),
            checksum: 0,
        };

        entry.set_checksum();

        return entry;
    }

    pub fn name(&self) -> String {
        let end = self.name.iter().position(|b| *b == 0).unwrap_or(64);

        return String::from_utf8_lossy(&self.name[..end]).into_owned();
    }

    /// Compares the stored name against `other` without allocating.
    pub fn name_matches(&self, other: &str) -> bool {
        let bytes = other.as_bytes();

        if bytes.is_empty() || bytes.len() >= 64 {
            return false;
        }

        return &self.name[..bytes.len()] == bytes && self.name[bytes.len()] == 0;
    }

    #[inline]
    pub fn in_use(&self) -> bool {
        return self.in_use;
    }

    #[inline]
    pub fn inode(&self) -> Option<u32> {
        return self.inode;
    }

    pub fn set_in_use(&mut self, in_use: bool) {
        self.in_use = in_use;
        self.set_checksum();
    }

    #[allow(dead_code)]
    pub fn size() -> u64 {
        return DIRECTORY_ENTRY_SIZE as u64;
    }
}

impl Checksum for DirectoryEntry {
    fn set_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = self.calculate_checksum();
    }
}

impl ByteSerializable for DirectoryEntry {
    type BytesArrayType = [u8; DIRECTORY_ENTRY_SIZE];

    fn to_bytes(&self) -> Self::BytesArrayType {
        let mut bytes = [0u8; DIRECTORY_ENTRY_SIZE];

        bytes[..64].copy_from_slice(&self.name);
        bytes[64] = self.in_use as u8;
        bytes[65] = self.checksum;
        // 66 and 67 are reserved
        LittleEndian::write_u32(&mut bytes[68..], self.inode.unwrap_or(INODE_REF_NONE));

        return bytes;
    }

    /// Performs the checksum check.
    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < DIRECTORY_ENTRY_SIZE {
            return None;
        }

        let mut name = [0u8; 64];
        name.copy_from_slice(&bytes[..64]);

        let in_use = bytes[64] != 0;
        let checksum = bytes[65];

        let inode = match LittleEndian::read_u32(&bytes[68..]) {
            INODE_REF_NONE => None,
            index => Some(index),
        };

        let entry = Self {
            name,
            in_use,
            inode,
            checksum,
        };

        if entry.perform_checksum() {
            return Some(entry);
        } else {
            return None;
        }
    }

    fn generic_bytes_rep(bytes: &Self::BytesArrayType) -> &[u8] {
        return bytes;
    }
}

impl core::cmp::PartialEq for DirectoryEntry {
    fn eq(&self, other: &Self) -> bool {
        return self.name[..] == other.name[..]
            && self.in_use == other.in_use
            && self.inode == other.inode
            && self.checksum == other.checksum;
    }
}

impl core::fmt::Debug for DirectoryEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        return f
            .debug_struct("DirectoryEntry")
            .field("name", &self.name())
            .field("in_use", &self.in_use)
            .field("inode", &self.inode)
            .field("checksum", &self.checksum)
            .finish();
    }
}
