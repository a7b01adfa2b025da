use super::image_store::ImageStore;
use super::layout::*;
use super::table_records::{encode_filename, DirectoryEntry, FileAttributes, INode};
use crate::bitmap::BitMap;
use crate::{ByteSerializable, FlatFSError, FlatFSErrorConvertible, OSManager};
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use chrono::{DateTime, Utc};

macro_rules! unwrap_store_error {
    ($v:expr) => {
        match $v {
            Ok(val) => val,
            Err(e) => return Err(e.into_flatfs_error()),
        }
    };
}

/// Which directory entries a listing reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ListMode {
    /// Live entries whose inode does not carry the hidden attribute.
    Visible,
    /// Every live entry, hidden ones included.
    AllNames,
    /// The attribute view of the non-hidden live entries.
    Attributes,
}

/// One row of a listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRecord {
    name: String,
    file_size: u32,
    attributes: FileAttributes,
    modified_time: DateTime<Utc>,
}

impl FileRecord {
    #[inline]
    pub fn name(&self) -> &str {
        return &self.name;
    }

    #[inline]
    pub fn file_size(&self) -> u32 {
        return self.file_size;
    }

    #[inline]
    pub fn attributes(&self) -> FileAttributes {
        return self.attributes;
    }

    #[inline]
    pub fn modified_time(&self) -> DateTime<Utc> {
        return self.modified_time;
    }
}

/// The in-memory image plus the parsed table state layered over it. Table mutations are
/// written through into `data` immediately, so `data` is always ready to be persisted
/// verbatim.
struct OpenImage {
    name: String,
    data: Vec<u8>,
    directory: Vec<DirectoryEntry>,
    inodes: Vec<INode>,
    inode_map: BitMap,
    block_map: BitMap,
}

impl OpenImage {
    /// A zeroed image with every slot free and every table record initialized.
    fn new_empty(name: &str) -> Self {
        let mut image = Self {
            name: name.to_string(),
            data: vec![0u8; IMAGE_SIZE],
            directory: vec![DirectoryEntry::empty(); MAX_FILES],
            inodes: vec![INode::empty(); MAX_FILES],
            inode_map: BitMap::new(INODE_MAP_BYTES * 8),
            block_map: BitMap::new(BLOCK_MAP_BYTES * 8),
        };

        for i in 0..MAX_FILES {
            image.sync_directory_entry(i);
            image.sync_inode(i);
        }

        image.sync_inode_map();
        image.sync_block_map();

        return image;
    }

    fn sync_directory_entry(&mut self, index: usize) {
        let offset = DIRECTORY_OFFSET + index * DIRECTORY_ENTRY_SIZE;
        let bytes = self.directory[index].to_bytes();

        self.data[offset..offset + DIRECTORY_ENTRY_SIZE].copy_from_slice(&bytes);
    }

    fn sync_inode(&mut self, index: usize) {
        let offset = INODE_TABLE_OFFSET + index * INODE_SIZE;
        let bytes = self.inodes[index].to_bytes();

        self.data[offset..offset + INODE_SIZE].copy_from_slice(&bytes);
    }

    fn sync_inode_map(&mut self) {
        let bytes = self.inode_map.as_bytes();

        self.data[INODE_MAP_OFFSET..INODE_MAP_OFFSET + INODE_MAP_BYTES].copy_from_slice(&bytes);
    }

    fn sync_block_map(&mut self) {
        let bytes = self.block_map.as_bytes();

        self.data[BLOCK_MAP_OFFSET..BLOCK_MAP_OFFSET + BLOCK_MAP_BYTES].copy_from_slice(&bytes);
    }

    /// First-fit scan for a free data block. Returns the absolute block index.
    fn find_free_block(&self) -> Option<u32> {
        return self
            .block_map
            .find_next_0_index_up_to(DATA_BLOCK_COUNT)
            .map(|index| (index + FIRST_DATA_BLOCK) as u32);
    }

    fn free_data_blocks(&self) -> usize {
        return self.block_map.count_zeros_up_to(DATA_BLOCK_COUNT);
    }

    /// The first live entry carrying `name`.
    fn find_live_entry(&self, name: &str) -> Option<usize> {
        for (i, entry) in self.directory.iter().enumerate() {
            if entry.in_use() && entry.name_matches(name) {
                return Some(i);
            }
        }

        return None;
    }

    /// The first soft-deleted entry carrying `name`.
    fn find_dead_entry(&self, name: &str) -> Option<usize> {
        for (i, entry) in self.directory.iter().enumerate() {
            if !entry.in_use() && entry.name_matches(name) {
                return Some(i);
            }
        }

        return None;
    }
}

/// Parses a loaded backing file into an open image. Record checksums are validated here so
/// a damaged image is rejected before it replaces the current state.
fn parse_open_image<E: FlatFSErrorConvertible>(
    name: &str,
    data: Vec<u8>,
) -> Result<OpenImage, FlatFSError<E>> {
    if data.len() != IMAGE_SIZE {
        return Err(FlatFSError::InvalidImageSize);
    }

    let mut directory = Vec::with_capacity(MAX_FILES);

    for i in 0..MAX_FILES {
        let offset = DIRECTORY_OFFSET + i * DIRECTORY_ENTRY_SIZE;

        directory.push(
            match DirectoryEntry::from_bytes(&data[offset..offset + DIRECTORY_ENTRY_SIZE]) {
                Some(entry) => entry,
                None => return Err(FlatFSError::CorruptedDirectoryEntry),
            },
        );
    }

    let mut inodes = Vec::with_capacity(MAX_FILES);

    for i in 0..MAX_FILES {
        let offset = INODE_TABLE_OFFSET + i * INODE_SIZE;

        inodes.push(match INode::from_bytes(&data[offset..offset + INODE_SIZE]) {
            Some(inode) => inode,
            None => return Err(FlatFSError::CorruptedINode),
        });
    }

    let inode_map = BitMap::from_bytes(&data[INODE_MAP_OFFSET..INODE_MAP_OFFSET + INODE_MAP_BYTES]);
    let block_map = BitMap::from_bytes(&data[BLOCK_MAP_OFFSET..BLOCK_MAP_OFFSET + BLOCK_MAP_BYTES]);

    return Ok(OpenImage {
        name: name.to_string(),
        data,
        directory,
        inodes,
        inode_map,
        block_map,
    });
}

/// The inode index a live entry is bound to. An unbound or out-of-range reference means the
/// directory region no longer agrees with the inode table.
fn bound_inode_index<E>(entry: &DirectoryEntry) -> Result<usize, FlatFSError<E>> {
    return match entry.inode() {
        Some(index) if (index as usize) < MAX_FILES => Ok(index as usize),
        _ => Err(FlatFSError::CorruptedDirectoryEntry),
    };
}

/// Byte offset of a chain-referenced block, rejecting references outside the data region.
fn data_block_offset<E>(block: u32) -> Result<usize, FlatFSError<E>> {
    let block = block as usize;

    if block < FIRST_DATA_BLOCK || block >= BLOCK_COUNT {
        return Err(FlatFSError::CorruptedINode);
    }

    return Ok(block_offset(block));
}

/// The filesystem engine. Holds at most one open image; every operation that touches the
/// tables requires one. Nothing is persisted except through `create_new_image` and
/// `save_image`, closing or dropping the engine discards unsaved changes by design.
pub struct FileSystem<'a, 'b, E: FlatFSErrorConvertible> {
    store: &'a mut dyn ImageStore<E>,
    manager: &'b mut dyn OSManager,
    image: Option<OpenImage>,
}

impl<'a, 'b, E: FlatFSErrorConvertible> FileSystem<'a, 'b, E> {
    pub fn new(store: &'a mut dyn ImageStore<E>, manager: &'b mut dyn OSManager) -> Self {
        return Self {
            store,
            manager,
            image: None,
        };
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        return self.image.is_some();
    }

    fn open_image_ref(&self) -> Result<&OpenImage, FlatFSError<E>> {
        return match &self.image {
            Some(image) => Ok(image),
            None => Err(FlatFSError::ImageNotOpen),
        };
    }

    fn open_image_mut(&mut self) -> Result<&mut OpenImage, FlatFSError<E>> {
        return match &mut self.image {
            Some(image) => Ok(image),
            None => Err(FlatFSError::ImageNotOpen),
        };
    }

    /// Creates a fresh, empty image and immediately persists it to the named backing file,
    /// so a newly created image has no unsaved content. Replaces any currently open image.
    pub fn create_new_image(&mut self, name: &str) -> Result<(), FlatFSError<E>> {
        let image = OpenImage::new_empty(name);

        unwrap_store_error!(self.store.write_image(name, &image.data));

        self.image = Some(image);

        return Ok(());
    }

    /// Loads the named backing file verbatim. On any failure the previously open image, if
    /// any, is left untouched.
    pub fn open_image(&mut self, name: &str) -> Result<(), FlatFSError<E>> {
        let bytes = unwrap_store_error!(self.store.read_image(name));
        let image = parse_open_image(name, bytes)?;

        self.image = Some(image);

        return Ok(());
    }

    /// Writes the whole current image verbatim to its backing file.
    pub fn save_image(&mut self) -> Result<(), FlatFSError<E>> {
        let image = match &self.image {
            Some(image) => image,
            None => return Err(FlatFSError::ImageNotOpen),
        };

        unwrap_store_error!(self.store.write_image(&image.name, &image.data));

        return Ok(());
    }

    /// Discards the open image without flushing. Unsaved changes are lost.
    pub fn close_image(&mut self) -> Result<(), FlatFSError<E>> {
        if self.image.is_none() {
            return Err(FlatFSError::ImageNotOpen);
        }

        self.image = None;

        return Ok(());
    }

    /// The number of free data blocks.
    pub fn available_data_blocks(&self) -> Result<u64, FlatFSError<E>> {
        return Ok(self.open_image_ref()?.free_data_blocks() as u64);
    }

    /// The free space of the image in bytes, counted as whole free blocks.
    pub fn free_bytes(&self) -> Result<u64, FlatFSError<E>> {
        return Ok(self.available_data_blocks()? * BLOCK_SIZE as u64);
    }

    /// Copies `contents` into newly allocated blocks and binds them to `name`.
    ///
    /// Preconditions are validated in order before any mutation: an image is open, the name
    /// is valid, the content fits a single file, enough free blocks exist, and a directory
    /// slot and an inode slot are free. Should block allocation still fail mid-copy the
    /// partially populated inode, directory entry and blocks are left in place and the
    /// error is surfaced; the copy is documented as non-atomic.
    pub fn insert_file(&mut self, name: &str, contents: &[u8]) -> Result<(), FlatFSError<E>> {
        let modified_time = self.manager.current_time();
        let image = match &mut self.image {
            Some(image) => image,
            None => return Err(FlatFSError::ImageNotOpen),
        };

        let encoded_name = match encode_filename(name) {
            Some(encoded) => encoded,
            None => return Err(FlatFSError::InvalidFileName),
        };

        if contents.len() > MAX_FILE_SIZE {
            return Err(FlatFSError::FileTooLarge);
        }

        if contents.len() > image.free_data_blocks() * BLOCK_SIZE {
            return Err(FlatFSError::NotEnoughFreeDataBlocks);
        }

        let entry_index = match image.directory.iter().position(|entry| !entry.in_use()) {
            Some(index) => index,
            None => return Err(FlatFSError::NoFreeDirectoryEntry),
        };

        let inode_index = match image.inode_map.find_next_0_index_up_to(MAX_FILES) {
            Some(index) => index,
            None => return Err(FlatFSError::NoFreeINode),
        };

        // Allocate the inode, then bind the directory slot to it.
        image.inodes[inode_index] = INode::new(contents.len() as u32, modified_time);

        if !image.inode_map.set_bit(inode_index, true) {
            return Err(FlatFSError::FailedToSetBitmapBit);
        }

        image.sync_inode(inode_index);
        image.sync_inode_map();

        image.directory[entry_index] = DirectoryEntry::new(encoded_name, inode_index as u32);
        image.sync_directory_entry(entry_index);

        let mut remaining = contents.len();
        let mut offset = 0;
        let mut result = Ok(());

        while remaining > 0 {
            let block = match image.find_free_block() {
                Some(block) => block,
                None => {
                    result = Err(FlatFSError::NotEnoughFreeDataBlocks);
                    break;
                }
            };

            if !image.block_map.set_bit(block as usize - FIRST_DATA_BLOCK, true) {
                result = Err(FlatFSError::FailedToSetBitmapBit);
                break;
            }

            let take = if remaining < BLOCK_SIZE { remaining } else { BLOCK_SIZE };
            let destination = block_offset(block as usize);

            // The trailing bytes of a partial final block are padding; file_size is
            // authoritative for the content length.
            image.data[destination..destination + take]
                .copy_from_slice(&contents[offset..offset + take]);

            let slot = match image.inodes[inode_index].first_free_chain_slot() {
                Some(slot) => slot,
                None => {
                    result = Err(FlatFSError::NoFreeINodeBlock);
                    break;
                }
            };

            image.inodes[inode_index].set_block(slot, block);

            remaining -= take;
            offset += take;
        }

        image.sync_inode(inode_index);
        image.sync_block_map();

        return result;
    }

    /// Reconstructs the full content of a tracked file, exactly `file_size` bytes in chain
    /// order. No metadata is transferred.
    pub fn read_file(&self, name: &str) -> Result<Vec<u8>, FlatFSError<E>> {
        let image = self.open_image_ref()?;

        let entry_index = match image.find_live_entry(name) {
            Some(index) => index,
            None => return Err(FlatFSError::FileNotFound),
        };

        let inode = &image.inodes[bound_inode_index(&image.directory[entry_index])?];

        let mut remaining = inode.file_size() as usize;
        let mut contents = Vec::with_capacity(remaining);
        let mut position = 0;

        while remaining > 0 {
            let block = match inode.block_at(position) {
                Some(block) => block,
                None => return Err(FlatFSError::CorruptedINode),
            };

            let source = data_block_offset(block)?;
            let take = if remaining < BLOCK_SIZE { remaining } else { BLOCK_SIZE };

            contents.extend_from_slice(&image.data[source..source + take]);

            remaining -= take;
            position += 1;
        }

        return Ok(contents);
    }

    /// Reads an arbitrary byte range of a tracked file through the block chain.
    ///
    /// The range is clamped to the end of the file: with `end = min(start + count,
    /// file_size)`, exactly `end - start` bytes are returned. A zero `count`, or a `start`
    /// at or past the end of the file, yields an empty result rather than an error. A range
    /// beginning exactly on a block boundary starts reading at that block; one ending
    /// exactly on a boundary never touches the following block.
    pub fn read_file_range(
        &self,
        name: &str,
        start: u64,
        count: u64,
    ) -> Result<Vec<u8>, FlatFSError<E>> {
        let image = self.open_image_ref()?;

        let entry_index = match image.find_live_entry(name) {
            Some(index) => index,
            None => return Err(FlatFSError::FileNotFound),
        };

        let inode = &image.inodes[bound_inode_index(&image.directory[entry_index])?];
        let file_size = inode.file_size() as u64;

        if count == 0 || start >= file_size {
            return Ok(Vec::new());
        }

        let end = {
            let requested = start.saturating_add(count);

            if requested > file_size {
                file_size
            } else {
                requested
            }
        };

        let mut position = (start / BLOCK_SIZE as u64) as usize;
        let mut block_cursor = (start % BLOCK_SIZE as u64) as usize;
        let mut remaining = (end - start) as usize;
        let mut contents = Vec::with_capacity(remaining);

        while remaining > 0 {
            let block = match inode.block_at(position) {
                Some(block) => block,
                None => return Err(FlatFSError::CorruptedINode),
            };

            let source = data_block_offset(block)? + block_cursor;
            let available = BLOCK_SIZE - block_cursor;
            let take = if remaining < available { remaining } else { available };

            contents.extend_from_slice(&image.data[source..source + take]);

            remaining -= take;
            position += 1;
            block_cursor = 0;
        }

        return Ok(contents);
    }

    /// Soft-deletes a tracked file: the directory entry and inode give up their liveness
    /// and the inode slot returns to the free pool, but the chain's data blocks are never
    /// released. The content stays intact and restorable until a later insert reuses the
    /// inode slot or the directory slot.
    pub fn delete_file(&mut self, name: &str) -> Result<(), FlatFSError<E>> {
        let image = self.open_image_mut()?;

        let entry_index = match image.find_live_entry(name) {
            Some(index) => index,
            None => return Err(FlatFSError::FileNotFound),
        };

        let inode_index = bound_inode_index(&image.directory[entry_index])?;

        image.directory[entry_index].set_in_use(false);
        image.sync_directory_entry(entry_index);

        image.inodes[inode_index].set_in_use(false);
        image.sync_inode(inode_index);

        if !image.inode_map.set_bit(inode_index, false) {
            return Err(FlatFSError::FailedToSetBitmapBit);
        }

        image.sync_inode_map();

        return Ok(());
    }

    /// Restores a soft-deleted file. Fails with `FileNotRecoverable` when the entry was
    /// never bound or a later insert has reallocated its inode slot; in that case the
    /// delete is permanent.
    pub fn restore_file(&mut self, name: &str) -> Result<(), FlatFSError<E>> {
        let image = self.open_image_mut()?;

        let entry_index = match image.find_dead_entry(name) {
            Some(index) => index,
            None => return Err(FlatFSError::FileNotFound),
        };

        let inode_index = match image.directory[entry_index].inode() {
            Some(index) if (index as usize) < MAX_FILES => index as usize,
            _ => return Err(FlatFSError::FileNotRecoverable),
        };

        match image.inode_map.bit_at(inode_index) {
            Some(false) => (),
            _ => return Err(FlatFSError::FileNotRecoverable),
        }

        image.directory[entry_index].set_in_use(true);
        image.sync_directory_entry(entry_index);

        image.inodes[inode_index].set_in_use(true);
        image.sync_inode(inode_index);

        if !image.inode_map.set_bit(inode_index, true) {
            return Err(FlatFSError::FailedToSetBitmapBit);
        }

        image.sync_inode_map();

        return Ok(());
    }

    /// Applies an attribute token (`+h`, `-h`, `+r`, `-r`) to a tracked file.
    pub fn set_attribute(&mut self, token: &str, name: &str) -> Result<(), FlatFSError<E>> {
        let image = self.open_image_mut()?;

        let entry_index = match image.find_live_entry(name) {
            Some(index) => index,
            None => return Err(FlatFSError::FileNotFound),
        };

        let inode_index = bound_inode_index(&image.directory[entry_index])?;
        let mut attributes = image.inodes[inode_index].attributes();

        match token {
            "+h" => attributes.set_hidden(true),
            "-h" => attributes.set_hidden(false),
            "+r" => attributes.set_read_only(true),
            "-r" => attributes.set_read_only(false),
            _ => return Err(FlatFSError::UnknownAttribute(token.to_string())),
        }

        image.inodes[inode_index].set_attributes(attributes);
        image.sync_inode(inode_index);

        return Ok(());
    }

    /// XORs every stored content byte of a tracked file with `key`: all full blocks of the
    /// chain plus the partial final block, exactly `file_size` bytes. Padding bytes are not
    /// touched. The transform is its own inverse, so applying the same key twice restores
    /// the original content.
    pub fn apply_cipher(&mut self, name: &str, key: u8) -> Result<(), FlatFSError<E>> {
        let image = self.open_image_mut()?;

        let entry_index = match image.find_live_entry(name) {
            Some(index) => index,
            None => return Err(FlatFSError::FileNotFound),
        };

        let inode_index = bound_inode_index(&image.directory[entry_index])?;
        let file_size = image.inodes[inode_index].file_size() as usize;

        // Collect the chain up front; the blocks are mutated through `data` below.
        let chain_length = (file_size + BLOCK_SIZE - 1) / BLOCK_SIZE;
        let mut chain = Vec::with_capacity(chain_length);

        for position in 0..chain_length {
            match image.inodes[inode_index].block_at(position) {
                Some(block) => chain.push(data_block_offset::<E>(block)?),
                None => return Err(FlatFSError::CorruptedINode),
            }
        }

        let mut remaining = file_size;

        for offset in chain {
            let take = if remaining < BLOCK_SIZE { remaining } else { BLOCK_SIZE };

            for byte in image.data[offset..offset + take].iter_mut() {
                *byte ^= key;
            }

            remaining -= take;
        }

        return Ok(());
    }

    /// Lists the directory in slot order, filtered by `mode`. An empty result is not an
    /// error; reporting "no files" is the caller's concern.
    pub fn list_files(&self, mode: ListMode) -> Result<Vec<FileRecord>, FlatFSError<E>> {
        let image = self.open_image_ref()?;
        let mut records = Vec::new();

        for entry in &image.directory {
            if !entry.in_use() {
                continue;
            }

            let inode = &image.inodes[bound_inode_index(entry)?];

            if inode.attributes().hidden() && mode != ListMode::AllNames {
                continue;
            }

            records.push(FileRecord {
                name: entry.name(),
                file_size: inode.file_size(),
                attributes: inode.attributes(),
                modified_time: inode.modified_time(),
            });
        }

        return Ok(records);
    }
}
