mod directory_entry;
mod inode;

pub use directory_entry::DirectoryEntry;
pub(crate) use directory_entry::encode_filename;
pub use inode::{FileAttributes, INode};
