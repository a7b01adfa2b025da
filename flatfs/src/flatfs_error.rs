use alloc::string::String;
use core::fmt::{Debug, Display};

/// Store implementations define their own error type and implement this trait so the core
/// can lift their failures into a FlatFSError.
pub trait FlatFSErrorConvertible: Debug {
    fn into_flatfs_error(self) -> FlatFSError<Self>
    where
        Self: Sized,
    {
        return FlatFSError::StoreError(self);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatFSError<E> {
    /// The operation requires an open image and none is open.
    ImageNotOpen,
    /// The backing file does not have the fixed image size.
    InvalidImageSize,
    CorruptedDirectoryEntry,
    CorruptedINode,
    /// No live directory entry carries the requested name.
    FileNotFound,
    /// A deleted entry was found but its inode slot has since been reallocated.
    FileNotRecoverable,
    FileTooLarge,
    NotEnoughFreeDataBlocks,
    NoFreeINode,
    /// The inode's block chain has no free slot left.
    NoFreeINodeBlock,
    NoFreeDirectoryEntry,
    /// The filename is empty, longer than 63 bytes, or contains a NUL byte.
    InvalidFileName,
    UnknownAttribute(String),
    FailedToSetBitmapBit,
    StoreError(E),
}

impl<E: Display> Display for FlatFSError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use FlatFSError::*;

        return match self {
            ImageNotOpen => write!(f, "no image is open"),
            InvalidImageSize => write!(f, "the backing file is not a valid image"),
            CorruptedDirectoryEntry => write!(f, "corrupted directory entry"),
            CorruptedINode => write!(f, "corrupted inode"),
            FileNotFound => write!(f, "file not found"),
            FileNotRecoverable => write!(f, "file can no longer be recovered"),
            FileTooLarge => write!(f, "file exceeds the maximum file size"),
            NotEnoughFreeDataBlocks => write!(f, "not enough free data blocks"),
            NoFreeINode => write!(f, "no free inode"),
            NoFreeINodeBlock => write!(f, "no free slot in the inode block chain"),
            NoFreeDirectoryEntry => write!(f, "no free directory entry"),
            InvalidFileName => write!(f, "invalid file name"),
            UnknownAttribute(token) => write!(f, "unknown attribute token: {}", token),
            FailedToSetBitmapBit => write!(f, "failed to set a bitmap bit"),
            StoreError(e) => write!(f, "store error: {}", e),
        };
    }
}
