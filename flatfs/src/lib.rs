#![no_std]

extern crate alloc;

mod bitmap;
mod byte_serializable;
mod checksum_trait;
mod flatfs_error;
mod image;
mod manager;
mod utils;

pub use byte_serializable::ByteSerializable;
pub use checksum_trait::Checksum;
pub use flatfs_error::{FlatFSError, FlatFSErrorConvertible};
pub use image::*;
pub use manager::OSManager;
