#![cfg_attr(not(test), no_std)]
extern crate alloc;

mod arena;
mod bitmap;
mod dir;
mod error;
mod file;
mod fops;
mod layout;
mod volume;

/// Volume block size; every on-disk record is sized in these units.
pub const BLOCK_SIZE: usize = 4096;

pub use error::{FsError, FsResult};
pub use fops::{FdFlags, FileDescriptor, FileOps};
pub use layout::{BootBlock, Dentry, DiskInode, FileType, DIRECT_CNT, MAX_FILES, MAX_NAME_LEN};
pub use volume::Volume;
