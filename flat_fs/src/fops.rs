use crate::error::{FsError, FsResult};
use crate::layout::{FileType, MAX_NAME_LEN};
use crate::volume::Volume;
use bitflags::bitflags;
use core::cmp::min;
use spin::Mutex;

bitflags! {
    /// Descriptor flags. Owned by the process layer; opaque here.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FdFlags: u32 {
        const IN_USE = 1 << 0;
    }
}

/// Per-open-file record. Slot allocation and lifetime belong to the process
/// layer; this crate only reads `inode_num` and advances `cursor`.
pub struct FileDescriptor {
    pub ops: FileOps,
    pub inode_num: u32,
    /// Byte offset for regular files, entry index for directories.
    pub cursor: u32,
    pub flags: FdFlags,
}

/// Operations table selected per descriptor when it is opened. RTC dentries
/// dispatch through a device table outside this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileOps {
    Regular,
    Directory,
}

impl FileOps {
    pub fn resolve(file_type: FileType) -> FsResult<Self> {
        match file_type {
            FileType::Regular => Ok(Self::Regular),
            FileType::Directory => Ok(Self::Directory),
            FileType::Rtc => Err(FsError::Unsupported),
        }
    }

    /// Open a descriptor on `name`, resolving the operations table from the
    /// dentry's type once, here.
    pub fn open(volume: &Mutex<Volume<'_>>, name: &[u8]) -> FsResult<FileDescriptor> {
        let volume = volume.lock();
        let dentry = volume.lookup_by_name(name)?;
        let file_type = dentry.file_type().ok_or(FsError::InvalidType)?;
        let ops = Self::resolve(file_type)?;
        Ok(FileDescriptor {
            ops,
            inode_num: dentry.inode_num(),
            cursor: 0,
            flags: FdFlags::IN_USE,
        })
    }

    /// Regular files: copy from the cursor and advance it by the bytes
    /// actually copied. Directories: copy the name at the cursor entry,
    /// truncated to the fixed name width, and advance by one entry. A zero
    /// return signals end of stream in both cases; directory reads reject a
    /// zero-capacity buffer, which could not be told apart from that signal.
    pub fn read(
        self,
        volume: &Mutex<Volume<'_>>,
        fd: &mut FileDescriptor,
        buf: &mut [u8],
    ) -> FsResult<usize> {
        match self {
            Self::Regular => {
                let copied = {
                    let volume = volume.lock();
                    volume.read_data(fd.inode_num, fd.cursor as usize, buf)?
                };
                fd.cursor += copied as u32;
                Ok(copied)
            }
            Self::Directory => {
                if buf.is_empty() {
                    return Err(FsError::Unsupported);
                }
                let copied = {
                    let volume = volume.lock();
                    match volume.dir_entry_name(fd.cursor as usize) {
                        Some(field) => {
                            let len = min(buf.len(), MAX_NAME_LEN);
                            buf[..len].copy_from_slice(&field[..len]);
                            len
                        }
                        None => 0,
                    }
                };
                if copied > 0 {
                    fd.cursor += 1;
                }
                Ok(copied)
            }
        }
    }

    /// Regular files: whole-file replace. Directory streams take no
    /// byte-oriented writes; entries change only through create/remove.
    pub fn write(
        self,
        volume: &Mutex<Volume<'_>>,
        fd: &mut FileDescriptor,
        buf: &[u8],
    ) -> FsResult<usize> {
        match self {
            Self::Regular => volume.lock().write_file(fd.inode_num, buf),
            Self::Directory => Err(FsError::Unsupported),
        }
    }

    /// No per-file state is held here; closing always succeeds.
    pub fn close(self, _fd: &mut FileDescriptor) -> FsResult<()> {
        Ok(())
    }
}
