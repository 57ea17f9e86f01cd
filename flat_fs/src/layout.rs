use crate::BLOCK_SIZE;

pub const DENTRY_SIZE: usize = 64;
pub const MAX_NAME_LEN: usize = 32;
/// Dentries that fit in the boot block after its header slot.
pub const MAX_FILES: usize = BLOCK_SIZE / DENTRY_SIZE - 1;
/// Direct data-block indices per inode: one block of u32 minus the length word.
pub const DIRECT_CNT: usize = BLOCK_SIZE / core::mem::size_of::<u32>() - 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum FileType {
    Rtc = 0,
    Directory = 1,
    Regular = 2,
}

impl FileType {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Rtc),
            1 => Some(Self::Directory),
            2 => Some(Self::Regular),
            _ => None,
        }
    }

    /// Membership test against the known on-disk type values.
    pub fn is_valid_raw(raw: u32) -> bool {
        Self::from_raw(raw).is_some()
    }
}

/// Directory entry: fixed-width name, type tag, owning inode.
/// Exactly `DENTRY_SIZE` bytes on disk.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Dentry {
    name: [u8; MAX_NAME_LEN],
    file_type: u32,
    inode_num: u32,
    _reserved: [u8; 24],
}

impl Dentry {
    pub fn init(&mut self, name: &[u8], file_type: FileType, inode_num: u32) {
        debug_assert!(!name.is_empty() && name.len() <= MAX_NAME_LEN);
        self.name = [0u8; MAX_NAME_LEN];
        self.name[..name.len()].copy_from_slice(name);
        self.file_type = file_type as u32;
        self.inode_num = inode_num;
        self._reserved = [0u8; 24];
    }

    pub fn clear(&mut self) {
        self.name = [0u8; MAX_NAME_LEN];
        self.file_type = 0;
        self.inode_num = 0;
        self._reserved = [0u8; 24];
    }

    /// A zero first byte marks a free slot.
    pub fn is_free(&self) -> bool {
        self.name[0] == 0
    }

    /// The raw 32-byte name field. Full-width names carry no terminator.
    pub fn name_field(&self) -> &[u8; MAX_NAME_LEN] {
        &self.name
    }

    /// Name with the zero padding stripped.
    pub fn name(&self) -> &[u8] {
        let len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_NAME_LEN);
        &self.name[..len]
    }

    pub fn file_type_raw(&self) -> u32 {
        self.file_type
    }

    pub fn file_type(&self) -> Option<FileType> {
        FileType::from_raw(self.file_type)
    }

    pub fn inode_num(&self) -> u32 {
        self.inode_num
    }

    /// Fixed-width comparison: the query is truncated to the field width and
    /// zero-padded, then compared byte-for-byte against the stored field.
    pub fn name_matches(&self, name: &[u8]) -> bool {
        if name.is_empty() {
            return false;
        }
        let name = &name[..name.len().min(MAX_NAME_LEN)];
        let mut padded = [0u8; MAX_NAME_LEN];
        padded[..name.len()].copy_from_slice(name);
        padded == self.name
    }
}

/// First block of the volume: superblock counts plus the root directory's
/// dentry array. Exactly one block.
#[repr(C)]
pub struct BootBlock {
    pub num_dir_entries: u32,
    pub num_inodes: u32,
    pub num_data_blocks: u32,
    _reserved: [u8; 52],
    pub dentries: [Dentry; MAX_FILES],
}

impl BootBlock {
    pub fn init(&mut self, num_inodes: u32, num_data_blocks: u32) {
        self.num_dir_entries = 0;
        self.num_inodes = num_inodes;
        self.num_data_blocks = num_data_blocks;
        self._reserved = [0u8; 52];
        for dentry in self.dentries.iter_mut() {
            dentry.clear();
        }
    }
}

/// Per-file metadata: byte length plus the direct block list.
/// Exactly one block; entries past `populated_blocks()` are stale.
#[repr(C)]
pub struct DiskInode {
    pub length: u32,
    pub blocks: [u32; DIRECT_CNT],
}

impl DiskInode {
    pub fn clear(&mut self) {
        self.length = 0;
    }

    /// Number of populated entries in the direct list.
    pub fn populated_blocks(&self) -> usize {
        (self.length as usize + BLOCK_SIZE - 1) / BLOCK_SIZE
    }
}

/// Opaque fixed-size byte buffer.
#[repr(C)]
pub struct DataBlock(pub [u8; BLOCK_SIZE]);

impl DataBlock {
    pub fn clear(&mut self) {
        for byte in self.0.iter_mut() {
            *byte = 0;
        }
    }
}
