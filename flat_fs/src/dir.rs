use crate::error::{FsError, FsResult};
use crate::layout::{Dentry, FileType, MAX_FILES, MAX_NAME_LEN};
use crate::volume::Volume;
use log::debug;

impl Volume<'_> {
    /// First dentry whose name matches under fixed-width comparison,
    /// scanning in index order. Entries with an unknown type are skipped.
    pub fn lookup_by_name(&self, name: &[u8]) -> FsResult<Dentry> {
        if name.is_empty() {
            return Err(FsError::NotFound);
        }
        for dentry in self.boot().dentries.iter() {
            if !FileType::is_valid_raw(dentry.file_type_raw()) {
                continue;
            }
            if dentry.name_matches(name) {
                return Ok(*dentry);
            }
        }
        Err(FsError::NotFound)
    }

    /// Entry at `index`. Free slots are lookup misses; a slot whose type is
    /// outside the known set is reported as such.
    pub fn lookup_by_index(&self, index: usize) -> FsResult<Dentry> {
        if index >= MAX_FILES {
            return Err(FsError::NotFound);
        }
        let dentry = &self.boot().dentries[index];
        if !FileType::is_valid_raw(dentry.file_type_raw()) {
            return Err(FsError::InvalidType);
        }
        if dentry.is_free() {
            return Err(FsError::NotFound);
        }
        Ok(*dentry)
    }

    /// Create a regular file. The inode comes from the inode bitmap (scanned
    /// from 1, over the whole table) and is marked occupied immediately, so
    /// back-to-back creates never share an inode.
    pub fn create(&mut self, name: &[u8]) -> FsResult<u32> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(FsError::InvalidName);
        }
        let slot = self
            .boot()
            .dentries
            .iter()
            .position(|dentry| dentry.is_free())
            .ok_or(FsError::Exhausted)?;
        let inode_num = self.alloc_inode()?;
        self.inode_mut(inode_num)?.clear();
        let boot = self.boot_mut();
        boot.dentries[slot].init(name, FileType::Regular, inode_num);
        boot.num_dir_entries += 1;
        debug!("created dentry slot {} -> inode {}", slot, inode_num);
        Ok(inode_num)
    }

    /// Remove by name: release the inode's data blocks and the inode itself,
    /// clear the dentry, and re-pack the array so index-based enumeration
    /// stays dense.
    pub fn remove(&mut self, name: &[u8]) -> FsResult<()> {
        if name.is_empty() {
            return Err(FsError::NotFound);
        }
        let slot = self
            .boot()
            .dentries
            .iter()
            .position(|dentry| !dentry.is_free() && dentry.name_matches(name))
            .ok_or(FsError::NotFound)?;
        let inode_num = self.boot().dentries[slot].inode_num();
        self.release_data_blocks(inode_num)?;
        self.free_inode(inode_num);

        let boot = self.boot_mut();
        boot.dentries[slot].clear();
        boot.num_dir_entries = boot.num_dir_entries.saturating_sub(1);

        // fill the hole with the last live entry
        let mut last = slot;
        while self.lookup_by_index(last + 1).is_ok() {
            last += 1;
        }
        if last > slot {
            let moved = self.boot().dentries[last];
            let boot = self.boot_mut();
            boot.dentries[slot] = moved;
            boot.dentries[last].clear();
        }
        debug!("removed dentry slot {} (inode {})", slot, inode_num);
        Ok(())
    }

    /// Directory enumeration by cursor index: the fixed-width name at
    /// `cursor`, or `None` once the cursor reaches the live entry count.
    /// Advancing the cursor is the descriptor layer's job.
    pub fn dir_entry_name(&self, cursor: usize) -> Option<&[u8; MAX_NAME_LEN]> {
        let boot = self.boot();
        if cursor >= boot.num_dir_entries as usize {
            return None;
        }
        Some(boot.dentries[cursor].name_field())
    }
}
