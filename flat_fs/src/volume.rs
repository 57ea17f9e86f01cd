use crate::arena::VolumeArena;
use crate::bitmap::Bitmap;
use crate::error::{FsError, FsResult};
use crate::layout::{BootBlock, DataBlock, DiskInode, DIRECT_CNT, MAX_FILES};
use crate::BLOCK_SIZE;
use log::debug;

const BOOT_BLOCK: usize = 0;

/// A mounted single-volume filesystem: the boot block (superblock plus root
/// directory), the inode table, the data region, and the occupancy bitmaps
/// derived from them. Owns all mutable filesystem state; every operation
/// takes it explicitly, so multiple volumes can coexist.
pub struct Volume<'a> {
    arena: VolumeArena<'a>,
    inode_start_block: usize,
    data_start_block: usize,
    inode_bitmap: Bitmap,
    data_bitmap: Bitmap,
}

impl<'a> Volume<'a> {
    /// Format `image` as an empty volume with the given geometry, then
    /// mount it.
    pub fn format(image: &'a mut [u8], num_inodes: u32, num_data_blocks: u32) -> FsResult<Self> {
        let mut arena = VolumeArena::new(image)?;
        let total = 1 + num_inodes as usize + num_data_blocks as usize;
        if num_inodes == 0 || total > arena.total_blocks() {
            return Err(FsError::BadImage);
        }
        for block_id in 0..total {
            arena.get_mut::<DataBlock>(block_id)?.clear();
        }
        arena
            .get_mut::<BootBlock>(BOOT_BLOCK)?
            .init(num_inodes, num_data_blocks);
        debug!(
            "formatted volume: {} inodes, {} data blocks",
            num_inodes, num_data_blocks
        );
        Self::from_arena(arena)
    }

    /// Mount an existing volume image.
    pub fn mount(image: &'a mut [u8]) -> FsResult<Self> {
        Self::from_arena(VolumeArena::new(image)?)
    }

    /// Mount from the base address of a memory-resident image spanning
    /// `total_blocks` blocks.
    ///
    /// # Safety
    /// `base` must point to `total_blocks * BLOCK_SIZE` readable and
    /// writable bytes that stay valid and unaliased for the volume's life.
    pub unsafe fn mount_raw(base: *mut u8, total_blocks: usize) -> FsResult<Volume<'static>> {
        let image = core::slice::from_raw_parts_mut(base, total_blocks * BLOCK_SIZE);
        Volume::mount(image)
    }

    fn from_arena(arena: VolumeArena<'a>) -> FsResult<Self> {
        let boot: &BootBlock = arena.get(BOOT_BLOCK)?;
        let num_inodes = boot.num_inodes as usize;
        let num_data_blocks = boot.num_data_blocks as usize;
        let num_dir_entries = boot.num_dir_entries as usize;
        if num_inodes == 0
            || num_dir_entries > MAX_FILES
            || 1 + num_inodes + num_data_blocks > arena.total_blocks()
        {
            return Err(FsError::BadImage);
        }
        let mut volume = Self {
            arena,
            inode_start_block: 1,
            data_start_block: 1 + num_inodes,
            inode_bitmap: Bitmap::new(num_inodes),
            data_bitmap: Bitmap::new(num_data_blocks),
        };
        volume.rebuild_bitmaps()?;
        debug!(
            "mounted volume: {} dentries, {} inodes, {} data blocks",
            num_dir_entries, num_inodes, num_data_blocks
        );
        Ok(volume)
    }

    /// Reconstruct both occupancy bitmaps from the live directory entries.
    /// Occupancy depends only on current state, so repeated runs agree.
    pub fn rebuild_bitmaps(&mut self) -> FsResult<()> {
        let Self {
            arena,
            inode_bitmap,
            data_bitmap,
            inode_start_block,
            ..
        } = self;
        inode_bitmap.reset();
        data_bitmap.reset();
        // inode 0 is reserved, never handed to a file
        inode_bitmap.set(0);
        let boot: &BootBlock = arena.get(BOOT_BLOCK)?;
        for dentry in boot.dentries[..boot.num_dir_entries as usize].iter() {
            if dentry.is_free() {
                continue;
            }
            let inode_num = dentry.inode_num() as usize;
            if inode_num >= inode_bitmap.len() {
                return Err(FsError::BadImage);
            }
            inode_bitmap.set(inode_num);
            let inode: &DiskInode = arena.get(*inode_start_block + inode_num)?;
            let populated = inode.populated_blocks();
            if populated > DIRECT_CNT {
                return Err(FsError::BadImage);
            }
            for &block in inode.blocks[..populated].iter() {
                if block as usize >= data_bitmap.len() {
                    return Err(FsError::BadImage);
                }
                data_bitmap.set(block as usize);
            }
        }
        Ok(())
    }

    pub fn boot(&self) -> &BootBlock {
        // block 0 existence is guaranteed by VolumeArena::new
        self.arena.get(BOOT_BLOCK).unwrap()
    }

    pub(crate) fn boot_mut(&mut self) -> &mut BootBlock {
        self.arena.get_mut(BOOT_BLOCK).unwrap()
    }

    pub fn inode(&self, inode_num: u32) -> FsResult<&DiskInode> {
        let index = inode_num as usize;
        if index >= self.inode_bitmap.len() {
            return Err(FsError::OutOfRange);
        }
        self.arena.get(self.inode_start_block + index)
    }

    pub(crate) fn inode_mut(&mut self, inode_num: u32) -> FsResult<&mut DiskInode> {
        let index = inode_num as usize;
        if index >= self.inode_bitmap.len() {
            return Err(FsError::OutOfRange);
        }
        self.arena.get_mut(self.inode_start_block + index)
    }

    pub fn data_block(&self, index: u32) -> FsResult<&DataBlock> {
        let index = index as usize;
        if index >= self.data_bitmap.len() {
            return Err(FsError::OutOfRange);
        }
        self.arena.get(self.data_start_block + index)
    }

    pub(crate) fn data_block_mut(&mut self, index: u32) -> FsResult<&mut DataBlock> {
        let index = index as usize;
        if index >= self.data_bitmap.len() {
            return Err(FsError::OutOfRange);
        }
        self.arena.get_mut(self.data_start_block + index)
    }

    /// First free inode at or after 1; inode 0 stays reserved. The chosen
    /// inode is marked occupied so consecutive allocations never collide.
    pub(crate) fn alloc_inode(&mut self) -> FsResult<u32> {
        self.inode_bitmap
            .alloc_from(1)
            .map(|id| id as u32)
            .ok_or(FsError::Exhausted)
    }

    pub(crate) fn free_inode(&mut self, inode_num: u32) {
        let index = inode_num as usize;
        if index != 0 && index < self.inode_bitmap.len() {
            self.inode_bitmap.clear(index);
        }
    }

    pub(crate) fn alloc_data_block(&mut self) -> FsResult<u32> {
        self.data_bitmap
            .alloc()
            .map(|id| id as u32)
            .ok_or(FsError::Exhausted)
    }

    pub(crate) fn free_data_block(&mut self, index: u32) {
        let index = index as usize;
        if index < self.data_bitmap.len() {
            self.data_bitmap.clear(index);
        }
    }

    /// Release every data block the inode currently lists and reset its
    /// length. The inode id itself stays allocated.
    pub(crate) fn release_data_blocks(&mut self, inode_num: u32) -> FsResult<()> {
        let Self {
            arena,
            inode_bitmap,
            data_bitmap,
            inode_start_block,
            ..
        } = self;
        let index = inode_num as usize;
        if index >= inode_bitmap.len() {
            return Err(FsError::OutOfRange);
        }
        let inode: &mut DiskInode = arena.get_mut(*inode_start_block + index)?;
        let populated = inode.populated_blocks().min(DIRECT_CNT);
        for &block in inode.blocks[..populated].iter() {
            if (block as usize) < data_bitmap.len() {
                data_bitmap.clear(block as usize);
            }
        }
        inode.length = 0;
        Ok(())
    }

    pub fn inode_occupied(&self, inode_num: u32) -> bool {
        let index = inode_num as usize;
        index < self.inode_bitmap.len() && self.inode_bitmap.is_set(index)
    }

    pub fn data_block_occupied(&self, index: u32) -> bool {
        let index = index as usize;
        index < self.data_bitmap.len() && self.data_bitmap.is_set(index)
    }

    pub fn free_data_blocks(&self) -> usize {
        self.data_bitmap.len() - self.data_bitmap.count_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{blocks_for, TestImage};
    use crate::BLOCK_SIZE;

    #[test]
    fn format_then_mount_round_trips_the_geometry() {
        let mut image = TestImage::new(blocks_for(8, 16));
        {
            let volume = Volume::format(image.bytes(), 8, 16).unwrap();
            assert_eq!(volume.boot().num_inodes, 8);
            assert_eq!(volume.boot().num_data_blocks, 16);
            assert_eq!(volume.boot().num_dir_entries, 0);
        }
        let volume = Volume::mount(image.bytes()).unwrap();
        assert_eq!(volume.free_data_blocks(), 16);
        assert!(volume.inode_occupied(0));
        assert!(!volume.inode_occupied(1));
    }

    #[test]
    fn mount_rejects_geometry_larger_than_the_image() {
        let mut image = TestImage::new(blocks_for(8, 16));
        Volume::format(image.bytes(), 8, 16).unwrap();
        // grow the declared data region past the arena
        let short = &mut image.bytes()[..blocks_for(8, 15) * BLOCK_SIZE];
        assert_eq!(Volume::mount(short).err(), Some(FsError::BadImage));
    }

    #[test]
    fn mount_rejects_out_of_range_dentry_references() {
        let mut image = TestImage::new(blocks_for(4, 8));
        {
            let mut volume = Volume::format(image.bytes(), 4, 8).unwrap();
            volume.create(b"victim").unwrap();
        }
        // corrupt the dentry's inode number beyond the table
        {
            let bytes = image.bytes();
            let inode_field = 64 + 32 + 4; // first dentry, inode_num field
            bytes[inode_field..inode_field + 4].copy_from_slice(&100u32.to_le_bytes());
        }
        assert_eq!(Volume::mount(image.bytes()).err(), Some(FsError::BadImage));
    }

    #[test]
    fn rebuild_marks_every_populated_block_including_the_partial_tail() {
        let mut image = TestImage::new(blocks_for(4, 8));
        let used = {
            let mut volume = Volume::format(image.bytes(), 4, 8).unwrap();
            let inode = volume.create(b"two-blocks").unwrap();
            volume.write_file(inode, &[7u8; 5000]).unwrap();
            8 - volume.free_data_blocks()
        };
        assert_eq!(used, 2);
        // a fresh mount must reconstruct the same occupancy
        let mut volume = Volume::mount(image.bytes()).unwrap();
        assert_eq!(volume.free_data_blocks(), 6);
        volume.rebuild_bitmaps().unwrap();
        assert_eq!(volume.free_data_blocks(), 6);
    }

    #[test]
    fn inode_and_block_access_is_bounds_checked() {
        let mut image = TestImage::new(blocks_for(4, 8));
        let volume = Volume::format(image.bytes(), 4, 8).unwrap();
        assert!(volume.inode(3).is_ok());
        assert_eq!(volume.inode(4).err(), Some(FsError::OutOfRange));
        assert!(volume.data_block(7).is_ok());
        assert_eq!(volume.data_block(8).err(), Some(FsError::OutOfRange));
    }
}
