use crate::error::{FsError, FsResult};
use crate::layout::DIRECT_CNT;
use crate::volume::Volume;
use crate::BLOCK_SIZE;
use alloc::vec::Vec;
use core::cmp::min;
use log::debug;

impl Volume<'_> {
    /// Sequential multi-block read starting at byte `offset`, copying into
    /// `buf` block by block. Returns the bytes copied; a read that starts at
    /// or past end of file copies nothing. Reaching end of file mid-request
    /// is a short read, not an error.
    pub fn read_data(&self, inode_num: u32, offset: usize, buf: &mut [u8]) -> FsResult<usize> {
        let length = self.inode(inode_num)?.length as usize;
        let mut start = offset;
        let end = min(offset + buf.len(), length);
        if start >= end {
            return Ok(0);
        }
        let mut read_size = 0usize;
        loop {
            let end_current_block = min((start / BLOCK_SIZE + 1) * BLOCK_SIZE, end);
            let block_read_size = end_current_block - start;
            let inner = start / BLOCK_SIZE;
            if inner >= DIRECT_CNT {
                return Err(FsError::OutOfRange);
            }
            let block_index = self.inode(inode_num)?.blocks[inner];
            let block = self.data_block(block_index)?;
            let inner_offset = start % BLOCK_SIZE;
            buf[read_size..read_size + block_read_size]
                .copy_from_slice(&block.0[inner_offset..inner_offset + block_read_size]);
            read_size += block_read_size;
            if end_current_block == end {
                break;
            }
            start = end_current_block;
        }
        Ok(read_size)
    }

    /// Whole-file replace, not append: the previous contents' blocks are
    /// released, a new run is allocated and marked occupied in the bitmap,
    /// and `data` is copied in with the final partial block zero-padded.
    pub fn write_file(&mut self, inode_num: u32, data: &[u8]) -> FsResult<usize> {
        let needed = (data.len() + BLOCK_SIZE - 1) / BLOCK_SIZE;
        if needed > DIRECT_CNT {
            return Err(FsError::Exhausted);
        }
        // bounds-checks inode_num and leaves length at zero until the new
        // run is fully in place
        self.release_data_blocks(inode_num)?;

        let mut new_blocks: Vec<u32> = Vec::with_capacity(needed);
        for _ in 0..needed {
            match self.alloc_data_block() {
                Ok(block_index) => new_blocks.push(block_index),
                Err(error) => {
                    for &block_index in new_blocks.iter() {
                        self.free_data_block(block_index);
                    }
                    return Err(error);
                }
            }
        }
        for (position, chunk) in data.chunks(BLOCK_SIZE).enumerate() {
            let block = self.data_block_mut(new_blocks[position])?;
            block.clear();
            block.0[..chunk.len()].copy_from_slice(chunk);
        }
        let inode = self.inode_mut(inode_num)?;
        inode.length = data.len() as u32;
        inode.blocks[..needed].copy_from_slice(&new_blocks);
        debug!(
            "wrote {} bytes to inode {} across {} blocks",
            data.len(),
            inode_num,
            needed
        );
        Ok(data.len())
    }
}
