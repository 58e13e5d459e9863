use std::{
    io::{Error, ErrorKind, Result},
    sync::RwLock,
};

use crate::disk::{
    block_device::BlockDevice,
    types::{zeroed_block, Block, BlockId},
};

/// 内存中的块设备，创建时所有块清零
#[derive(Debug)]
pub struct MemDisk {
    blocks: RwLock<Vec<Block>>,
}

impl MemDisk {
    pub fn new(block_count: u32) -> Self {
        Self {
            blocks: RwLock::new(vec![zeroed_block(); block_count as usize]),
        }
    }
}

fn out_of_range(block_id: BlockId) -> Error {
    Error::new(
        ErrorKind::InvalidInput,
        format!("block {} out of range", block_id),
    )
}

fn poisoned() -> Error {
    Error::new(ErrorKind::Other, "memory disk lock poisoned")
}

impl BlockDevice for MemDisk {
    fn read_block(&self, block_id: BlockId, buf: &mut Block) -> Result<()> {
        let blocks = self.blocks.read().map_err(|_| poisoned())?;
        let block = blocks
            .get(block_id as usize)
            .ok_or_else(|| out_of_range(block_id))?;
        buf.copy_from_slice(block);
        Ok(())
    }

    fn write_block(&self, block_id: BlockId, buf: &Block) -> Result<()> {
        let mut blocks = self.blocks.write().map_err(|_| poisoned())?;
        let block = blocks
            .get_mut(block_id as usize)
            .ok_or_else(|| out_of_range(block_id))?;
        block.copy_from_slice(buf);
        Ok(())
    }

    fn block_count(&self) -> u32 {
        self.blocks.read().map(|b| b.len() as u32).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::types::BLOCK_SIZE;

    #[test]
    fn starts_zeroed_and_round_trips() {
        let disk = MemDisk::new(8);
        let mut buf = [0xFFu8; BLOCK_SIZE];
        disk.read_block(3, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));

        buf.fill(0x42);
        disk.write_block(3, &buf).unwrap();
        let mut back = [0u8; BLOCK_SIZE];
        disk.read_block(3, &mut back).unwrap();
        assert_eq!(back, buf);
        assert_eq!(disk.block_count(), 8);
    }

    #[test]
    fn rejects_ids_past_the_end() {
        let disk = MemDisk::new(2);
        let buf = [0u8; BLOCK_SIZE];
        assert!(disk.write_block(2, &buf).is_err());
    }
}
