use serde::{Deserialize, Serialize};

use crate::{
    disk::{types::zeroed_block, Block, BLOCK_SIZE},
    fs::{
        config::Geometry,
        error::{FileSystemError, Result},
    },
};

// 序列化后的长度：3 个 u32，小端定长编码
const SUPER_BLOCK_SIZE: usize = 12;

/// 超级块：格式化时写入一次，之后只读
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperBlock {
    pub size: u32,    // 磁盘总字节数
    pub nblocks: u32, // 总块数
    pub ninodes: u32, // 最大 inode 数
}

impl SuperBlock {
    pub fn new(geometry: &Geometry) -> Self {
        Self {
            size: (geometry.block_count as u64 * BLOCK_SIZE as u64) as u32,
            nblocks: geometry.block_count,
            ninodes: geometry.inode_count,
        }
    }

    pub fn to_block(&self) -> Result<Block> {
        let bytes = bincode::serialize(self)
            .map_err(|e| FileSystemError::Corrupted(format!("superblock encode: {}", e)))?;
        let mut block = zeroed_block();
        block[..bytes.len()].copy_from_slice(&bytes);
        Ok(block)
    }

    pub fn from_block(block: &Block) -> Result<Self> {
        bincode::deserialize(&block[..SUPER_BLOCK_SIZE])
            .map_err(|e| FileSystemError::Corrupted(format!("superblock decode: {}", e)))
    }

    /// 校验超级块并推导出磁盘几何参数
    pub fn geometry(&self) -> Result<Geometry> {
        if self.nblocks == 0 || self.size as u64 != self.nblocks as u64 * BLOCK_SIZE as u64 {
            return Err(FileSystemError::Corrupted(format!(
                "superblock size {} does not match {} blocks of {} bytes",
                self.size, self.nblocks, BLOCK_SIZE
            )));
        }
        Geometry::new(self.nblocks, self.ninodes)
            .map_err(|e| FileSystemError::Corrupted(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_as_three_little_endian_words() {
        let sb = SuperBlock::new(&Geometry::default());
        let block = sb.to_block().unwrap();
        assert_eq!(&block[0..4], &(16u32 * 1024 * 1024).to_le_bytes());
        assert_eq!(&block[4..8], &32768u32.to_le_bytes());
        assert_eq!(&block[8..12], &1024u32.to_le_bytes());
        assert!(block[12..].iter().all(|&b| b == 0));

        let back = SuperBlock::from_block(&block).unwrap();
        assert_eq!(back, sb);
        assert_eq!(back.geometry().unwrap(), Geometry::default());
    }

    #[test]
    fn largest_geometry_survives_encoding() {
        let max_blocks = (u32::MAX as u64 / BLOCK_SIZE as u64) as u32;
        let g = Geometry::new(max_blocks, 1024).unwrap();
        let sb = SuperBlock::new(&g);
        let back = SuperBlock::from_block(&sb.to_block().unwrap()).unwrap();
        assert_eq!(back.geometry().unwrap(), g);
    }

    #[test]
    fn blank_block_is_not_a_superblock() {
        let sb = SuperBlock::from_block(&zeroed_block()).unwrap();
        assert!(matches!(sb.geometry(), Err(FileSystemError::Corrupted(_))));
    }
}
