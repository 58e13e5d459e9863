use std::io::Result;

use crate::disk::types::{Block, BlockId};

/// 块设备抽象：只负责按块号整块读写，不理解任何文件系统语义。
pub trait BlockDevice: Send + Sync {
    fn read_block(&self, block_id: BlockId, buf: &mut Block) -> Result<()>;
    fn write_block(&self, block_id: BlockId, buf: &Block) -> Result<()>;

    /// 设备包含的块总数
    fn block_count(&self) -> u32;
}
