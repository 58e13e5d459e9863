/// 每个逻辑块（Block）的大小：512 字节
/// 引擎以“块”为最小读写单位，磁盘布局依赖这个值，不可随意修改。
pub const BLOCK_SIZE: usize = 512;

/// 默认虚拟磁盘大小：16MB
pub const DEFAULT_DISK_SIZE: u64 = 16 * 1024 * 1024;

/// 默认块总数：16MB / 512B = 32768 块
pub const DEFAULT_BLOCK_COUNT: u32 = (DEFAULT_DISK_SIZE / BLOCK_SIZE as u64) as u32;

/// 块编号
pub type BlockId = u32;

/// 定义一个逻辑块类型（每块 512 字节的字节数组）
/// 所有磁盘读写都以 Block 为单位进行。
pub type Block = [u8; BLOCK_SIZE];

/// 一个全零块
pub const fn zeroed_block() -> Block {
    [0; BLOCK_SIZE]
}
