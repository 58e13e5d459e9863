use crate::{
    disk::{
        types::DEFAULT_BLOCK_COUNT,
        BlockId, BLOCK_SIZE,
    },
    fs::error::{FileSystemError, Result},
};

/// inode 编号
pub type InodeNum = u32;

pub const SUPER_BLOCK_BLOCK_ID: BlockId = 1;
pub const BLOCK_BITMAP_START_BLOCK_ID: BlockId = 2;

/// 每个位图块能描述的块数（Bits Per Block）
pub const BITS_PER_BLOCK: u32 = (BLOCK_SIZE * 8) as u32;

// 每个 inode 的直接块指针数
pub const NDIRECT: usize = 100;

// 块号在磁盘上占 4 字节，一个间接块可以存 128 个块号
pub const NINDIRECT: usize = BLOCK_SIZE / std::mem::size_of::<BlockId>();

// 单个文件最多占用的块数
pub const MAXFILE: usize = NDIRECT + NINDIRECT;

pub const MAX_FILE_SIZE: usize = MAXFILE * BLOCK_SIZE;

// inode 记录的磁盘大小：type(2) + pad(2) + size/atime/mtime/ctime(16) + (NDIRECT + 1) 个块号
pub const INODE_SIZE: usize = 20 + (NDIRECT + 1) * 4;

// 每个 inode 表块能放下的 inode 数
pub const INODES_PER_BLOCK: u32 = (BLOCK_SIZE / INODE_SIZE) as u32;

// 默认 inode 总数
pub const DEFAULT_INODE_COUNT: u32 = 1024;

// 根目录 inode 号
pub const ROOT_INODE: InodeNum = 1;

// shell 使用的磁盘镜像
pub const DISK_PATH: &str = "chfs.img";

/// 磁盘几何参数，所有分区边界都由它推导
///
/// ```text
/// | boot | super | block bitmap | inode bitmap | inode table | data ... |
///    0      1      2 ..            1 块           ..            data_start
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub block_count: u32,
    pub inode_count: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            block_count: DEFAULT_BLOCK_COUNT,
            inode_count: DEFAULT_INODE_COUNT,
        }
    }
}

impl Geometry {
    pub fn new(block_count: u32, inode_count: u32) -> Result<Self> {
        let geometry = Self {
            block_count,
            inode_count,
        };

        if inode_count < 2 {
            return Err(FileSystemError::InvalidGeometry(format!(
                "need at least 2 inodes, got {}",
                inode_count
            )));
        }
        if inode_count > BITS_PER_BLOCK {
            return Err(FileSystemError::InvalidGeometry(format!(
                "inode bitmap holds at most {} inodes, got {}",
                BITS_PER_BLOCK, inode_count
            )));
        }
        // 超级块的 size 字段只有 32 位
        if geometry.disk_size() > u32::MAX as u64 {
            return Err(FileSystemError::InvalidGeometry(format!(
                "{} blocks of {} bytes exceed the 32-bit disk size field",
                block_count, BLOCK_SIZE
            )));
        }
        // 用 u64 计算，避免块数很小时先溢出
        if geometry.data_start() as u64 >= block_count as u64 {
            return Err(FileSystemError::InvalidGeometry(format!(
                "{} blocks leave no room for data (data region starts at {})",
                block_count,
                geometry.data_start()
            )));
        }

        Ok(geometry)
    }

    /// 磁盘总字节数
    pub fn disk_size(&self) -> u64 {
        self.block_count as u64 * BLOCK_SIZE as u64
    }

    // 块位图占用的块数 = ceil(block_count / BPB)
    pub fn block_bitmap_blocks(&self) -> u32 {
        self.block_count.div_ceil(BITS_PER_BLOCK)
    }

    pub fn inode_bitmap_block(&self) -> BlockId {
        BLOCK_BITMAP_START_BLOCK_ID + self.block_bitmap_blocks()
    }

    pub fn inode_table_start(&self) -> BlockId {
        self.inode_bitmap_block() + 1
    }

    pub fn inode_table_blocks(&self) -> u32 {
        self.inode_count.div_ceil(INODES_PER_BLOCK)
    }

    /// 数据区的起始块号，比它小的块永远不会被分配给文件
    pub fn data_start(&self) -> BlockId {
        self.inode_table_start() + self.inode_table_blocks()
    }

    pub fn data_blocks(&self) -> u32 {
        self.block_count - self.data_start()
    }

    pub fn is_data_block(&self, id: BlockId) -> bool {
        id >= self.data_start() && id < self.block_count
    }

    // 记录块 id 分配状态的位图块
    pub fn bitmap_block_of(&self, id: BlockId) -> BlockId {
        BLOCK_BITMAP_START_BLOCK_ID + id / BITS_PER_BLOCK
    }

    // inode 所在的 inode 表块，以及它在块内的槽位
    pub fn inode_location(&self, inum: InodeNum) -> (BlockId, usize) {
        (
            self.inode_table_start() + inum / INODES_PER_BLOCK,
            (inum % INODES_PER_BLOCK) as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_matches_reference_disk() {
        let g = Geometry::default();
        assert_eq!(g.block_count, 32768);
        assert_eq!(INODE_SIZE, 424);
        assert_eq!(INODES_PER_BLOCK, 1);
        assert_eq!(g.block_bitmap_blocks(), 8);
        assert_eq!(g.inode_bitmap_block(), 10);
        assert_eq!(g.inode_table_start(), 11);
        assert_eq!(g.data_start(), 11 + 1024);
        assert_eq!(MAX_FILE_SIZE, 228 * 512);
    }

    #[test]
    fn small_disk_rounds_bitmap_up() {
        let g = Geometry::new(1024, 64).unwrap();
        assert_eq!(g.block_bitmap_blocks(), 1);
        assert_eq!(g.inode_bitmap_block(), 3);
        assert_eq!(g.data_start(), 4 + 64);
        assert!(!g.is_data_block(g.data_start() - 1));
        assert!(g.is_data_block(g.data_start()));
        assert!(!g.is_data_block(1024));
        assert_eq!(g.inode_location(5), (4 + 5, 0));
    }

    #[test]
    fn largest_disk_fits_the_size_field() {
        let max_blocks = (u32::MAX as u64 / BLOCK_SIZE as u64) as u32;
        let g = Geometry::new(max_blocks, 1024).unwrap();
        assert_eq!(g.disk_size(), max_blocks as u64 * BLOCK_SIZE as u64);
        assert!(Geometry::new(max_blocks + 1, 1024).is_err());
    }

    #[test]
    fn rejects_impossible_geometries() {
        assert!(matches!(
            Geometry::new(1024, 1),
            Err(FileSystemError::InvalidGeometry(_))
        ));
        assert!(matches!(
            Geometry::new(1 << 20, BITS_PER_BLOCK + 1),
            Err(FileSystemError::InvalidGeometry(_))
        ));
        assert!(matches!(
            Geometry::new(1 << 23, 1024),
            Err(FileSystemError::InvalidGeometry(_))
        ));
        assert!(matches!(
            Geometry::new(40, 64),
            Err(FileSystemError::InvalidGeometry(_))
        ));
    }
}
