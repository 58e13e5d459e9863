use std::fmt;

use crate::{disk::BlockId, fs::config::InodeNum};

/// 存储引擎错误类型
#[derive(Debug)]
pub enum FileSystemError {
    Io(std::io::Error),                  // 底层 I/O 错误
    NotFound(InodeNum),                  // inode 号越界或 inode 处于空闲状态
    DiskFull,                            // 块位图已满
    InodeFull,                           // inode 位图已满
    TooLarge { size: usize, max: usize }, // 文件大小超过可表示的上限
    InvalidBlock(BlockId),               // 释放数据区以外的块
    InvalidArgument(String),             // 调用参数非法
    InvalidGeometry(String),             // 磁盘几何参数不可用
    Corrupted(String),                   // 磁盘内容损坏
}

impl FileSystemError {
    /// 块或 inode 耗尽
    pub fn is_out_of_space(&self) -> bool {
        matches!(self, Self::DiskFull | Self::InodeFull)
    }
}

impl From<std::io::Error> for FileSystemError {
    fn from(e: std::io::Error) -> Self {
        FileSystemError::Io(e)
    }
}

impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Disk I/O error: {}", e),
            Self::NotFound(inum) => write!(f, "Inode not found: {}", inum),
            Self::DiskFull => write!(f, "No free data block available"),
            Self::InodeFull => write!(f, "No free inode available"),
            Self::TooLarge { size, max } => {
                write!(f, "File size {} exceeds the limit of {} bytes", size, max)
            }
            Self::InvalidBlock(id) => write!(f, "Block {} is outside the data region", id),
            Self::InvalidArgument(desc) => write!(f, "Invalid argument: {}", desc),
            Self::InvalidGeometry(desc) => write!(f, "Invalid disk geometry: {}", desc),
            Self::Corrupted(desc) => write!(f, "File system corrupted: {}", desc),
        }
    }
}

// 支持链式错误，方便追踪底层原因
impl std::error::Error for FileSystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// 统一结果类型
pub type Result<T> = std::result::Result<T, FileSystemError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn out_of_space_covers_both_bitmaps() {
        assert!(FileSystemError::DiskFull.is_out_of_space());
        assert!(FileSystemError::InodeFull.is_out_of_space());
        assert!(!FileSystemError::NotFound(3).is_out_of_space());
    }

    #[test]
    fn io_errors_keep_their_source() {
        let err: FileSystemError =
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read").into();
        assert!(err.source().is_some());
        assert!(err.to_string().contains("short read"));
    }
}
