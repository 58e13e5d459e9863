use std::{
    fs::{File, OpenOptions},
    io::{Error, ErrorKind, Read, Result, Seek, SeekFrom, Write},
    path::Path,
    sync::Mutex,
};

use crate::disk::{
    block_device::BlockDevice,
    types::{Block, BlockId, BLOCK_SIZE},
};

/// 以宿主机上的磁盘镜像文件作为后端的块设备
#[derive(Debug)]
pub struct FileDisk {
    file: Mutex<File>,
    block_count: u32,
}

impl FileDisk {
    /// 打开（必要时创建）磁盘镜像，并保证其长度至少为 `block_count` 个块
    pub fn open<P: AsRef<Path>>(path: P, block_count: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        let disk_size = block_count as u64 * BLOCK_SIZE as u64;
        if file.metadata()?.len() < disk_size {
            log::info!(
                "allocating {} bytes for disk image {}",
                disk_size,
                path.as_ref().display()
            );
            file.set_len(disk_size)?;
        }

        Ok(Self {
            file: Mutex::new(file),
            block_count,
        })
    }

    fn check(&self, block_id: BlockId) -> Result<()> {
        if block_id >= self.block_count {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("block {} out of range", block_id),
            ));
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|_| Error::new(ErrorKind::Other, "disk image lock poisoned"))
    }
}

impl BlockDevice for FileDisk {
    fn read_block(&self, block_id: BlockId, buf: &mut Block) -> Result<()> {
        self.check(block_id)?;
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(block_id as u64 * BLOCK_SIZE as u64))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&self, block_id: BlockId, buf: &Block) -> Result<()> {
        self.check(block_id)?;
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(block_id as u64 * BLOCK_SIZE as u64))?;
        file.write_all(buf)?;
        Ok(())
    }

    fn block_count(&self) -> u32 {
        self.block_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");

        {
            let disk = FileDisk::open(&path, 16).unwrap();
            let mut block = [0u8; BLOCK_SIZE];
            block[0] = 0x5A;
            block[BLOCK_SIZE - 1] = 0xA5;
            disk.write_block(7, &block).unwrap();
        }

        let disk = FileDisk::open(&path, 16).unwrap();
        let mut block = [0u8; BLOCK_SIZE];
        disk.read_block(7, &mut block).unwrap();
        assert_eq!(block[0], 0x5A);
        assert_eq!(block[BLOCK_SIZE - 1], 0xA5);
        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            16 * BLOCK_SIZE as u64
        );
    }

    #[test]
    fn out_of_range_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let disk = FileDisk::open(dir.path().join("disk.img"), 4).unwrap();
        let mut block = [0u8; BLOCK_SIZE];
        let err = disk.read_block(4, &mut block).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
