use std::{path::Path, sync::mpsc::Sender};

use crate::{
    disk::FileDisk,
    fs::{config::Geometry, error::Result, FileSystem},
};

/// 启动过程中发往前端的进度消息
#[derive(Debug)]
pub enum BootProgress {
    Step(&'static str),
    Progress(u64),
    Finished(Result<FileSystem<FileDisk>>),
}

/// 打开磁盘镜像：新镜像先格式化，已有镜像直接挂载
pub fn perform_disk_initialization<P: AsRef<Path>>(path: P, tx: Sender<BootProgress>) {
    let _ = tx.send(BootProgress::Step("🧠 Initializing virtual disk..."));
    let result = open_or_format(path.as_ref(), &tx);
    let _ = tx.send(BootProgress::Progress(100));
    let _ = tx.send(BootProgress::Finished(result));
}

fn open_or_format(path: &Path, tx: &Sender<BootProgress>) -> Result<FileSystem<FileDisk>> {
    let geometry = Geometry::default();
    let disk_exists = path.exists();

    let disk = FileDisk::open(path, geometry.block_count)?;
    let _ = tx.send(BootProgress::Progress(50));

    if disk_exists {
        let _ = tx.send(BootProgress::Step("⚙️  Mounting file system..."));
        FileSystem::mount(disk)
    } else {
        // 只有“明确是新磁盘”才格式化
        let _ = tx.send(BootProgress::Step(
            "🔧 No disk found, formatting new file system...",
        ));
        FileSystem::format(disk, geometry)
    }
}

/// 丢弃旧镜像，重新建立一个空文件系统
pub fn reformat<P: AsRef<Path>>(path: P) -> Result<FileSystem<FileDisk>> {
    let geometry = Geometry::default();
    if path.as_ref().exists() {
        std::fs::remove_file(path.as_ref())?;
    }
    let disk = FileDisk::open(path, geometry.block_count)?;
    FileSystem::format(disk, geometry)
}
