use chfs_store::{
    disk::init::reformat,
    fs::config::{DISK_PATH, MAX_FILE_SIZE},
    utils::format_timestamp,
    FileDisk, FileSystem, InodeNum, InodeType,
};
use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;

#[derive(Debug)]
pub enum Command {
    Help,
    Ls,
    Df,
    Create(InodeType),
    Write(InodeNum, String),
    Fill(InodeNum, usize, u8),
    Read(InodeNum),
    Stat(InodeNum),
    Rm(InodeNum),
    Format,
    Exit,
}

pub fn execute_command(
    cmd: &Command,
    fs: &mut FileSystem<FileDisk>,
) -> Result<(), Box<dyn Error>> {
    match cmd {
        Command::Help => print_help(),
        Command::Ls => {
            for (inum, attr) in fs.list_inodes()? {
                let icon = match attr.inode_type {
                    InodeType::Directory => "📁",
                    InodeType::Symlink => "🔗",
                    _ => "📄",
                };
                println!(
                    "{}  {:>5}  {:<9} {:>7} bytes",
                    icon,
                    inum.to_string().cyan(),
                    attr.inode_type.name(),
                    attr.size
                );
            }
        }
        Command::Df => {
            let stats = fs.statfs()?;
            println!(
                "{}\n{}: {} / {} free (of {} total)\n{}: {} / {} free",
                "💽 Disk Usage".bright_yellow().bold(),
                "Data blocks".blue(),
                stats.free_blocks,
                stats.data_blocks,
                stats.total_blocks,
                "Inodes".blue(),
                stats.free_inodes,
                stats.total_inodes
            );
        }
        Command::Create(inode_type) => {
            let inum = fs.create(*inode_type)?;
            println!(
                "📝 Created {} with inode {}",
                inode_type.name(),
                inum.to_string().green()
            );
        }
        Command::Write(inum, content) => {
            fs.put(*inum, content.as_bytes())?;
            println!("✏️  Wrote {} bytes to inode {}", content.len(), inum.to_string().cyan());
        }
        Command::Fill(inum, len, byte) => {
            let Some(data) = fill_buffer(*len, *byte) else {
                println!(
                    "{}",
                    format!("⚠️  Files are limited to {} bytes", MAX_FILE_SIZE).yellow()
                );
                return Ok(());
            };
            fs.put(*inum, &data)?;
            println!(
                "✏️  Filled inode {} with {} bytes of {:#04x}",
                inum.to_string().cyan(),
                len,
                byte
            );
        }
        Command::Read(inum) => {
            let data = fs.get(*inum)?;
            match std::str::from_utf8(&data) {
                Ok(text) => println!("{}", text),
                Err(_) => {
                    let preview: Vec<String> =
                        data.iter().take(32).map(|b| format!("{:02x}", b)).collect();
                    println!(
                        "{} {}{}",
                        format!("({} bytes of binary data)", data.len()).bright_black(),
                        preview.join(" "),
                        if data.len() > 32 { " ..." } else { "" }
                    );
                }
            }
        }
        Command::Stat(inum) => {
            let attr = fs.getattr(*inum)?;
            println!(
                "{}\n{}: {}\n{}: {}\n{}: {} bytes\n{}: {}\n{}: {}\n{}: {}\n",
                "📊 Inode Info".bright_yellow().bold(),
                "Inode".blue(),
                inum,
                "Type".blue(),
                attr.inode_type.name(),
                "Size".blue(),
                attr.size,
                "Access".blue(),
                format_timestamp(attr.atime),
                "Modify".blue(),
                format_timestamp(attr.mtime),
                "Create".blue(),
                format_timestamp(attr.ctime)
            );
        }
        Command::Rm(inum) => {
            fs.remove(*inum)?;
            println!("❌ Removed inode {}", inum.to_string().red());
        }
        Command::Format => {
            let confirmed = Confirm::new()
                .with_prompt("This erases every file on the disk. Continue?")
                .default(false)
                .interact()?;
            if !confirmed {
                println!("{}", "Format cancelled.".bright_black());
                return Ok(());
            }

            println!("💾 Formatting virtual disk...");
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message("writing superblock and root directory");
            *fs = reformat(DISK_PATH)?;
            pb.finish_with_message("✅ Disk formatted successfully!");
        }
        Command::Exit => println!("{}", "👋 Exiting chfs shell...".yellow().bold()),
    }

    Ok(())
}

// 超过单文件上限时不构造缓冲区
fn fill_buffer(len: usize, byte: u8) -> Option<Vec<u8>> {
    (len <= MAX_FILE_SIZE).then(|| vec![byte; len])
}

fn print_help() {
    println!("{}", "📘 chfs Commands".bright_cyan().bold());
    println!(
        "{}",
        "
  ls                        List live inodes
  df                        Show free blocks and inodes
  create [file|dir|symlink] Allocate a new inode
  write <inum> <text>       Replace inode contents with text
  fill <inum> <len> [byte]  Replace inode contents with len copies of byte
  read <inum>               Print inode contents
  stat <inum>               Show inode attributes
  rm <inum>                 Remove inode and free its blocks
  format                    Format virtual disk
  help                      Show this help message
  exit                      Quit the shell
"
        .bright_black()
    );
}
