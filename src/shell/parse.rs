use chfs_store::{InodeNum, InodeType};

use crate::shell::command::Command;

fn parse_inum(arg: Option<&&str>) -> Option<InodeNum> {
    arg?.parse().ok()
}

fn parse_byte(arg: &str) -> Option<u8> {
    match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => arg.parse().ok(),
    }
}

fn parse_type(arg: &str) -> Option<InodeType> {
    match arg {
        "file" => Some(InodeType::File),
        "dir" | "directory" => Some(InodeType::Directory),
        "symlink" | "link" => Some(InodeType::Symlink),
        _ => None,
    }
}

// 跳过前 n 个词，原样返回剩余文本（保留内部的空白）
fn rest_after_tokens(input: &str, n: usize) -> &str {
    let is_space = |c: char| c.is_ascii_whitespace();
    let mut rest = input.trim_start_matches(is_space);
    for _ in 0..n {
        let end = rest.find(is_space).unwrap_or(rest.len());
        rest = rest[end..].trim_start_matches(is_space);
    }
    rest.trim_end_matches(is_space)
}

pub fn parse_command(input: &str) -> Option<Command> {
    let tokens: Vec<&str> = input.split_ascii_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let cmd = tokens[0];
    let args = &tokens[1..];

    match cmd {
        "help" => Some(Command::Help),
        "ls" => Some(Command::Ls),
        "df" => Some(Command::Df),
        "create" => match args.first() {
            Some(kind) => parse_type(kind).map(Command::Create),
            None => Some(Command::Create(InodeType::File)),
        },
        "write" => {
            if args.len() >= 2 {
                let text = rest_after_tokens(input, 2);
                Some(Command::Write(parse_inum(args.first())?, text.to_string()))
            } else {
                None
            }
        }
        "fill" => {
            let inum = parse_inum(args.first())?;
            let len = args.get(1)?.parse().ok()?;
            let byte = match args.get(2) {
                Some(arg) => parse_byte(arg)?,
                None => 0,
            };
            Some(Command::Fill(inum, len, byte))
        }
        "read" => parse_inum(args.first()).map(Command::Read),
        "stat" => parse_inum(args.first()).map(Command::Stat),
        "rm" => parse_inum(args.first()).map(Command::Rm),
        "format" => Some(Command::Format),
        "exit" | "quit" => Some(Command::Exit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inode_commands() {
        assert!(matches!(parse_command("read 3"), Some(Command::Read(3))));
        assert!(matches!(parse_command("  rm 12 "), Some(Command::Rm(12))));
        assert!(matches!(
            parse_command("create dir"),
            Some(Command::Create(InodeType::Directory))
        ));
        assert!(matches!(
            parse_command("create"),
            Some(Command::Create(InodeType::File))
        ));
        match parse_command("write 2 hello  world") {
            Some(Command::Write(2, text)) => assert_eq!(text, "hello  world"),
            other => panic!("unexpected {:?}", other),
        }
        match parse_command("  write\t7   a \t b  ") {
            Some(Command::Write(7, text)) => assert_eq!(text, "a \t b"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_fill_byte_in_hex_or_decimal() {
        assert!(matches!(
            parse_command("fill 2 1000 0xAB"),
            Some(Command::Fill(2, 1000, 0xAB))
        ));
        assert!(matches!(
            parse_command("fill 2 10 7"),
            Some(Command::Fill(2, 10, 7))
        ));
        assert!(matches!(parse_command("fill 2 10"), Some(Command::Fill(2, 10, 0))));
        assert!(parse_command("fill 2 10 0x1FF").is_none());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_command("").is_none());
        assert!(parse_command("read").is_none());
        assert!(parse_command("read abc").is_none());
        assert!(parse_command("write 3").is_none());
        assert!(parse_command("create fifo").is_none());
        assert!(parse_command("mkdir x").is_none());
    }
}
