//! Inspect a FAT32 disk image without mounting it in the kernel.
//!
//! `vfat_dump disk.img ls /DOCS` lists a directory, `stat` prints
//! attributes, `cat` writes file bytes to stdout and `tree` walks everything
//! below a directory.

mod logger;

use std::fs::File;
use std::io::Write;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use vfat::{MountOptions, Vfat};
use vfat_api_types::FileKind;

#[derive(Parser)]
#[command(about = "Read-only inspection of FAT32 disk images")]
struct Cli {
    /// Disk image or block device holding the volume
    image: PathBuf,

    /// Log more; repeat for debug and trace output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List a directory
    Ls(PathArgs),
    /// Print the attributes of a file or directory
    Stat(PathArgs),
    /// Write a file's contents to stdout
    Cat(CatArgs),
    /// Recursively list a directory
    Tree(PathArgs),
}

#[derive(Args)]
struct PathArgs {
    #[arg(default_value = "/")]
    path: String,
}

#[derive(Args)]
struct CatArgs {
    path: String,

    /// Byte offset to start at
    #[arg(long, default_value_t = 0)]
    offset: u64,

    /// Maximum number of bytes to write
    #[arg(long, value_name = "BYTES")]
    length: Option<u64>,
}

const CAT_CHUNK: usize = 64 * 1024;
// A directory that lists one of its ancestors would otherwise recurse forever.
const MAX_TREE_DEPTH: usize = 64;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose).context("failed to install logger")?;

    let file = File::open(&cli.image).with_context(|| format!("failed to open {}", cli.image.display()))?;
    let meta = file.metadata().context("failed to stat image")?;
    let mount_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() as i64);
    let options = MountOptions::new().owner(meta.uid(), meta.gid()).mount_time(mount_time);

    let vfat = Vfat::mount(file, options)
        .with_context(|| format!("failed to mount {}", cli.image.display()))?;

    match cli.command.unwrap_or(Command::Tree(PathArgs { path: "/".into() })) {
        Command::Ls(args) => ls(&vfat, &args.path),
        Command::Stat(args) => stat(&vfat, &args.path),
        Command::Cat(args) => cat(&vfat, &args),
        Command::Tree(args) => tree(&vfat, &args.path),
    }
}

fn ls(vfat: &Vfat<File>, path: &str) -> Result<()> {
    let entries = vfat.listdir(path).with_context(|| format!("cannot list {path}"))?;
    for entry in &entries {
        let name = String::from_utf8_lossy(entry.name());
        match entry.kind {
            FileKind::Directory => println!("{:>10}  {name}/", "<DIR>"),
            FileKind::File => println!("{:>10}  {name}", entry.size),
        }
    }
    Ok(())
}

fn stat(vfat: &Vfat<File>, path: &str) -> Result<()> {
    let st = vfat.getattr(path).with_context(|| format!("cannot stat {path}"))?;
    println!("  path: {path}");
    println!("  kind: {:?}", st.kind);
    println!("  size: {}", st.size);
    println!("blocks: {}", st.blocks);
    println!("  mode: {:o}", st.st_mode());
    println!(" owner: {}:{}", st.uid, st.gid);
    println!(" atime: {}", st.atime);
    println!(" mtime: {}", st.mtime);
    println!(" ctime: {}", st.ctime);
    Ok(())
}

fn cat(vfat: &Vfat<File>, args: &CatArgs) -> Result<()> {
    let st = vfat.getattr(&args.path).with_context(|| format!("cannot open {}", args.path))?;
    if st.kind == FileKind::Directory {
        bail!("{} is a directory", args.path);
    }
    let end = args.length.map_or(st.size, |len| st.size.min(args.offset.saturating_add(len)));

    let mut stdout = std::io::stdout().lock();
    let mut buf = vec![0u8; CAT_CHUNK];
    let mut offset = args.offset;
    while offset < end {
        let want = ((end - offset) as usize).min(CAT_CHUNK);
        let n = vfat
            .read(&args.path, offset, &mut buf[..want])
            .with_context(|| format!("read of {} failed at offset {offset}", args.path))?;
        if n == 0 {
            log::warn!("{}: data ends at {offset} of {end} bytes", args.path);
            break;
        }
        stdout.write_all(&buf[..n]).context("failed to write to stdout")?;
        offset += n as u64;
    }
    stdout.flush().context("failed to flush stdout")?;
    Ok(())
}

fn tree(vfat: &Vfat<File>, path: &str) -> Result<()> {
    println!("{path}");
    walk(vfat, path, 1)
}

fn walk(vfat: &Vfat<File>, dir: &str, depth: usize) -> Result<()> {
    if depth > MAX_TREE_DEPTH {
        bail!("{dir}: directories nested deeper than {MAX_TREE_DEPTH}, giving up");
    }
    let entries = vfat.listdir(dir).with_context(|| format!("cannot list {dir}"))?;
    for entry in &entries {
        let name = String::from_utf8_lossy(entry.name());
        if name == "." || name == ".." {
            continue;
        }
        let indent = "  ".repeat(depth);
        match entry.kind {
            FileKind::Directory => {
                println!("{indent}{name}/");
                let child = format!("{}/{name}", dir.trim_end_matches('/'));
                walk(vfat, &child, depth + 1)?;
            }
            FileKind::File => println!("{indent}{name} ({} bytes)", entry.size),
        }
    }
    Ok(())
}
