//! Command front end
//!
//! `<program> /dev/hd<letter><n> <cmd> <args...>` with the commands
//! `cat`, `cp`, `ls`, `mkdir` and `rm`. Output goes to any
//! `core::fmt::Write` console.

use crate::channel::SectorChannel;
use crate::config::Options;
use crate::disk::{BiosDrive, DiskServices};
use crate::error::Result;
use crate::library::FsLibrary;
use crate::ops;
use crate::session::{Mount, Session};
use crate::types::OpenFlags;
use alloc::format;
use alloc::string::String;
use core::fmt::{self, Write};

/// Exit status: success, including reported operation failures
pub const EXIT_OK: i32 = 0;
/// Exit status: the device or filesystem could not be opened
pub const EXIT_OPEN_FAILED: i32 = 1;
/// Exit status: malformed command line
pub const EXIT_USAGE: i32 = 2;

/// A parsed command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Print a file
    Cat(&'a str),
    /// Copy a file within the filesystem
    Copy {
        /// Source path
        from: &'a str,
        /// Target path
        to: &'a str,
    },
    /// List a directory
    List(&'a str),
    /// Create a directory
    MakeDir(&'a str),
    /// Remove a file
    Remove(&'a str),
}

impl Command<'_> {
    /// Whether the command changes the filesystem
    pub fn mutates(&self) -> bool {
        matches!(self, Self::Copy { .. } | Self::MakeDir(_) | Self::Remove(_))
    }
}

/// A full command line: device plus command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// Device identifier
    pub device: &'a str,
    /// Command to run
    pub command: Command<'a>,
}

/// Why a command line was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// Fewer than device, command and one argument
    TooFewArgs,
    /// `cp` without a target
    MissingTarget,
    /// Command name not recognized
    UnknownCommand(String),
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewArgs => write!(f, "missing arguments"),
            Self::MissingTarget => write!(f, "'cp' missing target name"),
            Self::UnknownCommand(cmd) => write!(f, "Unknown command '{}'", cmd),
        }
    }
}

/// Parse `args` (program name first)
pub fn parse_args<'a>(args: &[&'a str]) -> core::result::Result<Invocation<'a>, UsageError> {
    let (device, name, target) = match args {
        [_, device, name, target, ..] => (*device, *name, *target),
        _ => return Err(UsageError::TooFewArgs),
    };

    let command = match name {
        "cat" => Command::Cat(target),
        "cp" => match args.get(4) {
            Some(&to) if args.len() == 5 => Command::Copy { from: target, to },
            _ => return Err(UsageError::MissingTarget),
        },
        "ls" => Command::List(target),
        "mkdir" => Command::MakeDir(target),
        "rm" => Command::Remove(target),
        other => return Err(UsageError::UnknownCommand(other.into())),
    };

    Ok(Invocation { device, command })
}

/// Usage text for `program`
pub fn usage(program: &str) -> String {
    format!(
        "Usage: {p} /dev/hd[a-z][1-9] cmd cmd-options\n\
         examples:\n \
         {p} /dev/hdb1 cat /root/file.txt\n \
         {p} /dev/hdb1 cp /root/file.txt /root/newfile.txt\n \
         {p} /dev/hdb1 ls /boot\n \
         {p} /dev/hdb1 mkdir /foo\n \
         {p} /dev/hdb1 rm /root/file.txt\n",
        p = program
    )
}

/// Run a command line against the firmware disk `services`
///
/// Returns the process exit status.
pub fn run<D, L, W>(services: D, args: &[&str], options: Options, out: &mut W) -> i32
where
    D: DiskServices,
    L: FsLibrary<Channel = SectorChannel<BiosDrive<D>>>,
    W: Write,
{
    execute::<D, L, W>(services, args, options, out).unwrap_or(EXIT_OK)
}

fn execute<D, L, W>(services: D, args: &[&str], options: Options, out: &mut W) -> core::result::Result<i32, fmt::Error>
where
    D: DiskServices,
    L: FsLibrary<Channel = SectorChannel<BiosDrive<D>>>,
    W: Write,
{
    let program = args.first().copied().unwrap_or("ext2");
    let invocation = match parse_args(args) {
        Ok(invocation) => invocation,
        Err(UsageError::TooFewArgs) => {
            out.write_str(&usage(program))?;
            return Ok(EXIT_USAGE);
        }
        Err(e) => {
            writeln!(out, "ERR: {}", e)?;
            out.write_str(&usage(program))?;
            return Ok(EXIT_USAGE);
        }
    };
    let device = invocation.device;

    let flags = if options.read_write { OpenFlags::RW } else { OpenFlags::empty() };
    let channel = match SectorChannel::open(services, device, flags) {
        Ok(channel) => channel,
        Err(e) => {
            writeln!(out, "ERR: Can't open '{}' ({})", device, e)?;
            return Ok(EXIT_OPEN_FAILED);
        }
    };

    let mut mount = Mount::<L>::new();
    let session = match mount.open(channel, options) {
        Ok(session) => session,
        Err(e) => {
            writeln!(out, "ERR: Can't open '{}' ({})", device, e)?;
            return Ok(EXIT_OPEN_FAILED);
        }
    };

    writeln!(
        out,
        "'{}' has a valid superblock and is mounted {}",
        device,
        if session.is_read_write() { "Read/Write" } else { "Read Only" }
    )?;

    let write_changes = dispatch(session, invocation.command, out)?;

    match mount.close(write_changes) {
        Ok(()) => writeln!(out, "Filesystem closed.")?,
        Err(e) => writeln!(out, "ERR: could not close filesystem! ({})", e)?,
    }

    Ok(EXIT_OK)
}

/// Run one command; returns whether changes should be written back
fn dispatch<L: FsLibrary, W: Write>(
    session: &mut Session<L>,
    command: Command<'_>,
    out: &mut W,
) -> core::result::Result<bool, fmt::Error> {
    if command.mutates() {
        if let Err(e) = session.load_bitmaps() {
            writeln!(out, "ERR: Could not load bitmaps ({})", e)?;
            return Ok(false);
        }
    }

    match command {
        Command::Cat(path) => {
            writeln!(out, "Displaying '{}' file..", path)?;
            match ops::load_file(session, path) {
                Ok(data) => {
                    writeln!(out, "'{}' is {} bytes", path, data.len())?;
                    out.write_str(&String::from_utf8_lossy(&data))?;
                }
                Err(e) => writeln!(out, "ERR: Can't cat '{}' ({})", path, e)?,
            }
            Ok(false)
        }
        Command::Copy { from, to } => {
            writeln!(out, "Copying '{}' to '{}'", from, to)?;
            let copied = copy(session, from, to);
            report(out, copied, || format!("'{}' has been copied to '{}'", from, to), || format!("Could not copy '{}'", from))
        }
        Command::List(path) => {
            writeln!(out, "Displaying '{}' dir..", path)?;
            match ops::list_directory(session, path) {
                Ok(entries) => {
                    for entry in &entries {
                        writeln!(out, "{}", entry)?;
                    }
                }
                Err(e) => writeln!(out, "ERR: Can't list '{}' ({})", path, e)?,
            }
            Ok(false)
        }
        Command::MakeDir(path) => {
            writeln!(out, "Making '{}' dir..", path)?;
            let made = ops::make_directory(session, path);
            report(out, made, || format!("Created '{}'", path), || format!("Could not mkdir '{}'", path))
        }
        Command::Remove(path) => {
            writeln!(out, "Removing '{}' file..", path)?;
            let removed = ops::delete_file(session, path);
            report(out, removed, || format!("'{}' has been deleted", path), || format!("Could not delete '{}'", path))
        }
    }
}

fn copy<L: FsLibrary>(session: &mut Session<L>, from: &str, to: &str) -> Result<()> {
    let data = ops::load_file(session, from)?;
    let mode = session.options().copy_mode;
    ops::write_file(session, to, &data, mode)
}

fn report<W, S, F>(out: &mut W, result: Result<()>, success: S, failure: F) -> core::result::Result<bool, fmt::Error>
where
    W: Write,
    S: FnOnce() -> String,
    F: FnOnce() -> String,
{
    match result {
        Ok(()) => {
            writeln!(out, "{}", success())?;
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "ERR: {} ({})", failure(), e)?;
            Ok(false)
        }
    }
}
