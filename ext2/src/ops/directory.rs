//! Directory listing and creation

use super::{check_leaf, resolve_parent, split_path, with_dir_expansion};
use crate::error::{Error, Result};
use crate::library::FsLibrary;
use crate::session::Session;
use crate::types::{is_dir_mode, Ino};
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use log::{error, info};

/// Size column of a listing line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySize {
    /// Entry is a directory
    Directory,
    /// Regular entry of the given length
    Bytes(u64),
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirListing {
    /// Entry name, lossily decoded
    pub name: String,
    /// Inode number
    pub inode: Ino,
    /// File mode
    pub mode: u16,
    /// Owner uid
    pub uid: u16,
    /// Group id
    pub gid: u16,
    /// Directory marker or byte size
    pub size: EntrySize,
}

impl DirListing {
    /// Whether this entry is a directory
    pub fn is_dir(&self) -> bool {
        self.size == EntrySize::Directory
    }
}

impl fmt::Display for DirListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' (inode={}, mode={:06o}, uid={}, gid={}, ",
            self.name, self.inode, self.mode, self.uid, self.gid
        )?;
        match self.size {
            EntrySize::Directory => write!(f, "dir)"),
            EntrySize::Bytes(n) => write!(f, "{} bytes)", n),
        }
    }
}

/// List the entries of the directory at `path`
///
/// Unused slots (inode 0) are skipped. A failure to read any entry's
/// inode aborts the whole listing.
pub fn list_directory<L: FsLibrary>(session: &mut Session<L>, path: &str) -> Result<Vec<DirListing>> {
    let (root, cwd) = (session.root(), session.cwd());
    let fs = session.library_mut();

    let dir = fs.namei(root, cwd, path).map_err(|e| {
        error!("\"{}\" does not exist", path);
        Error::Library(e)
    })?;
    fs.check_directory(dir).map_err(|e| {
        error!("\"{}\" is not a directory", path);
        Error::Library(e)
    })?;

    let mut cursor = fs.dir_open(dir).map_err(|e| {
        error!("Can't iterate \"{}\": {}", path, e);
        Error::Library(e)
    })?;

    let mut entries = Vec::new();
    while let Some(entry) = fs.dir_next(&mut cursor) {
        let entry = entry.map_err(Error::Library)?;
        if entry.inode == 0 {
            continue;
        }

        let inode = fs.read_inode(entry.inode).map_err(|e| {
            error!("Can't read inode {}: {}", entry.inode, e);
            Error::Library(e)
        })?;

        entries.push(DirListing {
            name: String::from_utf8_lossy(entry.name_bytes()).into_owned(),
            inode: entry.inode,
            mode: inode.mode,
            uid: inode.uid,
            gid: inode.gid,
            size: if is_dir_mode(inode.mode) {
                EntrySize::Directory
            } else {
                EntrySize::Bytes(inode.size())
            },
        });
    }

    Ok(entries)
}

/// Create the directory `path`
///
/// The parent is resolved from everything before the last separator. If
/// the parent has no room for the entry it is expanded and the creation
/// retried, up to `Options::dir_expansion_retries` times.
pub fn make_directory<L: FsLibrary>(session: &mut Session<L>, path: &str) -> Result<()> {
    session.require_writable()?;

    let (parent, name) = split_path(path);
    check_leaf(name)?;
    let parent_ino = resolve_parent(session, parent)?;

    let expansions = with_dir_expansion(session, parent_ino, |fs| fs.mkdir(parent_ino, name)).map_err(|e| {
        error!("Can't create directory \"{}\": {}", path, e);
        e
    })?;

    info!("Created directory \"{}\" ({} expansion(s))", path, expansions);
    Ok(())
}
