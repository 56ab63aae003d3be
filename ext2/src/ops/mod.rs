//! Path and mutation operations
//!
//! Every operation takes the session explicitly and resolves its paths
//! through the library's name lookup on each call; nothing is cached
//! between calls.

mod delete;
mod directory;
mod file;
mod txn;

pub use delete::delete_file;
pub use directory::{list_directory, make_directory, DirListing, EntrySize};
pub use file::{load_file, write_file};

use crate::error::{Error, LibError, LibResult, Result};
use crate::library::FsLibrary;
use crate::session::Session;
use crate::types::{Ino, NAME_LEN};
use log::{error, info};

/// Whether `path` resolves to an entry
pub fn exists<L: FsLibrary>(session: &mut Session<L>, path: &str) -> bool {
    let (root, cwd) = (session.root(), session.cwd());
    session.library_mut().namei(root, cwd, path).is_ok()
}

/// Whether `path` resolves to a directory
pub fn is_directory<L: FsLibrary>(session: &mut Session<L>, path: &str) -> bool {
    let (root, cwd) = (session.root(), session.cwd());
    let fs = session.library_mut();
    match fs.namei(root, cwd, path) {
        Ok(ino) => fs.check_directory(ino).is_ok(),
        Err(_) => false,
    }
}

/// Where the parent directory of a path lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent<'a> {
    /// No separator: the current directory
    Cwd,
    /// Only a leading separator: the root directory
    Root,
    /// Everything before the last separator
    Path(&'a str),
}

/// Split a path into its parent and final component
pub fn split_path(path: &str) -> (Parent<'_>, &str) {
    match path.rfind('/') {
        None => (Parent::Cwd, path),
        Some(0) => (Parent::Root, &path[1..]),
        Some(pos) => (Parent::Path(&path[..pos]), &path[pos + 1..]),
    }
}

pub(crate) fn check_leaf(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > NAME_LEN {
        error!("'{}' is not a valid name", name);
        return Err(Error::InvalidPath);
    }
    Ok(())
}

/// Resolve the parent half of a split path to a directory inode
pub(crate) fn resolve_parent<L: FsLibrary>(session: &mut Session<L>, parent: Parent<'_>) -> Result<Ino> {
    let (root, cwd) = (session.root(), session.cwd());
    match parent {
        Parent::Cwd => Ok(cwd),
        Parent::Root => Ok(root),
        Parent::Path(dir) => {
            let fs = session.library_mut();
            let ino = fs.namei(root, cwd, dir).map_err(|e| {
                error!("\"{}\" does not exist", dir);
                Error::Library(e)
            })?;
            fs.check_directory(ino).map_err(|e| {
                error!("\"{}\" is not a directory", dir);
                Error::Library(e)
            })?;
            Ok(ino)
        }
    }
}

/// Run a directory insertion, growing `parent` when it reports no space
///
/// Returns the number of expansions performed. Once the configured
/// number of expansions is used up, a further no-space result is
/// `Error::DirectoryFull`.
pub(crate) fn with_dir_expansion<L, F>(session: &mut Session<L>, parent: Ino, mut insert: F) -> Result<u32>
where
    L: FsLibrary,
    F: FnMut(&mut L) -> LibResult<()>,
{
    let retries = session.options().dir_expansion_retries;
    let mut expansions = 0;

    loop {
        match insert(session.library_mut()) {
            Ok(()) => return Ok(expansions),
            Err(LibError::DirNoSpace) if expansions < retries => {
                info!("expanding dir {}...", parent);
                session.library_mut().expand_dir(parent).map_err(|e| {
                    error!("Can't expand dir {}: {}", parent, e);
                    Error::Library(e)
                })?;
                expansions += 1;
            }
            Err(LibError::DirNoSpace) => {
                error!("dir {} still full after {} expansion(s)", parent, expansions);
                return Err(Error::DirectoryFull);
            }
            Err(e) => return Err(Error::Library(e)),
        }
    }
}
