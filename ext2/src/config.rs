//! Runtime options for filesystem sessions

use crate::types::S_IFREG;

/// Options applied when a session is opened
///
/// The default `wall_clock` has no time source and returns 0. Embedders
/// running on filesystems without a clock must supply one (for example
/// the CMOS RTC), or new inodes are stamped with time 0.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Open the filesystem read/write
    pub read_write: bool,

    /// Directory expansions allowed before a create gives up with
    /// `Error::DirectoryFull`
    pub dir_expansion_retries: u32,

    /// Mode given to files created by `cp`
    pub copy_mode: u16,

    /// Clock used for inode timestamps when the filesystem has none;
    /// the default returns 0
    pub wall_clock: fn() -> u32,
}

fn no_clock() -> u32 {
    0
}

impl Default for Options {
    fn default() -> Self {
        Self {
            // File reads go through write-capable handles too
            read_write: true,
            dir_expansion_retries: 1,
            copy_mode: S_IFREG | 0o755,
            wall_clock: no_clock,
        }
    }
}
