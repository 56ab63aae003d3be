//! Firmware disk access
//!
//! The firmware exposes drives by BIOS number (0x80 is the first hard
//! drive). `BiosDrive` binds one drive number to a `DiskServices`
//! implementation and presents it as a `gpt_disk_io::BlockIo` device with
//! 512-byte blocks, so the partition scanner and the block channel only
//! ever talk to `BlockIo`.

pub mod geometry;
pub mod partition;

pub use geometry::{DriveGeometry, DriveParameters, EddParameters, GeometrySource};
pub use partition::{parse_device, resolve_partition, PartitionDescriptor, PartitionScanner, PartitionSlot};

use crate::types::SECTOR_SIZE;
use core::fmt;
use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};

/// BIOS number of the first hard drive
pub const FIRST_HARD_DRIVE: u8 = 0x80;

/// Synchronous firmware disk services
pub trait DiskServices {
    /// Transfer error type
    type Error: fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Query drive parameters; failure carries the raw firmware status
    fn drive_parameters(&mut self, drive: u8) -> core::result::Result<DriveParameters, u16>;

    /// Read `dst.len() / 512` sectors starting at absolute `lba`
    fn read_sectors(&mut self, drive: u8, lba: u64, dst: &mut [u8]) -> core::result::Result<(), Self::Error>;

    /// Write `src.len() / 512` sectors starting at absolute `lba`
    fn write_sectors(&mut self, drive: u8, lba: u64, src: &[u8]) -> core::result::Result<(), Self::Error>;
}

/// Error type for BIOS drive operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveError<E> {
    /// Drive parameter query failed
    Status(u16),
    /// Buffer is not a whole number of sectors
    Unaligned(usize),
    /// Sector transfer failed
    Transfer(E),
}

impl<E: fmt::Display> fmt::Display for DriveError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "BIOS disk status 0x{:X}", status),
            Self::Unaligned(len) => write!(f, "buffer of {} bytes is not sector aligned", len),
            Self::Transfer(err) => write!(f, "BIOS disk transfer failed: {}", err),
        }
    }
}

/// One physical drive, as a `BlockIo` device with 512-byte blocks
pub struct BiosDrive<D> {
    services: D,
    number: u8,
}

impl<D: DiskServices> BiosDrive<D> {
    /// Bind a drive number to the firmware services
    pub fn new(services: D, number: u8) -> Self {
        Self { services, number }
    }

    /// BIOS drive number
    pub fn number(&self) -> u8 {
        self.number
    }

    /// Query the firmware for this drive's parameters
    pub fn query_parameters(&mut self) -> core::result::Result<DriveParameters, u16> {
        self.services.drive_parameters(self.number)
    }

    /// Release the drive, returning the firmware services
    pub fn into_services(self) -> D {
        self.services
    }

    fn check_aligned(len: usize) -> core::result::Result<(), DriveError<D::Error>> {
        if len % SECTOR_SIZE != 0 {
            return Err(DriveError::Unaligned(len));
        }
        Ok(())
    }
}

impl<D: DiskServices> BlockIo for BiosDrive<D> {
    type Error = DriveError<D::Error>;

    fn block_size(&self) -> BlockSize {
        BlockSize::BS_512
    }

    fn num_blocks(&mut self) -> core::result::Result<u64, Self::Error> {
        let params = self.query_parameters().map_err(DriveError::Status)?;
        Ok(DriveGeometry::new(self.number, params).total_sectors())
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> core::result::Result<(), Self::Error> {
        Self::check_aligned(dst.len())?;
        self.services
            .read_sectors(self.number, start_lba.0, dst)
            .map_err(DriveError::Transfer)
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> core::result::Result<(), Self::Error> {
        Self::check_aligned(src.len())?;
        self.services
            .write_sectors(self.number, start_lba.0, src)
            .map_err(DriveError::Transfer)
    }

    fn flush(&mut self) -> core::result::Result<(), Self::Error> {
        // BIOS transfers are unbuffered
        Ok(())
    }
}
