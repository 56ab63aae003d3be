//! Partition discovery
//!
//! Maps a device identifier such as `/dev/hdb3` to a BIOS drive and a
//! partition number, then walks the MS-DOS partition table to locate that
//! partition. Partitions are numbered in the order the scan meets them,
//! starting at 1: every non-empty primary entry in table order whatever
//! its type byte. An extended container is numbered like any other entry
//! and the logical partitions of its EBR chain come right after it.

use super::{BiosDrive, DiskServices, DriveGeometry, FIRST_HARD_DRIVE};
use crate::error::{Error, Result};
use crate::types::SECTOR_SIZE;
use alloc::string::String;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;
use log::{error, info, warn};

/// Offset of the partition table inside an MBR or EBR
pub const PARTITION_TABLE_OFFSET: usize = 446;

/// Size of one partition table entry
pub const PARTITION_ENTRY_SIZE: usize = 16;

/// Boot signature at the end of an MBR or EBR
pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// Upper bound on the EBR chain length
pub const MAX_EBR_CHAIN: u32 = 128;

/// Partition this channel was opened against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDescriptor {
    /// Device identifier the partition was resolved from
    pub device: String,
    /// BIOS drive number
    pub drive: u8,
    /// Partition number (1 based, scan order)
    pub index: u32,
    /// Absolute LBA of the partition's first sector
    pub start_lba: u64,
    /// Length in sectors
    pub length: u64,
    /// Cylinder count of the drive
    pub cylinders: u32,
    /// Head count of the drive
    pub heads: u32,
    /// Sectors per track of the drive
    pub sectors: u32,
}

/// Partition entry met during a table scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSlot {
    /// Scan-order number, starting at 1
    pub ordinal: u32,
    /// Absolute LBA of the first sector
    pub start_lba: u64,
    /// Length in sectors
    pub length: u64,
    /// Partition type byte
    pub os_type: u8,
    /// Active flag set
    pub bootable: bool,
}

#[derive(Debug, Clone, Copy)]
struct RawEntry {
    active: u8,
    os_type: u8,
    start: u32,
    length: u32,
}

impl RawEntry {
    fn parse(sector: &[u8], index: usize) -> Self {
        let off = PARTITION_TABLE_OFFSET + index * PARTITION_ENTRY_SIZE;
        let e = &sector[off..off + PARTITION_ENTRY_SIZE];
        Self {
            active: e[0],
            os_type: e[4],
            start: u32::from_le_bytes([e[8], e[9], e[10], e[11]]),
            length: u32::from_le_bytes([e[12], e[13], e[14], e[15]]),
        }
    }

    fn is_extended(&self) -> bool {
        matches!(self.os_type, 0x05 | 0x0F | 0x85)
    }
}

fn has_signature(sector: &[u8]) -> bool {
    sector[SECTOR_SIZE - 2..SECTOR_SIZE] == BOOT_SIGNATURE
}

struct EbrChain {
    base: u64,
    next: Option<u64>,
    hops: u32,
}

/// Iterator over the partitions of an MS-DOS partition table, in scan order
pub struct PartitionScanner<'a, B: BlockIo> {
    block_io: &'a mut B,
    mbr: [u8; SECTOR_SIZE],
    slot: usize,
    chain: Option<EbrChain>,
    seen: u32,
    done: bool,
}

impl<'a, B: BlockIo> PartitionScanner<'a, B> {
    /// Read the MBR and start a scan
    pub fn new(block_io: &'a mut B) -> Result<Self> {
        let mut mbr = [0u8; SECTOR_SIZE];
        block_io.read_blocks(Lba(0), &mut mbr).map_err(|_| Error::Io)?;

        if !has_signature(&mbr) {
            warn!("Unrecognized partition layout");
            return Err(Error::PartitionNotFound);
        }

        Ok(Self {
            block_io,
            mbr,
            slot: 0,
            chain: None,
            seen: 0,
            done: false,
        })
    }

    fn next_logical(&mut self) -> Option<Result<PartitionSlot>> {
        loop {
            let chain = self.chain.as_mut()?;
            let ebr_lba = match chain.next.take() {
                Some(lba) if chain.hops < MAX_EBR_CHAIN => lba,
                _ => {
                    self.chain = None;
                    return None;
                }
            };
            chain.hops += 1;

            let mut ebr = [0u8; SECTOR_SIZE];
            if self.block_io.read_blocks(Lba(ebr_lba), &mut ebr).is_err() {
                self.done = true;
                return Some(Err(Error::Io));
            }
            if !has_signature(&ebr) {
                self.chain = None;
                return None;
            }

            let logical = RawEntry::parse(&ebr, 0);
            let link = RawEntry::parse(&ebr, 1);
            if link.is_extended() && link.start != 0 {
                chain.next = Some(chain.base + link.start as u64);
            }

            if logical.os_type != 0 {
                self.seen += 1;
                return Some(Ok(PartitionSlot {
                    ordinal: self.seen,
                    start_lba: ebr_lba + logical.start as u64,
                    length: logical.length as u64,
                    os_type: logical.os_type,
                    bootable: logical.active == 0x80,
                }));
            }
        }
    }
}

impl<'a, B: BlockIo> Iterator for PartitionScanner<'a, B> {
    type Item = Result<PartitionSlot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if self.chain.is_some() {
                if let Some(item) = self.next_logical() {
                    return Some(item);
                }
                if self.done {
                    return None;
                }
            }

            if self.slot >= 4 {
                self.done = true;
                return None;
            }

            let entry = RawEntry::parse(&self.mbr, self.slot);
            self.slot += 1;

            if entry.os_type == 0 {
                continue;
            }

            // The container takes its own number; its logical partitions follow it
            if entry.is_extended() {
                self.chain = Some(EbrChain {
                    base: entry.start as u64,
                    next: Some(entry.start as u64),
                    hops: 0,
                });
            }

            self.seen += 1;
            return Some(Ok(PartitionSlot {
                ordinal: self.seen,
                start_lba: entry.start as u64,
                length: entry.length as u64,
                os_type: entry.os_type,
                bootable: entry.active == 0x80,
            }));
        }
    }
}

/// Split a device identifier into BIOS drive number and partition number
///
/// `/dev/hda1` maps to drive 0x80, partition 1.
pub fn parse_device(device: &str) -> Result<(u8, u32)> {
    let pos = device.find("hd").ok_or(Error::InvalidDevice)?;
    let rest = &device[pos + 2..];

    let letter = match rest.as_bytes().first() {
        Some(&c) if c.is_ascii_lowercase() => c,
        _ => return Err(Error::InvalidDevice),
    };

    let digits = &rest[1..];
    if digits.is_empty() || !digits.bytes().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidDevice);
    }

    let index: u32 = digits.parse().map_err(|_| Error::InvalidDevice)?;
    if index == 0 {
        return Err(Error::InvalidDevice);
    }

    Ok((FIRST_HARD_DRIVE + (letter - b'a'), index))
}

/// Find the partition with the given scan-order number
pub fn find_partition<B: BlockIo>(block_io: &mut B, index: u32) -> Result<PartitionSlot> {
    for slot in PartitionScanner::new(block_io)? {
        let slot = slot?;
        if slot.ordinal == index {
            return Ok(slot);
        }
    }
    Err(Error::PartitionNotFound)
}

/// Resolve a device identifier to a bound drive and its partition
pub fn resolve_partition<D: DiskServices>(
    services: D,
    device: &str,
) -> Result<(BiosDrive<D>, PartitionDescriptor)> {
    let (number, index) = parse_device(device).map_err(|e| {
        error!("Open must be of the form \"/dev/hda1\" (got \"{}\")", device);
        e
    })?;

    let mut drive = BiosDrive::new(services, number);
    let params = drive.query_parameters().map_err(|status| {
        error!("Error 0x{:X}h while reading disk 0x{:X}", status, number);
        Error::Geometry(status)
    })?;
    let (cylinders, heads, sectors) = DriveGeometry::new(number, params).chs();

    let slot = find_partition(&mut drive, index).map_err(|e| {
        error!("Can't process disk \"{}\": {}", device, e);
        e
    })?;

    let descriptor = PartitionDescriptor {
        device: String::from(device),
        drive: number,
        index,
        start_lba: slot.start_lba,
        length: slot.length,
        cylinders,
        heads,
        sectors,
    };

    info!(
        "Device \"{}\" (drive=0x{:x} pno={}) found, C/H/S = {}/{}/{} start={} len={}",
        device, number, index, cylinders, heads, sectors, descriptor.start_lba, descriptor.length
    );

    Ok((drive, descriptor))
}
