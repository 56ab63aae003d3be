//! Drive geometry detection
//!
//! The firmware reports geometry two ways: the legacy CHS query (maximum
//! head/cylinder numbers, zero based) and, when the drive supports
//! enhanced disk drive services, an extended parameter block with real
//! counts. The extended values win whenever they are present.

use log::debug;

/// Extended (EDD) drive parameter block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EddParameters {
    /// EDD version reported by the firmware
    pub version: u8,
    /// Number of heads
    pub heads: u32,
    /// Number of cylinders
    pub cylinders: u32,
    /// Total addressable sectors
    pub sectors: u64,
    /// Bytes per sector
    pub bytes_per_sector: u16,
    /// Sectors per track
    pub sectors_per_track: u32,
}

/// Raw result of a drive parameter query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveParameters {
    /// Highest head number (zero based)
    pub legacy_max_head: u8,
    /// Highest cylinder number (zero based)
    pub legacy_max_cylinder: u16,
    /// Sectors per track
    pub legacy_sectors_per_track: u8,
    /// Number of drives attached to the controller
    pub legacy_max_drive: u8,
    /// Extended parameters, when EDD is available
    pub edd: Option<EddParameters>,
}

/// Which query the geometry values came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometrySource {
    /// Legacy CHS query
    Legacy,
    /// Extended (EDD) parameters
    Extended,
}

/// Drive geometry for one physical drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveGeometry {
    /// BIOS drive number
    pub drive: u8,
    /// Selected source
    pub source: GeometrySource,
    /// Legacy head count
    pub legacy_heads: u32,
    /// Legacy cylinder count
    pub legacy_cylinders: u32,
    /// Legacy sectors per track
    pub legacy_sectors_per_track: u32,
    /// Extended parameters, when available
    pub edd: Option<EddParameters>,
}

impl DriveGeometry {
    /// Build geometry from a parameter query
    pub fn new(drive: u8, params: DriveParameters) -> Self {
        let geometry = Self {
            drive,
            source: if params.edd.is_some() {
                GeometrySource::Extended
            } else {
                GeometrySource::Legacy
            },
            legacy_heads: params.legacy_max_head as u32 + 1,
            legacy_cylinders: params.legacy_max_cylinder as u32 + 1,
            legacy_sectors_per_track: params.legacy_sectors_per_track as u32,
            edd: params.edd,
        };

        debug!("DISK: 0x{:x}", drive);
        debug!(
            "  C/H/S: {} heads, {} cylinders, {} sectors/track, {} drives",
            geometry.legacy_heads,
            geometry.legacy_cylinders,
            geometry.legacy_sectors_per_track,
            params.legacy_max_drive
        );
        if let Some(edd) = params.edd {
            debug!(
                "  EDD {:X}: {} heads, {} cylinders, {} sectors, {} bytes/sector, {} sectors/track",
                edd.version,
                edd.heads,
                edd.cylinders,
                edd.sectors,
                edd.bytes_per_sector,
                edd.sectors_per_track
            );
        }

        geometry
    }

    /// Cylinder, head and sectors-per-track counts from the selected source
    pub fn chs(&self) -> (u32, u32, u32) {
        match (self.source, self.edd) {
            (GeometrySource::Extended, Some(edd)) => (edd.cylinders, edd.heads, edd.sectors_per_track),
            _ => (self.legacy_cylinders, self.legacy_heads, self.legacy_sectors_per_track),
        }
    }

    /// Total addressable sectors
    pub fn total_sectors(&self) -> u64 {
        match self.edd {
            Some(edd) if edd.sectors != 0 => edd.sectors,
            _ => {
                let (c, h, s) = self.chs();
                c as u64 * h as u64 * s as u64
            }
        }
    }
}
