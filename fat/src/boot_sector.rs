// Boot sector parsing and volume geometry for FAT12/FAT16

use byteorder::{ByteOrder, LittleEndian};
use fatscan_core::ScanError;

// Boot sector offsets
pub const BPB_BYTES_PER_SEC: usize = 0x0B;
pub const BPB_SEC_PER_CLUS: usize = 0x0D;
pub const BPB_RSVD_SEC_CNT: usize = 0x0E;
pub const BPB_NUM_FATS: usize = 0x10;
pub const BPB_ROOT_ENT_CNT: usize = 0x11;
pub const BPB_TOT_SEC16: usize = 0x13;
pub const BPB_MEDIA: usize = 0x15;
pub const BPB_FAT_SZ16: usize = 0x16;
pub const BPB_TOT_SEC32: usize = 0x20;

pub const BOOT_SIGNATURE_OFFSET: usize = 0x1FE;
pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

// FAT entry values
pub const FAT_FREE: u16 = 0x0000;
pub const FAT12_BAD: u16 = 0x0FF7;
pub const FAT12_EOC: u16 = 0x0FF8; // 0x0FF8..=0x0FFF mark end of chain
pub const FAT16_BAD: u16 = 0xFFF7;
pub const FAT16_EOC: u16 = 0xFFF8; // 0xFFF8..=0xFFFF mark end of chain

// Cluster count thresholds (data clusters, exclusive of the two reserved)
pub const FAT12_MAX_CLUSTERS: u32 = 4084;
pub const FAT16_MAX_CLUSTERS: u32 = 65524;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatType {
    Fat12,
    Fat16,
}

/// Volume layout derived from the BPB, fixed for the life of a scan.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    pub fat_type: FatType,
    pub bytes_per_sector: u32,
    pub sectors_per_cluster: u32,
    pub bytes_per_cluster: u32,
    pub fat_offset: usize,
    pub root_dir_offset: usize,
    pub root_entries: u32,
    pub data_offset: usize,
    /// Data clusters + 2: valid cluster indices are `2..total_clusters`,
    /// with 0 and 1 reserved per FAT convention.
    pub total_clusters: u32,
}

impl Geometry {
    /// Parse and validate the boot sector at the start of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self, ScanError> {
        if buf.len() < 512 {
            return Err(ScanError::InvalidBootSector(format!(
                "image is only {} bytes, smaller than one sector",
                buf.len()
            )));
        }
        if buf[BOOT_SIGNATURE_OFFSET..BOOT_SIGNATURE_OFFSET + 2] != BOOT_SIGNATURE {
            return Err(ScanError::InvalidBootSector(format!(
                "missing 0x55AA signature (found 0x{:02X}{:02X})",
                buf[BOOT_SIGNATURE_OFFSET],
                buf[BOOT_SIGNATURE_OFFSET + 1]
            )));
        }

        let bytes_per_sector = LittleEndian::read_u16(&buf[BPB_BYTES_PER_SEC..]) as u32;
        let sectors_per_cluster = buf[BPB_SEC_PER_CLUS] as u32;
        let reserved_sectors = LittleEndian::read_u16(&buf[BPB_RSVD_SEC_CNT..]) as u32;
        let num_fats = buf[BPB_NUM_FATS] as u32;
        let root_entries = LittleEndian::read_u16(&buf[BPB_ROOT_ENT_CNT..]) as u32;
        let total_sectors_16 = LittleEndian::read_u16(&buf[BPB_TOT_SEC16..]) as u32;
        let sectors_per_fat = LittleEndian::read_u16(&buf[BPB_FAT_SZ16..]) as u32;
        let total_sectors_32 = LittleEndian::read_u32(&buf[BPB_TOT_SEC32..]);

        if ![512, 1024, 2048, 4096].contains(&bytes_per_sector) {
            return Err(ScanError::InvalidBootSector(format!(
                "invalid bytes per sector: {bytes_per_sector}"
            )));
        }
        if sectors_per_cluster == 0 || !sectors_per_cluster.is_power_of_two() {
            return Err(ScanError::InvalidBootSector(format!(
                "sectors per cluster ({sectors_per_cluster}) is not a power of two"
            )));
        }
        if reserved_sectors == 0 {
            return Err(ScanError::InvalidBootSector(
                "reserved sector count is zero".into(),
            ));
        }
        if num_fats == 0 {
            return Err(ScanError::InvalidBootSector("no FAT tables".into()));
        }
        if root_entries == 0 || sectors_per_fat == 0 {
            // FAT32 keeps its root in the data area and its FAT size at
            // offset 0x24; neither layout is handled here
            return Err(ScanError::UnsupportedFilesystem(
                "no fixed root directory; this looks like FAT32".into(),
            ));
        }

        let total_sectors = if total_sectors_16 != 0 {
            total_sectors_16
        } else {
            total_sectors_32
        };
        if total_sectors == 0 {
            return Err(ScanError::InvalidBootSector(
                "total sector count is zero".into(),
            ));
        }

        let root_dir_sectors = (root_entries * 32).div_ceil(bytes_per_sector);
        let data_start_sector =
            reserved_sectors + num_fats * sectors_per_fat + root_dir_sectors;
        if data_start_sector >= total_sectors {
            return Err(ScanError::InvalidBootSector(format!(
                "data area starts at sector {data_start_sector}, past the \
                 {total_sectors} total sectors"
            )));
        }

        let data_clusters = (total_sectors - data_start_sector) / sectors_per_cluster;
        if data_clusters > FAT16_MAX_CLUSTERS {
            return Err(ScanError::UnsupportedFilesystem(format!(
                "{data_clusters} data clusters is FAT32 territory"
            )));
        }
        let fat_type = if data_clusters <= FAT12_MAX_CLUSTERS {
            FatType::Fat12
        } else {
            FatType::Fat16
        };

        let total_clusters = data_clusters + 2;
        let fat_bytes_needed = match fat_type {
            // two 12-bit entries per three bytes, plus one byte of
            // spill for the last odd-indexed entry
            FatType::Fat12 => total_clusters + total_clusters / 2 + 2,
            FatType::Fat16 => total_clusters * 2,
        };
        if sectors_per_fat * bytes_per_sector < fat_bytes_needed {
            return Err(ScanError::InvalidBootSector(format!(
                "FAT of {sectors_per_fat} sector(s) cannot index \
                 {data_clusters} data clusters"
            )));
        }

        if buf.len() < (total_sectors * bytes_per_sector) as usize {
            return Err(ScanError::InvalidBootSector(format!(
                "image truncated: {} bytes for {} declared sectors",
                buf.len(),
                total_sectors
            )));
        }

        Ok(Self {
            fat_type,
            bytes_per_sector,
            sectors_per_cluster,
            bytes_per_cluster: bytes_per_sector * sectors_per_cluster,
            fat_offset: (reserved_sectors * bytes_per_sector) as usize,
            root_dir_offset: ((reserved_sectors + num_fats * sectors_per_fat)
                * bytes_per_sector) as usize,
            root_entries,
            data_offset: (data_start_sector * bytes_per_sector) as usize,
            total_clusters,
        })
    }

    pub fn cluster_size(&self) -> u32 {
        self.bytes_per_cluster
    }

    pub fn total_clusters(&self) -> u32 {
        self.total_clusters
    }

    pub fn root_entry_count(&self) -> u32 {
        self.root_entries
    }

    /// Whether `cluster` indexes a real data cluster.
    pub fn is_valid_cluster(&self, cluster: u16) -> bool {
        cluster >= 2 && (cluster as u32) < self.total_clusters
    }

    pub fn is_end_of_chain(&self, value: u16) -> bool {
        match self.fat_type {
            FatType::Fat12 => value >= FAT12_EOC,
            FatType::Fat16 => value >= FAT16_EOC,
        }
    }

    pub fn is_bad(&self, value: u16) -> bool {
        match self.fat_type {
            FatType::Fat12 => value == FAT12_BAD,
            FatType::Fat16 => value == FAT16_BAD,
        }
    }

    /// Byte offset of a data cluster's first byte in the image.
    pub fn cluster_offset(&self, cluster: u16) -> usize {
        self.data_offset + (cluster as usize - 2) * self.bytes_per_cluster as usize
    }

    /// Read the FAT entry for `cluster` out of the image buffer.
    ///
    /// FAT12 packs two 12-bit entries into three bytes; FAT16 entries are
    /// plain little-endian u16s.
    pub fn fat_value(&self, buf: &[u8], cluster: u16) -> u16 {
        match self.fat_type {
            FatType::Fat16 => {
                let offset = self.fat_offset + cluster as usize * 2;
                LittleEndian::read_u16(&buf[offset..])
            }
            FatType::Fat12 => {
                let offset = self.fat_offset + cluster as usize + cluster as usize / 2;
                let pair = LittleEndian::read_u16(&buf[offset..]);
                if cluster & 1 == 1 {
                    pair >> 4
                } else {
                    pair & 0x0FFF
                }
            }
        }
    }
}
