// 32-byte FAT directory entry codec

use byteorder::{ByteOrder, LittleEndian};

pub const DIR_ENTRY_SIZE: usize = 32;

/// First name byte of a never-used slot (and end-of-directory marker).
pub const SLOT_EMPTY: u8 = 0x00;
/// First name byte of a deleted entry.
pub const SLOT_DELETED: u8 = 0xE5;
// A real leading 0xE5 is stored escaped as 0x05
const NAME_E5_ESCAPE: u8 = 0x05;

/// Directory entry attribute flags.
pub mod attributes {
    pub const READ_ONLY: u8 = 0x01;
    pub const HIDDEN: u8 = 0x02;
    pub const SYSTEM: u8 = 0x04;
    pub const VOLUME_ID: u8 = 0x08;
    pub const DIRECTORY: u8 = 0x10;
    pub const ARCHIVE: u8 = 0x20;
    pub const LONG_NAME: u8 = 0x0F; // VFAT long-name fragment marker
}

const OFF_ATTRIBUTES: usize = 11;
const OFF_START_CLUSTER: usize = 26;
const OFF_FILE_SIZE: usize = 28;

/// Decoded view of one directory slot.
///
/// Entries are copied out of the image; writes go back through
/// `put_file_size` and `write_entry` so the mutation points stay
/// explicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: [u8; 11],
    pub attributes: u8,
    pub start_cluster: u16,
    pub file_size: u32,
}

impl DirEntry {
    pub fn parse(slot: &[u8]) -> Self {
        let mut name = [0u8; 11];
        name.copy_from_slice(&slot[..11]);
        Self {
            name,
            attributes: slot[OFF_ATTRIBUTES],
            start_cluster: LittleEndian::read_u16(&slot[OFF_START_CLUSTER..]),
            file_size: LittleEndian::read_u32(&slot[OFF_FILE_SIZE..]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name[0] == SLOT_EMPTY
    }

    pub fn is_deleted(&self) -> bool {
        self.name[0] == SLOT_DELETED
    }

    /// `.` and `..` self-references.
    pub fn is_dot(&self) -> bool {
        self.name[0] == b'.'
    }

    pub fn is_long_name(&self) -> bool {
        self.attributes & attributes::LONG_NAME == attributes::LONG_NAME
    }

    pub fn is_volume_label(&self) -> bool {
        self.attributes & attributes::VOLUME_ID != 0
    }

    pub fn is_directory(&self) -> bool {
        self.attributes & attributes::DIRECTORY != 0
    }

    pub fn is_hidden(&self) -> bool {
        self.attributes & attributes::HIDDEN != 0
    }

    pub fn display_name(&self) -> String {
        parse_83_name(&self.name)
    }

    /// The `rhsa` attribute letters of the classic listing format.
    pub fn attribute_letters(&self) -> String {
        let mut letters = String::with_capacity(4);
        letters.push(if self.attributes & attributes::READ_ONLY != 0 { 'r' } else { ' ' });
        letters.push(if self.attributes & attributes::HIDDEN != 0 { 'h' } else { ' ' });
        letters.push(if self.attributes & attributes::SYSTEM != 0 { 's' } else { ' ' });
        letters.push(if self.attributes & attributes::ARCHIVE != 0 { 'a' } else { ' ' });
        letters
    }
}

/// Parse an 8.3 space-padded name field into a display string.
pub fn parse_83_name(name: &[u8; 11]) -> String {
    let mut result = String::new();

    for (i, &byte) in name[0..8].iter().enumerate() {
        if byte == 0x20 || byte == 0x00 {
            break;
        }
        if i == 0 && byte == NAME_E5_ESCAPE {
            result.push(0xE5 as char);
        } else {
            result.push(byte as char);
        }
    }

    let base_len = result.len();
    for &byte in &name[8..11] {
        if byte != 0x20 && byte != 0x00 {
            if result.len() == base_len {
                result.push('.');
            }
            result.push(byte as char);
        }
    }

    result
}

/// Format a name into the on-disk 8.3 field: uppercased, space-padded,
/// base and extension truncated to 8 and 3 bytes.
pub fn format_83_name(filename: &str) -> [u8; 11] {
    let mut result = [0x20u8; 11];
    let upper = filename.to_uppercase();
    let (base, ext) = match upper.split_once('.') {
        Some((base, ext)) => (base, ext),
        None => (upper.as_str(), ""),
    };

    for (i, byte) in base.bytes().enumerate().take(8) {
        result[i] = if i == 0 && byte == SLOT_DELETED {
            NAME_E5_ESCAPE
        } else {
            byte
        };
    }
    for (i, byte) in ext.bytes().enumerate().take(3) {
        result[8 + i] = byte;
    }

    result
}

/// Rewrite the 4-byte size field of an existing slot.
pub fn put_file_size(slot: &mut [u8], size: u32) {
    LittleEndian::write_u32(&mut slot[OFF_FILE_SIZE..OFF_FILE_SIZE + 4], size);
}

/// Write a fully-formed entry into a slot: 8.3 name, normal attributes,
/// zeroed time fields, start cluster and size.
pub fn write_entry(slot: &mut [u8], name: &str, start_cluster: u16, size: u32) {
    slot[..DIR_ENTRY_SIZE].fill(0);
    slot[..11].copy_from_slice(&format_83_name(name));
    slot[OFF_ATTRIBUTES] = 0; // plain file
    LittleEndian::write_u16(&mut slot[OFF_START_CLUSTER..OFF_START_CLUSTER + 2], start_cluster);
    LittleEndian::write_u32(&mut slot[OFF_FILE_SIZE..OFF_FILE_SIZE + 4], size);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_83_name() {
        assert_eq!(parse_83_name(b"README  TXT"), "README.TXT");
        assert_eq!(parse_83_name(b"FOLDER     "), "FOLDER");
        assert_eq!(parse_83_name(b"TEST    C  "), "TEST.C");
        assert_eq!(parse_83_name(&[0x05, b'X', 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20]),
            format!("{}X", 0xE5 as char));
    }

    #[test]
    fn test_format_83_name() {
        assert_eq!(&format_83_name("FOUND1.DAT"), b"FOUND1  DAT");
        assert_eq!(&format_83_name("readme.txt"), b"README  TXT");
        assert_eq!(&format_83_name("FOLDER"), b"FOLDER     ");
        assert_eq!(&format_83_name("LONGERNAME.DATA"), b"LONGERNADAT");
    }

    #[test]
    fn test_write_and_parse_entry() {
        let mut slot = [0xFFu8; DIR_ENTRY_SIZE];
        write_entry(&mut slot, "FOUND1.DAT", 40, 1536);
        let entry = DirEntry::parse(&slot);
        assert_eq!(entry.display_name(), "FOUND1.DAT");
        assert_eq!(entry.start_cluster, 40);
        assert_eq!(entry.file_size, 1536);
        assert_eq!(entry.attributes, 0);
        assert!(!entry.is_directory());
        assert!(!entry.is_volume_label());
    }

    #[test]
    fn test_put_file_size() {
        let mut slot = [0u8; DIR_ENTRY_SIZE];
        write_entry(&mut slot, "A.TXT", 5, 100);
        put_file_size(&mut slot, 512);
        assert_eq!(DirEntry::parse(&slot).file_size, 512);
    }

    #[test]
    fn test_marker_predicates() {
        let mut slot = [0u8; DIR_ENTRY_SIZE];
        assert!(DirEntry::parse(&slot).is_empty());
        slot[0] = SLOT_DELETED;
        assert!(DirEntry::parse(&slot).is_deleted());
        slot[0] = b'.';
        assert!(DirEntry::parse(&slot).is_dot());
        slot[0] = b'A';
        slot[11] = attributes::LONG_NAME;
        assert!(DirEntry::parse(&slot).is_long_name());
    }
}
