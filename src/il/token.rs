//! Metadata tokens as they appear inline in CIL.
//!
//! A token is a 32-bit value: the high byte names the metadata table,
//! the low 24 bits are a 1-based row index into that table.

use serde::Serialize;

/// Mask selecting the row index of a token.
pub const ROW_MASK: u32 = 0x00FF_FFFF;

/// Largest row index representable in a token.
pub const MAX_ROW: u32 = ROW_MASK;

/// Metadata tables that can be referenced from the intrinsic bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TableIndex {
    MethodDef = 0x06,
    StandAloneSig = 0x11,
}

impl TableIndex {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x06 => Some(TableIndex::MethodDef),
            0x11 => Some(TableIndex::StandAloneSig),
            _ => None,
        }
    }

    /// The table tag already shifted into the high byte.
    pub fn tag(self) -> u32 {
        (self as u32) << 24
    }
}

/// A raw metadata token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MetadataToken(u32);

impl MetadataToken {
    pub fn from_raw(raw: u32) -> Self {
        MetadataToken(raw)
    }

    /// Token referencing a row of the StandAloneSig table.
    pub fn standalone_signature(row: u32) -> Self {
        debug_assert!(row <= MAX_ROW, "row {row:#x} does not fit in a token");
        MetadataToken(TableIndex::StandAloneSig.tag() | (row & ROW_MASK))
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn table(self) -> Option<TableIndex> {
        TableIndex::from_byte((self.0 >> 24) as u8)
    }

    pub fn row(self) -> u32 {
        self.0 & ROW_MASK
    }

    /// Nil tokens have a zero row.
    pub fn is_nil(self) -> bool {
        self.row() == 0
    }
}

impl std::fmt::Display for MetadataToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
