//! Four-ASCII chunk tags, the universal record identifier of the container
//! format (spec §6: "Top-level chunk tags. Exactly four-ASCII").

use std::fmt;

/// A 4-byte ASCII chunk identifier, e.g. `ChunkTag::new(*b"FILE")`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkTag(pub [u8; 4]);

impl ChunkTag {
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(self) -> [u8; 4] {
        self.0
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "{s}"),
            Err(_) => write!(f, "{:02x}{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2], self.0[3]),
        }
    }
}

/// Top-level and sub-chunk tags used by the archive schema.
pub mod tags {
    use super::ChunkTag;

    pub const HEADER: ChunkTag = ChunkTag::new(*b"BAR\0");
    pub const KEY: ChunkTag = ChunkTag::new(*b"KEY\0");

    pub const FILE_ENTRY: ChunkTag = ChunkTag::new(*b"FILE");
    pub const FILE_META: ChunkTag = ChunkTag::new(*b"FMET");
    pub const FILE_DATA: ChunkTag = ChunkTag::new(*b"FDAT");

    pub const IMAGE_ENTRY: ChunkTag = ChunkTag::new(*b"IMAG");
    pub const IMAGE_META: ChunkTag = ChunkTag::new(*b"IMET");
    pub const IMAGE_DATA: ChunkTag = ChunkTag::new(*b"IDAT");

    pub const DIRECTORY_ENTRY: ChunkTag = ChunkTag::new(*b"DIR\0");
    pub const DIRECTORY_META: ChunkTag = ChunkTag::new(*b"DMET");

    pub const LINK_ENTRY: ChunkTag = ChunkTag::new(*b"LINK");
    pub const LINK_META: ChunkTag = ChunkTag::new(*b"LMET");

    pub const HARDLINK_ENTRY: ChunkTag = ChunkTag::new(*b"HLNK");
    pub const HARDLINK_META: ChunkTag = ChunkTag::new(*b"HMET");
    pub const HARDLINK_NAME: ChunkTag = ChunkTag::new(*b"HNAM");
    pub const HARDLINK_DATA: ChunkTag = ChunkTag::new(*b"HDAT");

    pub const SPECIAL_ENTRY: ChunkTag = ChunkTag::new(*b"SPEC");
    pub const SPECIAL_META: ChunkTag = ChunkTag::new(*b"SMET");

    /// All tags that may legally appear at the top level of an archive.
    pub const TOP_LEVEL_ENTRY_TAGS: [ChunkTag; 6] =
        [FILE_ENTRY, IMAGE_ENTRY, DIRECTORY_ENTRY, LINK_ENTRY, HARDLINK_ENTRY, SPECIAL_ENTRY];
}
