//! Entry-meta, data-meta and fragmentation value objects (spec §6).

use serde::{Deserialize, Serialize};

/// `specialType` discriminant for special-file entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialType {
    CharacterDevice,
    BlockDevice,
    Fifo,
    Socket,
    Other(u32),
}

impl SpecialType {
    pub const fn wire_code(self) -> u32 {
        match self {
            SpecialType::CharacterDevice => 1,
            SpecialType::BlockDevice => 2,
            SpecialType::Fifo => 3,
            SpecialType::Socket => 4,
            SpecialType::Other(code) => code,
        }
    }

    pub const fn from_wire_code(code: u32) -> Self {
        match code {
            1 => SpecialType::CharacterDevice,
            2 => SpecialType::BlockDevice,
            3 => SpecialType::Fifo,
            4 => SpecialType::Socket,
            other => SpecialType::Other(other),
        }
    }
}

/// The common fields every entry-meta sub-chunk carries, plus the
/// type-specific attributes folded into one struct for simplicity (the
/// writer only ever populates the fields relevant to the entry it is
/// building; the reader leaves the rest at their defaults).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMeta {
    pub name: String,
    /// Second name for symlinks (`destinationName`); unused otherwise.
    pub destination_name: Option<String>,
    /// File/image size; absent for directories, links, specials.
    pub size: Option<u64>,
    pub time_last_access: u64,
    pub time_modified: u64,
    pub time_last_changed: u64,
    pub user_id: u32,
    pub group_id: u32,
    pub permission: u32,
    pub special_type: Option<SpecialType>,
    pub major: Option<u32>,
    pub minor: Option<u32>,
}

impl EntryMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            destination_name: None,
            size: None,
            time_last_access: 0,
            time_modified: 0,
            time_last_changed: 0,
            user_id: 0,
            group_id: 0,
            permission: 0,
            special_type: None,
            major: None,
            minor: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_times(mut self, access: u64, modified: u64, changed: u64) -> Self {
        self.time_last_access = access;
        self.time_modified = modified;
        self.time_last_changed = changed;
        self
    }

    pub fn with_owner(mut self, user_id: u32, group_id: u32, permission: u32) -> Self {
        self.user_id = user_id;
        self.group_id = group_id;
        self.permission = permission;
        self
    }

    pub fn with_destination(mut self, destination_name: impl Into<String>) -> Self {
        self.destination_name = Some(destination_name.into());
        self
    }

    pub fn with_special(mut self, special_type: SpecialType, major: u32, minor: u32) -> Self {
        self.special_type = Some(special_type);
        self.major = Some(major);
        self.minor = Some(minor);
        self
    }
}

/// `fragmentOffset`/`fragmentSize` for file/hardlink data sub-chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentRange {
    pub fragment_offset: u64,
    pub fragment_size: u64,
}

/// `blockOffset`/`blockCount`/`blockSize` for image data sub-chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlockRange {
    pub block_offset: u64,
    pub block_count: u64,
    pub block_size: u32,
}
