#![deny(unsafe_code)]

//! Sharded Image Storage Format: an on-disk container for large 3-D
//! (optionally multi-channel) volumes. A volume is tiled into macro-chunks,
//! each stored as one shard whose micro-chunks are compressed individually,
//! so arbitrary sub-volume reads only touch the chunks they overlap.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod select;
pub mod tiling;
pub mod volume;

pub mod codec;

pub mod container {
    pub mod index;
    pub mod metadata;
    pub mod paths;
    pub mod shard;
}

pub mod pack {
    pub mod archive;
    pub mod shard;
}

pub mod read {
    pub mod archive;
    pub mod shard;
}

pub use crate::error::{Result, SisfError};

pub use codec::CompressionTag;

pub use container::metadata::{ArchiveHeader, CURRENT_VERSION};
pub use container::shard::ShardHeader;

pub use pack::archive::{ArchiveOptions, create_archive, create_archive_3d};
pub use pack::shard::{ShardOptions, create_shard};

pub use read::archive::Archive;
pub use read::shard::ShardReader;

pub use volume::{Dtype, Element};

pub mod prelude {
    pub use crate::codec::CompressionTag;
    pub use crate::error::{Result, SisfError};
    pub use crate::pack::archive::{ArchiveOptions, create_archive, create_archive_3d};
    pub use crate::pack::shard::{ShardOptions, create_shard};
    pub use crate::read::archive::Archive;
    pub use crate::read::shard::ShardReader;
    pub use crate::volume::{Dtype, Element};
}
