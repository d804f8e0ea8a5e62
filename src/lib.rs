pub mod array;
pub mod codec;
pub mod compound;
pub mod compression;
pub mod error;
pub mod json;
pub mod list;
pub mod reader;
pub mod registry;
pub mod scope;
pub mod snbt;
pub mod tag;
pub mod tag_io;
pub mod utils;
pub mod writer;

pub use crate::array::{ArrayTag, ByteArrayTag, IntArrayTag, LongArrayTag};
pub use crate::compound::{CompoundAccess, CompoundBuilder, CompoundTag, ImmutableCompoundTag, MutableCompoundTag};
pub use crate::error::{NbtError, NbtResult};
pub use crate::list::{ImmutableListTag, ListAccess, ListBuilder, ListTag, MutableListTag};
pub use crate::reader::NbtReader;
pub use crate::registry::{TagId, TagMetadata};
pub use crate::scope::Scope;
pub use crate::tag::Tag;
pub use crate::writer::{NbtValue, NbtWriter};

/// 最大嵌套深度（List/Compound 层数）
pub const MAX_DEPTH: usize = 512;

/// 字符串与名称的最大 UTF-8 字节数
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// 压缩算法枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CompressionType {
    #[default]
    None = 0,
    Gzip = 1,
    Zlib = 2,
}
