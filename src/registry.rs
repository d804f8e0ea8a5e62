// 标签类型注册表：类型ID -> 元数据与负载读取器，按ID直接索引

use crate::codec;
use crate::error::{NbtError, NbtResult};
use crate::tag::Tag;
use std::fmt;
use std::io::Read;

/// NBT标签类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TagId {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagId {
    pub const ALL: [TagId; 13] = [
        TagId::End,
        TagId::Byte,
        TagId::Short,
        TagId::Int,
        TagId::Long,
        TagId::Float,
        TagId::Double,
        TagId::ByteArray,
        TagId::String,
        TagId::List,
        TagId::Compound,
        TagId::IntArray,
        TagId::LongArray,
    ];

    pub fn metadata(self) -> &'static TagMetadata {
        &METADATA[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.metadata().name
    }

    /// 是否为数值类型（Byte 到 Double）
    pub fn is_numeric(self) -> bool {
        self.metadata().is_fixed_width()
    }
}

impl TryFrom<u8> for TagId {
    type Error = NbtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        TagId::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| NbtError::Format(format!("无效的NBT标签类型: {}", value)))
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 标签类型元数据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagMetadata {
    pub name: &'static str,
    /// 不可变的叶子值（End、数值、字符串），复制时无需深拷贝
    pub is_value: bool,
    /// 定长标量的负载字节数
    pub fixed_width: Option<usize>,
}

impl TagMetadata {
    const fn new(name: &'static str, is_value: bool, fixed_width: Option<usize>) -> Self {
        Self {
            name,
            is_value,
            fixed_width,
        }
    }

    pub fn is_fixed_width(&self) -> bool {
        self.fixed_width.is_some()
    }
}

static METADATA: [TagMetadata; 13] = [
    TagMetadata::new("TAG_End", true, None),
    TagMetadata::new("TAG_Byte", true, Some(1)),
    TagMetadata::new("TAG_Short", true, Some(2)),
    TagMetadata::new("TAG_Int", true, Some(4)),
    TagMetadata::new("TAG_Long", true, Some(8)),
    TagMetadata::new("TAG_Float", true, Some(4)),
    TagMetadata::new("TAG_Double", true, Some(8)),
    TagMetadata::new("TAG_Byte_Array", false, None),
    TagMetadata::new("TAG_String", true, None),
    TagMetadata::new("TAG_List", false, None),
    TagMetadata::new("TAG_Compound", false, None),
    TagMetadata::new("TAG_Int_Array", false, None),
    TagMetadata::new("TAG_Long_Array", false, None),
];

/// 负载读取器，第二个参数为当前嵌套深度
pub type PayloadReader = fn(&mut dyn Read, usize) -> NbtResult<Tag>;

static READERS: [PayloadReader; 13] = [
    codec::read_end,
    codec::read_byte,
    codec::read_short,
    codec::read_int,
    codec::read_long,
    codec::read_float,
    codec::read_double,
    codec::read_byte_array,
    codec::read_string,
    codec::read_list,
    codec::read_compound,
    codec::read_int_array,
    codec::read_long_array,
];

/// 获取类型ID对应的元数据
pub fn metadata_of(id: u8) -> NbtResult<&'static TagMetadata> {
    Ok(TagId::try_from(id)?.metadata())
}

/// 获取类型ID对应的负载读取器
pub fn reader_of(id: u8) -> NbtResult<PayloadReader> {
    Ok(READERS[TagId::try_from(id)? as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_through_u8() {
        for id in TagId::ALL {
            assert_eq!(TagId::try_from(id as u8).unwrap(), id);
        }
        assert!(matches!(TagId::try_from(13), Err(NbtError::Format(_))));
        assert!(matches!(metadata_of(200), Err(NbtError::Format(_))));
    }

    #[test]
    fn test_metadata_flags() {
        assert_eq!(TagId::ByteArray.name(), "TAG_Byte_Array");
        assert!(TagId::String.metadata().is_value);
        assert!(!TagId::String.metadata().is_fixed_width());
        assert!(!TagId::Compound.metadata().is_value);
        assert_eq!(TagId::Double.metadata().fixed_width, Some(8));
        assert!(TagId::Float.is_numeric());
        assert!(!TagId::End.is_numeric());
    }

    #[test]
    fn test_reader_produces_matching_variant() {
        let payloads: [(TagId, &[u8]); 7] = [
            (TagId::End, &[]),
            (TagId::Byte, &[0x7F]),
            (TagId::Short, &[0x00, 0x02]),
            (TagId::Int, &[0, 0, 0, 3]),
            (TagId::Long, &[0, 0, 0, 0, 0, 0, 0, 4]),
            (TagId::String, &[0, 1, b'a']),
            (TagId::IntArray, &[0, 0, 0, 1, 0, 0, 0, 9]),
        ];
        for (id, bytes) in payloads {
            let mut source = bytes;
            let tag = reader_of(id as u8).unwrap()(&mut source, 0).unwrap();
            assert_eq!(tag.id(), id);
        }
    }
}
