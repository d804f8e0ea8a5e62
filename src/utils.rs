use crate::array::IntArrayTag;
use crate::error::{NbtError, NbtResult};
use crate::registry::TagId;
use crate::tag::Tag;
use crate::MAX_STRING_LEN;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use uuid::Uuid;

/// 读取 u16 字节长度前缀的 UTF-8 字符串
pub fn read_string<R: Read + ?Sized>(reader: &mut R) -> NbtResult<String> {
    let len = reader.read_u16::<BigEndian>()?;
    let mut bytes = vec![0u8; len as usize];
    reader.read_exact(&mut bytes)?;

    String::from_utf8(bytes).map_err(|e| NbtError::Format(format!("字符串不是有效的UTF-8: {}", e)))
}

/// 写入 u16 字节长度前缀的 UTF-8 字符串
pub fn write_string<W: Write + ?Sized>(writer: &mut W, value: &str) -> NbtResult<()> {
    if value.len() > MAX_STRING_LEN {
        return Err(NbtError::StringTooLong(value.len()));
    }

    writer.write_u16::<BigEndian>(value.len() as u16)?;
    writer.write_all(value.as_bytes())?;

    Ok(())
}

/// 读取数组或列表的 4 字节长度，负数视为格式错误
pub fn read_length<R: Read + ?Sized>(reader: &mut R) -> NbtResult<usize> {
    let len = reader.read_i32::<BigEndian>()?;
    if len < 0 {
        return Err(NbtError::Format(format!("长度不能为负数: {}", len)));
    }
    Ok(len as usize)
}

/// 写入数组或列表的 4 字节长度
pub fn write_length<W: Write + ?Sized>(writer: &mut W, len: usize) -> NbtResult<()> {
    let len = i32::try_from(len).map_err(|_| NbtError::Format(format!("长度超出i32范围: {}", len)))?;
    writer.write_i32::<BigEndian>(len)?;
    Ok(())
}

/// 按声明长度预分配时的上限，防止恶意长度导致一次性分配过大
pub(crate) fn bounded_capacity(declared: usize) -> usize {
    declared.min(4096)
}

/// UUID 拆分为四个 32 位整数：高 64 位在前，每半按大端拆为两个字
pub fn uuid_to_ints(uuid: Uuid) -> [i32; 4] {
    let (most, least) = uuid.as_u64_pair();
    [
        (most >> 32) as i32,
        most as i32,
        (least >> 32) as i32,
        least as i32,
    ]
}

/// 由四个 32 位整数还原 UUID
pub fn uuid_from_ints(ints: [i32; 4]) -> Uuid {
    let most = ((ints[0] as u32 as u64) << 32) | ints[1] as u32 as u64;
    let least = ((ints[2] as u32 as u64) << 32) | ints[3] as u32 as u64;
    Uuid::from_u64_pair(most, least)
}

/// UUID 的标签表示（4 元素 IntArray）
pub fn uuid_to_tag(uuid: Uuid) -> Tag {
    Tag::IntArray(IntArrayTag::from(uuid_to_ints(uuid).to_vec()))
}

/// 从 4 元素 IntArray 标签还原 UUID
pub fn uuid_from_tag(tag: &Tag) -> NbtResult<Uuid> {
    match tag {
        Tag::IntArray(array) => {
            let ints: [i32; 4] = array
                .as_slice()
                .try_into()
                .map_err(|_| NbtError::Format(format!("UUID数组长度必须为4，实际为 {}", array.len())))?;
            Ok(uuid_from_ints(ints))
        }
        other => Err(NbtError::TypeMismatch {
            expected: TagId::IntArray,
            found: other.id(),
        }),
    }
}
