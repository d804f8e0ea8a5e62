// 整树编解码：按类型ID分派的递归下降读取器与对应的写入器

use crate::array::{ArrayElement, ArrayTag};
use crate::compound::{CompoundAccess, CompoundTag, MutableCompoundTag};
use crate::error::{NbtError, NbtResult};
use crate::list::{ListAccess, MutableListTag};
use crate::registry::{self, TagId};
use crate::tag::Tag;
use crate::utils;
use crate::MAX_DEPTH;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use tracing::trace;

/// 容器在读取或写入任何字节前检查深度
fn check_depth(depth: usize) -> NbtResult<()> {
    if depth >= MAX_DEPTH {
        return Err(NbtError::DepthExceeded(MAX_DEPTH));
    }
    Ok(())
}

pub fn read_end(_reader: &mut dyn Read, _depth: usize) -> NbtResult<Tag> {
    Ok(Tag::End)
}

pub fn read_byte(reader: &mut dyn Read, _depth: usize) -> NbtResult<Tag> {
    Ok(Tag::Byte(reader.read_i8()?))
}

pub fn read_short(reader: &mut dyn Read, _depth: usize) -> NbtResult<Tag> {
    Ok(Tag::Short(reader.read_i16::<BigEndian>()?))
}

pub fn read_int(reader: &mut dyn Read, _depth: usize) -> NbtResult<Tag> {
    Ok(Tag::Int(reader.read_i32::<BigEndian>()?))
}

pub fn read_long(reader: &mut dyn Read, _depth: usize) -> NbtResult<Tag> {
    Ok(Tag::Long(reader.read_i64::<BigEndian>()?))
}

pub fn read_float(reader: &mut dyn Read, _depth: usize) -> NbtResult<Tag> {
    Ok(Tag::Float(reader.read_f32::<BigEndian>()?))
}

pub fn read_double(reader: &mut dyn Read, _depth: usize) -> NbtResult<Tag> {
    Ok(Tag::Double(reader.read_f64::<BigEndian>()?))
}

pub fn read_string(reader: &mut dyn Read, _depth: usize) -> NbtResult<Tag> {
    Ok(Tag::String(utils::read_string(reader)?))
}

pub fn read_byte_array(reader: &mut dyn Read, _depth: usize) -> NbtResult<Tag> {
    Ok(Tag::ByteArray(read_array(reader)?))
}

pub fn read_int_array(reader: &mut dyn Read, _depth: usize) -> NbtResult<Tag> {
    Ok(Tag::IntArray(read_array(reader)?))
}

pub fn read_long_array(reader: &mut dyn Read, _depth: usize) -> NbtResult<Tag> {
    Ok(Tag::LongArray(read_array(reader)?))
}

fn read_array<T: ArrayElement>(reader: &mut dyn Read) -> NbtResult<ArrayTag<T>> {
    let len = utils::read_length(reader)?;
    let mut data = Vec::with_capacity(utils::bounded_capacity(len));
    for _ in 0..len {
        data.push(T::read_from(reader)?);
    }
    Ok(ArrayTag::new(data))
}

pub fn read_list(reader: &mut dyn Read, depth: usize) -> NbtResult<Tag> {
    check_depth(depth)?;

    let element_type = TagId::try_from(reader.read_u8()?)?;
    let len = utils::read_length(reader)?;
    if element_type == TagId::End && len > 0 {
        return Err(NbtError::format(format!("非空列表缺少元素类型，长度为 {}", len)));
    }

    let element_reader = registry::reader_of(element_type as u8)?;
    let mut data = Vec::with_capacity(utils::bounded_capacity(len));
    for _ in 0..len {
        data.push(element_reader(reader, depth + 1)?);
    }

    Ok(Tag::List(MutableListTag::from_raw(element_type, data).into()))
}

pub fn read_compound(reader: &mut dyn Read, depth: usize) -> NbtResult<Tag> {
    check_depth(depth)?;

    let mut compound = MutableCompoundTag::new();
    loop {
        let id = reader.read_u8()?;
        if id == TagId::End as u8 {
            break;
        }
        let payload_reader = registry::reader_of(id)?;
        let name = utils::read_string(reader)?;
        let value = payload_reader(reader, depth + 1)?;
        // 重复键：后写入者覆盖
        compound.put(name, value);
    }

    Ok(Tag::Compound(compound.into()))
}

/// 读取带名称的标签；类型为 End 时不读取名称，返回空名称
pub fn read_named_tag<R: Read>(reader: &mut R) -> NbtResult<(String, Tag)> {
    let id = reader.read_u8()?;
    if id == TagId::End as u8 {
        return Ok((String::new(), Tag::End));
    }
    let tag_type = TagId::try_from(id)?;
    let payload_reader = registry::reader_of(id)?;
    let name = utils::read_string(reader)?;
    trace!(%tag_type, %name, "读取根标签");
    let tag = payload_reader(reader, 0)?;
    Ok((name, tag))
}

/// 写入标签负载（不含类型与名称）
pub fn write_payload<W: Write + ?Sized>(writer: &mut W, tag: &Tag) -> NbtResult<()> {
    write_payload_at(writer, tag, 0)
}

/// 写入完整的带名称标签；End 只写类型字节
pub fn write_named_tag<W: Write + ?Sized>(writer: &mut W, name: &str, tag: &Tag) -> NbtResult<()> {
    write_named_at(writer, name, tag, 0)
}

/// 写入带名称的根复合标签
pub fn write_named_compound<W: Write + ?Sized>(writer: &mut W, name: &str, compound: &CompoundTag) -> NbtResult<()> {
    writer.write_u8(TagId::Compound as u8)?;
    utils::write_string(writer, name)?;
    write_compound_at(writer, compound, 0)
}

fn write_named_at<W: Write + ?Sized>(writer: &mut W, name: &str, tag: &Tag, depth: usize) -> NbtResult<()> {
    writer.write_u8(tag.id() as u8)?;
    if let Tag::End = tag {
        return Ok(());
    }
    utils::write_string(writer, name)?;
    write_payload_at(writer, tag, depth)
}

fn write_payload_at<W: Write + ?Sized>(writer: &mut W, tag: &Tag, depth: usize) -> NbtResult<()> {
    match tag {
        Tag::End => {}
        Tag::Byte(v) => writer.write_i8(*v)?,
        Tag::Short(v) => writer.write_i16::<BigEndian>(*v)?,
        Tag::Int(v) => writer.write_i32::<BigEndian>(*v)?,
        Tag::Long(v) => writer.write_i64::<BigEndian>(*v)?,
        Tag::Float(v) => writer.write_f32::<BigEndian>(*v)?,
        Tag::Double(v) => writer.write_f64::<BigEndian>(*v)?,
        Tag::String(v) => utils::write_string(writer, v)?,
        Tag::ByteArray(array) => write_array(writer, array)?,
        Tag::IntArray(array) => write_array(writer, array)?,
        Tag::LongArray(array) => write_array(writer, array)?,
        Tag::List(list) => {
            check_depth(depth)?;
            writer.write_u8(list.element_type() as u8)?;
            utils::write_length(writer, list.len())?;
            for element in list.iter() {
                write_payload_at(writer, element, depth + 1)?;
            }
        }
        Tag::Compound(compound) => write_compound_at(writer, compound, depth)?,
    }
    Ok(())
}

fn write_compound_at<W: Write + ?Sized>(writer: &mut W, compound: &CompoundTag, depth: usize) -> NbtResult<()> {
    check_depth(depth)?;
    for (name, value) in compound.iter() {
        // End 字节会提前结束复合标签
        if let Tag::End = value {
            return Err(NbtError::format(format!("复合标签条目 \"{}\" 不能为 End", name)));
        }
        write_named_at(writer, name, value, depth + 1)?;
    }
    writer.write_u8(TagId::End as u8)?;
    Ok(())
}

fn write_array<W: Write + ?Sized, T: ArrayElement>(writer: &mut W, array: &ArrayTag<T>) -> NbtResult<()> {
    utils::write_length(writer, array.len())?;
    for &value in array.iter() {
        value.write_to(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::ListTag;
    use pretty_assertions::assert_eq;

    fn nested_lists(depth: usize) -> Vec<u8> {
        // depth 层嵌套列表，最内层为空列表
        let mut bytes = Vec::new();
        for _ in 0..depth - 1 {
            bytes.push(TagId::List as u8);
            bytes.extend_from_slice(&1i32.to_be_bytes());
        }
        bytes.push(TagId::End as u8);
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes
    }

    #[test]
    fn test_list_with_end_type_and_elements_is_rejected() {
        let bytes = [0x00, 0x00, 0x00, 0x00, 0x02];
        let mut cursor: &[u8] = &bytes;
        assert!(matches!(read_list(&mut cursor, 0), Err(NbtError::Format(_))));
    }

    #[test]
    fn test_unknown_type_is_format_error() {
        let bytes = [0x0F, 0x00, 0x01, b'x'];
        let mut cursor: &[u8] = &bytes;
        assert!(matches!(read_compound(&mut cursor, 0), Err(NbtError::Format(_))));
    }

    #[test]
    fn test_truncated_input_is_format_error() {
        let bytes = [0x03, 0x00, 0x01, b'x', 0x00, 0x00];
        let mut cursor: &[u8] = &bytes;
        assert!(matches!(read_compound(&mut cursor, 0), Err(NbtError::Format(_))));
    }

    #[test]
    fn test_duplicate_keys_last_write_wins() {
        let bytes = [
            0x01, 0x00, 0x01, b'k', 0x05, //
            0x01, 0x00, 0x01, b'k', 0x07, //
            0x00,
        ];
        let mut cursor: &[u8] = &bytes;
        let tag = read_compound(&mut cursor, 0).unwrap();
        let compound = tag.as_compound().unwrap();
        assert_eq!(compound.len(), 1);
        assert_eq!(compound.get("k"), Some(&Tag::Byte(7)));
    }

    #[test]
    fn test_depth_limit_on_nested_lists() {
        let ok = nested_lists(MAX_DEPTH);
        let mut cursor = ok.as_slice();
        assert!(read_list(&mut cursor, 0).is_ok());
        assert!(cursor.is_empty());

        let deep = nested_lists(MAX_DEPTH + 1);
        let mut cursor = deep.as_slice();
        assert!(matches!(read_list(&mut cursor, 0), Err(NbtError::DepthExceeded(512))));
    }

    #[test]
    fn test_writer_applies_depth_limit() {
        let mut tag = Tag::List(ListTag::new());
        for _ in 0..MAX_DEPTH {
            let mut outer = ListTag::new();
            outer.add(tag).unwrap();
            tag = Tag::List(outer);
        }
        let mut buffer = Vec::new();
        assert!(matches!(write_payload(&mut buffer, &tag), Err(NbtError::DepthExceeded(_))));
    }

    #[test]
    fn test_end_entry_in_compound_is_rejected() {
        let compound = CompoundTag::builder(true).put("a", Tag::End).put("b", 1).build();
        let mut buffer = Vec::new();
        assert!(matches!(
            write_payload(&mut buffer, &Tag::Compound(compound.clone())),
            Err(NbtError::Format(_))
        ));
        assert!(matches!(
            write_named_compound(&mut Vec::new(), "", &compound),
            Err(NbtError::Format(_))
        ));
    }

    #[test]
    fn test_named_end_has_no_name() {
        let mut buffer = Vec::new();
        write_named_tag(&mut buffer, "ignored", &Tag::End).unwrap();
        assert_eq!(buffer, vec![0x00]);

        let mut cursor = buffer.as_slice();
        assert_eq!(read_named_tag(&mut cursor).unwrap(), (String::new(), Tag::End));
    }

    #[test]
    fn test_list_wire_layout() {
        let list = ListTag::builder(TagId::Int, true)
            .add(1)
            .unwrap()
            .add(74)
            .unwrap()
            .add(493029)
            .unwrap()
            .build();
        let mut buffer = Vec::new();
        write_payload(&mut buffer, &Tag::List(list)).unwrap();
        assert_eq!(
            buffer,
            vec![
                0x03, 0x00, 0x00, 0x00, 0x03, //
                0x00, 0x00, 0x00, 0x01, //
                0x00, 0x00, 0x00, 0x4A, //
                0x00, 0x07, 0x85, 0xE5,
            ]
        );
    }

    #[test]
    fn test_compound_payload_round_trip() {
        let compound = CompoundTag::builder(false)
            .put("bytes", vec![1i8, -1])
            .put("longs", vec![i64::MIN, i64::MAX])
            .put("pi", std::f64::consts::PI)
            .compound("nested", |b| b.put("s", "é"))
            .build();
        let tag = Tag::Compound(compound);
        let mut buffer = Vec::new();
        write_payload(&mut buffer, &tag).unwrap();

        let mut cursor = buffer.as_slice();
        assert_eq!(read_compound(&mut cursor, 0).unwrap(), tag);
    }
}
