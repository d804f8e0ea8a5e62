// JSON 导出：单向序列化，仅用于调试与数据检查

use crate::array::{ArrayElement, ArrayTag};
use crate::compound::{CompoundAccess, CompoundTag};
use crate::error::{NbtError, NbtResult};
use crate::list::{ListAccess, ListTag};
use crate::tag::Tag;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tag::End => serializer.serialize_unit(),
            Tag::Byte(v) => serializer.serialize_i8(*v),
            Tag::Short(v) => serializer.serialize_i16(*v),
            Tag::Int(v) => serializer.serialize_i32(*v),
            Tag::Long(v) => serializer.serialize_i64(*v),
            Tag::Float(v) => serializer.serialize_f32(*v),
            Tag::Double(v) => serializer.serialize_f64(*v),
            Tag::String(v) => serializer.serialize_str(v),
            Tag::ByteArray(array) => array.serialize(serializer),
            Tag::IntArray(array) => array.serialize(serializer),
            Tag::LongArray(array) => array.serialize(serializer),
            Tag::List(list) => list.serialize(serializer),
            Tag::Compound(compound) => compound.serialize(serializer),
        }
    }
}

impl<T: ArrayElement + Serialize> Serialize for ArrayTag<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl Serialize for ListTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for element in self.iter() {
            seq.serialize_element(element)?;
        }
        seq.end()
    }
}

/// 按插入顺序输出键
impl Serialize for CompoundTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

pub fn to_json_string(tag: &Tag, pretty: bool) -> NbtResult<String> {
    let result = if pretty {
        serde_json::to_string_pretty(tag)
    } else {
        serde_json::to_string(tag)
    };
    result.map_err(|e| NbtError::Format(format!("JSON序列化失败: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TagId;
    use serde_json::json;

    #[test]
    fn test_tree_maps_to_json() {
        let list = ListTag::builder(TagId::Short, true).add(1i16).unwrap().build();
        let compound = CompoundTag::builder(false)
            .put("name", "Bananrama")
            .put("bytes", vec![1i8, -1])
            .list("shorts", list)
            .compound("inner", |b| b.put("d", 0.5f64))
            .build();
        let value = serde_json::to_value(Tag::Compound(compound)).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Bananrama",
                "bytes": [1, -1],
                "shorts": [1],
                "inner": { "d": 0.5 }
            })
        );
    }

    #[test]
    fn test_compact_string_keeps_insertion_order() {
        let compound = CompoundTag::builder(true).put("b", 1).put("a", 2).build();
        let text = to_json_string(&Tag::Compound(compound), false).unwrap();
        assert_eq!(text, "{\"b\":1,\"a\":2}");
    }
}
