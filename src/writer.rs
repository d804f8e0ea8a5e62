use crate::array::{ArrayElement, ArrayTag};
use crate::compound::{CompoundAccess, CompoundTag};
use crate::error::{NbtError, NbtResult};
use crate::list::{ListAccess, ListTag};
use crate::registry::TagId;
use crate::scope::{Frame, Scope, ScopeStack, Slot};
use crate::tag::Tag;
use crate::utils;
use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;
use tracing::trace;
use uuid::Uuid;

/// 可直接写入流的标量值
pub trait NbtValue {
    const ID: TagId;

    fn write_payload<W: Write + ?Sized>(self, writer: &mut W) -> NbtResult<()>;
}

macro_rules! numeric_value {
    ($ty:ty, $id:ident, $write:ident) => {
        impl NbtValue for $ty {
            const ID: TagId = TagId::$id;

            fn write_payload<W: Write + ?Sized>(self, writer: &mut W) -> NbtResult<()> {
                writer.$write::<BigEndian>(self)?;
                Ok(())
            }
        }
    };
}

numeric_value!(i16, Short, write_i16);
numeric_value!(i32, Int, write_i32);
numeric_value!(i64, Long, write_i64);
numeric_value!(f32, Float, write_f32);
numeric_value!(f64, Double, write_f64);

impl NbtValue for i8 {
    const ID: TagId = TagId::Byte;

    fn write_payload<W: Write + ?Sized>(self, writer: &mut W) -> NbtResult<()> {
        writer.write_i8(self)?;
        Ok(())
    }
}

impl NbtValue for bool {
    const ID: TagId = TagId::Byte;

    fn write_payload<W: Write + ?Sized>(self, writer: &mut W) -> NbtResult<()> {
        (self as i8).write_payload(writer)
    }
}

impl NbtValue for &str {
    const ID: TagId = TagId::String;

    fn write_payload<W: Write + ?Sized>(self, writer: &mut W) -> NbtResult<()> {
        utils::write_string(writer, self)
    }
}

impl NbtValue for String {
    const ID: TagId = TagId::String;

    fn write_payload<W: Write + ?Sized>(self, writer: &mut W) -> NbtResult<()> {
        utils::write_string(writer, &self)
    }
}

impl NbtValue for Uuid {
    const ID: TagId = TagId::IntArray;

    fn write_payload<W: Write + ?Sized>(self, writer: &mut W) -> NbtResult<()> {
        let ints = utils::uuid_to_ints(self);
        utils::write_length(writer, ints.len())?;
        for value in ints {
            writer.write_i32::<BigEndian>(value)?;
        }
        Ok(())
    }
}

/// 流式写入器
///
/// 不构建标签树，直接按调用顺序输出字节。作用域栈保证嵌套与命名规则：
/// 复合标签中的每个值前必须调用 `name`（隐式根除外），列表与数组必须写满声明的长度。
pub struct NbtWriter<W: Write> {
    output: W,
    stack: ScopeStack,
}

impl<W: Write> NbtWriter<W> {
    pub fn new(output: W) -> Self {
        Self {
            output,
            stack: ScopeStack::new(),
        }
    }

    /// 当前打开的作用域数
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn name(&mut self, name: impl Into<String>) -> NbtResult<&mut Self> {
        self.stack.set_name(name.into())?;
        Ok(self)
    }

    /// 写入标量值
    pub fn value<V: NbtValue>(&mut self, value: V) -> NbtResult<&mut Self> {
        self.open(V::ID)?;
        value.write_payload(&mut self.output)?;
        Ok(self)
    }

    pub fn begin_byte_array(&mut self, len: usize) -> NbtResult<&mut Self> {
        self.begin(Scope::ByteArray, TagId::Byte, len)
    }

    pub fn begin_int_array(&mut self, len: usize) -> NbtResult<&mut Self> {
        self.begin(Scope::IntArray, TagId::Int, len)
    }

    pub fn begin_long_array(&mut self, len: usize) -> NbtResult<&mut Self> {
        self.begin(Scope::LongArray, TagId::Long, len)
    }

    pub fn begin_list(&mut self, element_type: TagId, len: usize) -> NbtResult<&mut Self> {
        if element_type == TagId::End && len > 0 {
            return Err(NbtError::misuse(format!("元素类型为 {} 的列表不能包含 {} 个元素", element_type, len)));
        }
        self.begin(Scope::List, element_type, len)
    }

    pub fn begin_compound(&mut self) -> NbtResult<&mut Self> {
        self.stack.ensure_can_push(Scope::Compound)?;
        self.open(TagId::Compound)?;
        self.stack.push(Frame::compound())?;
        trace!(depth = self.stack.depth(), "开始复合标签");
        Ok(self)
    }

    pub fn end_byte_array(&mut self) -> NbtResult<&mut Self> {
        self.close(Scope::ByteArray)
    }

    pub fn end_int_array(&mut self) -> NbtResult<&mut Self> {
        self.close(Scope::IntArray)
    }

    pub fn end_long_array(&mut self) -> NbtResult<&mut Self> {
        self.close(Scope::LongArray)
    }

    pub fn end_list(&mut self) -> NbtResult<&mut Self> {
        self.close(Scope::List)
    }

    /// 结束复合标签并写入其 End 字节
    pub fn end_compound(&mut self) -> NbtResult<&mut Self> {
        self.close(Scope::Compound)?;
        self.output.write_u8(TagId::End as u8)?;
        Ok(self)
    }

    /// 在隐式根作用域写入裸 End 字节，显式结束整个文档
    pub fn end(&mut self) -> NbtResult<&mut Self> {
        if !self.stack.is_root() {
            return Err(NbtError::misuse(format!(
                "{} 作用域中不能写入裸 End，请使用对应的结束方法",
                self.stack.scope()
            )));
        }
        if let Some(pending) = self.stack.pending_name() {
            return Err(NbtError::misuse(format!("名称 \"{}\" 悬空，没有对应的值", pending)));
        }
        self.output.write_u8(TagId::End as u8)?;
        Ok(self)
    }

    /// 将已构建的标签按流式调用写出
    pub fn write_tag(&mut self, tag: &Tag) -> NbtResult<&mut Self> {
        match tag {
            Tag::End => return Err(NbtError::misuse("End 标签不能作为值写入")),
            Tag::Byte(v) => self.value(*v)?,
            Tag::Short(v) => self.value(*v)?,
            Tag::Int(v) => self.value(*v)?,
            Tag::Long(v) => self.value(*v)?,
            Tag::Float(v) => self.value(*v)?,
            Tag::Double(v) => self.value(*v)?,
            Tag::String(v) => self.value(v.as_str())?,
            Tag::ByteArray(array) => self.write_array(Scope::ByteArray, TagId::Byte, array)?,
            Tag::IntArray(array) => self.write_array(Scope::IntArray, TagId::Int, array)?,
            Tag::LongArray(array) => self.write_array(Scope::LongArray, TagId::Long, array)?,
            Tag::List(list) => self.write_list(list)?,
            Tag::Compound(compound) => self.write_compound(compound)?,
        };
        Ok(self)
    }

    /// 结束写入：只允许隐式根作用域且无悬空名称，刷新后返回输出流
    pub fn finish(mut self) -> NbtResult<W> {
        if !self.stack.is_root() {
            return Err(NbtError::misuse(format!(
                "仍有 {} 个作用域未结束，当前为 {}",
                self.stack.depth(),
                self.stack.scope()
            )));
        }
        if let Some(pending) = self.stack.pending_name() {
            return Err(NbtError::misuse(format!("名称 \"{}\" 悬空，没有对应的值", pending)));
        }
        self.output.flush()?;
        Ok(self.output)
    }

    /// 为下一个值写入类型与名称（复合标签中），或仅消耗一个元素名额（列表与数组中）
    fn open(&mut self, id: TagId) -> NbtResult<()> {
        match self.stack.claim(id)? {
            Slot::Entry(name) => {
                self.output.write_u8(id as u8)?;
                utils::write_string(&mut self.output, name.as_deref().unwrap_or(""))?;
            }
            Slot::Element => {}
        }
        Ok(())
    }

    fn begin(&mut self, scope: Scope, element_type: TagId, len: usize) -> NbtResult<&mut Self> {
        self.stack.ensure_can_push(scope)?;
        self.open(scope.tag_id())?;
        self.stack.push(Frame::sequence(scope, element_type, len))?;
        if scope == Scope::List {
            self.output.write_u8(element_type as u8)?;
        }
        utils::write_length(&mut self.output, len)?;
        trace!(%scope, len, depth = self.stack.depth(), "开始序列");
        Ok(self)
    }

    fn write_array<T: ArrayElement>(
        &mut self,
        scope: Scope,
        element_type: TagId,
        array: &ArrayTag<T>,
    ) -> NbtResult<&mut Self> {
        self.begin(scope, element_type, array.len())?;
        for &v in array.iter() {
            self.stack.claim(element_type)?;
            v.write_to(&mut self.output)?;
        }
        self.close(scope)
    }

    #[inline(never)]
    fn write_list(&mut self, list: &ListTag) -> NbtResult<&mut Self> {
        self.begin_list(list.element_type(), list.len())?;
        for element in list.iter() {
            self.write_tag(element)?;
        }
        self.end_list()
    }

    #[inline(never)]
    fn write_compound(&mut self, compound: &CompoundTag) -> NbtResult<&mut Self> {
        self.begin_compound()?;
        for (name, value) in compound.iter() {
            self.name(name)?;
            self.write_tag(value)?;
        }
        self.end_compound()
    }

    fn close(&mut self, scope: Scope) -> NbtResult<&mut Self> {
        self.stack.pop(scope)?;
        trace!(%scope, depth = self.stack.depth(), "结束作用域");
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_balanced_compound_succeeds() {
        let mut writer = NbtWriter::new(Vec::new());
        writer.begin_compound().unwrap();
        writer.name("k").unwrap().value(1).unwrap();
        writer.end_compound().unwrap();
        let bytes = writer.finish().unwrap();
        assert_eq!(
            bytes,
            vec![0x0A, 0x00, 0x00, 0x03, 0x00, 0x01, b'k', 0x00, 0x00, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn test_mismatched_end_is_misuse() {
        let mut writer = NbtWriter::new(Vec::new());
        writer.begin_compound().unwrap();
        assert!(matches!(writer.end_list(), Err(NbtError::StructuralMisuse(_))));
    }

    #[test]
    fn test_value_in_nested_compound_requires_name() {
        let mut writer = NbtWriter::new(Vec::new());
        writer.begin_compound().unwrap();
        assert!(matches!(writer.value(1i8), Err(NbtError::StructuralMisuse(_))));
    }

    #[test]
    fn test_dangling_name_is_misuse() {
        let mut writer = NbtWriter::new(Vec::new());
        writer.begin_compound().unwrap();
        writer.name("orphan").unwrap();
        assert!(writer.end_compound().is_err());
        assert!(writer.name("second").is_err());
    }

    #[test]
    fn test_name_only_in_compound_scope() {
        let mut writer = NbtWriter::new(Vec::new());
        writer.begin_compound().unwrap();
        writer.name("list").unwrap().begin_list(TagId::Int, 1).unwrap();
        assert!(writer.name("x").is_err());
    }

    #[test]
    fn test_list_discipline() {
        let mut writer = NbtWriter::new(Vec::new());
        writer.begin_compound().unwrap();
        writer.name("list").unwrap().begin_list(TagId::Short, 2).unwrap();
        assert!(writer.value(1i32).is_err());
        writer.value(1i16).unwrap();
        assert!(writer.end_list().is_err());
        writer.value(2i16).unwrap();
        assert!(writer.value(3i16).is_err());
        writer.end_list().unwrap().end_compound().unwrap();
        assert!(writer.finish().is_ok());

        let mut writer = NbtWriter::new(Vec::new());
        assert!(writer.begin_list(TagId::End, 1).is_err());
    }

    #[test]
    fn test_array_scope_accepts_matching_width_only() {
        let mut writer = NbtWriter::new(Vec::new());
        writer.begin_compound().unwrap();
        writer.name("ids").unwrap().begin_int_array(1).unwrap();
        assert!(writer.value(1i64).is_err());
        assert!(writer.begin_compound().is_err());
        assert!(writer.value(Uuid::nil()).is_err());
        writer.value(7).unwrap();
        writer.end_int_array().unwrap();
    }

    #[test]
    fn test_finish_rejects_open_scopes() {
        let mut writer = NbtWriter::new(Vec::new());
        writer.begin_compound().unwrap();
        assert!(matches!(writer.finish(), Err(NbtError::StructuralMisuse(_))));
    }

    #[test]
    fn test_end_only_at_root() {
        let mut writer = NbtWriter::new(Vec::new());
        writer.begin_compound().unwrap();
        assert!(writer.end().is_err());
        writer.end_compound().unwrap();
        writer.end().unwrap();
        assert_eq!(writer.finish().unwrap(), vec![0x0A, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_depth_cap() {
        let mut writer = NbtWriter::new(std::io::sink());
        writer.begin_compound().unwrap();
        for _ in 1..crate::MAX_DEPTH {
            writer.name("n").unwrap().begin_compound().unwrap();
        }
        assert_eq!(writer.depth(), crate::MAX_DEPTH);
        writer.name("n").unwrap();
        assert!(matches!(writer.begin_compound(), Err(NbtError::DepthExceeded(_))));
    }

    #[test]
    fn test_write_tag_matches_tree_codec() {
        let list = ListTag::builder(TagId::Long, true).add(1i64).unwrap().add(2i64).unwrap().build();
        let compound = CompoundTag::builder(true)
            .put("name", "Bananrama")
            .put("bytes", vec![1i8, 2, 3])
            .put_uuid("id", Uuid::from_u128(99))
            .list("longs", list)
            .compound("inner", |b| b.put("f", 0.5f32))
            .build();
        let tag = Tag::Compound(compound.clone());

        let mut writer = NbtWriter::new(Vec::new());
        writer.name("root").unwrap().write_tag(&tag).unwrap();
        let streamed = writer.finish().unwrap();

        let mut tree = Vec::new();
        codec::write_named_compound(&mut tree, "root", &compound).unwrap();
        assert_eq!(streamed, tree);
    }
}
