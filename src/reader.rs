use crate::array::{ArrayElement, ArrayTag};
use crate::compound::MutableCompoundTag;
use crate::error::{NbtError, NbtResult};
use crate::list::MutableListTag;
use crate::registry::TagId;
use crate::scope::{Frame, Scope, ScopeStack, Slot};
use crate::tag::Tag;
use crate::utils;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Read};
use tracing::trace;
use uuid::Uuid;

/// `next_tag` 中构建到一半的容器
enum Partial {
    List { element_type: TagId, data: Vec<Tag> },
    /// `name` 为下一个子值的条目名称
    Compound { compound: MutableCompoundTag, name: String },
}

impl Partial {
    fn push(&mut self, tag: Tag) {
        match self {
            Partial::List { data, .. } => data.push(tag),
            Partial::Compound { compound, name } => {
                compound.put(std::mem::take(name), tag);
            }
        }
    }
}

enum Step {
    Done(Tag),
    Open(Partial),
}

/// 流式读取器，与 `NbtWriter` 遵循相同的作用域规则
///
/// 复合标签中先用 `peek_type`/`has_next` 查看下一条目类型，再用 `next_name` 读取名称，
/// 最后按类型调用 `next_*` 或 `begin_*`。隐式根作用域中可省略 `next_name`。
pub struct NbtReader<R: Read> {
    input: R,
    stack: ScopeStack,
    /// 当前复合标签条目已读出的类型字节
    entry_type: Option<TagId>,
}

impl<R: Read> NbtReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            stack: ScopeStack::new(),
            entry_type: None,
        }
    }

    /// 当前打开的作用域数
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn scope(&self) -> Scope {
        self.stack.scope()
    }

    /// 下一个值的类型；复合标签中会读取条目的类型字节，列表与数组耗尽时返回 End
    pub fn peek_type(&mut self) -> NbtResult<TagId> {
        let frame = *self.stack.top();
        match frame.scope {
            Scope::Compound => {
                if let Some(id) = self.entry_type {
                    return Ok(id);
                }
                let id = TagId::try_from(self.input.read_u8()?)?;
                self.entry_type = Some(id);
                Ok(id)
            }
            _ if frame.remaining > 0 => Ok(frame.element_type),
            _ => Ok(TagId::End),
        }
    }

    /// 当前作用域是否还有值；隐式根作用域中数据流结束也视为没有
    pub fn has_next(&mut self) -> NbtResult<bool> {
        if self.stack.is_root() && self.entry_type.is_none() {
            let mut byte = [0u8; 1];
            loop {
                match self.input.read(&mut byte) {
                    Ok(0) => return Ok(false),
                    Ok(_) => break,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            let id = TagId::try_from(byte[0])?;
            self.entry_type = Some(id);
            return Ok(id != TagId::End);
        }
        Ok(self.peek_type()? != TagId::End)
    }

    /// 读取复合标签中下一条目的名称
    pub fn next_name(&mut self) -> NbtResult<String> {
        if self.stack.scope() != Scope::Compound {
            return Err(NbtError::misuse(format!("{} 作用域中没有名称", self.stack.scope())));
        }
        if let Some(pending) = self.stack.pending_name() {
            return Err(NbtError::misuse(format!("名称 \"{}\" 已读取，尚未读取其值", pending)));
        }
        if self.peek_type()? == TagId::End {
            return Err(NbtError::misuse("复合标签已没有更多条目"));
        }
        let name = utils::read_string(&mut self.input)?;
        self.stack.set_name(name.clone())?;
        Ok(name)
    }

    pub fn next_bool(&mut self) -> NbtResult<bool> {
        Ok(self.next_byte()? != 0)
    }

    pub fn next_byte(&mut self) -> NbtResult<i8> {
        self.open(TagId::Byte)?;
        Ok(self.input.read_i8()?)
    }

    pub fn next_short(&mut self) -> NbtResult<i16> {
        self.open(TagId::Short)?;
        Ok(self.input.read_i16::<BigEndian>()?)
    }

    pub fn next_int(&mut self) -> NbtResult<i32> {
        self.open(TagId::Int)?;
        Ok(self.input.read_i32::<BigEndian>()?)
    }

    pub fn next_long(&mut self) -> NbtResult<i64> {
        self.open(TagId::Long)?;
        Ok(self.input.read_i64::<BigEndian>()?)
    }

    pub fn next_float(&mut self) -> NbtResult<f32> {
        self.open(TagId::Float)?;
        Ok(self.input.read_f32::<BigEndian>()?)
    }

    pub fn next_double(&mut self) -> NbtResult<f64> {
        self.open(TagId::Double)?;
        Ok(self.input.read_f64::<BigEndian>()?)
    }

    pub fn next_string(&mut self) -> NbtResult<String> {
        self.open(TagId::String)?;
        utils::read_string(&mut self.input)
    }

    /// 读取 4 元素 IntArray 形式的 UUID
    pub fn next_uuid(&mut self) -> NbtResult<Uuid> {
        self.open(TagId::IntArray)?;
        let len = utils::read_length(&mut self.input)?;
        if len != 4 {
            return Err(NbtError::format(format!("UUID数组长度必须为4，实际为 {}", len)));
        }
        let mut ints = [0i32; 4];
        for value in ints.iter_mut() {
            *value = self.input.read_i32::<BigEndian>()?;
        }
        Ok(utils::uuid_from_ints(ints))
    }

    /// 在隐式根作用域读取显式的文档结束标记
    pub fn next_end(&mut self) -> NbtResult<()> {
        if !self.stack.is_root() {
            return Err(NbtError::misuse(format!(
                "{} 作用域中不能读取裸 End，请使用对应的结束方法",
                self.stack.scope()
            )));
        }
        if let Some(pending) = self.stack.pending_name() {
            return Err(NbtError::misuse(format!("名称 \"{}\" 已读取，尚未读取其值", pending)));
        }
        let found = self.peek_type()?;
        if found != TagId::End {
            return Err(NbtError::TypeMismatch {
                expected: TagId::End,
                found,
            });
        }
        self.entry_type = None;
        Ok(())
    }

    pub fn begin_byte_array(&mut self) -> NbtResult<usize> {
        self.begin_sequence(Scope::ByteArray, TagId::Byte)
    }

    pub fn begin_int_array(&mut self) -> NbtResult<usize> {
        self.begin_sequence(Scope::IntArray, TagId::Int)
    }

    pub fn begin_long_array(&mut self) -> NbtResult<usize> {
        self.begin_sequence(Scope::LongArray, TagId::Long)
    }

    /// 开始读取列表，返回 `(元素类型, 长度)`
    pub fn begin_list(&mut self) -> NbtResult<(TagId, usize)> {
        self.stack.ensure_can_push(Scope::List)?;
        self.open(TagId::List)?;
        let element_type = TagId::try_from(self.input.read_u8()?)?;
        let len = utils::read_length(&mut self.input)?;
        if element_type == TagId::End && len > 0 {
            return Err(NbtError::format(format!("非空列表缺少元素类型，长度为 {}", len)));
        }
        self.stack.push(Frame::sequence(Scope::List, element_type, len))?;
        trace!(%element_type, len, depth = self.stack.depth(), "开始读取列表");
        Ok((element_type, len))
    }

    pub fn begin_compound(&mut self) -> NbtResult<()> {
        self.stack.ensure_can_push(Scope::Compound)?;
        self.open(TagId::Compound)?;
        self.stack.push(Frame::compound())?;
        trace!(depth = self.stack.depth(), "开始读取复合标签");
        Ok(())
    }

    pub fn end_byte_array(&mut self) -> NbtResult<()> {
        self.close(Scope::ByteArray)
    }

    pub fn end_int_array(&mut self) -> NbtResult<()> {
        self.close(Scope::IntArray)
    }

    pub fn end_long_array(&mut self) -> NbtResult<()> {
        self.close(Scope::LongArray)
    }

    pub fn end_list(&mut self) -> NbtResult<()> {
        self.close(Scope::List)
    }

    /// 读取 End 字节并结束复合标签；仍有条目时报错
    pub fn end_compound(&mut self) -> NbtResult<()> {
        self.stack.check_close(Scope::Compound)?;
        let next = self.peek_type()?;
        if next != TagId::End {
            return Err(NbtError::misuse(format!("复合标签仍有未读取的 {} 条目", next)));
        }
        self.entry_type = None;
        self.close(Scope::Compound)
    }

    /// 读取当前位置的完整值并构建为标签
    ///
    /// 用显式栈保存构建中的容器，嵌套深度只受作用域栈上限约束。
    pub fn next_tag(&mut self) -> NbtResult<Tag> {
        let mut parents: Vec<Partial> = Vec::new();
        loop {
            let mut finished = match self.start_value()? {
                Step::Done(tag) => Some(tag),
                Step::Open(partial) => {
                    parents.push(partial);
                    None
                }
            };

            loop {
                let Some(parent) = parents.last_mut() else {
                    return finished.ok_or_else(|| NbtError::misuse("当前位置没有可读取的值"));
                };
                if let Some(tag) = finished.take() {
                    parent.push(tag);
                }
                if self.peek_type()? != TagId::End {
                    if let Partial::Compound { name, .. } = parent {
                        *name = self.next_name()?;
                    }
                    break;
                }
                if let Some(partial) = parents.pop() {
                    finished = Some(self.finish_partial(partial)?);
                }
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.input
    }

    /// 为类型为 `id` 的下一个值占位：复合标签中校验条目类型并消耗名称
    fn open(&mut self, id: TagId) -> NbtResult<()> {
        let frame = *self.stack.top();
        if frame.scope == Scope::Compound {
            if self.stack.pending_name().is_none() && self.stack.is_root() {
                self.next_name()?;
            }
            if self.stack.pending_name().is_some() {
                let found = self.entry_type.unwrap_or(TagId::End);
                if found != id {
                    return Err(NbtError::TypeMismatch { expected: id, found });
                }
            }
        } else if frame.element_type != id {
            return Err(NbtError::TypeMismatch {
                expected: id,
                found: frame.element_type,
            });
        }
        if let Slot::Entry(_) = self.stack.claim(id)? {
            self.entry_type = None;
        }
        Ok(())
    }

    /// 标量与数组直接读完，列表与复合标签只打开作用域
    fn start_value(&mut self) -> NbtResult<Step> {
        let tag = match self.peek_type()? {
            TagId::End => return Err(NbtError::misuse("当前位置没有可读取的值")),
            TagId::Byte => Tag::Byte(self.next_byte()?),
            TagId::Short => Tag::Short(self.next_short()?),
            TagId::Int => Tag::Int(self.next_int()?),
            TagId::Long => Tag::Long(self.next_long()?),
            TagId::Float => Tag::Float(self.next_float()?),
            TagId::Double => Tag::Double(self.next_double()?),
            TagId::String => Tag::String(self.next_string()?),
            TagId::ByteArray => Tag::ByteArray(self.read_array(Scope::ByteArray, TagId::Byte)?),
            TagId::IntArray => Tag::IntArray(self.read_array(Scope::IntArray, TagId::Int)?),
            TagId::LongArray => Tag::LongArray(self.read_array(Scope::LongArray, TagId::Long)?),
            TagId::List => {
                let (element_type, len) = self.begin_list()?;
                return Ok(Step::Open(Partial::List {
                    element_type,
                    data: Vec::with_capacity(utils::bounded_capacity(len)),
                }));
            }
            TagId::Compound => {
                self.begin_compound()?;
                return Ok(Step::Open(Partial::Compound {
                    compound: MutableCompoundTag::new(),
                    name: String::new(),
                }));
            }
        };
        Ok(Step::Done(tag))
    }

    fn read_array<T: ArrayElement>(&mut self, scope: Scope, element_type: TagId) -> NbtResult<ArrayTag<T>> {
        let len = self.begin_sequence(scope, element_type)?;
        let mut data = Vec::with_capacity(utils::bounded_capacity(len));
        for _ in 0..len {
            self.stack.claim(element_type)?;
            data.push(T::read_from(&mut self.input)?);
        }
        self.close(scope)?;
        Ok(ArrayTag::new(data))
    }

    fn finish_partial(&mut self, partial: Partial) -> NbtResult<Tag> {
        match partial {
            Partial::List { element_type, data } => {
                self.end_list()?;
                Ok(Tag::List(MutableListTag::from_raw(element_type, data).into()))
            }
            Partial::Compound { compound, .. } => {
                self.end_compound()?;
                Ok(Tag::Compound(compound.into()))
            }
        }
    }

    fn begin_sequence(&mut self, scope: Scope, element_type: TagId) -> NbtResult<usize> {
        self.stack.ensure_can_push(scope)?;
        self.open(scope.tag_id())?;
        let len = utils::read_length(&mut self.input)?;
        self.stack.push(Frame::sequence(scope, element_type, len))?;
        trace!(%scope, len, depth = self.stack.depth(), "开始读取数组");
        Ok(len)
    }

    fn close(&mut self, scope: Scope) -> NbtResult<()> {
        self.stack.pop(scope)?;
        trace!(%scope, depth = self.stack.depth(), "结束作用域");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::NbtWriter;

    fn bananrama() -> Vec<u8> {
        let mut bytes = vec![0x0A, 0x00, 0x0B];
        bytes.extend_from_slice(b"hello world");
        bytes.extend_from_slice(&[0x08, 0x00, 0x04]);
        bytes.extend_from_slice(b"name");
        bytes.extend_from_slice(&[0x00, 0x09]);
        bytes.extend_from_slice(b"Bananrama");
        bytes.push(0x00);
        bytes
    }

    #[test]
    fn test_reads_bananrama_event_by_event() {
        let bytes = bananrama();
        let mut reader = NbtReader::new(bytes.as_slice());
        assert_eq!(reader.peek_type().unwrap(), TagId::Compound);
        assert_eq!(reader.next_name().unwrap(), "hello world");
        reader.begin_compound().unwrap();
        assert!(reader.has_next().unwrap());
        assert_eq!(reader.next_name().unwrap(), "name");
        assert_eq!(reader.next_string().unwrap(), "Bananrama");
        assert!(!reader.has_next().unwrap());
        reader.end_compound().unwrap();
        assert!(!reader.has_next().unwrap());
        assert_eq!(reader.depth(), 0);
    }

    #[test]
    fn test_root_name_is_implicit() {
        let bytes = bananrama();
        let mut reader = NbtReader::new(bytes.as_slice());
        reader.begin_compound().unwrap();
        reader.next_name().unwrap();
        assert_eq!(reader.next_string().unwrap(), "Bananrama");
        reader.end_compound().unwrap();
    }

    #[test]
    fn test_type_mismatch_on_wrong_request() {
        let bytes = bananrama();
        let mut reader = NbtReader::new(bytes.as_slice());
        reader.begin_compound().unwrap();
        reader.next_name().unwrap();
        assert!(matches!(
            reader.next_int(),
            Err(NbtError::TypeMismatch {
                expected: TagId::Int,
                found: TagId::String
            })
        ));
    }

    #[test]
    fn test_end_compound_with_remaining_entries_is_misuse() {
        let bytes = bananrama();
        let mut reader = NbtReader::new(bytes.as_slice());
        reader.begin_compound().unwrap();
        assert!(matches!(reader.end_compound(), Err(NbtError::StructuralMisuse(_))));
    }

    #[test]
    fn test_value_without_name_in_nested_compound_is_misuse() {
        let bytes = bananrama();
        let mut reader = NbtReader::new(bytes.as_slice());
        reader.begin_compound().unwrap();
        assert!(matches!(reader.next_string(), Err(NbtError::StructuralMisuse(_))));
    }

    #[test]
    fn test_list_and_array_scopes() {
        let mut writer = NbtWriter::new(Vec::new());
        writer.begin_compound().unwrap();
        writer.name("list").unwrap().begin_list(TagId::Int, 2).unwrap();
        writer.value(1).unwrap().value(2).unwrap();
        writer.end_list().unwrap();
        writer.name("id").unwrap().value(Uuid::from_u128(5)).unwrap();
        writer.name("longs").unwrap().begin_long_array(1).unwrap();
        writer.value(9i64).unwrap();
        writer.end_long_array().unwrap();
        writer.end_compound().unwrap();
        let bytes = writer.finish().unwrap();

        let mut reader = NbtReader::new(bytes.as_slice());
        reader.begin_compound().unwrap();
        assert_eq!(reader.next_name().unwrap(), "list");
        assert_eq!(reader.begin_list().unwrap(), (TagId::Int, 2));
        assert_eq!(reader.peek_type().unwrap(), TagId::Int);
        assert!(matches!(
            reader.next_long(),
            Err(NbtError::TypeMismatch {
                expected: TagId::Long,
                found: TagId::Int
            })
        ));
        assert_eq!(reader.next_int().unwrap(), 1);
        assert!(reader.end_list().is_err());
        assert_eq!(reader.next_int().unwrap(), 2);
        assert!(!reader.has_next().unwrap());
        reader.end_list().unwrap();

        assert_eq!(reader.next_name().unwrap(), "id");
        assert_eq!(reader.next_uuid().unwrap(), Uuid::from_u128(5));

        assert_eq!(reader.next_name().unwrap(), "longs");
        assert_eq!(reader.next_tag().unwrap(), Tag::LongArray(vec![9i64].into()));
        reader.end_compound().unwrap();
    }

    #[test]
    fn test_next_end_reads_document_terminator() {
        let mut writer = NbtWriter::new(Vec::new());
        writer.name("a").unwrap().value(1i8).unwrap();
        writer.end().unwrap();
        let bytes = writer.finish().unwrap();

        let mut reader = NbtReader::new(bytes.as_slice());
        assert_eq!(reader.next_name().unwrap(), "a");
        assert_eq!(reader.next_byte().unwrap(), 1);
        reader.next_end().unwrap();
        assert!(!reader.has_next().unwrap());
    }

    #[test]
    fn test_next_tag_reads_deepest_nested_lists() {
        // 根复合标签内嵌 511 层列表，共 512 层容器
        let mut bytes = vec![0x0A, 0x00, 0x00, 0x09, 0x00, 0x01, b'l'];
        for _ in 0..crate::MAX_DEPTH - 2 {
            bytes.push(TagId::List as u8);
            bytes.extend_from_slice(&1i32.to_be_bytes());
        }
        bytes.push(TagId::Int as u8);
        bytes.extend_from_slice(&1i32.to_be_bytes());
        bytes.extend_from_slice(&42i32.to_be_bytes());
        bytes.push(0x00);

        let mut reader = NbtReader::new(bytes.as_slice());
        let tag = reader.next_tag().unwrap();
        assert_eq!(reader.depth(), 0);

        let mut cursor = bytes.as_slice();
        let (_, tree) = crate::codec::read_named_tag(&mut cursor).unwrap();
        assert_eq!(tag, tree);

        let mut deeper = bytes.clone();
        deeper.splice(7..7, [TagId::List as u8, 0x00, 0x00, 0x00, 0x01]);
        let mut reader = NbtReader::new(deeper.as_slice());
        assert!(matches!(reader.next_tag(), Err(NbtError::DepthExceeded(_))));
    }

    #[test]
    fn test_truncated_input_is_format_error() {
        let bytes = bananrama();
        let mut reader = NbtReader::new(&bytes[..bytes.len() - 4]);
        assert!(matches!(reader.next_tag(), Err(NbtError::Format(_))));
    }
}
