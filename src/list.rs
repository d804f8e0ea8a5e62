use crate::array::{ByteArrayTag, IntArrayTag, LongArrayTag};
use crate::compound::CompoundTag;
use crate::error::{NbtError, NbtResult};
use crate::registry::TagId;
use crate::tag::Tag;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// 列表的只读访问接口，可变与不可变列表共用
///
/// 类型化读取器要求元素类型严格一致，索引越界或类型不符时返回默认值。
pub trait ListAccess {
    /// 元素类型，空列表可能为 End
    fn element_type(&self) -> TagId;

    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Option<&Tag>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn iter(&self) -> ListIter<'_, Self>
    where
        Self: Sized,
    {
        ListIter {
            list: self,
            index: 0,
        }
    }

    fn get_bool(&self, index: usize, default: bool) -> bool {
        match self.get(index) {
            Some(Tag::Byte(v)) => *v != 0,
            _ => default,
        }
    }

    fn get_byte(&self, index: usize, default: i8) -> i8 {
        match self.get(index) {
            Some(Tag::Byte(v)) => *v,
            _ => default,
        }
    }

    fn get_short(&self, index: usize, default: i16) -> i16 {
        match self.get(index) {
            Some(Tag::Short(v)) => *v,
            _ => default,
        }
    }

    fn get_int(&self, index: usize, default: i32) -> i32 {
        match self.get(index) {
            Some(Tag::Int(v)) => *v,
            _ => default,
        }
    }

    fn get_long(&self, index: usize, default: i64) -> i64 {
        match self.get(index) {
            Some(Tag::Long(v)) => *v,
            _ => default,
        }
    }

    fn get_float(&self, index: usize, default: f32) -> f32 {
        match self.get(index) {
            Some(Tag::Float(v)) => *v,
            _ => default,
        }
    }

    fn get_double(&self, index: usize, default: f64) -> f64 {
        match self.get(index) {
            Some(Tag::Double(v)) => *v,
            _ => default,
        }
    }

    fn get_string<'a>(&'a self, index: usize, default: &'a str) -> &'a str {
        match self.get(index) {
            Some(Tag::String(v)) => v,
            _ => default,
        }
    }

    fn get_byte_array<'a>(&'a self, index: usize, default: &'a ByteArrayTag) -> &'a ByteArrayTag {
        match self.get(index) {
            Some(Tag::ByteArray(v)) => v,
            _ => default,
        }
    }

    fn get_int_array<'a>(&'a self, index: usize, default: &'a IntArrayTag) -> &'a IntArrayTag {
        match self.get(index) {
            Some(Tag::IntArray(v)) => v,
            _ => default,
        }
    }

    fn get_long_array<'a>(&'a self, index: usize, default: &'a LongArrayTag) -> &'a LongArrayTag {
        match self.get(index) {
            Some(Tag::LongArray(v)) => v,
            _ => default,
        }
    }

    fn get_list<'a>(&'a self, index: usize, default: &'a ListTag) -> &'a ListTag {
        match self.get(index) {
            Some(Tag::List(v)) => v,
            _ => default,
        }
    }

    fn get_compound<'a>(&'a self, index: usize, default: &'a CompoundTag) -> &'a CompoundTag {
        match self.get(index) {
            Some(Tag::Compound(v)) => v,
            _ => default,
        }
    }
}

/// 按索引遍历列表元素
pub struct ListIter<'a, L: ListAccess> {
    list: &'a L,
    index: usize,
}

impl<'a, L: ListAccess> Iterator for ListIter<'a, L> {
    type Item = &'a Tag;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.list.get(self.index)?;
        self.index += 1;
        Some(tag)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.list.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<'a, L: ListAccess> ExactSizeIterator for ListIter<'a, L> {}

/// 校验待写入元素，返回写入后列表的元素类型
fn accept(element_type: TagId, tag: &Tag) -> NbtResult<TagId> {
    let id = tag.id();
    if id == TagId::End {
        return Err(NbtError::TypeMismatch {
            expected: element_type,
            found: id,
        });
    }
    if element_type != TagId::End && element_type != id {
        return Err(NbtError::TypeMismatch {
            expected: element_type,
            found: id,
        });
    }
    Ok(id)
}

/// 替换元素时的校验：单元素列表允许改变类型
fn accept_replacement(element_type: TagId, len: usize, tag: &Tag) -> NbtResult<TagId> {
    if len == 1 {
        accept(TagId::End, tag)
    } else {
        accept(element_type, tag)
    }
}

fn index_error(index: usize, len: usize) -> NbtError {
    NbtError::Index { index, len }
}

/// 可变列表，单一所有者原地修改
#[derive(Debug, Clone)]
pub struct MutableListTag {
    element_type: TagId,
    data: Vec<Tag>,
}

impl Default for MutableListTag {
    fn default() -> Self {
        Self::new()
    }
}

impl MutableListTag {
    pub fn new() -> Self {
        Self {
            element_type: TagId::End,
            data: Vec::new(),
        }
    }

    /// 预先声明元素类型的空列表
    pub fn with_type(element_type: TagId) -> Self {
        Self {
            element_type,
            data: Vec::new(),
        }
    }

    /// 由已有标签构建，逐个校验类型
    pub fn from_tags(element_type: TagId, tags: Vec<Tag>) -> NbtResult<Self> {
        let mut list = Self::with_type(element_type);
        list.data.reserve(tags.len());
        for tag in tags {
            list.add(tag)?;
        }
        Ok(list)
    }

    /// 解码器已保证同构时使用
    pub(crate) fn from_raw(element_type: TagId, data: Vec<Tag>) -> Self {
        Self { element_type, data }
    }

    pub fn add(&mut self, tag: impl Into<Tag>) -> NbtResult<()> {
        let tag = tag.into();
        self.element_type = accept(self.element_type, &tag)?;
        self.data.push(tag);
        Ok(())
    }

    pub fn add_uuid(&mut self, uuid: Uuid) -> NbtResult<()> {
        self.add(uuid)
    }

    pub fn insert(&mut self, index: usize, tag: impl Into<Tag>) -> NbtResult<()> {
        if index > self.data.len() {
            return Err(index_error(index, self.data.len()));
        }
        let tag = tag.into();
        self.element_type = accept(self.element_type, &tag)?;
        self.data.insert(index, tag);
        Ok(())
    }

    /// 替换元素，返回旧值
    pub fn set(&mut self, index: usize, tag: impl Into<Tag>) -> NbtResult<Tag> {
        let len = self.data.len();
        if index >= len {
            return Err(index_error(index, len));
        }
        let tag = tag.into();
        self.element_type = accept_replacement(self.element_type, len, &tag)?;
        Ok(std::mem::replace(&mut self.data[index], tag))
    }

    pub fn remove(&mut self, index: usize) -> NbtResult<Tag> {
        if index >= self.data.len() {
            return Err(index_error(index, self.data.len()));
        }
        let removed = self.data.remove(index);
        self.reset_if_empty();
        Ok(removed)
    }

    /// 移除第一个与之相等的元素
    pub fn remove_tag(&mut self, tag: &Tag) -> bool {
        match self.data.iter().position(|t| t == tag) {
            Some(index) => {
                self.data.remove(index);
                self.reset_if_empty();
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.element_type = TagId::End;
    }

    pub fn as_slice(&self) -> &[Tag] {
        &self.data
    }

    /// 深拷贝
    pub fn copy(&self) -> Self {
        Self {
            element_type: self.element_type,
            data: self.data.iter().map(Tag::copy).collect(),
        }
    }

    pub fn into_immutable(self) -> ImmutableListTag {
        ImmutableListTag {
            element_type: self.element_type,
            data: self.data.into_iter().collect(),
        }
    }

    fn reset_if_empty(&mut self) {
        if self.data.is_empty() {
            self.element_type = TagId::End;
        }
    }
}

impl ListAccess for MutableListTag {
    fn element_type(&self) -> TagId {
        self.element_type
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn get(&self, index: usize) -> Option<&Tag> {
        self.data.get(index)
    }
}

/// 不可变列表，基于持久化向量，每次写操作返回新实例
#[derive(Debug, Clone)]
pub struct ImmutableListTag {
    element_type: TagId,
    data: im::Vector<Tag>,
}

impl Default for ImmutableListTag {
    fn default() -> Self {
        Self::new()
    }
}

impl ImmutableListTag {
    pub fn new() -> Self {
        Self {
            element_type: TagId::End,
            data: im::Vector::new(),
        }
    }

    pub fn with_type(element_type: TagId) -> Self {
        Self {
            element_type,
            data: im::Vector::new(),
        }
    }

    pub fn from_tags(element_type: TagId, tags: Vec<Tag>) -> NbtResult<Self> {
        Ok(MutableListTag::from_tags(element_type, tags)?.into_immutable())
    }

    pub fn add(&self, tag: impl Into<Tag>) -> NbtResult<Self> {
        let tag = tag.into();
        let element_type = accept(self.element_type, &tag)?;
        let mut data = self.data.clone();
        data.push_back(tag);
        Ok(Self { element_type, data })
    }

    pub fn add_uuid(&self, uuid: Uuid) -> NbtResult<Self> {
        self.add(uuid)
    }

    pub fn insert(&self, index: usize, tag: impl Into<Tag>) -> NbtResult<Self> {
        if index > self.data.len() {
            return Err(index_error(index, self.data.len()));
        }
        let tag = tag.into();
        let element_type = accept(self.element_type, &tag)?;
        let mut data = self.data.clone();
        data.insert(index, tag);
        Ok(Self { element_type, data })
    }

    pub fn set(&self, index: usize, tag: impl Into<Tag>) -> NbtResult<Self> {
        let len = self.data.len();
        if index >= len {
            return Err(index_error(index, len));
        }
        let tag = tag.into();
        let element_type = accept_replacement(self.element_type, len, &tag)?;
        Ok(Self {
            element_type,
            data: self.data.update(index, tag),
        })
    }

    pub fn remove(&self, index: usize) -> NbtResult<Self> {
        if index >= self.data.len() {
            return Err(index_error(index, self.data.len()));
        }
        let mut data = self.data.clone();
        data.remove(index);
        Ok(Self::rebuilt(self.element_type, data))
    }

    pub fn remove_tag(&self, tag: &Tag) -> Self {
        match self.data.index_of(tag) {
            Some(index) => {
                let mut data = self.data.clone();
                data.remove(index);
                Self::rebuilt(self.element_type, data)
            }
            None => self.clone(),
        }
    }

    /// 共享结构，O(1)
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn to_mutable(&self) -> MutableListTag {
        MutableListTag {
            element_type: self.element_type,
            data: self.data.iter().map(Tag::copy).collect(),
        }
    }

    fn rebuilt(element_type: TagId, data: im::Vector<Tag>) -> Self {
        if data.is_empty() {
            Self::new()
        } else {
            Self { element_type, data }
        }
    }
}

impl ListAccess for ImmutableListTag {
    fn element_type(&self) -> TagId {
        self.element_type
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn get(&self, index: usize) -> Option<&Tag> {
        self.data.get(index)
    }
}

/// 列表标签：可变或不可变两种生命周期
#[derive(Debug, Clone)]
pub enum ListTag {
    Mutable(MutableListTag),
    Immutable(ImmutableListTag),
}

impl Default for ListTag {
    fn default() -> Self {
        ListTag::Mutable(MutableListTag::new())
    }
}

impl ListTag {
    /// 空的可变列表
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(element_type: TagId) -> Self {
        ListTag::Mutable(MutableListTag::with_type(element_type))
    }

    /// 共享的空不可变列表
    pub fn empty() -> Self {
        ListTag::Immutable(ImmutableListTag::new())
    }

    pub fn builder(element_type: TagId, mutable: bool) -> ListBuilder {
        ListBuilder::new(element_type, mutable)
    }

    pub fn is_mutable(&self) -> bool {
        matches!(self, ListTag::Mutable(_))
    }

    /// 追加元素；对不可变变体，以新实例替换自身
    pub fn add(&mut self, tag: impl Into<Tag>) -> NbtResult<()> {
        match self {
            ListTag::Mutable(list) => list.add(tag),
            ListTag::Immutable(list) => {
                *list = list.add(tag)?;
                Ok(())
            }
        }
    }

    /// 转为可变列表（不可变列表会复制元素）
    pub fn mutable(self) -> MutableListTag {
        match self {
            ListTag::Mutable(list) => list,
            ListTag::Immutable(list) => list.to_mutable(),
        }
    }

    pub fn immutable(self) -> ImmutableListTag {
        match self {
            ListTag::Mutable(list) => list.into_immutable(),
            ListTag::Immutable(list) => list,
        }
    }

    pub fn as_mutable_mut(&mut self) -> Option<&mut MutableListTag> {
        match self {
            ListTag::Mutable(list) => Some(list),
            ListTag::Immutable(_) => None,
        }
    }

    pub fn copy(&self) -> Self {
        match self {
            ListTag::Mutable(list) => ListTag::Mutable(list.copy()),
            ListTag::Immutable(list) => ListTag::Immutable(list.copy()),
        }
    }
}

impl ListAccess for ListTag {
    fn element_type(&self) -> TagId {
        match self {
            ListTag::Mutable(list) => list.element_type(),
            ListTag::Immutable(list) => list.element_type(),
        }
    }

    fn len(&self) -> usize {
        match self {
            ListTag::Mutable(list) => list.len(),
            ListTag::Immutable(list) => list.len(),
        }
    }

    fn get(&self, index: usize) -> Option<&Tag> {
        match self {
            ListTag::Mutable(list) => list.get(index),
            ListTag::Immutable(list) => list.get(index),
        }
    }
}

fn lists_equal<A: ListAccess, B: ListAccess>(a: &A, b: &B) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

fn hash_list<L: ListAccess, H: Hasher>(list: &L, state: &mut H) {
    list.len().hash(state);
    for tag in list.iter() {
        tag.hash(state);
    }
}

impl PartialEq for ListTag {
    fn eq(&self, other: &Self) -> bool {
        lists_equal(self, other)
    }
}

impl Eq for ListTag {}

impl Hash for ListTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_list(self, state);
    }
}

impl PartialEq for MutableListTag {
    fn eq(&self, other: &Self) -> bool {
        lists_equal(self, other)
    }
}

impl Eq for MutableListTag {}

impl PartialEq for ImmutableListTag {
    fn eq(&self, other: &Self) -> bool {
        lists_equal(self, other)
    }
}

impl Eq for ImmutableListTag {}

impl From<MutableListTag> for ListTag {
    fn from(list: MutableListTag) -> Self {
        ListTag::Mutable(list)
    }
}

impl From<ImmutableListTag> for ListTag {
    fn from(list: ImmutableListTag) -> Self {
        ListTag::Immutable(list)
    }
}

impl<'a> IntoIterator for &'a ListTag {
    type Item = &'a Tag;
    type IntoIter = ListIter<'a, ListTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// 列表构建器
pub struct ListBuilder {
    mutable: bool,
    list: MutableListTag,
}

impl ListBuilder {
    pub fn new(element_type: TagId, mutable: bool) -> Self {
        Self {
            mutable,
            list: MutableListTag::with_type(element_type),
        }
    }

    pub fn add(mut self, tag: impl Into<Tag>) -> NbtResult<Self> {
        self.list.add(tag)?;
        Ok(self)
    }

    pub fn add_uuid(self, uuid: Uuid) -> NbtResult<Self> {
        self.add(uuid)
    }

    pub fn build(self) -> ListTag {
        if self.mutable {
            ListTag::Mutable(self.list)
        } else {
            ListTag::Immutable(self.list.into_immutable())
        }
    }
}
