use crate::array::{ByteArrayTag, IntArrayTag, LongArrayTag};
use crate::list::{ListAccess, ListTag};
use crate::registry::TagId;
use crate::tag::Tag;
use crate::utils;
use indexmap::IndexMap;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// 复合标签的只读访问接口
///
/// 数值读取器接受任意数值类型并按 `as` 语义转换；其他读取器要求类型一致。
/// 键不存在或类型不符时返回默认值，从不失败。
pub trait CompoundAccess {
    fn get(&self, key: &str) -> Option<&Tag>;

    fn len(&self) -> usize;

    /// 按插入顺序取第 `index` 个条目
    fn entry_at(&self, index: usize) -> Option<(&str, &Tag)>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// 条目类型，不存在时为 End
    fn type_of(&self, key: &str) -> TagId {
        self.get(key).map_or(TagId::End, Tag::id)
    }

    fn contains(&self, key: &str, id: TagId) -> bool {
        self.type_of(key) == id
    }

    fn contains_number(&self, key: &str) -> bool {
        self.type_of(key).is_numeric()
    }

    /// 4 元素 IntArray 即视为 UUID
    fn has_uuid(&self, key: &str) -> bool {
        matches!(self.get(key), Some(Tag::IntArray(a)) if a.len() == 4)
    }

    fn iter(&self) -> Entries<'_, Self>
    where
        Self: Sized,
    {
        Entries {
            compound: self,
            index: 0,
        }
    }

    fn keys(&self) -> Keys<'_, Self>
    where
        Self: Sized,
    {
        Keys { entries: self.iter() }
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(Tag::numeric_as_i32)
            .map_or(default, |v| v as i8 != 0)
    }

    fn get_byte(&self, key: &str, default: i8) -> i8 {
        self.get(key).and_then(Tag::numeric_as_i32).map_or(default, |v| v as i8)
    }

    fn get_short(&self, key: &str, default: i16) -> i16 {
        self.get(key).and_then(Tag::numeric_as_i32).map_or(default, |v| v as i16)
    }

    fn get_int(&self, key: &str, default: i32) -> i32 {
        self.get(key).and_then(Tag::numeric_as_i32).unwrap_or(default)
    }

    fn get_long(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(Tag::numeric_as_i64).unwrap_or(default)
    }

    fn get_float(&self, key: &str, default: f32) -> f32 {
        match self.get(key) {
            Some(Tag::Float(v)) => *v,
            Some(tag) => tag.numeric_as_f64().map_or(default, |v| v as f32),
            None => default,
        }
    }

    fn get_double(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(Tag::numeric_as_f64).unwrap_or(default)
    }

    fn get_string<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.get(key) {
            Some(Tag::String(v)) => v,
            _ => default,
        }
    }

    fn get_byte_array<'a>(&'a self, key: &str, default: &'a ByteArrayTag) -> &'a ByteArrayTag {
        match self.get(key) {
            Some(Tag::ByteArray(v)) => v,
            _ => default,
        }
    }

    fn get_int_array<'a>(&'a self, key: &str, default: &'a IntArrayTag) -> &'a IntArrayTag {
        match self.get(key) {
            Some(Tag::IntArray(v)) => v,
            _ => default,
        }
    }

    fn get_long_array<'a>(&'a self, key: &str, default: &'a LongArrayTag) -> &'a LongArrayTag {
        match self.get(key) {
            Some(Tag::LongArray(v)) => v,
            _ => default,
        }
    }

    /// 非空且元素类型不符的列表同样返回默认值
    fn get_list<'a>(&'a self, key: &str, element_type: TagId, default: &'a ListTag) -> &'a ListTag {
        match self.get(key) {
            Some(Tag::List(v)) if v.is_empty() || v.element_type() == element_type => v,
            _ => default,
        }
    }

    fn get_compound<'a>(&'a self, key: &str, default: &'a CompoundTag) -> &'a CompoundTag {
        match self.get(key) {
            Some(Tag::Compound(v)) => v,
            _ => default,
        }
    }

    fn get_uuid(&self, key: &str) -> Option<Uuid> {
        self.get(key).and_then(|tag| utils::uuid_from_tag(tag).ok())
    }
}

/// 按插入顺序遍历 `(键, 值)`
pub struct Entries<'a, C: CompoundAccess> {
    compound: &'a C,
    index: usize,
}

impl<'a, C: CompoundAccess> Iterator for Entries<'a, C> {
    type Item = (&'a str, &'a Tag);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.compound.entry_at(self.index)?;
        self.index += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.compound.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<'a, C: CompoundAccess> ExactSizeIterator for Entries<'a, C> {}

pub struct Keys<'a, C: CompoundAccess> {
    entries: Entries<'a, C>,
}

impl<'a, C: CompoundAccess> Iterator for Keys<'a, C> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(|(key, _)| key)
    }
}

/// 可变复合标签，保留插入顺序
#[derive(Debug, Clone, Default)]
pub struct MutableCompoundTag {
    tags: IndexMap<String, Tag>,
}

impl MutableCompoundTag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tags: IndexMap::with_capacity(capacity),
        }
    }

    /// 写入条目，返回旧值；已有键保持原位置
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Tag>) -> Option<Tag> {
        self.tags.insert(key.into(), value.into())
    }

    pub fn put_bool(&mut self, key: impl Into<String>, value: bool) -> Option<Tag> {
        self.put(key, Tag::from_bool(value))
    }

    pub fn put_uuid(&mut self, key: impl Into<String>, value: Uuid) -> Option<Tag> {
        self.put(key, Tag::from_uuid(value))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Tag> {
        self.tags.get_mut(key)
    }

    /// 移除条目，保持其余条目顺序
    pub fn remove(&mut self, key: &str) -> Option<Tag> {
        self.tags.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    /// 深拷贝
    pub fn copy(&self) -> Self {
        Self {
            tags: self
                .tags
                .iter()
                .map(|(key, value)| (key.clone(), value.copy()))
                .collect(),
        }
    }

    pub fn into_immutable(self) -> ImmutableCompoundTag {
        let mut compound = ImmutableCompoundTag::new();
        for (key, value) in self.tags {
            compound.insert_in_place(key, value);
        }
        compound
    }
}

impl CompoundAccess for MutableCompoundTag {
    fn get(&self, key: &str) -> Option<&Tag> {
        self.tags.get(key)
    }

    fn len(&self) -> usize {
        self.tags.len()
    }

    fn entry_at(&self, index: usize) -> Option<(&str, &Tag)> {
        self.tags
            .get_index(index)
            .map(|(key, value)| (key.as_str(), value))
    }
}

/// 不可变复合标签，基于持久化哈希表，写操作返回新实例
#[derive(Debug, Clone, Default)]
pub struct ImmutableCompoundTag {
    entries: im::HashMap<String, Tag>,
    order: im::Vector<String>,
}

impl ImmutableCompoundTag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: impl Into<String>, value: impl Into<Tag>) -> Self {
        let mut next = self.clone();
        next.insert_in_place(key.into(), value.into());
        next
    }

    pub fn put_bool(&self, key: impl Into<String>, value: bool) -> Self {
        self.put(key, Tag::from_bool(value))
    }

    pub fn put_uuid(&self, key: impl Into<String>, value: Uuid) -> Self {
        self.put(key, Tag::from_uuid(value))
    }

    pub fn remove(&self, key: &str) -> Self {
        if !self.entries.contains_key(key) {
            return self.clone();
        }
        let mut next = self.clone();
        next.entries.remove(key);
        if let Some(position) = next.order.iter().position(|k| k == key) {
            next.order.remove(position);
        }
        next
    }

    /// 共享结构，O(1)
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn to_mutable(&self) -> MutableCompoundTag {
        MutableCompoundTag {
            tags: self
                .iter()
                .map(|(key, value)| (key.to_string(), value.copy()))
                .collect(),
        }
    }

    fn insert_in_place(&mut self, key: String, value: Tag) {
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }
    }
}

impl CompoundAccess for ImmutableCompoundTag {
    fn get(&self, key: &str) -> Option<&Tag> {
        self.entries.get(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn entry_at(&self, index: usize) -> Option<(&str, &Tag)> {
        let key = self.order.get(index)?;
        let value = self.entries.get(key.as_str())?;
        Some((key.as_str(), value))
    }
}

/// 复合标签：可变或不可变两种生命周期
#[derive(Debug, Clone)]
pub enum CompoundTag {
    Mutable(MutableCompoundTag),
    Immutable(ImmutableCompoundTag),
}

impl Default for CompoundTag {
    fn default() -> Self {
        CompoundTag::Mutable(MutableCompoundTag::new())
    }
}

impl CompoundTag {
    /// 空的可变复合标签
    pub fn new() -> Self {
        Self::default()
    }

    /// 空的不可变复合标签
    pub fn empty() -> Self {
        CompoundTag::Immutable(ImmutableCompoundTag::new())
    }

    pub fn builder(mutable: bool) -> CompoundBuilder {
        CompoundBuilder::new(mutable)
    }

    pub fn is_mutable(&self) -> bool {
        matches!(self, CompoundTag::Mutable(_))
    }

    /// 写入条目；对不可变变体，以新实例替换自身
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Tag>) -> Option<Tag> {
        match self {
            CompoundTag::Mutable(compound) => compound.put(key, value),
            CompoundTag::Immutable(compound) => {
                let key = key.into();
                let previous = compound.get(&key).cloned();
                *compound = compound.put(key, value);
                previous
            }
        }
    }

    pub fn put_bool(&mut self, key: impl Into<String>, value: bool) -> Option<Tag> {
        self.put(key, Tag::from_bool(value))
    }

    pub fn put_uuid(&mut self, key: impl Into<String>, value: Uuid) -> Option<Tag> {
        self.put(key, Tag::from_uuid(value))
    }

    pub fn remove(&mut self, key: &str) -> Option<Tag> {
        match self {
            CompoundTag::Mutable(compound) => compound.remove(key),
            CompoundTag::Immutable(compound) => {
                let previous = compound.get(key).cloned();
                *compound = compound.remove(key);
                previous
            }
        }
    }

    pub fn mutable(self) -> MutableCompoundTag {
        match self {
            CompoundTag::Mutable(compound) => compound,
            CompoundTag::Immutable(compound) => compound.to_mutable(),
        }
    }

    pub fn immutable(self) -> ImmutableCompoundTag {
        match self {
            CompoundTag::Mutable(compound) => compound.into_immutable(),
            CompoundTag::Immutable(compound) => compound,
        }
    }

    pub fn as_mutable_mut(&mut self) -> Option<&mut MutableCompoundTag> {
        match self {
            CompoundTag::Mutable(compound) => Some(compound),
            CompoundTag::Immutable(_) => None,
        }
    }

    pub fn copy(&self) -> Self {
        match self {
            CompoundTag::Mutable(compound) => CompoundTag::Mutable(compound.copy()),
            CompoundTag::Immutable(compound) => CompoundTag::Immutable(compound.copy()),
        }
    }
}

impl CompoundAccess for CompoundTag {
    fn get(&self, key: &str) -> Option<&Tag> {
        match self {
            CompoundTag::Mutable(compound) => compound.get(key),
            CompoundTag::Immutable(compound) => compound.get(key),
        }
    }

    fn len(&self) -> usize {
        match self {
            CompoundTag::Mutable(compound) => compound.len(),
            CompoundTag::Immutable(compound) => compound.len(),
        }
    }

    fn entry_at(&self, index: usize) -> Option<(&str, &Tag)> {
        match self {
            CompoundTag::Mutable(compound) => compound.entry_at(index),
            CompoundTag::Immutable(compound) => compound.entry_at(index),
        }
    }
}

fn compounds_equal<A: CompoundAccess, B: CompoundAccess>(a: &A, b: &B) -> bool {
    a.len() == b.len() && a.iter().all(|(key, value)| b.get(key) == Some(value))
}

/// 与顺序无关：各条目哈希按和组合
fn hash_compound<C: CompoundAccess, H: Hasher>(compound: &C, state: &mut H) {
    use std::collections::hash_map::DefaultHasher;

    let combined = compound.iter().fold(0u64, |acc, (key, value)| {
        let mut entry = DefaultHasher::new();
        key.hash(&mut entry);
        value.hash(&mut entry);
        acc.wrapping_add(entry.finish())
    });
    compound.len().hash(state);
    combined.hash(state);
}

impl PartialEq for CompoundTag {
    fn eq(&self, other: &Self) -> bool {
        compounds_equal(self, other)
    }
}

impl Eq for CompoundTag {}

impl Hash for CompoundTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_compound(self, state);
    }
}

impl PartialEq for MutableCompoundTag {
    fn eq(&self, other: &Self) -> bool {
        compounds_equal(self, other)
    }
}

impl Eq for MutableCompoundTag {}

impl PartialEq for ImmutableCompoundTag {
    fn eq(&self, other: &Self) -> bool {
        compounds_equal(self, other)
    }
}

impl Eq for ImmutableCompoundTag {}

impl From<MutableCompoundTag> for CompoundTag {
    fn from(compound: MutableCompoundTag) -> Self {
        CompoundTag::Mutable(compound)
    }
}

impl From<ImmutableCompoundTag> for CompoundTag {
    fn from(compound: ImmutableCompoundTag) -> Self {
        CompoundTag::Immutable(compound)
    }
}

impl<'a> IntoIterator for &'a CompoundTag {
    type Item = (&'a str, &'a Tag);
    type IntoIter = Entries<'a, CompoundTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// 复合标签构建器
pub struct CompoundBuilder {
    mutable: bool,
    tags: MutableCompoundTag,
}

impl CompoundBuilder {
    pub fn new(mutable: bool) -> Self {
        Self {
            mutable,
            tags: MutableCompoundTag::new(),
        }
    }

    pub fn put(mut self, key: impl Into<String>, value: impl Into<Tag>) -> Self {
        self.tags.put(key, value);
        self
    }

    pub fn put_bool(self, key: impl Into<String>, value: bool) -> Self {
        self.put(key, Tag::from_bool(value))
    }

    pub fn put_uuid(self, key: impl Into<String>, value: Uuid) -> Self {
        self.put(key, Tag::from_uuid(value))
    }

    /// 嵌套复合标签，沿用当前构建器的可变性
    pub fn compound(self, key: impl Into<String>, build: impl FnOnce(CompoundBuilder) -> CompoundBuilder) -> Self {
        let nested = build(CompoundBuilder::new(self.mutable)).build();
        self.put(key, nested)
    }

    pub fn list(self, key: impl Into<String>, list: ListTag) -> Self {
        self.put(key, list)
    }

    pub fn build(self) -> CompoundTag {
        if self.mutable {
            CompoundTag::Mutable(self.tags)
        } else {
            CompoundTag::Immutable(self.tags.into_immutable())
        }
    }
}
