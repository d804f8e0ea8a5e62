use crate::error::{NbtError, NbtResult};
use crate::registry::TagId;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fmt::Debug;
use std::hash::Hash;
use std::io::{Read, Write};

/// 定长数组元素（i8 / i32 / i64）
pub trait ArrayElement: Copy + PartialEq + Eq + Hash + Debug + Default + Send + Sync + 'static {
    /// 数组标签自身的类型
    const ARRAY_ID: TagId;
    /// 单个元素对应的标量类型
    const ELEMENT_ID: TagId;

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> NbtResult<Self>;

    fn write_to<W: Write + ?Sized>(self, writer: &mut W) -> NbtResult<()>;
}

impl ArrayElement for i8 {
    const ARRAY_ID: TagId = TagId::ByteArray;
    const ELEMENT_ID: TagId = TagId::Byte;

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> NbtResult<Self> {
        Ok(reader.read_i8()?)
    }

    fn write_to<W: Write + ?Sized>(self, writer: &mut W) -> NbtResult<()> {
        writer.write_i8(self)?;
        Ok(())
    }
}

impl ArrayElement for i32 {
    const ARRAY_ID: TagId = TagId::IntArray;
    const ELEMENT_ID: TagId = TagId::Int;

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> NbtResult<Self> {
        Ok(reader.read_i32::<BigEndian>()?)
    }

    fn write_to<W: Write + ?Sized>(self, writer: &mut W) -> NbtResult<()> {
        writer.write_i32::<BigEndian>(self)?;
        Ok(())
    }
}

impl ArrayElement for i64 {
    const ARRAY_ID: TagId = TagId::LongArray;
    const ELEMENT_ID: TagId = TagId::Long;

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> NbtResult<Self> {
        Ok(reader.read_i64::<BigEndian>()?)
    }

    fn write_to<W: Write + ?Sized>(self, writer: &mut W) -> NbtResult<()> {
        writer.write_i64::<BigEndian>(self)?;
        Ok(())
    }
}

/// 定长元素数组标签
///
/// 存储原始数值而非标签；增删元素时按新长度重新分配，不做摊还扩容。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ArrayTag<T: ArrayElement> {
    data: Box<[T]>,
}

pub type ByteArrayTag = ArrayTag<i8>;
pub type IntArrayTag = ArrayTag<i32>;
pub type LongArrayTag = ArrayTag<i64>;

impl<T: ArrayElement> ArrayTag<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            data: data.into_boxed_slice(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.data.to_vec()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// 获取指定位置的元素
    pub fn get(&self, index: usize) -> NbtResult<T> {
        self.data.get(index).copied().ok_or(NbtError::Index {
            index,
            len: self.data.len(),
        })
    }

    /// 替换指定位置的元素，返回旧值
    pub fn set(&mut self, index: usize, value: T) -> NbtResult<T> {
        let len = self.data.len();
        let slot = self
            .data
            .get_mut(index)
            .ok_or(NbtError::Index { index, len })?;
        Ok(std::mem::replace(slot, value))
    }

    /// 追加元素（重新分配）
    pub fn push(&mut self, value: T) {
        let len = self.data.len();
        self.reallocate_with(len, value);
    }

    /// 在指定位置插入元素（重新分配），`index == len` 等价于追加
    pub fn insert(&mut self, index: usize, value: T) -> NbtResult<()> {
        if index > self.data.len() {
            return Err(NbtError::Index {
                index,
                len: self.data.len(),
            });
        }
        self.reallocate_with(index, value);
        Ok(())
    }

    /// 移除指定位置的元素（重新分配），返回被移除的值
    pub fn remove(&mut self, index: usize) -> NbtResult<T> {
        let old = self.get(index)?;
        let mut result = Vec::with_capacity(self.data.len() - 1);
        result.extend_from_slice(&self.data[..index]);
        result.extend_from_slice(&self.data[index + 1..]);
        self.data = result.into_boxed_slice();
        Ok(old)
    }

    pub fn clear(&mut self) {
        self.data = Box::default();
    }

    /// 深拷贝底层数组
    pub fn copy(&self) -> Self {
        self.clone()
    }

    fn reallocate_with(&mut self, index: usize, value: T) {
        let mut result = Vec::with_capacity(self.data.len() + 1);
        result.extend_from_slice(&self.data[..index]);
        result.push(value);
        result.extend_from_slice(&self.data[index..]);
        self.data = result.into_boxed_slice();
    }
}

impl<T: ArrayElement> From<Vec<T>> for ArrayTag<T> {
    fn from(data: Vec<T>) -> Self {
        Self::new(data)
    }
}

impl<T: ArrayElement> From<&[T]> for ArrayTag<T> {
    fn from(data: &[T]) -> Self {
        Self::new(data.to_vec())
    }
}

impl<'a, T: ArrayElement> IntoIterator for &'a ArrayTag<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_set_are_bounds_checked() {
        let mut array = IntArrayTag::from(vec![1, 2, 3]);
        assert_eq!(array.get(1).unwrap(), 2);
        assert_eq!(array.set(1, 20).unwrap(), 2);
        assert_eq!(array.as_slice(), &[1, 20, 3]);

        assert!(matches!(array.get(3), Err(NbtError::Index { index: 3, len: 3 })));
        assert!(matches!(array.set(7, 0), Err(NbtError::Index { index: 7, len: 3 })));
    }

    #[test]
    fn test_insert_and_remove_reallocate_exactly() {
        let mut array = ByteArrayTag::from(vec![1, 3]);
        array.insert(1, 2).unwrap();
        array.insert(3, 4).unwrap();
        array.push(5);
        assert_eq!(array.as_slice(), &[1, 2, 3, 4, 5]);
        assert_eq!(array.len(), 5);

        assert_eq!(array.remove(0).unwrap(), 1);
        assert_eq!(array.remove(3).unwrap(), 5);
        assert_eq!(array.as_slice(), &[2, 3, 4]);

        assert!(array.insert(9, 0).is_err());
        assert!(array.remove(3).is_err());
    }

    #[test]
    fn test_copy_is_independent() {
        let original = LongArrayTag::from(vec![10i64, 20]);
        let mut copy = original.copy();
        copy.set(0, 99).unwrap();
        assert_eq!(original.as_slice(), &[10, 20]);
        assert_eq!(copy.as_slice(), &[99, 20]);
    }

    #[test]
    fn test_clear_empties_array() {
        let mut array = IntArrayTag::from(&[1, 2][..]);
        array.clear();
        assert!(array.is_empty());
        assert_eq!(array, IntArrayTag::empty());
    }
}
