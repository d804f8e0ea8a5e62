use crate::array::{ByteArrayTag, IntArrayTag, LongArrayTag};
use crate::compound::{CompoundTag, ImmutableCompoundTag, MutableCompoundTag};
use crate::error::{NbtError, NbtResult};
use crate::list::{ImmutableListTag, ListTag, MutableListTag};
use crate::registry::{TagId, TagMetadata};
use crate::snbt;
use crate::utils;
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// NBT标签
///
/// 标量直接内联存储；浮点数按位模式比较与哈希，因此 `Tag` 满足 `Eq`。
#[derive(Debug, Clone)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(ByteArrayTag),
    String(String),
    List(ListTag),
    Compound(CompoundTag),
    IntArray(IntArrayTag),
    LongArray(LongArrayTag),
}

macro_rules! scalar_cast {
    ($name:ident, $variant:ident, $ty:ty) => {
        pub fn $name(&self) -> NbtResult<$ty> {
            match self {
                Tag::$variant(value) => Ok(*value),
                other => Err(other.mismatch(TagId::$variant)),
            }
        }
    };
}

macro_rules! ref_cast {
    ($name:ident, $name_mut:ident, $variant:ident, $ty:ty) => {
        pub fn $name(&self) -> NbtResult<&$ty> {
            match self {
                Tag::$variant(value) => Ok(value),
                other => Err(other.mismatch(TagId::$variant)),
            }
        }

        pub fn $name_mut(&mut self) -> NbtResult<&mut $ty> {
            match self {
                Tag::$variant(value) => Ok(value),
                other => Err(other.mismatch(TagId::$variant)),
            }
        }
    };
}

impl Tag {
    pub fn id(&self) -> TagId {
        match self {
            Tag::End => TagId::End,
            Tag::Byte(_) => TagId::Byte,
            Tag::Short(_) => TagId::Short,
            Tag::Int(_) => TagId::Int,
            Tag::Long(_) => TagId::Long,
            Tag::Float(_) => TagId::Float,
            Tag::Double(_) => TagId::Double,
            Tag::ByteArray(_) => TagId::ByteArray,
            Tag::String(_) => TagId::String,
            Tag::List(_) => TagId::List,
            Tag::Compound(_) => TagId::Compound,
            Tag::IntArray(_) => TagId::IntArray,
            Tag::LongArray(_) => TagId::LongArray,
        }
    }

    pub fn metadata(&self) -> &'static TagMetadata {
        self.id().metadata()
    }

    /// 布尔值以 Byte 0/1 表示
    pub fn from_bool(value: bool) -> Tag {
        Tag::Byte(value as i8)
    }

    pub fn from_uuid(uuid: Uuid) -> Tag {
        utils::uuid_to_tag(uuid)
    }

    /// 复制标签：可变容器与数组深拷贝，不可变容器共享结构
    pub fn copy(&self) -> Tag {
        match self {
            Tag::List(list) => Tag::List(list.copy()),
            Tag::Compound(compound) => Tag::Compound(compound.copy()),
            other => other.clone(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.id().is_numeric()
    }

    /// 数值标签按 Long 读取，浮点数向下取整并饱和
    pub fn numeric_as_i64(&self) -> Option<i64> {
        match *self {
            Tag::Byte(v) => Some(v as i64),
            Tag::Short(v) => Some(v as i64),
            Tag::Int(v) => Some(v as i64),
            Tag::Long(v) => Some(v),
            Tag::Float(v) => Some(v.floor() as i64),
            Tag::Double(v) => Some(v.floor() as i64),
            _ => None,
        }
    }

    /// 数值标签按 Int 读取：Long 保留低 32 位，浮点数向下取整并饱和到 Int 范围
    ///
    /// Byte 与 Short 视图在此结果上截取低位。
    pub fn numeric_as_i32(&self) -> Option<i32> {
        match *self {
            Tag::Float(v) => Some(v.floor() as i32),
            Tag::Double(v) => Some(v.floor() as i32),
            _ => self.numeric_as_i64().map(|v| v as i32),
        }
    }

    /// 数值标签按浮点数读取
    pub fn numeric_as_f64(&self) -> Option<f64> {
        match *self {
            Tag::Byte(v) => Some(v as f64),
            Tag::Short(v) => Some(v as f64),
            Tag::Int(v) => Some(v as f64),
            Tag::Long(v) => Some(v as f64),
            Tag::Float(v) => Some(v as f64),
            Tag::Double(v) => Some(v),
            _ => None,
        }
    }

    scalar_cast!(as_byte, Byte, i8);
    scalar_cast!(as_short, Short, i16);
    scalar_cast!(as_int, Int, i32);
    scalar_cast!(as_long, Long, i64);
    scalar_cast!(as_float, Float, f32);
    scalar_cast!(as_double, Double, f64);

    pub fn as_bool(&self) -> NbtResult<bool> {
        Ok(self.as_byte()? != 0)
    }

    pub fn as_str(&self) -> NbtResult<&str> {
        match self {
            Tag::String(value) => Ok(value),
            other => Err(other.mismatch(TagId::String)),
        }
    }

    pub fn as_uuid(&self) -> NbtResult<Uuid> {
        utils::uuid_from_tag(self)
    }

    ref_cast!(as_byte_array, as_byte_array_mut, ByteArray, ByteArrayTag);
    ref_cast!(as_int_array, as_int_array_mut, IntArray, IntArrayTag);
    ref_cast!(as_long_array, as_long_array_mut, LongArray, LongArrayTag);
    ref_cast!(as_list, as_list_mut, List, ListTag);
    ref_cast!(as_compound, as_compound_mut, Compound, CompoundTag);

    pub fn into_string(self) -> NbtResult<String> {
        match self {
            Tag::String(value) => Ok(value),
            other => Err(other.mismatch(TagId::String)),
        }
    }

    pub fn into_list(self) -> NbtResult<ListTag> {
        match self {
            Tag::List(value) => Ok(value),
            other => Err(other.mismatch(TagId::List)),
        }
    }

    pub fn into_compound(self) -> NbtResult<CompoundTag> {
        match self {
            Tag::Compound(value) => Ok(value),
            other => Err(other.mismatch(TagId::Compound)),
        }
    }

    pub fn to_snbt(&self) -> String {
        snbt::to_snbt(self)
    }

    fn mismatch(&self, expected: TagId) -> NbtError {
        NbtError::TypeMismatch {
            expected,
            found: self.id(),
        }
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Tag::End, Tag::End) => true,
            (Tag::Byte(a), Tag::Byte(b)) => a == b,
            (Tag::Short(a), Tag::Short(b)) => a == b,
            (Tag::Int(a), Tag::Int(b)) => a == b,
            (Tag::Long(a), Tag::Long(b)) => a == b,
            (Tag::Float(a), Tag::Float(b)) => a.to_bits() == b.to_bits(),
            (Tag::Double(a), Tag::Double(b)) => a.to_bits() == b.to_bits(),
            (Tag::ByteArray(a), Tag::ByteArray(b)) => a == b,
            (Tag::String(a), Tag::String(b)) => a == b,
            (Tag::List(a), Tag::List(b)) => a == b,
            (Tag::Compound(a), Tag::Compound(b)) => a == b,
            (Tag::IntArray(a), Tag::IntArray(b)) => a == b,
            (Tag::LongArray(a), Tag::LongArray(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.id() as u8).hash(state);
        match self {
            Tag::End => {}
            Tag::Byte(v) => v.hash(state),
            Tag::Short(v) => v.hash(state),
            Tag::Int(v) => v.hash(state),
            Tag::Long(v) => v.hash(state),
            Tag::Float(v) => v.to_bits().hash(state),
            Tag::Double(v) => v.to_bits().hash(state),
            Tag::ByteArray(v) => v.hash(state),
            Tag::String(v) => v.hash(state),
            Tag::List(v) => v.hash(state),
            Tag::Compound(v) => v.hash(state),
            Tag::IntArray(v) => v.hash(state),
            Tag::LongArray(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&snbt::to_snbt(self))
    }
}

macro_rules! impl_from {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Tag {
            fn from(value: $ty) -> Self {
                Tag::$variant(value.into())
            }
        }
    };
}

impl_from!(i8, Byte);
impl_from!(i16, Short);
impl_from!(i32, Int);
impl_from!(i64, Long);
impl_from!(f32, Float);
impl_from!(f64, Double);
impl_from!(String, String);
impl_from!(&str, String);
impl_from!(Vec<i8>, ByteArray);
impl_from!(Vec<i32>, IntArray);
impl_from!(Vec<i64>, LongArray);
impl_from!(ByteArrayTag, ByteArray);
impl_from!(IntArrayTag, IntArray);
impl_from!(LongArrayTag, LongArray);
impl_from!(ListTag, List);
impl_from!(MutableListTag, List);
impl_from!(ImmutableListTag, List);
impl_from!(CompoundTag, Compound);
impl_from!(MutableCompoundTag, Compound);
impl_from!(ImmutableCompoundTag, Compound);

impl From<bool> for Tag {
    fn from(value: bool) -> Self {
        Tag::from_bool(value)
    }
}

impl From<Uuid> for Tag {
    fn from(value: Uuid) -> Self {
        Tag::from_uuid(value)
    }
}
