use crate::registry::TagId;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NbtError {
    #[error("IO错误: {0}")]
    Io(io::Error),

    #[error("NBT格式错误: {0}")]
    Format(String),

    #[error("嵌套层级过深，最大深度为 {0}")]
    DepthExceeded(usize),

    #[error("流式读写调用顺序错误: {0}")]
    StructuralMisuse(String),

    #[error("标签类型不匹配: 期望 {expected}，实际 {found}")]
    TypeMismatch { expected: TagId, found: TagId },

    #[error("索引越界: 索引 {index}，长度 {len}")]
    Index { index: usize, len: usize },

    #[error("字符串过长: {0} 字节，超过65535字节限制")]
    StringTooLong(usize),

    #[error("压缩错误: {0}")]
    Compression(String),
}

/// 数据流提前结束属于格式错误，其余IO错误原样保留
impl From<io::Error> for NbtError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            NbtError::Format("数据流意外结束".to_string())
        } else {
            NbtError::Io(err)
        }
    }
}

impl NbtError {
    pub(crate) fn misuse(message: impl Into<String>) -> Self {
        NbtError::StructuralMisuse(message.into())
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        NbtError::Format(message.into())
    }
}

pub type NbtResult<T> = Result<T, NbtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_eof_becomes_format_error() {
        let err: NbtError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(err, NbtError::Format(_)));

        let err: NbtError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, NbtError::Io(_)));
    }

    #[test]
    fn test_type_mismatch_message_uses_tag_names() {
        let err = NbtError::TypeMismatch {
            expected: TagId::Int,
            found: TagId::String,
        };
        assert_eq!(err.to_string(), "标签类型不匹配: 期望 TAG_Int，实际 TAG_String");
    }
}
