use crate::error::{NbtError, NbtResult};
use crate::registry::TagId;
use crate::MAX_DEPTH;
use std::fmt;

/// 流式读写的作用域类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    ByteArray,
    IntArray,
    LongArray,
    List,
    Compound,
}

impl Scope {
    pub fn tag_id(self) -> TagId {
        match self {
            Scope::ByteArray => TagId::ByteArray,
            Scope::IntArray => TagId::IntArray,
            Scope::LongArray => TagId::LongArray,
            Scope::List => TagId::List,
            Scope::Compound => TagId::Compound,
        }
    }

    /// 列表与复合标签计入嵌套深度，数组不能再嵌套，不计入
    pub fn is_container(self) -> bool {
        matches!(self, Scope::List | Scope::Compound)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_id().name())
    }
}

/// 作用域栈中的一帧；列表与数组记录元素类型和剩余元素数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Frame {
    pub scope: Scope,
    pub element_type: TagId,
    pub remaining: usize,
}

impl Frame {
    pub fn compound() -> Self {
        Self {
            scope: Scope::Compound,
            element_type: TagId::End,
            remaining: 0,
        }
    }

    pub fn sequence(scope: Scope, element_type: TagId, len: usize) -> Self {
        Self {
            scope,
            element_type,
            remaining: len,
        }
    }
}

/// 为下一个值占位的结果
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    /// 复合标签中的条目；`None` 表示隐式根的空名称
    Entry(Option<String>),
    /// 列表或数组中的元素，无类型与名称
    Element,
}

/// 作用域栈：底部固定为隐式根复合标签，另有一个待用名称槽
#[derive(Debug)]
pub(crate) struct ScopeStack {
    frames: Vec<Frame>,
    /// 已打开的列表与复合标签数，与整树编解码的深度一致
    containers: usize,
    pending_name: Option<String>,
}

impl ScopeStack {
    pub fn new() -> Self {
        let mut frames = Vec::with_capacity(32);
        frames.push(Frame::compound());
        Self {
            frames,
            containers: 0,
            pending_name: None,
        }
    }

    /// 已打开的作用域数，不含隐式根
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn is_root(&self) -> bool {
        self.frames.len() == 1
    }

    pub fn top(&self) -> &Frame {
        // 隐式根从不出栈
        &self.frames[self.frames.len() - 1]
    }

    pub fn scope(&self) -> Scope {
        self.top().scope
    }

    pub fn pending_name(&self) -> Option<&str> {
        self.pending_name.as_deref()
    }

    /// 在写入或读取任何字节前检查能否打开 `scope`
    pub fn ensure_can_push(&self, scope: Scope) -> NbtResult<()> {
        if scope.is_container() && self.containers >= MAX_DEPTH {
            return Err(NbtError::DepthExceeded(MAX_DEPTH));
        }
        Ok(())
    }

    pub fn push(&mut self, frame: Frame) -> NbtResult<()> {
        self.ensure_can_push(frame.scope)?;
        if frame.scope.is_container() {
            self.containers += 1;
        }
        self.frames.push(frame);
        Ok(())
    }

    /// 设置待用名称，仅在复合标签作用域且无悬空名称时合法
    pub fn set_name(&mut self, name: String) -> NbtResult<()> {
        if self.scope() != Scope::Compound {
            return Err(NbtError::misuse(format!("{} 作用域中不能设置名称", self.scope())));
        }
        if let Some(pending) = &self.pending_name {
            return Err(NbtError::misuse(format!("名称 \"{}\" 尚未使用", pending)));
        }
        self.pending_name = Some(name);
        Ok(())
    }

    /// 为类型为 `id` 的下一个值占位：复合标签中消耗名称，列表与数组中消耗一个元素名额
    pub fn claim(&mut self, id: TagId) -> NbtResult<Slot> {
        let is_root = self.is_root();
        let last = self.frames.len() - 1;
        let frame = &mut self.frames[last];
        match frame.scope {
            Scope::Compound => match self.pending_name.take() {
                Some(name) => Ok(Slot::Entry(Some(name))),
                None if is_root => Ok(Slot::Entry(None)),
                None => Err(NbtError::misuse(format!("复合标签中的 {} 必须先命名", id))),
            },
            scope => {
                if frame.element_type != id {
                    return Err(NbtError::misuse(format!(
                        "{} 作用域的元素类型为 {}，不能写入 {}",
                        scope, frame.element_type, id
                    )));
                }
                if frame.remaining == 0 {
                    return Err(NbtError::misuse(format!("{} 的元素数量超出声明长度", scope)));
                }
                frame.remaining -= 1;
                Ok(Slot::Element)
            }
        }
    }

    /// 检查当前作用域能否以 `expected` 结束
    pub fn check_close(&self, expected: Scope) -> NbtResult<()> {
        let frame = self.top();
        if frame.scope != expected {
            return Err(NbtError::misuse(format!(
                "嵌套错误: 当前作用域为 {}，不能结束 {}",
                frame.scope, expected
            )));
        }
        if self.is_root() {
            return Err(NbtError::misuse("隐式根作用域不能结束"));
        }
        if let Some(pending) = &self.pending_name {
            return Err(NbtError::misuse(format!("名称 \"{}\" 悬空，没有对应的值", pending)));
        }
        if frame.remaining > 0 {
            return Err(NbtError::misuse(format!(
                "{} 仍缺少 {} 个元素",
                frame.scope, frame.remaining
            )));
        }
        Ok(())
    }

    pub fn pop(&mut self, expected: Scope) -> NbtResult<Frame> {
        self.check_close(expected)?;
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| NbtError::misuse("作用域栈为空"))?;
        if frame.scope.is_container() {
            self.containers -= 1;
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_allows_unnamed_entry() {
        let mut stack = ScopeStack::new();
        assert_eq!(stack.claim(TagId::Compound).unwrap(), Slot::Entry(None));

        stack.push(Frame::compound()).unwrap();
        assert!(matches!(stack.claim(TagId::Int), Err(NbtError::StructuralMisuse(_))));
        stack.set_name("k".to_string()).unwrap();
        assert_eq!(stack.claim(TagId::Int).unwrap(), Slot::Entry(Some("k".to_string())));
    }

    #[test]
    fn test_name_rules() {
        let mut stack = ScopeStack::new();
        stack.set_name("a".to_string()).unwrap();
        assert!(stack.set_name("b".to_string()).is_err());
        stack.claim(TagId::Int).unwrap();

        stack.push(Frame::sequence(Scope::List, TagId::Int, 1)).unwrap();
        assert!(stack.set_name("c".to_string()).is_err());
    }

    #[test]
    fn test_sequence_counts_and_types() {
        let mut stack = ScopeStack::new();
        stack.push(Frame::sequence(Scope::IntArray, TagId::Int, 2)).unwrap();
        assert!(stack.claim(TagId::Long).is_err());
        assert_eq!(stack.claim(TagId::Int).unwrap(), Slot::Element);
        assert!(stack.pop(Scope::IntArray).is_err());
        stack.claim(TagId::Int).unwrap();
        assert!(stack.claim(TagId::Int).is_err());
        stack.pop(Scope::IntArray).unwrap();
        assert!(stack.is_root());
    }

    #[test]
    fn test_pop_requires_matching_scope() {
        let mut stack = ScopeStack::new();
        assert!(stack.pop(Scope::Compound).is_err());
        stack.push(Frame::compound()).unwrap();
        assert!(matches!(stack.pop(Scope::List), Err(NbtError::StructuralMisuse(_))));
        stack.pop(Scope::Compound).unwrap();
    }

    #[test]
    fn test_depth_is_capped() {
        let mut stack = ScopeStack::new();
        for _ in 0..MAX_DEPTH {
            stack.push(Frame::compound()).unwrap();
        }
        assert_eq!(stack.depth(), MAX_DEPTH);
        assert!(matches!(stack.push(Frame::compound()), Err(NbtError::DepthExceeded(_))));
        assert!(matches!(
            stack.push(Frame::sequence(Scope::List, TagId::Int, 0)),
            Err(NbtError::DepthExceeded(_))
        ));
        stack.push(Frame::sequence(Scope::ByteArray, TagId::Byte, 0)).unwrap();
        stack.pop(Scope::ByteArray).unwrap();

        stack.pop(Scope::Compound).unwrap();
        stack.push(Frame::compound()).unwrap();
    }
}
