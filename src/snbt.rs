// SNBT 文本渲染（仅输出，用于调试与展示）

use crate::array::{ArrayElement, ArrayTag};
use crate::compound::{CompoundAccess, CompoundTag};
use crate::list::{ListAccess, ListTag};
use crate::tag::Tag;
use std::fmt::Write;

/// 渲染为规范 SNBT 文本：复合标签的键按字典序排列
pub fn to_snbt(tag: &Tag) -> String {
    let mut out = String::new();
    examine(&mut out, tag);
    out
}

fn examine(out: &mut String, tag: &Tag) {
    // 写入 String 不会失败
    let _ = match tag {
        Tag::End => write!(out, "END"),
        Tag::Byte(v) => write!(out, "{}b", v),
        Tag::Short(v) => write!(out, "{}s", v),
        Tag::Int(v) => write!(out, "{}", v),
        Tag::Long(v) => write!(out, "{}L", v),
        Tag::Float(v) => write!(out, "{:?}f", v),
        Tag::Double(v) => write!(out, "{:?}d", v),
        Tag::String(v) => {
            out.push_str(&quote_and_escape(v));
            Ok(())
        }
        Tag::ByteArray(array) => {
            examine_array(out, "B", "B", array);
            Ok(())
        }
        Tag::IntArray(array) => {
            examine_array(out, "I", "", array);
            Ok(())
        }
        Tag::LongArray(array) => {
            examine_array(out, "L", "", array);
            Ok(())
        }
        Tag::List(list) => {
            examine_list(out, list);
            Ok(())
        }
        Tag::Compound(compound) => {
            examine_compound(out, compound);
            Ok(())
        }
    };
}

fn examine_array<T: ArrayElement + std::fmt::Display>(out: &mut String, prefix: &str, suffix: &str, array: &ArrayTag<T>) {
    out.push('[');
    out.push_str(prefix);
    out.push(';');
    for (i, value) in array.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}{}", value, suffix);
    }
    out.push(']');
}

fn examine_list(out: &mut String, list: &ListTag) {
    out.push('[');
    for (i, element) in list.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        examine(out, element);
    }
    out.push(']');
}

fn examine_compound(out: &mut String, compound: &CompoundTag) {
    let mut entries: Vec<(&str, &Tag)> = compound.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_key(key));
        out.push(':');
        examine(out, value);
    }
    out.push('}');
}

fn is_bare_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-'))
}

/// 简单键原样输出，其余加引号
pub fn escape_key(key: &str) -> String {
    if is_bare_key(key) {
        key.to_string()
    } else {
        quote_and_escape(key)
    }
}

/// 选用与文本中首个引号相反的引号包裹，并转义反斜杠与所选引号
pub fn quote_and_escape(text: &str) -> String {
    let quote = match text.chars().find(|&c| c == '"' || c == '\'') {
        Some('"') => '\'',
        _ => '"',
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        if c == '\\' || c == quote {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TagId;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalar_suffixes() {
        assert_eq!(to_snbt(&Tag::Byte(1)), "1b");
        assert_eq!(to_snbt(&Tag::Short(-2)), "-2s");
        assert_eq!(to_snbt(&Tag::Int(3)), "3");
        assert_eq!(to_snbt(&Tag::Long(4)), "4L");
        assert_eq!(to_snbt(&Tag::Float(1.5)), "1.5f");
        assert_eq!(to_snbt(&Tag::Double(2.0)), "2.0d");
        assert_eq!(to_snbt(&Tag::End), "END");
    }

    #[test]
    fn test_arrays() {
        assert_eq!(to_snbt(&Tag::from(vec![1i8, 2])), "[B;1B,2B]");
        assert_eq!(to_snbt(&Tag::from(vec![1i32, 2])), "[I;1,2]");
        assert_eq!(to_snbt(&Tag::from(vec![1i64, 2])), "[L;1,2]");
        assert_eq!(to_snbt(&Tag::from(Vec::<i32>::new())), "[I;]");
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote_and_escape("plain"), "\"plain\"");
        assert_eq!(quote_and_escape("say \"hi\""), "'say \"hi\"'");
        assert_eq!(quote_and_escape("it's"), "\"it's\"");
        assert_eq!(quote_and_escape("a\\b"), "\"a\\\\b\"");
        assert_eq!(quote_and_escape("\"x' y"), "'\"x\\' y'");
    }

    #[test]
    fn test_compound_keys_sorted_and_escaped() {
        let list = ListTag::builder(TagId::String, true).add("x").unwrap().build();
        let compound = CompoundTag::builder(true)
            .put("zeta", 1i8)
            .put("has space", 2)
            .list("alpha", list)
            .build();
        assert_eq!(
            to_snbt(&Tag::Compound(compound)),
            "{alpha:[\"x\"],\"has space\":2,zeta:1b}"
        );
    }

    #[test]
    fn test_display_uses_renderer() {
        let tag = Tag::from("v");
        assert_eq!(tag.to_string(), "\"v\"");
    }
}
