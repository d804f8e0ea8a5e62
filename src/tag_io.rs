// 顶层入口：整棵标签树与（可选压缩的）字节流之间的读写

use crate::codec;
use crate::compound::CompoundTag;
use crate::error::{NbtError, NbtResult};
use crate::tag::Tag;
use crate::CompressionType;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// 读取根复合标签，根名称被丢弃
pub fn read<R: Read>(source: R, compression: CompressionType) -> NbtResult<CompoundTag> {
    let (_, tag) = read_named(source, compression)?;
    match tag {
        Tag::Compound(compound) => Ok(compound),
        other => Err(NbtError::Format(format!("根标签必须是复合标签，实际为 {}", other.id()))),
    }
}

/// 读取带名称的根标签
pub fn read_named<R: Read>(source: R, compression: CompressionType) -> NbtResult<(String, Tag)> {
    let mut input = BufReader::new(compression.decompress(source));
    let (name, tag) = codec::read_named_tag(&mut input)?;
    debug!(name = %name, tag_type = %tag.id(), compression = ?compression, "读取NBT文档");
    Ok((name, tag))
}

/// 以空根名称写入复合标签
pub fn write<W: Write>(sink: W, value: &CompoundTag, compression: CompressionType) -> NbtResult<()> {
    write_named(sink, "", value, compression)
}

/// 以指定根名称写入复合标签
pub fn write_named<W: Write>(
    sink: W,
    name: &str,
    value: &CompoundTag,
    compression: CompressionType,
) -> NbtResult<()> {
    let mut output = compression.compress(sink);
    codec::write_named_compound(&mut output, name, value)?;
    let mut sink = output.finish()?;
    sink.flush()?;
    debug!(name = %name, compression = ?compression, "写入NBT文档");
    Ok(())
}

pub fn read_file<P: AsRef<Path>>(path: P, compression: CompressionType) -> NbtResult<CompoundTag> {
    let file = File::open(path.as_ref())?;
    read(file, compression)
}

pub fn read_named_file<P: AsRef<Path>>(path: P, compression: CompressionType) -> NbtResult<(String, Tag)> {
    let file = File::open(path.as_ref())?;
    read_named(file, compression)
}

pub fn write_file<P: AsRef<Path>>(path: P, value: &CompoundTag, compression: CompressionType) -> NbtResult<()> {
    write_named_file(path, "", value, compression)
}

pub fn write_named_file<P: AsRef<Path>>(
    path: P,
    name: &str,
    value: &CompoundTag,
    compression: CompressionType,
) -> NbtResult<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    write_named(writer, name, value, compression)
}
