use clap::{Parser, Subcommand};
use mcnbt::{
    json, tag_io, CompoundAccess, CompressionType, ListAccess, NbtError, Tag, TagId,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// NBT命令行工具 - 查看、统计、转换NBT二进制标签文件
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 以SNBT文本显示NBT文件内容
    Show {
        /// 输入NBT文件路径
        #[arg(short, long)]
        input: PathBuf,

        /// 压缩算法: none, gzip, zlib
        #[arg(short, long, default_value = "gzip")]
        compression: CompressionType,
    },

    /// 查看NBT文件统计信息
    Info {
        /// 输入NBT文件路径
        #[arg(short, long)]
        input: PathBuf,

        /// 压缩算法: none, gzip, zlib
        #[arg(short, long, default_value = "gzip")]
        compression: CompressionType,

        /// 以JSON格式输出
        #[arg(long)]
        json: bool,
    },

    /// 转换NBT文件的压缩算法
    Convert {
        /// 输入NBT文件路径
        #[arg(short, long)]
        input: PathBuf,

        /// 输出NBT文件路径
        #[arg(short, long)]
        output: PathBuf,

        /// 输入文件的压缩算法
        #[arg(long, default_value = "gzip")]
        from: CompressionType,

        /// 输出文件的压缩算法
        #[arg(long, default_value = "none")]
        to: CompressionType,
    },

    /// 将NBT文件导出为JSON
    Json {
        /// 输入NBT文件路径
        #[arg(short, long)]
        input: PathBuf,

        /// 输出JSON文件路径
        #[arg(short, long)]
        output: PathBuf,

        /// 压缩算法: none, gzip, zlib
        #[arg(short, long, default_value = "gzip")]
        compression: CompressionType,
    },
}

/// 文件统计信息
#[derive(Debug, Default, Serialize)]
struct InfoReport {
    root_name: String,
    root_type: String,
    entries: usize,
    max_depth: usize,
    tag_counts: BTreeMap<String, usize>,
}

fn main() -> Result<(), NbtError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Show { input, compression } => show(input, *compression),
        Commands::Info {
            input,
            compression,
            json,
        } => print_info(input, *compression, *json),
        Commands::Convert {
            input,
            output,
            from,
            to,
        } => convert(input, output, *from, *to),
        Commands::Json {
            input,
            output,
            compression,
        } => export_json(input, output, *compression),
    };

    if let Err(e) = &result {
        eprintln!("操作失败: {}", e);
        if let NbtError::Format(_) = e {
            eprintln!("请确认压缩算法是否正确（-c none|gzip|zlib）");
        }
    }
    result
}

fn ensure_exists(path: &Path) -> Result<(), NbtError> {
    if !path.exists() {
        return Err(NbtError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("文件不存在: {}", path.display()),
        )));
    }
    Ok(())
}

/// 显示根名称与SNBT文本
fn show(input: &Path, compression: CompressionType) -> Result<(), NbtError> {
    ensure_exists(input)?;
    let (name, tag) = tag_io::read_named_file(input, compression)?;

    println!("根名称: {}", if name.is_empty() { "(空)" } else { name.as_str() });
    println!("{}", tag);
    Ok(())
}

/// 打印NBT文件统计信息
fn print_info(input: &Path, compression: CompressionType, as_json: bool) -> Result<(), NbtError> {
    ensure_exists(input)?;
    let (name, tag) = tag_io::read_named_file(input, compression)?;

    let mut report = InfoReport {
        root_name: name,
        root_type: tag.id().name().to_string(),
        ..Default::default()
    };
    if let Tag::Compound(compound) = &tag {
        report.entries = compound.len();
    }
    collect_stats(&tag, 0, &mut report);
    debug!(?report, "统计完成");

    if as_json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| NbtError::Format(format!("JSON序列化失败: {}", e)))?;
        println!("{}", text);
        return Ok(());
    }

    println!("=== NBT文件信息 ===");
    println!("文件: {}", input.display());
    println!("压缩算法: {}", compression.name());
    println!("根名称: {}", report.root_name);
    println!("根类型: {}", report.root_type);
    println!("根条目数: {}", report.entries);
    println!("最大嵌套深度: {}", report.max_depth);
    println!("标签统计:");
    for (tag_type, count) in &report.tag_counts {
        println!("  {}: {}", tag_type, count);
    }
    Ok(())
}

/// 递归统计各类型标签数量与最大容器嵌套深度
fn collect_stats(tag: &Tag, depth: usize, report: &mut InfoReport) {
    *report.tag_counts.entry(tag.id().name().to_string()).or_insert(0) += 1;

    match tag {
        Tag::List(list) => {
            report.max_depth = report.max_depth.max(depth + 1);
            for element in list.iter() {
                collect_stats(element, depth + 1, report);
            }
        }
        Tag::Compound(compound) => {
            report.max_depth = report.max_depth.max(depth + 1);
            for (_, value) in compound.iter() {
                collect_stats(value, depth + 1, report);
            }
        }
        _ => {}
    }
}

/// 重新压缩NBT文件，保留根名称
fn convert(input: &Path, output: &Path, from: CompressionType, to: CompressionType) -> Result<(), NbtError> {
    ensure_exists(input)?;
    let (name, tag) = tag_io::read_named_file(input, from)?;
    let compound = tag.into_compound()?;

    tag_io::write_named_file(output, &name, &compound, to)?;
    info!(from = from.name(), to = to.name(), "转换完成");
    println!("转换完成: {} ({} -> {})", output.display(), from.name(), to.name());
    Ok(())
}

/// 导出为格式化JSON
fn export_json(input: &Path, output: &Path, compression: CompressionType) -> Result<(), NbtError> {
    ensure_exists(input)?;
    let (_, tag) = tag_io::read_named_file(input, compression)?;
    if tag.id() != TagId::Compound {
        return Err(NbtError::TypeMismatch {
            expected: TagId::Compound,
            found: tag.id(),
        });
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let text = json::to_json_string(&tag, true)?;
    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(text.as_bytes())?;
    writer.flush()?;

    println!("导出完成: {}", output.display());
    Ok(())
}
