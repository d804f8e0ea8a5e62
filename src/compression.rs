use crate::{error::{NbtError, NbtResult}, CompressionType};
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::io::{self, Read, Write};
use std::str::FromStr;
use tracing::debug;

impl CompressionType {
    /// 包装输入流，按所选算法解压
    pub fn decompress<R: Read>(self, source: R) -> Decompressor<R> {
        debug!(compression = ?self, "创建解压流");
        match self {
            CompressionType::None => Decompressor::None(source),
            CompressionType::Gzip => Decompressor::Gzip(GzDecoder::new(source)),
            CompressionType::Zlib => Decompressor::Zlib(ZlibDecoder::new(source)),
        }
    }

    /// 包装输出流，按所选算法压缩；写完后须调用 `finish`
    pub fn compress<W: Write>(self, sink: W) -> Compressor<W> {
        debug!(compression = ?self, "创建压缩流");
        match self {
            CompressionType::None => Compressor::None(sink),
            CompressionType::Gzip => Compressor::Gzip(GzEncoder::new(sink, Compression::default())),
            CompressionType::Zlib => Compressor::Zlib(ZlibEncoder::new(sink, Compression::default())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CompressionType::None => "none",
            CompressionType::Gzip => "gzip",
            CompressionType::Zlib => "zlib",
        }
    }
}

impl FromStr for CompressionType {
    type Err = NbtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(CompressionType::None),
            "gzip" | "gz" => Ok(CompressionType::Gzip),
            "zlib" => Ok(CompressionType::Zlib),
            other => Err(NbtError::Compression(format!("不支持的压缩类型: {}", other))),
        }
    }
}

/// 解压读取流
pub enum Decompressor<R: Read> {
    None(R),
    Gzip(GzDecoder<R>),
    Zlib(ZlibDecoder<R>),
}

impl<R: Read> Read for Decompressor<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Decompressor::None(inner) => inner.read(buf),
            Decompressor::Gzip(inner) => inner.read(buf),
            Decompressor::Zlib(inner) => inner.read(buf),
        }
    }
}

/// 压缩写入流
pub enum Compressor<W: Write> {
    None(W),
    Gzip(GzEncoder<W>),
    Zlib(ZlibEncoder<W>),
}

impl<W: Write> Write for Compressor<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Compressor::None(inner) => inner.write(buf),
            Compressor::Gzip(inner) => inner.write(buf),
            Compressor::Zlib(inner) => inner.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Compressor::None(inner) => inner.flush(),
            Compressor::Gzip(inner) => inner.flush(),
            Compressor::Zlib(inner) => inner.flush(),
        }
    }
}

impl<W: Write> Compressor<W> {
    /// 写入压缩尾部并返回底层输出流
    pub fn finish(self) -> NbtResult<W> {
        let result = match self {
            Compressor::None(inner) => Ok(inner),
            Compressor::Gzip(inner) => inner.finish(),
            Compressor::Zlib(inner) => inner.finish(),
        };
        result.map_err(|e| NbtError::Compression(format!("写入压缩尾部失败: {}", e)))
    }
}

/// 压缩数据
pub fn compress_data(data: &[u8], compression_type: CompressionType) -> NbtResult<Vec<u8>> {
    let mut encoder = compression_type.compress(Vec::with_capacity(data.len()));
    encoder.write_all(data)?;
    encoder.finish()
}

/// 解压数据
pub fn decompress_data(compressed_data: &[u8], compression_type: CompressionType) -> NbtResult<Vec<u8>> {
    let mut decompressed = Vec::new();
    let mut decoder = compression_type.decompress(compressed_data);
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| NbtError::Compression(format!("解压失败: {}", e)))?;
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [CompressionType; 3] = [CompressionType::None, CompressionType::Gzip, CompressionType::Zlib];

    #[test]
    fn test_round_trip_for_every_type() {
        let data = b"hello world hello world hello world".repeat(8);
        for compression in ALL {
            let packed = compress_data(&data, compression).unwrap();
            assert_eq!(decompress_data(&packed, compression).unwrap(), data);
        }
    }

    #[test]
    fn test_none_is_identity() {
        let data = [1u8, 2, 3];
        assert_eq!(compress_data(&data, CompressionType::None).unwrap(), data);
    }

    #[test]
    fn test_stream_headers() {
        let gzip = compress_data(b"x", CompressionType::Gzip).unwrap();
        assert_eq!(&gzip[..2], &[0x1F, 0x8B]);

        let zlib = compress_data(b"x", CompressionType::Zlib).unwrap();
        assert_eq!(zlib[0], 0x78);
    }

    #[test]
    fn test_wrong_type_fails() {
        let zlib = compress_data(b"payload", CompressionType::Zlib).unwrap();
        assert!(decompress_data(&zlib, CompressionType::Gzip).is_err());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("GZIP".parse::<CompressionType>().unwrap(), CompressionType::Gzip);
        assert_eq!("none".parse::<CompressionType>().unwrap(), CompressionType::None);
        assert!("brotli".parse::<CompressionType>().is_err());

        for compression in ALL {
            assert_eq!(compression.name().parse::<CompressionType>().unwrap(), compression);
        }
    }
}
