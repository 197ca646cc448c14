// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! The page payload compressor plug-in seam (spec.md §6): one [`Codec`] per
//! [`Compression`], selected by [`create_codec`].

use crate::basic::Compression;
use crate::errors::{unsupported_err, Result};

pub trait Codec: Send {
    /// Appends the compressed form of `input` to `output`, returning the
    /// number of bytes written.
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize>;

    /// Decompresses exactly `uncompressed_size` bytes of `input` into
    /// `output`.
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut Vec<u8>,
        uncompressed_size: usize,
    ) -> Result<usize>;
}

struct UncompressedCodec;

impl Codec for UncompressedCodec {
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        output.extend_from_slice(input);
        Ok(input.len())
    }

    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut Vec<u8>,
        uncompressed_size: usize,
    ) -> Result<usize> {
        if input.len() != uncompressed_size {
            return Err(crate::errors::malformed_err!(
                "uncompressed page declares {} bytes but carries {}",
                uncompressed_size,
                input.len()
            ));
        }
        output.extend_from_slice(input);
        Ok(input.len())
    }
}

#[cfg(feature = "snap")]
mod snappy_codec {
    use super::*;

    pub struct SnappyCodec;

    impl Codec for SnappyCodec {
        fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
            let mut encoder = snap::raw::Encoder::new();
            let start = output.len();
            output.resize(start + snap::raw::max_compress_len(input.len()), 0);
            let written = encoder
                .compress(input, &mut output[start..])
                .map_err(|e| crate::errors::general_err!("snappy compress failed: {e}"))?;
            output.truncate(start + written);
            Ok(written)
        }

        fn decompress(
            &mut self,
            input: &[u8],
            output: &mut Vec<u8>,
            uncompressed_size: usize,
        ) -> Result<usize> {
            let start = output.len();
            output.resize(start + uncompressed_size, 0);
            let mut decoder = snap::raw::Decoder::new();
            let written = decoder
                .decompress(input, &mut output[start..])
                .map_err(|e| crate::errors::general_err!("snappy decompress failed: {e}"))?;
            output.truncate(start + written);
            Ok(written)
        }
    }
}

#[cfg(feature = "flate2")]
mod gzip_codec {
    use super::*;
    use std::io::{Read, Write};

    pub struct GzipCodec;

    impl Codec for GzipCodec {
        fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
            let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(input)?;
            let compressed = encoder.finish()?;
            let written = compressed.len();
            output.extend_from_slice(&compressed);
            Ok(written)
        }

        fn decompress(
            &mut self,
            input: &[u8],
            output: &mut Vec<u8>,
            _uncompressed_size: usize,
        ) -> Result<usize> {
            let mut decoder = flate2::read::GzDecoder::new(input);
            let start = output.len();
            decoder.read_to_end(output)?;
            Ok(output.len() - start)
        }
    }
}

#[cfg(feature = "brotli")]
mod brotli_codec {
    use super::*;
    use std::io::Write;

    const BROTLI_BUFFER_SIZE: usize = 4096;
    const BROTLI_QUALITY: u32 = 11;
    const BROTLI_WINDOW: u32 = 22;

    pub struct BrotliCodec;

    impl Codec for BrotliCodec {
        fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
            let mut encoder = brotli::CompressorWriter::new(
                Vec::new(),
                BROTLI_BUFFER_SIZE,
                BROTLI_QUALITY,
                BROTLI_WINDOW,
            );
            encoder.write_all(input)?;
            let compressed = encoder.into_inner();
            let written = compressed.len();
            output.extend_from_slice(&compressed);
            Ok(written)
        }

        fn decompress(
            &mut self,
            input: &[u8],
            output: &mut Vec<u8>,
            _uncompressed_size: usize,
        ) -> Result<usize> {
            let mut decoder = brotli::Decompressor::new(input, BROTLI_BUFFER_SIZE);
            use std::io::Read;
            let start = output.len();
            decoder.read_to_end(output)?;
            Ok(output.len() - start)
        }
    }
}

#[cfg(feature = "lz4")]
mod lz4_codec {
    use super::*;

    pub struct Lz4RawCodec;

    impl Codec for Lz4RawCodec {
        fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
            let compressed = lz4::block::compress(input, None, false)
                .map_err(|e| crate::errors::general_err!("lz4 compress failed: {e}"))?;
            let written = compressed.len();
            output.extend_from_slice(&compressed);
            Ok(written)
        }

        fn decompress(
            &mut self,
            input: &[u8],
            output: &mut Vec<u8>,
            uncompressed_size: usize,
        ) -> Result<usize> {
            let decompressed = lz4::block::decompress(input, Some(uncompressed_size as i32))
                .map_err(|e| crate::errors::general_err!("lz4 decompress failed: {e}"))?;
            let written = decompressed.len();
            output.extend_from_slice(&decompressed);
            Ok(written)
        }
    }
}

#[cfg(feature = "zstd")]
mod zstd_codec {
    use super::*;

    pub struct ZstdCodec;

    impl Codec for ZstdCodec {
        fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
            let compressed = zstd::stream::encode_all(input, 0)
                .map_err(|e| crate::errors::general_err!("zstd compress failed: {e}"))?;
            let written = compressed.len();
            output.extend_from_slice(&compressed);
            Ok(written)
        }

        fn decompress(
            &mut self,
            input: &[u8],
            output: &mut Vec<u8>,
            _uncompressed_size: usize,
        ) -> Result<usize> {
            let decompressed = zstd::stream::decode_all(input)
                .map_err(|e| crate::errors::general_err!("zstd decompress failed: {e}"))?;
            let written = decompressed.len();
            output.extend_from_slice(&decompressed);
            Ok(written)
        }
    }
}

/// Returns `None` for `Compression::UNCOMPRESSED`, which is handled inline
/// by callers (no codec dispatch needed).
pub fn create_codec(compression: Compression) -> Result<Box<dyn Codec>> {
    Ok(match compression {
        Compression::UNCOMPRESSED => Box::new(UncompressedCodec),
        #[cfg(feature = "snap")]
        Compression::SNAPPY => Box::new(snappy_codec::SnappyCodec),
        #[cfg(feature = "flate2")]
        Compression::GZIP => Box::new(gzip_codec::GzipCodec),
        #[cfg(feature = "brotli")]
        Compression::BROTLI => Box::new(brotli_codec::BrotliCodec),
        #[cfg(feature = "lz4")]
        Compression::LZ4_RAW => Box::new(lz4_codec::Lz4RawCodec),
        #[cfg(feature = "zstd")]
        Compression::ZSTD => Box::new(zstd_codec::ZstdCodec),
        other => return Err(unsupported_err!("compression codec {:?} is not enabled", other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncompressed_round_trips() {
        let mut codec = create_codec(Compression::UNCOMPRESSED).unwrap();
        let input = b"hello world, this is a page of column data".to_vec();
        let mut compressed = Vec::new();
        codec.compress(&input, &mut compressed).unwrap();
        let mut output = Vec::new();
        codec
            .decompress(&compressed, &mut output, input.len())
            .unwrap();
        assert_eq!(output, input);
    }

    #[cfg(feature = "snap")]
    #[test]
    fn snappy_round_trips() {
        let mut codec = create_codec(Compression::SNAPPY).unwrap();
        let input = vec![7u8; 4096];
        let mut compressed = Vec::new();
        codec.compress(&input, &mut compressed).unwrap();
        let mut output = Vec::new();
        codec
            .decompress(&compressed, &mut output, input.len())
            .unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn unsupported_codec_without_feature_errors() {
        // LZO has no fallback anywhere in this crate.
        assert!(create_codec(Compression::LZO).is_err());
    }
}
