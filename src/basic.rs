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

//! The physical, logical and wire-level enumerations shared by every layer:
//! physical type, repetition, encoding, compression codec, page type, and
//! logical type annotation. Each has a `From`/`TryFrom` bridge to its
//! `parquet_format` (Thrift-generated) counterpart so the rest of the crate
//! never touches the wire enums directly.

use std::fmt;

use crate::errors::{unsupported_err, ParquetError};

/// The seven physical value kinds plus their FIXED_LEN_BYTE_ARRAY sibling,
/// as laid out in spec.md §3. `INT96` is carried for legacy compatibility
/// only and is never produced by new writers in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Type {
    BOOLEAN,
    INT32,
    INT64,
    INT96,
    FLOAT,
    DOUBLE,
    BYTE_ARRAY,
    FIXED_LEN_BYTE_ARRAY,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl From<parquet_format::Type> for Type {
    fn from(value: parquet_format::Type) -> Self {
        match value {
            parquet_format::Type::Boolean => Type::BOOLEAN,
            parquet_format::Type::Int32 => Type::INT32,
            parquet_format::Type::Int64 => Type::INT64,
            parquet_format::Type::Int96 => Type::INT96,
            parquet_format::Type::Float => Type::FLOAT,
            parquet_format::Type::Double => Type::DOUBLE,
            parquet_format::Type::ByteArray => Type::BYTE_ARRAY,
            parquet_format::Type::FixedLenByteArray => Type::FIXED_LEN_BYTE_ARRAY,
        }
    }
}

impl From<Type> for parquet_format::Type {
    fn from(value: Type) -> Self {
        match value {
            Type::BOOLEAN => parquet_format::Type::Boolean,
            Type::INT32 => parquet_format::Type::Int32,
            Type::INT64 => parquet_format::Type::Int64,
            Type::INT96 => parquet_format::Type::Int96,
            Type::FLOAT => parquet_format::Type::Float,
            Type::DOUBLE => parquet_format::Type::Double,
            Type::BYTE_ARRAY => parquet_format::Type::ByteArray,
            Type::FIXED_LEN_BYTE_ARRAY => parquet_format::Type::FixedLenByteArray,
        }
    }
}

/// Group/leaf repetition: REQUIRED, OPTIONAL, or REPEATED (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Repetition {
    REQUIRED,
    OPTIONAL,
    REPEATED,
}

impl From<parquet_format::FieldRepetitionType> for Repetition {
    fn from(value: parquet_format::FieldRepetitionType) -> Self {
        match value {
            parquet_format::FieldRepetitionType::Required => Repetition::REQUIRED,
            parquet_format::FieldRepetitionType::Optional => Repetition::OPTIONAL,
            parquet_format::FieldRepetitionType::Repeated => Repetition::REPEATED,
        }
    }
}

impl From<Repetition> for parquet_format::FieldRepetitionType {
    fn from(value: Repetition) -> Self {
        match value {
            Repetition::REQUIRED => parquet_format::FieldRepetitionType::Required,
            Repetition::OPTIONAL => parquet_format::FieldRepetitionType::Optional,
            Repetition::REPEATED => parquet_format::FieldRepetitionType::Repeated,
        }
    }
}

/// Value and level encodings (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Encoding {
    PLAIN,
    PLAIN_DICTIONARY,
    RLE,
    BIT_PACKED,
    DELTA_BINARY_PACKED,
    DELTA_LENGTH_BYTE_ARRAY,
    DELTA_BYTE_ARRAY,
    RLE_DICTIONARY,
    BYTE_STREAM_SPLIT,
}

impl From<parquet_format::Encoding> for Encoding {
    fn from(value: parquet_format::Encoding) -> Self {
        match value {
            parquet_format::Encoding::Plain => Encoding::PLAIN,
            parquet_format::Encoding::PlainDictionary => Encoding::PLAIN_DICTIONARY,
            parquet_format::Encoding::Rle => Encoding::RLE,
            parquet_format::Encoding::BitPacked => Encoding::BIT_PACKED,
            parquet_format::Encoding::DeltaBinaryPacked => Encoding::DELTA_BINARY_PACKED,
            parquet_format::Encoding::DeltaLengthByteArray => {
                Encoding::DELTA_LENGTH_BYTE_ARRAY
            }
            parquet_format::Encoding::DeltaByteArray => Encoding::DELTA_BYTE_ARRAY,
            parquet_format::Encoding::RleDictionary => Encoding::RLE_DICTIONARY,
            parquet_format::Encoding::ByteStreamSplit => Encoding::BYTE_STREAM_SPLIT,
        }
    }
}

impl From<Encoding> for parquet_format::Encoding {
    fn from(value: Encoding) -> Self {
        match value {
            Encoding::PLAIN => parquet_format::Encoding::Plain,
            Encoding::PLAIN_DICTIONARY => parquet_format::Encoding::PlainDictionary,
            Encoding::RLE => parquet_format::Encoding::Rle,
            Encoding::BIT_PACKED => parquet_format::Encoding::BitPacked,
            Encoding::DELTA_BINARY_PACKED => parquet_format::Encoding::DeltaBinaryPacked,
            Encoding::DELTA_LENGTH_BYTE_ARRAY => {
                parquet_format::Encoding::DeltaLengthByteArray
            }
            Encoding::DELTA_BYTE_ARRAY => parquet_format::Encoding::DeltaByteArray,
            Encoding::RLE_DICTIONARY => parquet_format::Encoding::RleDictionary,
            Encoding::BYTE_STREAM_SPLIT => parquet_format::Encoding::ByteStreamSplit,
        }
    }
}

/// Page compression codec. Known by numeric id per spec.md §6; `LZO` is
/// recognized but never usable (no decoder is wired up for it — it is a
/// stub, matching the teacher's treatment of long-deprecated codecs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Compression {
    UNCOMPRESSED,
    SNAPPY,
    GZIP,
    LZO,
    BROTLI,
    LZ4,
    ZSTD,
    LZ4_RAW,
}

impl From<parquet_format::CompressionCodec> for Compression {
    fn from(value: parquet_format::CompressionCodec) -> Self {
        match value {
            parquet_format::CompressionCodec::Uncompressed => Compression::UNCOMPRESSED,
            parquet_format::CompressionCodec::Snappy => Compression::SNAPPY,
            parquet_format::CompressionCodec::Gzip => Compression::GZIP,
            parquet_format::CompressionCodec::Lzo => Compression::LZO,
            parquet_format::CompressionCodec::Brotli => Compression::BROTLI,
            parquet_format::CompressionCodec::Lz4 => Compression::LZ4,
            parquet_format::CompressionCodec::Zstd => Compression::ZSTD,
            parquet_format::CompressionCodec::Lz4Raw => Compression::LZ4_RAW,
        }
    }
}

impl From<Compression> for parquet_format::CompressionCodec {
    fn from(value: Compression) -> Self {
        match value {
            Compression::UNCOMPRESSED => parquet_format::CompressionCodec::Uncompressed,
            Compression::SNAPPY => parquet_format::CompressionCodec::Snappy,
            Compression::GZIP => parquet_format::CompressionCodec::Gzip,
            Compression::LZO => parquet_format::CompressionCodec::Lzo,
            Compression::BROTLI => parquet_format::CompressionCodec::Brotli,
            Compression::LZ4 => parquet_format::CompressionCodec::Lz4,
            Compression::ZSTD => parquet_format::CompressionCodec::Zstd,
            Compression::LZ4_RAW => parquet_format::CompressionCodec::Lz4Raw,
        }
    }
}

/// Page header kind (spec.md §3 "Page").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum PageType {
    DATA_PAGE,
    INDEX_PAGE,
    DICTIONARY_PAGE,
    DATA_PAGE_V2,
}

impl From<parquet_format::PageType> for PageType {
    fn from(value: parquet_format::PageType) -> Self {
        match value {
            parquet_format::PageType::DataPage => PageType::DATA_PAGE,
            parquet_format::PageType::IndexPage => PageType::INDEX_PAGE,
            parquet_format::PageType::DictionaryPage => PageType::DICTIONARY_PAGE,
            parquet_format::PageType::DataPageV2 => PageType::DATA_PAGE_V2,
        }
    }
}

impl From<PageType> for parquet_format::PageType {
    fn from(value: PageType) -> Self {
        match value {
            PageType::DATA_PAGE => parquet_format::PageType::DataPage,
            PageType::INDEX_PAGE => parquet_format::PageType::IndexPage,
            PageType::DICTIONARY_PAGE => parquet_format::PageType::DictionaryPage,
            PageType::DATA_PAGE_V2 => parquet_format::PageType::DataPageV2,
        }
    }
}

/// Which page framing a column writer emits (spec.md §4.3): v1 compresses
/// `levels || values` as one unit, v2 compresses only the values and
/// leaves levels raw with explicit byte lengths in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataPageVersion {
    V1,
    V2,
}

/// Ordering used when comparing two pages/columns for ColumnIndex min/max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    SIGNED,
    UNSIGNED,
    UNDEFINED,
}

/// Logical type annotation attached to a leaf, beyond its physical storage
/// (spec.md §3 leaf types). `INTEGER` replaces the legacy `ConvertedType`
/// INT_8/16/32/64/UINT_8/16/32/64 with the unified (bit_width, signed) pair.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalType {
    String,
    Map,
    List,
    Enum,
    Decimal { scale: i32, precision: i32 },
    Date,
    Time { unit: TimeUnit, is_adjusted_to_utc: bool },
    Timestamp { unit: TimeUnit, is_adjusted_to_utc: bool },
    Integer { bit_width: i8, is_signed: bool },
    Unknown,
    Json,
    Bson,
    Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Millis,
    Micros,
    Nanos,
}

impl LogicalType {
    /// Whether values under this annotation should be compared as unsigned
    /// integers when computing page/column statistics (spec.md §4.2).
    pub fn is_unsigned(&self) -> bool {
        matches!(self, LogicalType::Integer { is_signed: false, .. })
    }
}

impl TryFrom<parquet_format::LogicalType> for LogicalType {
    type Error = ParquetError;

    fn try_from(value: parquet_format::LogicalType) -> Result<Self, Self::Error> {
        use parquet_format::LogicalType as FLT;
        Ok(match value {
            FLT::STRING(_) => LogicalType::String,
            FLT::MAP(_) => LogicalType::Map,
            FLT::LIST(_) => LogicalType::List,
            FLT::ENUM(_) => LogicalType::Enum,
            FLT::DECIMAL(d) => LogicalType::Decimal {
                scale: d.scale,
                precision: d.precision,
            },
            FLT::DATE(_) => LogicalType::Date,
            FLT::TIME(t) => LogicalType::Time {
                unit: time_unit_from_thrift(&t.unit),
                is_adjusted_to_utc: t.is_adjusted_to_u_t_c,
            },
            FLT::TIMESTAMP(t) => LogicalType::Timestamp {
                unit: time_unit_from_thrift(&t.unit),
                is_adjusted_to_utc: t.is_adjusted_to_u_t_c,
            },
            FLT::INTEGER(i) => LogicalType::Integer {
                bit_width: i.bit_width,
                is_signed: i.is_signed,
            },
            FLT::UNKNOWN(_) => LogicalType::Unknown,
            FLT::JSON(_) => LogicalType::Json,
            FLT::BSON(_) => LogicalType::Bson,
            FLT::UUID(_) => LogicalType::Uuid,
        })
    }
}

impl From<LogicalType> for parquet_format::LogicalType {
    fn from(value: LogicalType) -> Self {
        use parquet_format::LogicalType as FLT;
        match value {
            LogicalType::String => FLT::STRING(Default::default()),
            LogicalType::Map => FLT::MAP(Default::default()),
            LogicalType::List => FLT::LIST(Default::default()),
            LogicalType::Enum => FLT::ENUM(Default::default()),
            LogicalType::Decimal { scale, precision } => {
                FLT::DECIMAL(parquet_format::DecimalType { scale, precision })
            }
            LogicalType::Date => FLT::DATE(Default::default()),
            LogicalType::Time {
                unit,
                is_adjusted_to_utc,
            } => FLT::TIME(parquet_format::TimeType {
                is_adjusted_to_u_t_c: is_adjusted_to_utc,
                unit: time_unit_to_thrift(unit),
            }),
            LogicalType::Timestamp {
                unit,
                is_adjusted_to_utc,
            } => FLT::TIMESTAMP(parquet_format::TimestampType {
                is_adjusted_to_u_t_c: is_adjusted_to_utc,
                unit: time_unit_to_thrift(unit),
            }),
            LogicalType::Integer {
                bit_width,
                is_signed,
            } => FLT::INTEGER(parquet_format::IntType {
                bit_width,
                is_signed,
            }),
            LogicalType::Unknown => FLT::UNKNOWN(Default::default()),
            LogicalType::Json => FLT::JSON(Default::default()),
            LogicalType::Bson => FLT::BSON(Default::default()),
            LogicalType::Uuid => FLT::UUID(Default::default()),
        }
    }
}

fn time_unit_to_thrift(unit: TimeUnit) -> parquet_format::TimeUnit {
    match unit {
        TimeUnit::Millis => parquet_format::TimeUnit::MILLIS(Default::default()),
        TimeUnit::Micros => parquet_format::TimeUnit::MICROS(Default::default()),
        TimeUnit::Nanos => parquet_format::TimeUnit::NANOS(Default::default()),
    }
}

fn time_unit_from_thrift(unit: &parquet_format::TimeUnit) -> TimeUnit {
    match unit {
        parquet_format::TimeUnit::MILLIS(_) => TimeUnit::Millis,
        parquet_format::TimeUnit::MICROS(_) => TimeUnit::Micros,
        parquet_format::TimeUnit::NANOS(_) => TimeUnit::Nanos,
    }
}

/// Maps a [`Compression`] id that this crate cannot encode/decode into a
/// clear `UnsupportedFeature` error rather than panicking deep in the codec.
pub fn ensure_supported_codec(c: Compression) -> Result<(), ParquetError> {
    if c == Compression::LZO {
        return Err(unsupported_err!(
            "codec LZO is recognized but has no available implementation"
        ));
    }
    Ok(())
}
