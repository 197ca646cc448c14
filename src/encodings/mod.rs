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

//! Per-page value encodings (spec.md §4.2): PLAIN, the RLE/bit-packed
//! hybrid (also used for repetition/definition levels and dictionary
//! indices), DELTA_BINARY_PACKED, DELTA_LENGTH_BYTE_ARRAY, DELTA_BYTE_ARRAY
//! and BYTE_STREAM_SPLIT.

pub mod byte_stream_split;
pub mod delta_binary_packed;
pub mod delta_byte_array;
pub mod delta_length_byte_array;
pub mod plain;
pub mod rle;

use crate::basic::{Encoding, Type as PhysicalType};
use crate::errors::{unsupported_err, Result};
use crate::value::PhysicalValue;

/// Appends non-null physical values of one column's page to an internal
/// buffer and serializes them on [`Encoder::flush_buffer`].
pub trait Encoder {
    fn put(&mut self, values: &[PhysicalValue]) -> Result<()>;
    fn flush_buffer(&mut self) -> Result<Vec<u8>>;
    fn estimated_data_encoded_size(&self) -> usize;
    fn encoding(&self) -> Encoding;
}

/// Decodes a page's value bytes back into physical values, `num_values` at
/// a time (the page header's declared non-null count).
pub trait Decoder {
    fn set_data(&mut self, data: bytes::Bytes, num_values: usize) -> Result<()>;
    fn get(&mut self, max_values: usize) -> Result<Vec<PhysicalValue>>;
    fn values_left(&self) -> usize;
}

pub fn get_encoder(
    encoding: Encoding,
    physical_type: PhysicalType,
    type_length: i32,
) -> Result<Box<dyn Encoder>> {
    Ok(match encoding {
        Encoding::PLAIN => Box::new(plain::PlainEncoder::new(physical_type)),
        Encoding::DELTA_BINARY_PACKED => Box::new(
            delta_binary_packed::DeltaBinaryPackedEncoder::new(physical_type)?,
        ),
        Encoding::DELTA_LENGTH_BYTE_ARRAY => {
            Box::new(delta_length_byte_array::DeltaLengthByteArrayEncoder::new())
        }
        Encoding::DELTA_BYTE_ARRAY => Box::new(delta_byte_array::DeltaByteArrayEncoder::new()),
        Encoding::BYTE_STREAM_SPLIT => Box::new(byte_stream_split::ByteStreamSplitEncoder::new(
            physical_type,
            type_length,
        )?),
        other => return Err(unsupported_err!("no value encoder for {:?}", other)),
    })
}

pub fn get_decoder(
    encoding: Encoding,
    physical_type: PhysicalType,
    type_length: i32,
) -> Result<Box<dyn Decoder>> {
    Ok(match encoding {
        Encoding::PLAIN => Box::new(plain::PlainDecoder::new(physical_type, type_length)),
        Encoding::DELTA_BINARY_PACKED => {
            Box::new(delta_binary_packed::DeltaBinaryPackedDecoder::new(physical_type)?)
        }
        Encoding::DELTA_LENGTH_BYTE_ARRAY => {
            Box::new(delta_length_byte_array::DeltaLengthByteArrayDecoder::new())
        }
        Encoding::DELTA_BYTE_ARRAY => Box::new(delta_byte_array::DeltaByteArrayDecoder::new()),
        Encoding::BYTE_STREAM_SPLIT => {
            Box::new(byte_stream_split::ByteStreamSplitDecoder::new(physical_type, type_length)?)
        }
        other => return Err(unsupported_err!("no value decoder for {:?}", other)),
    })
}
