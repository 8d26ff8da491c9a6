/*
MIT License

Copyright (c) 2024 Philipp Schuster

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Packed conversion record codec.
//!
//! The conversion hardware emits one 32-bit little-endian word per sample:
//!
//! ```text
//! bits  0..=11   sample value (12 bit)
//! bits 12..=13   attenuation code
//! bits 14..=15   reserved
//! bits 16..=19   channel tag
//! bits 20..=31   reserved
//! ```
//!
//! Decoding is total: any word parses into a [`ConversionRecord`]. Whether
//! the channel tag belongs to a configured channel is a semantic question
//! answered by the demultiplexer, not a codec concern.

use crate::config::{Attenuation, ChannelId};

/// Size in bytes of one packed conversion record.
pub const RECORD_BYTES: usize = 4;

/// Largest value a 12-bit conversion can produce.
pub const SAMPLE_MAX: u16 = 0xfff;

const VALUE_MASK: u32 = 0xfff;
const ATTEN_SHIFT: u32 = 12;
const ATTEN_MASK: u32 = 0b11;
const TAG_SHIFT: u32 = 16;
const TAG_MASK: u32 = 0xf;

/// One decoded conversion record: a 12-bit sample value tagged with its
/// source channel and the attenuation it was converted under.
///
/// Records are produced by hardware at the configured trigger rate and are
/// immutable once captured; they live for exactly one buffer cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConversionRecord {
    pub channel: ChannelId,
    pub attenuation: Attenuation,
    pub value: u16,
}

impl ConversionRecord {
    /// Decodes one packed word. Reserved bits are ignored.
    pub const fn decode(word: [u8; RECORD_BYTES]) -> Self {
        let word = u32::from_le_bytes(word);
        Self {
            channel: ChannelId::from_wire(((word >> TAG_SHIFT) & TAG_MASK) as u8),
            attenuation: Attenuation::from_code(((word >> ATTEN_SHIFT) & ATTEN_MASK) as u8),
            value: (word & VALUE_MASK) as u16,
        }
    }

    /// Encodes the record into its packed wire form. Values wider than
    /// 12 bit are truncated the way the hardware register would truncate
    /// them.
    pub const fn encode(self) -> [u8; RECORD_BYTES] {
        let word = (self.value as u32 & VALUE_MASK)
            | ((self.attenuation.code() as u32) << ATTEN_SHIFT)
            | ((self.channel.tag() as u32) << TAG_SHIFT);
        word.to_le_bytes()
    }
}

/// Iterates the complete records in the valid bytes of a read buffer, in
/// delivered order. A trailing partial record is not yielded; callers that
/// care about truncation compare the buffer length against [`RECORD_BYTES`].
#[derive(Debug, Clone)]
pub struct RecordIter<'a> {
    bytes: &'a [u8],
}

impl<'a> RecordIter<'a> {
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl Iterator for RecordIter<'_> {
    type Item = ConversionRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bytes.len() < RECORD_BYTES {
            return None;
        }
        let (head, rest) = self.bytes.split_at(RECORD_BYTES);
        self.bytes = rest;
        let mut word = [0; RECORD_BYTES];
        word.copy_from_slice(head);
        Some(ConversionRecord::decode(word))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let records = self.bytes.len() / RECORD_BYTES;
        (records, Some(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use std::vec::Vec;

    #[test]
    fn encode_decode_roundtrip() {
        let record = ConversionRecord {
            channel: ChannelId::new(7).unwrap(),
            attenuation: Attenuation::Db6,
            value: 0xabc,
        };
        check!(ConversionRecord::decode(record.encode()) == record);

        let record = ConversionRecord {
            channel: ChannelId::new(0).unwrap(),
            attenuation: Attenuation::Db0,
            value: SAMPLE_MAX,
        };
        check!(ConversionRecord::decode(record.encode()) == record);
    }

    #[test]
    fn decode_ignores_reserved_bits() {
        let record = ConversionRecord {
            channel: ChannelId::new(2).unwrap(),
            attenuation: Attenuation::Db12,
            value: 1234,
        };
        let mut word = u32::from_le_bytes(record.encode());
        // Set every reserved bit.
        word |= 0b1100_0000_0000_0000;
        word |= 0xfff0_0000;
        check!(ConversionRecord::decode(word.to_le_bytes()) == record);
    }

    #[test]
    fn encode_truncates_oversized_value() {
        let record = ConversionRecord {
            channel: ChannelId::new(1).unwrap(),
            attenuation: Attenuation::Db12,
            value: 0x1fff,
        };
        check!(ConversionRecord::decode(record.encode()).value == 0xfff);
    }

    #[test]
    fn iterates_records_and_skips_partial_tail() {
        let records = [
            ConversionRecord {
                channel: ChannelId::new(0).unwrap(),
                attenuation: Attenuation::Db12,
                value: 10,
            },
            ConversionRecord {
                channel: ChannelId::new(1).unwrap(),
                attenuation: Attenuation::Db12,
                value: 20,
            },
        ];
        let mut bytes = records
            .iter()
            .flat_map(|record| record.encode())
            .collect::<Vec<_>>();
        // Dangling partial record.
        bytes.push(0xcc);

        let iter = RecordIter::new(&bytes);
        check!(iter.size_hint() == (2, Some(2)));
        check!(iter.collect::<Vec<_>>() == records);
    }

    #[test]
    fn empty_buffer_yields_nothing() {
        check!(RecordIter::new(&[]).next() == None);
    }
}
