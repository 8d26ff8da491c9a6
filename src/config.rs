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

//! Channel and sampling configuration for the acquisition pipeline.
//!
//! Configuration arrives once from an external settings store at startup and
//! is immutable while acquisition runs. Validation errors are fatal: the
//! caller is expected to abort startup, not to retry with the same input.

use core::fmt;
use thiserror::Error;

/// Number of logical channels the probe converts: the measurement ("current")
/// channel and the range-selection ("setup") channel.
pub const CHANNEL_COUNT: usize = 2;

/// Lowest aggregate trigger frequency the continuous conversion unit
/// supports.
pub const SAMPLE_RATE_MIN_HZ: u32 = 611;

/// Highest aggregate trigger frequency the continuous conversion unit
/// supports.
pub const SAMPLE_RATE_MAX_HZ: u32 = 83_333;

/// Logical channel tag as delivered in every conversion record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(u8);

impl ChannelId {
    /// Highest tag encodable in a conversion record.
    pub const MAX_TAG: u8 = 0xf;

    /// Creates a channel id, `None` if the tag doesn't fit the record
    /// format.
    pub const fn new(tag: u8) -> Option<Self> {
        if tag <= Self::MAX_TAG {
            Some(Self(tag))
        } else {
            None
        }
    }

    /// Decodes a tag nibble from the wire; bits above the nibble are
    /// ignored.
    pub(crate) const fn from_wire(tag: u8) -> Self {
        Self(tag & Self::MAX_TAG)
    }

    /// The raw tag value.
    pub const fn tag(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CH{}", self.0)
    }
}

/// Input divider setting of a channel. A higher attenuation extends the
/// measurable input range at the cost of resolution.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Attenuation {
    /// No attenuation.
    Db0,
    /// 2.5 dB.
    Db2_5,
    /// 6 dB.
    Db6,
    /// 12 dB, the widest input range.
    Db12,
}

impl Attenuation {
    /// The 2-bit wire code carried in every conversion record.
    pub const fn code(self) -> u8 {
        match self {
            Self::Db0 => 0,
            Self::Db2_5 => 1,
            Self::Db6 => 2,
            Self::Db12 => 3,
        }
    }

    /// Decodes a 2-bit wire code; bits above the code are ignored.
    pub const fn from_code(code: u8) -> Self {
        match code & 0b11 {
            0 => Self::Db0,
            1 => Self::Db2_5,
            2 => Self::Db6,
            _ => Self::Db12,
        }
    }

    /// Nominal range extension in decibels.
    pub const fn db(self) -> f32 {
        match self {
            Self::Db0 => 0.0,
            Self::Db2_5 => 2.5,
            Self::Db6 => 6.0,
            Self::Db12 => 12.0,
        }
    }
}

/// Conversion resolution of a channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BitWidth {
    Bits9,
    Bits10,
    Bits11,
    Bits12,
}

impl BitWidth {
    pub const fn bits(self) -> u8 {
        match self {
            Self::Bits9 => 9,
            Self::Bits10 => 10,
            Self::Bits11 => 11,
            Self::Bits12 => 12,
        }
    }

    /// Largest sample value a conversion at this resolution can produce.
    pub const fn max_value(self) -> u16 {
        (1 << self.bits()) - 1
    }
}

/// Configuration of one logical channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    pub id: ChannelId,
    pub attenuation: Attenuation,
    pub bit_width: BitWidth,
}

/// Fatal configuration error. There is no recovery path; startup must be
/// aborted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Both channel slots carry the same tag.
    #[error("both channels configured with tag {0}")]
    DuplicateChannel(ChannelId),
    /// The aggregate trigger frequency is outside the hardware limits.
    #[error(
        "sample rate {0} Hz outside supported range {min}..={max} Hz",
        min = SAMPLE_RATE_MIN_HZ,
        max = SAMPLE_RATE_MAX_HZ
    )]
    SampleRateOutOfRange(u32),
}

/// Validated configuration of the whole acquisition pipeline: exactly two
/// channel patterns plus the aggregate trigger frequency shared by them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AcquisitionConfig {
    channels: [ChannelConfig; CHANNEL_COUNT],
    sample_rate_hz: u32,
}

impl AcquisitionConfig {
    /// Validates and freezes a configuration.
    pub fn new(
        channels: [ChannelConfig; CHANNEL_COUNT],
        sample_rate_hz: u32,
    ) -> Result<Self, ConfigError> {
        if channels[0].id == channels[1].id {
            return Err(ConfigError::DuplicateChannel(channels[0].id));
        }
        if !(SAMPLE_RATE_MIN_HZ..=SAMPLE_RATE_MAX_HZ).contains(&sample_rate_hz) {
            return Err(ConfigError::SampleRateOutOfRange(sample_rate_hz));
        }
        Ok(Self {
            channels,
            sample_rate_hz,
        })
    }

    /// The configured channel patterns, in conversion order.
    pub const fn channels(&self) -> &[ChannelConfig; CHANNEL_COUNT] {
        &self.channels
    }

    /// Aggregate trigger frequency across both channels.
    pub const fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }
}
