//! # Frame Builder
//!
//! Turns a frame template plus a message and its device into wire bytes:
//!
//! ```text
//! prefix literal | segment bytes ... | suffix literal  --transcode-->  wire frame
//! ```
//!
//! Segment values are resolved in a fixed order by segment name:
//!
//! 1. `slave_address`: the device address
//! 2. `error_check`: checksum over the bytes accumulated so far (prefix excluded)
//! 3. `byte_count`: the message's payload size in bytes
//! 4. `data_bytes`: `ceil(bits * byte_count / 8)` random filler values
//! 5. anything else: the message field of the same name
//!
//! Filler bytes come from the builder's own random source, so two builds of
//! the same receive template are not expected to be byte-identical.

use bytes::{BufMut, Bytes, BytesMut};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::checksum::Checksum;
use crate::codec::FieldCodec;
use crate::constants::{
    MAX_FILLER_VALUES, SEG_BYTE_COUNT, SEG_DATA_BYTES, SEG_ERROR_CHECK, SEG_SLAVE_ADDRESS,
};
use crate::conversion::Conversion;
use crate::device::Device;
use crate::error::{FrameError, FrameResult};
use crate::logging::CallbackLogger;
use crate::message::Message;
use crate::prototype::{Direction, Prototype};
use crate::segment::Segment;

/// Random source seeded from the wall clock.
pub fn time_seeded_rng() -> StdRng {
    let now = Utc::now();
    let seed = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_millis());
    StdRng::seed_from_u64(seed as u64)
}

/// Assembles frames for one protocol configuration.
pub struct FrameBuilder<R: RngCore = StdRng> {
    prefix: String,
    suffix: String,
    conversion: Conversion,
    checksum: Checksum,
    rng: R,
    logger: CallbackLogger,
}

impl<R: RngCore> FrameBuilder<R> {
    pub fn new(
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        conversion: Conversion,
        checksum: Checksum,
        rng: R,
        logger: CallbackLogger,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            conversion,
            checksum,
            rng,
            logger,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn conversion(&self) -> &Conversion {
        &self.conversion
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    /// Build the wire frame for `direction` of `template`.
    ///
    /// Fails with [`FrameError::Build`] naming the first segment whose value
    /// cannot be resolved.
    pub fn build_frame(
        &mut self,
        template: &Prototype,
        direction: Direction,
        message: &Message,
        device: &Device,
    ) -> FrameResult<Bytes> {
        let segments = template.segments(direction);
        let capacity = self.prefix.len()
            + self.suffix.len()
            + segments.iter().map(Segment::byte_width).sum::<usize>();
        let mut frame = BytesMut::with_capacity(capacity);

        append_literal(&mut frame, &self.prefix);
        for segment in segments {
            let values = self.resolve_values(segment, message, device, &frame)?;
            FieldCodec::encode(segment, &values, &mut frame);
        }
        append_literal(&mut frame, &self.suffix);

        self.logger.log_frame(
            &format!("{} {} {}", template.name(), direction.label(), device.address()),
            &frame,
        );
        self.conversion.to_wire(&frame, &self.prefix, &self.suffix)
    }

    /// Values for one segment, given the bytes accumulated so far.
    fn resolve_values(
        &mut self,
        segment: &Segment,
        message: &Message,
        device: &Device,
        accumulated: &[u8],
    ) -> FrameResult<Vec<u64>> {
        match segment.name() {
            SEG_SLAVE_ADDRESS => Ok(vec![device.address()]),
            SEG_ERROR_CHECK => Ok(vec![u64::from(
                self.checksum.calculate(accumulated, &self.prefix),
            )]),
            SEG_BYTE_COUNT => Ok(vec![message.data_byte_count()]),
            SEG_DATA_BYTES => {
                let count = u64::from(segment.bits())
                    .saturating_mul(message.data_byte_count())
                    .div_ceil(8);
                if count > MAX_FILLER_VALUES {
                    return Err(FrameError::build(
                        SEG_DATA_BYTES,
                        format!(
                            "{} filler values requested, at most {} allowed",
                            count, MAX_FILLER_VALUES
                        ),
                    ));
                }
                Ok((0..count)
                    .map(|_| u64::from(self.rng.gen::<u8>()))
                    .collect())
            }
            name => {
                let value = message.field(name).map_err(|_| {
                    FrameError::build(name, "unable to find value for segment")
                })?;
                let encoded = value.as_u64().ok_or_else(|| {
                    FrameError::build(
                        name,
                        format!("{} value {} cannot be encoded", value.type_name(), value),
                    )
                })?;
                Ok(vec![encoded])
            }
        }
    }
}

/// Append a literal, one byte per upper-cased character.
fn append_literal(frame: &mut BytesMut, literal: &str) {
    for ch in literal.chars() {
        frame.put_u8(ch.to_ascii_uppercase() as u8);
    }
}
