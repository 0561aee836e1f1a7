//! Loop-back transport: "sends" a transmit frame and "receives" a reply
//! by logging both through the transcoder's display form.
//!
//! There is no wire. A transaction only fails when either buffer is
//! missing or empty, which points at a build defect rather than a bus fault.

use crate::conversion::Conversion;
use crate::error::{FrameError, FrameResult};
use crate::logging::CallbackLogger;

/// Simulated transport consumer.
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    conversion: Conversion,
    logger: CallbackLogger,
}

impl Simulation {
    pub fn new(conversion: Conversion, logger: CallbackLogger) -> Self {
        Self { conversion, logger }
    }

    /// Log one TX/RX exchange.
    ///
    /// Returns [`FrameError::Simulation`] if either frame is missing or empty.
    pub fn simulate_transaction(&self, transmit: Option<&[u8]>, receive: Option<&[u8]>) -> FrameResult<()> {
        let transmit = match transmit {
            Some(frame) if !frame.is_empty() => frame,
            _ => {
                self.logger.error("Empty transmit buffer, nothing to send");
                return Err(FrameError::simulation("transmit buffer is empty"));
            }
        };
        let receive = match receive {
            Some(frame) if !frame.is_empty() => frame,
            _ => {
                self.logger.error("Empty receive buffer, nothing received");
                return Err(FrameError::simulation("receive buffer is empty"));
            }
        };

        self.logger
            .info(&format!("Simulated TX: {}", self.conversion.display(transmit)));
        self.logger
            .info(&format!("Simulated RX: {}", self.conversion.display(receive)));
        Ok(())
    }
}
