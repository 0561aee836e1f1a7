//! Devices: an address plus the messages exchanged with it

use crate::logging::CallbackLogger;
use crate::message::Message;

/// A slave device on the simulated bus.
///
/// # Example
///
/// ```rust
/// use modbus_schema::{Device, Message};
///
/// let device = Device::new("meter", 17)
///     .with_message(Message::new("holding_regs").with_field("length", 2u64));
/// assert_eq!(device.address(), 17);
/// assert_eq!(device.messages().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Device {
    name: String,
    address: u64,
    messages: Vec<Message>,
}

impl Device {
    pub fn new(name: impl Into<String>, address: u64) -> Self {
        Self {
            name: name.into(),
            address,
            messages: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn log(&self, logger: &CallbackLogger) {
        logger.debug(&format!(
            "Device Name: {} (Address: {})",
            self.name, self.address
        ));
        for message in &self.messages {
            message.log(logger);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let device = Device::default();
        assert_eq!(device.name(), "");
        assert_eq!(device.address(), 0);
        assert!(device.messages().is_empty());
    }

    #[test]
    fn test_messages_keep_order() {
        let device = Device::new("plc", 1)
            .with_message(Message::new("a"))
            .with_message(Message::new("b"));
        let names: Vec<&str> = device.messages().iter().map(Message::name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
