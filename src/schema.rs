//! # Schema Loading
//!
//! Reads the JSON protocol description and turns it into templates,
//! devices and settings.
//!
//! ```json
//! {
//!   "protocol": {
//!     "prefix": ":", "suffix": "\r\n",
//!     "transmission_mode": "ascii",
//!     "checksum_calculation": "LRC",
//!     "prototype": [
//!       { "name": "read_holding",
//!         "transmit": [ { "name": "slave_address", "bits": 8 } ],
//!         "receive":  [ { "name": "slave_address", "bits": 8 } ] }
//!     ],
//!     "device": [
//!       { "name": "meter", "address": 17,
//!         "message": [ { "name": "read_holding", "length": 2 } ] }
//!     ]
//!   }
//! }
//! ```
//!
//! Every key is optional at the serde level so that a missing key is
//! reported as [`FrameError::Config`] with the path of the offending entity
//! (`prototype[1].transmit`, `device[0].message[2].name`) instead of a bare
//! JSON error.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::checksum::ChecksumAlgorithm;
use crate::constants::{
    ATTR_DATA_TYPE, ATTR_LENGTH, DEFAULT_CHECKSUM, KEY_DEVICE, KEY_MESSAGE, KEY_PROTOCOL, KEY_PROTOTYPE, KEY_RECEIVE,
    KEY_TRANSMIT,
};
use crate::conversion::TranscodeMode;
use crate::device::Device;
use crate::error::{FrameError, FrameResult};
use crate::message::Message;
use crate::protocol::ProtocolSettings;
use crate::prototype::Prototype;
use crate::segment::Segment;
use crate::value::FieldValue;

// ============================================================================
// Document model
// ============================================================================

/// Top level schema document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProtocolDocument {
    pub protocol: Option<ProtocolSection>,
}

/// The `protocol` object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProtocolSection {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub timeout: Option<u64>,
    pub source_address: Option<u64>,
    pub transmission_mode: Option<String>,
    pub checksum_calculation: Option<String>,
    pub prototype: Option<Vec<PrototypeEntry>>,
    pub device: Option<Vec<DeviceEntry>>,
}

/// One frame template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrototypeEntry {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub transmit: Option<Vec<SegmentEntry>>,
    pub receive: Option<Vec<SegmentEntry>>,
}

/// One field of a template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SegmentEntry {
    pub name: Option<String>,
    pub bits: Option<u64>,
    pub desc: Option<String>,
}

/// One device.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceEntry {
    pub name: Option<String>,
    pub address: Option<u64>,
    pub message: Option<Vec<MessageEntry>>,
}

/// One message; every key besides `name` is kept verbatim.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageEntry {
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// ============================================================================
// Resolved schema
// ============================================================================

/// Validated schema contents, ready to build a [`crate::Protocol`].
#[derive(Debug, Clone)]
pub struct Schema {
    pub settings: ProtocolSettings,
    pub templates: Vec<Prototype>,
    pub devices: Vec<Device>,
}

/// Parse and validate a schema from a JSON string.
pub fn load_from_str(json: &str) -> FrameResult<Schema> {
    let document: ProtocolDocument = serde_json::from_str(json)?;
    document.into_schema()
}

/// Read, parse and validate a schema file.
pub fn load_from_path(path: impl AsRef<Path>) -> FrameResult<Schema> {
    let json = std::fs::read_to_string(path.as_ref())?;
    load_from_str(&json)
}

impl ProtocolDocument {
    /// Validate required keys and build the schema.
    pub fn into_schema(self) -> FrameResult<Schema> {
        let section = self
            .protocol
            .ok_or_else(|| missing(KEY_PROTOCOL, "object"))?;

        let settings = parse_settings(&section)?;

        let prototypes = section
            .prototype
            .ok_or_else(|| missing(KEY_PROTOTYPE, "array"))?;
        if prototypes.is_empty() {
            return Err(FrameError::config(
                KEY_PROTOTYPE,
                "at least one prototype is required",
            ));
        }
        let mut seen = HashSet::new();
        let mut templates = Vec::with_capacity(prototypes.len());
        for (i, entry) in prototypes.into_iter().enumerate() {
            let entity = format!("{}[{}]", KEY_PROTOTYPE, i);
            let template = parse_prototype(&entity, entry)?;
            if !seen.insert(template.name().to_string()) {
                return Err(FrameError::config(
                    format!("{}.name", entity),
                    format!("duplicate prototype '{}'", template.name()),
                ));
            }
            templates.push(template);
        }

        let devices = section.device.ok_or_else(|| missing(KEY_DEVICE, "array"))?;
        if devices.is_empty() {
            return Err(FrameError::config(
                KEY_DEVICE,
                "at least one device is required",
            ));
        }
        let devices = devices
            .into_iter()
            .enumerate()
            .map(|(i, entry)| parse_device(&format!("{}[{}]", KEY_DEVICE, i), entry))
            .collect::<FrameResult<Vec<_>>>()?;

        Ok(Schema {
            settings,
            templates,
            devices,
        })
    }
}

fn missing(entity: &str, what: &str) -> FrameError {
    FrameError::config(entity, format!("missing required {}", what))
}

fn parse_settings(section: &ProtocolSection) -> FrameResult<ProtocolSettings> {
    let prefix = ascii_literal("protocol.prefix", section.prefix.as_deref())?;
    let suffix = ascii_literal("protocol.suffix", section.suffix.as_deref())?;

    let mode = match section.transmission_mode.as_deref() {
        None => TranscodeMode::default(),
        Some(name) => TranscodeMode::from_str(name).ok_or_else(|| {
            FrameError::config(
                "protocol.transmission_mode",
                format!("unknown mode '{}', expected 'hex' or 'ascii'", name),
            )
        })?,
    };

    let algorithm = ChecksumAlgorithm::from_name(
        section
            .checksum_calculation
            .as_deref()
            .unwrap_or(DEFAULT_CHECKSUM),
    );

    Ok(ProtocolSettings::default()
        .with_prefix(prefix)
        .with_suffix(suffix)
        .with_timeout(section.timeout.unwrap_or(0))
        .with_source_address(section.source_address.unwrap_or(0))
        .with_mode(mode)
        .with_algorithm(algorithm))
}

/// Prefix and suffix become one byte per character, so only ASCII fits.
fn ascii_literal(entity: &str, literal: Option<&str>) -> FrameResult<String> {
    let literal = literal.unwrap_or_default();
    if !literal.is_ascii() {
        return Err(FrameError::config(entity, "literal must be ASCII"));
    }
    Ok(literal.to_string())
}

fn parse_prototype(entity: &str, entry: PrototypeEntry) -> FrameResult<Prototype> {
    let name = entry
        .name
        .ok_or_else(|| missing(&format!("{}.name", entity), "name"))?;
    let transmit = parse_segments(&format!("{}.{}", entity, KEY_TRANSMIT), entry.transmit)?;
    let receive = parse_segments(&format!("{}.{}", entity, KEY_RECEIVE), entry.receive)?;
    Ok(Prototype::new(name, transmit, receive).with_desc(entry.desc.unwrap_or_default()))
}

fn parse_segments(entity: &str, entries: Option<Vec<SegmentEntry>>) -> FrameResult<Vec<Segment>> {
    let entries = entries.ok_or_else(|| missing(entity, "segment list"))?;
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let entity = format!("{}[{}]", entity, i);
            let name = entry
                .name
                .ok_or_else(|| missing(&format!("{}.name", entity), "name"))?;
            let bits = entry
                .bits
                .ok_or_else(|| missing(&format!("{}.bits", entity), "bit width"))?;
            let bits = u32::try_from(bits)
                .ok()
                .filter(|&b| b >= 1)
                .ok_or_else(|| {
                    FrameError::config(
                        format!("{}.bits", entity),
                        format!("bit width {} out of range", bits),
                    )
                })?;
            Segment::new(name, bits)
                .map(|s| s.with_desc(entry.desc.unwrap_or_default()))
                .map_err(|e| match e {
                    FrameError::Config { message, .. } => FrameError::config(entity.clone(), message),
                    other => other,
                })
        })
        .collect()
}

fn parse_device(entity: &str, entry: DeviceEntry) -> FrameResult<Device> {
    let messages_entity = format!("{}.{}", entity, KEY_MESSAGE);
    let messages = entry
        .message
        .ok_or_else(|| missing(&messages_entity, "message list"))?
        .into_iter()
        .enumerate()
        .map(|(i, m)| parse_message(&format!("{}[{}]", messages_entity, i), m))
        .collect::<FrameResult<Vec<_>>>()?;

    Ok(Device::new(entry.name.unwrap_or_default(), entry.address.unwrap_or(0)).with_messages(messages))
}

fn parse_message(entity: &str, entry: MessageEntry) -> FrameResult<Message> {
    let name = entry
        .name
        .ok_or_else(|| missing(&format!("{}.name", entity), "name"))?;
    let mut message = Message::new(name);
    for (key, value) in entry.extra {
        let field = FieldValue::from_json(&value).ok_or_else(|| {
            FrameError::config(
                format!("{}.{}", entity, key),
                format!("unsupported value {}", value),
            )
        })?;
        check_sizing_field(entity, &key, &field)?;
        message = message.with_field(key, field);
    }
    Ok(message)
}

/// `length` must be a non-negative integer and `data_type` a name.
fn check_sizing_field(entity: &str, key: &str, field: &FieldValue) -> FrameResult<()> {
    let problem = match (key, field) {
        (ATTR_LENGTH, FieldValue::Unsigned(_)) => None,
        (ATTR_LENGTH, _) => Some("length must be a non-negative integer"),
        (ATTR_DATA_TYPE, FieldValue::Text(_)) => None,
        (ATTR_DATA_TYPE, _) => Some("data_type must be a string"),
        _ => None,
    };
    match problem {
        Some(message) => Err(FrameError::config(
            format!("{}.{}", entity, key),
            format!("{}, got {}", message, field),
        )),
        None => Ok(()),
    }
}
