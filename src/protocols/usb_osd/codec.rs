// SPDX-License-Identifier: GPL-3.0-only
//! OSD command framing
//!
//! Frames follow the DDC/CI layout: destination and source addresses, a
//! length byte with the high bit set, the opcode, then the payload.
//!
//! ```text
//! [0x6E, 0x51, 0x81 + len(payload), opcode, payload...]
//! ```

use crate::error::{OsdError, Result};

use super::transport::{ControlChannel, Transport};
use super::{READ_INDEX, READ_REQUEST, WRITE_REQUEST};

/// DDC/CI destination address (display)
const DEST_ADDRESS: u8 = 0x6E;

/// DDC/CI source address (host)
const SOURCE_ADDRESS: u8 = 0x51;

/// Length byte base; the low bits carry the payload length
const LENGTH_BASE: u8 = 0x81;

/// Largest payload the length byte can describe
const MAX_PAYLOAD_LEN: usize = (u8::MAX - LENGTH_BASE) as usize;

/// Bytes read back for a "get"
pub const REPLY_LEN: usize = 12;

/// Position of the feature value inside a reply
pub const REPLY_VALUE_INDEX: usize = 10;

/// OSD opcode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Get = 0x01,
    Set = 0x03,
}

/// VCP features reachable through the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcpFeature {
    Brightness,
    Volume,
    /// Which upstream host the built-in KVM switch routes to
    KvmInput,
}

impl VcpFeature {
    /// Code bytes identifying the feature
    pub const fn code(self) -> &'static [u8] {
        match self {
            VcpFeature::Brightness => &[0x10],
            VcpFeature::Volume => &[0x62],
            VcpFeature::KvmInput => &[0xE0, 0x69],
        }
    }

    /// Number of value bytes following the code in a "set" payload
    pub const fn value_width(self) -> usize {
        match self {
            VcpFeature::Brightness | VcpFeature::Volume => 2,
            VcpFeature::KvmInput => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            VcpFeature::Brightness => "brightness",
            VcpFeature::Volume => "volume",
            VcpFeature::KvmInput => "KVM input",
        }
    }

    /// Build the "set" payload: code bytes then the value, high byte first
    pub fn set_payload(self, value: u16) -> Result<Vec<u8>> {
        let width = self.value_width();
        let value_bytes = value.to_be_bytes();
        let (high, low) = value_bytes.split_at(value_bytes.len().saturating_sub(width));
        if high.iter().any(|b| *b != 0) {
            return Err(OsdError::ValueOutOfRange {
                feature: self.name(),
                value,
                width,
            });
        }

        let mut payload = self.code().to_vec();
        payload.extend_from_slice(low);
        Ok(payload)
    }
}

fn encode(opcode: Opcode, payload: &[u8]) -> Result<Vec<u8>> {
    let len = u8::try_from(payload.len())
        .ok()
        .filter(|len| usize::from(*len) <= MAX_PAYLOAD_LEN)
        .ok_or(OsdError::PayloadTooLong {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        })?;

    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.push(DEST_ADDRESS);
    frame.push(SOURCE_ADDRESS);
    frame.push(LENGTH_BASE + len);
    frame.push(opcode as u8);
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Frame a "get" for the given feature code
pub fn encode_get(feature: &[u8]) -> Result<Vec<u8>> {
    encode(Opcode::Get, feature)
}

/// Frame a "set" for the given payload (feature code followed by value bytes)
pub fn encode_set(payload: &[u8]) -> Result<Vec<u8>> {
    encode(Opcode::Set, payload)
}

/// Extract the feature value from a "get" reply
pub fn decode_get_reply(reply: &[u8]) -> Result<u8> {
    reply
        .get(REPLY_VALUE_INDEX)
        .copied()
        .ok_or(OsdError::MalformedReply {
            len: reply.len(),
            needed: REPLY_VALUE_INDEX + 1,
        })
}

/// Get/set VCP features over a [`Transport`]
#[derive(Debug, Clone, Copy, Default)]
pub struct OsdCodec {
    transport: Transport,
}

impl OsdCodec {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Read a feature value: one write, one read, two settling delays
    pub fn get<C: ControlChannel + ?Sized>(&self, dev: &mut C, feature: &[u8]) -> Result<u8> {
        let frame = encode_get(feature)?;
        self.transport.write(dev, WRITE_REQUEST, 0, 0, &frame)?;
        let reply = self
            .transport
            .read(dev, READ_REQUEST, 0, READ_INDEX, REPLY_LEN)?;
        decode_get_reply(&reply)
    }

    /// Write a feature value. The bridge sends no reply for "set".
    pub fn set<C: ControlChannel + ?Sized>(
        &self,
        dev: &mut C,
        feature: &[u8],
        value: &[u8],
    ) -> Result<()> {
        let mut payload = Vec::with_capacity(feature.len() + value.len());
        payload.extend_from_slice(feature);
        payload.extend_from_slice(value);

        let frame = encode_set(&payload)?;
        self.transport.write(dev, WRITE_REQUEST, 0, 0, &frame)?;
        Ok(())
    }

    pub fn get_feature<C: ControlChannel + ?Sized>(
        &self,
        dev: &mut C,
        feature: VcpFeature,
    ) -> Result<u8> {
        let value = self.get(dev, feature.code())?;
        debug!("Read {} = {}", feature.name(), value);
        Ok(value)
    }

    pub fn set_feature<C: ControlChannel + ?Sized>(
        &self,
        dev: &mut C,
        feature: VcpFeature,
        value: u16,
    ) -> Result<()> {
        let payload = feature.set_payload(value)?;
        let code_len = feature.code().len();
        self.set(dev, &payload[..code_len], &payload[code_len..])?;
        debug!("Set {} to {}", feature.name(), value);
        Ok(())
    }
}
