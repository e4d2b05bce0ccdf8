// SPDX-License-Identifier: GPL-3.0-only
//! USB OSD control protocol
//!
//! Some KVM monitors (Gigabyte M27Q and relatives) put their on-screen
//! display registers behind a VIA Labs USB billboard device. The bridge
//! accepts DDC/CI style "get/set VCP feature" frames wrapped in vendor
//! control transfers, so brightness, volume and the KVM input can be driven
//! without touching the I2C bus.
//!
//! Based on the M27Q KVM gist:
//! https://gist.github.com/wadimw/4ac972d07ed1f3b6f22a101375ecac41

pub mod codec;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use codec::{OsdCodec, Opcode, VcpFeature, decode_get_reply, encode_get, encode_set};
pub use transport::{ControlChannel, TransferTiming, Transport};

/// bRequest used for every OSD frame written to the bridge
pub const WRITE_REQUEST: u8 = 178;

/// bRequest used to read an OSD reply back
pub const READ_REQUEST: u8 = 162;

/// wIndex used to read an OSD reply back
pub const READ_INDEX: u16 = 111;

/// Interface whose kernel driver must be detached before talking to the bridge
pub const INTERFACE_NUMBER: u8 = 0;

/// USB configuration the bridge is switched to after claiming
pub const CONFIGURATION: u8 = 1;

/// Inclusive bounds of an OSD value (brightness, volume)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange {
    pub min: u16,
    pub max: u16,
}

impl ValueRange {
    pub const fn new(min: u16, max: u16) -> Self {
        assert!(min <= max, "ValueRange min must not exceed max");
        Self { min, max }
    }

    /// Clamp an arbitrary request into the range. Out-of-range input is
    /// never rejected.
    pub fn clamp(&self, value: i32) -> u16 {
        if value <= i32::from(self.min) {
            self.min
        } else if value >= i32::from(self.max) {
            self.max
        } else {
            value as u16
        }
    }

    pub fn contains(&self, value: u16) -> bool {
        (self.min..=self.max).contains(&value)
    }
}
