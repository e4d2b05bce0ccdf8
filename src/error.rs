// SPDX-License-Identifier: GPL-3.0-only
//! Error types for the OSD control library
//!
//! Every failure surfaces to the caller of the operation that detected it.
//! Nothing in the stack retries on its own.

use thiserror::Error;

/// Failures of a single control transfer
#[derive(Error, Debug)]
pub enum TransportError {
    /// libusb reported a fault (unplugged, stall, permission denied, ...)
    #[error("USB {operation} failed: {source}")]
    Usb {
        operation: &'static str,
        #[source]
        source: rusb::Error,
    },

    /// The device accepted fewer bytes than the frame carried
    #[error("Transferred message length mismatch: sent {actual} of {expected} bytes")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Main library error type
#[derive(Error, Debug)]
pub enum OsdError {
    /// No USB device matched the configured identity
    #[error("Device VID_{vendor_id:04x}&PID_{product_id:04x} not found")]
    NoDeviceFound { vendor_id: u16, product_id: u16 },

    /// Bus level failure while talking to the bridge
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Reply too short to carry the feature value
    #[error("Malformed OSD reply: got {len} bytes, need at least {needed}")]
    MalformedReply { len: usize, needed: usize },

    /// Frame payload longer than the length byte can describe
    #[error("OSD payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLong { len: usize, max: usize },

    /// Brightness ramp step must be positive
    #[error("Invalid transition step {0}: must be greater than zero")]
    InvalidStep(i32),

    /// Value does not fit the feature's value field
    #[error("Value {value} does not fit in {width} byte(s) for {feature}")]
    ValueOutOfRange {
        feature: &'static str,
        value: u16,
        width: usize,
    },

    /// Reattaching the kernel driver failed during session teardown
    #[error("Failed to reattach kernel driver on bus {bus} address {address}: {source}")]
    Teardown {
        bus: u8,
        address: u8,
        #[source]
        source: rusb::Error,
    },

    /// Device setup failed while opening the session
    #[error("Failed to {action} on bus {bus} address {address}: {source}")]
    Claim {
        action: &'static str,
        bus: u8,
        address: u8,
        #[source]
        source: rusb::Error,
    },

    /// Enumeration of the USB bus failed
    #[error("USB enumeration failed: {0}")]
    Enumeration(#[source] rusb::Error),
}

/// Result type alias for OsdError
pub type Result<T> = std::result::Result<T, OsdError>;
