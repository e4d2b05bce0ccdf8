// SPDX-License-Identifier: GPL-3.0-only
//! Device-specific configurations organized by manufacturer

pub mod gigabyte;

use crate::protocols::usb_osd::ValueRange;

/// Device specification for a display reachable through the USB OSD bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSpec {
    /// USB Vendor ID of the bridge chip (not the monitor vendor)
    pub vendor_id: u16,

    /// USB Product ID of the bridge chip
    pub product_id: u16,

    /// Human-readable device name
    pub name: &'static str,

    /// Brightness values accepted by the OSD
    pub brightness: ValueRange,

    /// Volume values accepted by the OSD
    pub volume: ValueRange,
}

/// Get device specification by vendor and product ID
pub fn get_device_spec(vendor_id: u16, product_id: u16) -> Option<DeviceSpec> {
    match (vendor_id, product_id) {
        (gigabyte::VENDOR_ID, gigabyte::m27q::PRODUCT_ID) => Some(gigabyte::m27q::SPEC),
        _ => None,
    }
}

/// Get all supported (vendor, product) pairs
pub fn supported_ids() -> Vec<(u16, u16)> {
    vec![(gigabyte::VENDOR_ID, gigabyte::m27q::PRODUCT_ID)]
}
