// SPDX-License-Identifier: GPL-3.0-only
//! Gigabyte M27Q specifications

use crate::devices::DeviceSpec;
use crate::protocols::usb_osd::ValueRange;

/// USB Product ID of the M27Q's billboard bridge
pub const PRODUCT_ID: u16 = 0x8883;

/// Device specification for the Gigabyte M27Q
///
/// Technical specs:
/// - 27-inch 1440p IPS panel with built-in KVM switch
/// - OSD brightness and volume both run 0-100
/// - KVM input select is a binary selector (0 or 1)
pub const SPEC: DeviceSpec = DeviceSpec {
    vendor_id: super::VENDOR_ID,
    product_id: PRODUCT_ID,
    name: "Gigabyte M27Q",
    brightness: ValueRange::new(0, 100),
    volume: ValueRange::new(0, 100),
};
