// SPDX-License-Identifier: GPL-3.0-only
//! Gigabyte display device specifications
//!
//! Gigabyte KVM monitors expose their OSD through a VIA Labs USB billboard
//! device, so the USB identity is the bridge's and not Gigabyte's.

pub mod m27q;

/// VIA Labs, Inc. USB Vendor ID
pub const VENDOR_ID: u16 = 0x2109;
