// SPDX-License-Identifier: GPL-3.0-only
//! Display control protocols
//!
//! The USB OSD protocol is the only transport implemented so far. The
//! [`DisplayProtocol`] trait is what higher level logic (brightness
//! transitions) is written against.

pub mod usb_osd;

use crate::error::Result;

/// Common trait for all display control protocols
pub trait DisplayProtocol {
    /// Get the unique identifier for this display
    fn id(&self) -> String;

    /// Get the current brightness as reported by the monitor
    fn get_brightness(&mut self) -> Result<u16>;

    /// Set the brightness. Out-of-range values are clamped, not rejected.
    fn set_brightness(&mut self, value: i32) -> Result<()>;
}
