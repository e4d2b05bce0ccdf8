// SPDX-License-Identifier: GPL-3.0-only
//! Vendor control transfers with a fixed settling delay

use std::thread;
use std::time::Duration;

use rusb::{DeviceHandle, UsbContext};

use crate::error::TransportError;

/// bmRequestType for host-to-device, vendor, device recipient
pub const REQUEST_TYPE_OUT: u8 = 0x40;

/// bmRequestType for device-to-host, vendor, device recipient
pub const REQUEST_TYPE_IN: u8 = 0xC0;

/// Pause after every bus operation so the bridge firmware can process it
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Timeout handed to libusb for a single control transfer
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_millis(1000);

/// Anything that can carry a USB control transfer
///
/// Implemented for `rusb::DeviceHandle`; tests plug in an in-memory bridge.
pub trait ControlChannel {
    /// Issue an OUT control transfer, returning the number of bytes sent
    fn control_out(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> rusb::Result<usize>;

    /// Issue an IN control transfer, returning the number of bytes received
    fn control_in(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        timeout: Duration,
    ) -> rusb::Result<usize>;
}

impl<T: UsbContext> ControlChannel for DeviceHandle<T> {
    fn control_out(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> rusb::Result<usize> {
        self.write_control(request_type, request, value, index, data, timeout)
    }

    fn control_in(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        timeout: Duration,
    ) -> rusb::Result<usize> {
        self.read_control(request_type, request, value, index, buf, timeout)
    }
}

/// Timing parameters for bus operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferTiming {
    /// Fixed quiescence period after every transfer. Not a timeout.
    pub settle_delay: Duration,
    /// libusb timeout for one transfer
    pub timeout: Duration,
}

impl Default for TransferTiming {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            timeout: DEFAULT_TRANSFER_TIMEOUT,
        }
    }
}

/// Performs single vendor control transfers against a device handle
///
/// Each call is real bus I/O followed by the settling delay. Faults are
/// returned as-is and never retried here.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transport {
    timing: TransferTiming,
}

impl Transport {
    pub fn new(timing: TransferTiming) -> Self {
        Self { timing }
    }

    pub fn timing(&self) -> TransferTiming {
        self.timing
    }

    /// Write `payload` to the device, failing unless every byte went out
    pub fn write<C: ControlChannel + ?Sized>(
        &self,
        dev: &mut C,
        request: u8,
        value: u16,
        index: u16,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        let result = dev.control_out(
            REQUEST_TYPE_OUT,
            request,
            value,
            index,
            payload,
            self.timing.timeout,
        );
        // The firmware needs the pause whether or not the transfer landed
        self.settle();

        let written = result.map_err(|source| TransportError::Usb {
            operation: "control write",
            source,
        })?;

        if written != payload.len() {
            return Err(TransportError::LengthMismatch {
                expected: payload.len(),
                actual: written,
            });
        }

        tracing::trace!(request, value, index, ?payload, "OSD write");
        Ok(())
    }

    /// Read up to `length` bytes from the device
    ///
    /// A short completion is returned as a shorter buffer; judging whether
    /// that is enough is up to the caller.
    pub fn read<C: ControlChannel + ?Sized>(
        &self,
        dev: &mut C,
        request: u8,
        value: u16,
        index: u16,
        length: usize,
    ) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; length];
        let result = dev.control_in(
            REQUEST_TYPE_IN,
            request,
            value,
            index,
            &mut buf,
            self.timing.timeout,
        );
        self.settle();

        let read = result.map_err(|source| TransportError::Usb {
            operation: "control read",
            source,
        })?;
        buf.truncate(read);

        if read < length {
            tracing::debug!(request, index, expected = length, read, "Short OSD read");
        }
        tracing::trace!(request, value, index, reply = ?buf, "OSD read");

        Ok(buf)
    }

    fn settle(&self) {
        if !self.timing.settle_delay.is_zero() {
            thread::sleep(self.timing.settle_delay);
        }
    }
}
