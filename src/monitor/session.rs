// SPDX-License-Identifier: GPL-3.0-only
//! Scoped ownership of claimed OSD bridges
//!
//! Claiming a bridge may require detaching the kernel driver (usually
//! `usbhid` or the billboard class driver) from interface 0. A
//! [`DeviceSession`] remembers which handles it detached and reattaches
//! them when it is closed or dropped, on error paths too, so a monitor is
//! never left without its driver.
//!
//! # Usage
//!
//! ```no_run
//! use usb_osd_control::config::OsdConfig;
//! use usb_osd_control::monitor::{MonitorControl, with_session};
//!
//! # fn example() -> usb_osd_control::error::Result<()> {
//! let config = OsdConfig::default();
//! let control = MonitorControl::new(&config);
//!
//! with_session(&config, |session| {
//!     for device in session.devices_mut() {
//!         control.set_kvm_status(device.handle_mut(), 1)?;
//!     }
//!     Ok(())
//! })
//! # }
//! ```

use rusb::{Context, DeviceHandle, UsbContext};

use crate::config::OsdConfig;
use crate::error::{OsdError, Result};
use crate::protocols::usb_osd::{CONFIGURATION, ControlChannel, INTERFACE_NUMBER};

use super::enumeration::{self, DeviceAddress};

/// Driver and configuration control on top of control transfers
pub trait UsbHandle: ControlChannel {
    fn driver_active(&mut self, iface: u8) -> rusb::Result<bool>;

    fn detach_driver(&mut self, iface: u8) -> rusb::Result<()>;

    fn reattach_driver(&mut self, iface: u8) -> rusb::Result<()>;

    fn activate_configuration(&mut self, config: u8) -> rusb::Result<()>;
}

impl<T: UsbContext> UsbHandle for DeviceHandle<T> {
    fn driver_active(&mut self, iface: u8) -> rusb::Result<bool> {
        self.kernel_driver_active(iface)
    }

    fn detach_driver(&mut self, iface: u8) -> rusb::Result<()> {
        self.detach_kernel_driver(iface)
    }

    fn reattach_driver(&mut self, iface: u8) -> rusb::Result<()> {
        self.attach_kernel_driver(iface)
    }

    fn activate_configuration(&mut self, config: u8) -> rusb::Result<()> {
        self.set_active_configuration(config)
    }
}

/// One bridge owned by a session
#[derive(Debug)]
pub struct ClaimedDevice<H> {
    handle: H,
    location: DeviceAddress,
    detached_driver: bool,
}

impl<H: UsbHandle> ClaimedDevice<H> {
    fn new(handle: H, location: DeviceAddress) -> Self {
        Self {
            handle,
            location,
            detached_driver: false,
        }
    }

    /// Stable-for-this-boot identifier, e.g. `usb-osd-001:012`
    pub fn id(&self) -> String {
        format!("usb-osd-{}", self.location)
    }

    pub fn location(&self) -> DeviceAddress {
        self.location
    }

    /// Whether a kernel driver had to be detached to claim this device
    pub fn detached_driver(&self) -> bool {
        self.detached_driver
    }

    pub fn handle_mut(&mut self) -> &mut H {
        &mut self.handle
    }

    fn prepare(&mut self, can_detach: bool) -> Result<()> {
        if can_detach {
            let active = match self.handle.driver_active(INTERFACE_NUMBER) {
                Ok(active) => active,
                Err(rusb::Error::NotSupported) => false,
                Err(source) => return Err(self.claim_error("query kernel driver", source)),
            };

            if active {
                self.handle
                    .detach_driver(INTERFACE_NUMBER)
                    .map_err(|source| self.claim_error("detach kernel driver", source))?;
                self.detached_driver = true;
                debug!("Detached kernel driver from {}", self.location);
            }
        }

        self.handle
            .activate_configuration(CONFIGURATION)
            .map_err(|source| self.claim_error("set configuration", source))
    }

    /// Reattach the driver if this session detached it. Runs at most once.
    fn release(&mut self) -> Result<()> {
        if !self.detached_driver {
            return Ok(());
        }
        self.detached_driver = false;

        self.handle
            .reattach_driver(INTERFACE_NUMBER)
            .map_err(|source| OsdError::Teardown {
                bus: self.location.bus,
                address: self.location.address,
                source,
            })?;
        debug!("Reattached kernel driver to {}", self.location);
        Ok(())
    }

    fn claim_error(&self, action: &'static str, source: rusb::Error) -> OsdError {
        OsdError::Claim {
            action,
            bus: self.location.bus,
            address: self.location.address,
            source,
        }
    }
}

/// Exclusive owner of every claimed bridge for its lifetime
#[derive(Debug)]
pub struct DeviceSession<H: UsbHandle> {
    devices: Vec<ClaimedDevice<H>>,
}

impl DeviceSession<DeviceHandle<Context>> {
    /// Find, open and claim every bridge matching the configured identity
    pub fn open(config: &OsdConfig) -> Result<Self> {
        let context = Context::new().map_err(OsdError::Enumeration)?;
        let found = enumeration::find_devices(&context, config.vendor_id, config.product_id)?;
        Self::claim(
            found,
            config.vendor_id,
            config.product_id,
            rusb::supports_detach_kernel_driver(),
        )
    }
}

impl<H: UsbHandle> DeviceSession<H> {
    /// Claim already opened handles
    ///
    /// If claiming fails partway, the devices prepared so far are released
    /// before the error is returned.
    pub fn claim(
        found: Vec<(H, DeviceAddress)>,
        vendor_id: u16,
        product_id: u16,
        can_detach: bool,
    ) -> Result<Self> {
        if found.is_empty() {
            return Err(OsdError::NoDeviceFound {
                vendor_id,
                product_id,
            });
        }

        let mut session = Self {
            devices: Vec::with_capacity(found.len()),
        };

        for (handle, location) in found {
            let mut device = ClaimedDevice::new(handle, location);
            let prepared = device.prepare(can_detach);
            // Track it before bailing out so a detached driver still gets reattached
            session.devices.push(device);
            prepared?;
        }

        info!("Claimed {} OSD bridge(s)", session.devices.len());
        Ok(session)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn devices(&self) -> impl Iterator<Item = &ClaimedDevice<H>> {
        self.devices.iter()
    }

    pub fn devices_mut(&mut self) -> impl Iterator<Item = &mut ClaimedDevice<H>> {
        self.devices.iter_mut()
    }

    /// Run `f` against the session, then close it
    ///
    /// An error from `f` takes precedence over a teardown error, which is
    /// then only logged.
    pub fn run<T, F>(mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let result = f(&mut self);
        let teardown = self.close();

        match (result, teardown) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(teardown)) => Err(teardown),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(teardown)) => {
                warn!("Session teardown failed after error: {}", teardown);
                Err(err)
            }
        }
    }

    /// Reattach detached drivers, reporting the first failure
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        let mut first_error = None;
        for device in &mut self.devices {
            if let Err(e) = device.release() {
                error!("{}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl<H: UsbHandle> Drop for DeviceSession<H> {
    fn drop(&mut self) {
        // Errors were already logged by release
        let _ = self.release();
    }
}

/// Open a session for `config`, run `f`, and always tear the session down
pub fn with_session<T, F>(config: &OsdConfig, f: F) -> Result<T>
where
    F: FnOnce(&mut DeviceSession<DeviceHandle<Context>>) -> Result<T>,
{
    DeviceSession::open(config)?.run(f)
}
