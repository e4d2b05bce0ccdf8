use rusb::{DeviceHandle, UsbContext};

use crate::error::{OsdError, Result};

/// Where a device sits on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress {
    pub bus: u8,
    pub address: u8,
}

impl std::fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}:{:03}", self.bus, self.address)
    }
}

/// Open every device matching `vendor_id:product_id`
///
/// Devices that match but cannot be opened are skipped with a warning. If
/// none could be opened the last open error is returned, so a permissions
/// problem is not mistaken for an unplugged monitor.
pub fn find_devices<T: UsbContext>(
    context: &T,
    vendor_id: u16,
    product_id: u16,
) -> Result<Vec<(DeviceHandle<T>, DeviceAddress)>> {
    let devices = context.devices().map_err(OsdError::Enumeration)?;
    let mut found = Vec::new();
    let mut last_error = None;

    for device in devices.iter() {
        let desc = match device.device_descriptor() {
            Ok(desc) => desc,
            Err(e) => {
                trace!("Skipping device without descriptor: {}", e);
                continue;
            }
        };

        if desc.vendor_id() != vendor_id || desc.product_id() != product_id {
            continue;
        }

        let location = DeviceAddress {
            bus: device.bus_number(),
            address: device.address(),
        };

        debug!(
            "Found OSD bridge: vendor={:#06x} product={:#06x} at {}",
            vendor_id, product_id, location
        );

        match device.open() {
            Ok(handle) => {
                info!("Opened {:04x}:{:04x} at {}", vendor_id, product_id, location);
                found.push((handle, location));
            }
            Err(e) => {
                warn!(
                    "Failed to open {:04x}:{:04x} at {}: {}. \
                     This may be a permissions issue. On Linux, ensure udev rules are configured.",
                    vendor_id, product_id, location, e
                );
                last_error = Some(OsdError::Claim {
                    action: "open device",
                    bus: location.bus,
                    address: location.address,
                    source: e,
                });
            }
        }
    }

    if found.is_empty() {
        if let Some(err) = last_error {
            return Err(err);
        }
        debug!("No {:04x}:{:04x} devices found", vendor_id, product_id);
    }

    Ok(found)
}
