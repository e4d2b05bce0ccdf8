use crate::devices::{self, DeviceSpec};
use crate::protocols::usb_osd::{TransferTiming, ValueRange};

/// Default brightness ramp step
pub const DEFAULT_TRANSITION_STEP: i32 = 3;

/// Immutable settings injected into the session and controller at construction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OsdConfig {
    /// USB vendor ID of the bridge to claim
    pub vendor_id: u16,
    /// USB product ID of the bridge to claim
    pub product_id: u16,
    /// Display name used in logs
    pub name: String,
    pub timing: TransferTiming,
    pub brightness: ValueRange,
    pub volume: ValueRange,
    /// Step used by brightness transitions when the caller gives none
    pub transition_step: i32,
}

impl OsdConfig {
    pub fn for_device(spec: &DeviceSpec) -> Self {
        Self {
            vendor_id: spec.vendor_id,
            product_id: spec.product_id,
            name: spec.name.to_string(),
            timing: TransferTiming::default(),
            brightness: spec.brightness,
            volume: spec.volume,
            transition_step: DEFAULT_TRANSITION_STEP,
        }
    }

    /// Target a different USB identity, keeping known device bounds if any
    pub fn with_identity(mut self, vendor_id: u16, product_id: u16) -> Self {
        if let Some(spec) = devices::get_device_spec(vendor_id, product_id) {
            let timing = self.timing;
            let step = self.transition_step;
            self = Self::for_device(&spec);
            self.timing = timing;
            self.transition_step = step;
        } else {
            warn!(
                "No device spec for {:04x}:{:04x}, keeping {} bounds",
                vendor_id, product_id, self.name
            );
            self.vendor_id = vendor_id;
            self.product_id = product_id;
        }
        self
    }

    pub fn with_timing(mut self, timing: TransferTiming) -> Self {
        self.timing = timing;
        self
    }
}

impl Default for OsdConfig {
    fn default() -> Self {
        Self::for_device(&devices::gigabyte::m27q::SPEC)
    }
}
