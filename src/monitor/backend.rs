use crate::brightness::{BrightnessTransition, TransitionReport};
use crate::config::OsdConfig;
use crate::error::Result;
use crate::protocols::DisplayProtocol;
use crate::protocols::usb_osd::{ControlChannel, OsdCodec, Transport, ValueRange, VcpFeature};

use super::session::{ClaimedDevice, UsbHandle};

/// Id reported for transitions run on a bare handle
const ANONYMOUS_DISPLAY_ID: &str = "usb-osd";

/// Typed OSD operations for one kind of monitor
///
/// Holds no device state; every operation takes the handle it talks to.
/// Read-modify-write helpers such as [`MonitorControl::toggle_kvm`] are not
/// atomic, so a handle must only ever have one caller.
#[derive(Debug, Clone)]
pub struct MonitorControl {
    codec: OsdCodec,
    brightness: ValueRange,
    volume: ValueRange,
    transition_step: i32,
}

impl MonitorControl {
    pub fn new(config: &OsdConfig) -> Self {
        Self {
            codec: OsdCodec::new(Transport::new(config.timing)),
            brightness: config.brightness,
            volume: config.volume,
            transition_step: config.transition_step,
        }
    }

    pub fn brightness_range(&self) -> ValueRange {
        self.brightness
    }

    pub fn volume_range(&self) -> ValueRange {
        self.volume
    }

    pub fn get_brightness<C: ControlChannel + ?Sized>(&self, dev: &mut C) -> Result<u16> {
        self.codec
            .get_feature(dev, VcpFeature::Brightness)
            .map(u16::from)
    }

    /// Set brightness, clamping into the monitor's range first
    pub fn set_brightness<C: ControlChannel + ?Sized>(&self, dev: &mut C, value: i32) -> Result<()> {
        let clamped = self.brightness.clamp(value);
        if i32::from(clamped) != value {
            debug!("Clamping brightness {} to {}", value, clamped);
        }
        self.codec.set_feature(dev, VcpFeature::Brightness, clamped)
    }

    pub fn get_volume<C: ControlChannel + ?Sized>(&self, dev: &mut C) -> Result<u16> {
        self.codec.get_feature(dev, VcpFeature::Volume).map(u16::from)
    }

    /// Set volume, clamping into the monitor's range first
    pub fn set_volume<C: ControlChannel + ?Sized>(&self, dev: &mut C, value: i32) -> Result<()> {
        let clamped = self.volume.clamp(value);
        if i32::from(clamped) != value {
            debug!("Clamping volume {} to {}", value, clamped);
        }
        self.codec.set_feature(dev, VcpFeature::Volume, clamped)
    }

    /// Which KVM upstream input is active (0 or 1)
    pub fn get_kvm_status<C: ControlChannel + ?Sized>(&self, dev: &mut C) -> Result<u8> {
        self.codec.get_feature(dev, VcpFeature::KvmInput)
    }

    pub fn set_kvm_status<C: ControlChannel + ?Sized>(&self, dev: &mut C, status: u8) -> Result<()> {
        self.codec
            .set_feature(dev, VcpFeature::KvmInput, u16::from(status))
    }

    /// Switch the KVM to the other input and return the new status
    pub fn toggle_kvm<C: ControlChannel + ?Sized>(&self, dev: &mut C) -> Result<u8> {
        let current = self.get_kvm_status(dev)?;
        // Anything other than input 0 is treated as input 1
        let next = u8::from(current == 0);
        self.set_kvm_status(dev, next)?;
        info!("KVM input switched from {} to {}", current, next);
        Ok(next)
    }

    /// Fade brightness to `target` using the configured default step
    pub fn transition_brightness<C: ControlChannel + ?Sized>(
        &self,
        dev: &mut C,
        target: i32,
    ) -> Result<TransitionReport> {
        self.transition_brightness_with_step(dev, target, self.transition_step)
    }

    /// Fade brightness to `target` in increments of `step`
    pub fn transition_brightness_with_step<C: ControlChannel + ?Sized>(
        &self,
        dev: &mut C,
        target: i32,
        step: i32,
    ) -> Result<TransitionReport> {
        self.run_transition(dev, ANONYMOUS_DISPLAY_ID, target, step)
    }

    /// Fade brightness on a claimed device, logging under its bus location
    ///
    /// Uses the configured default step when `step` is `None`.
    pub fn transition_device<H: UsbHandle>(
        &self,
        device: &mut ClaimedDevice<H>,
        target: i32,
        step: Option<i32>,
    ) -> Result<TransitionReport> {
        let id = device.id();
        let step = step.unwrap_or(self.transition_step);
        self.run_transition(device.handle_mut(), &id, target, step)
    }

    fn run_transition<C: ControlChannel + ?Sized>(
        &self,
        dev: &mut C,
        id: &str,
        target: i32,
        step: i32,
    ) -> Result<TransitionReport> {
        let transition = BrightnessTransition::new(self.brightness.clamp(target), step)?;
        let mut display = OsdDisplay::new(self, dev, id);
        transition.run(&mut display)
    }
}

/// A [`MonitorControl`] bound to one device handle
pub struct OsdDisplay<'a, C: ControlChannel + ?Sized> {
    control: &'a MonitorControl,
    dev: &'a mut C,
    id: String,
}

impl<'a, C: ControlChannel + ?Sized> OsdDisplay<'a, C> {
    pub fn new(control: &'a MonitorControl, dev: &'a mut C, id: impl Into<String>) -> Self {
        Self {
            control,
            dev,
            id: id.into(),
        }
    }
}

impl<C: ControlChannel + ?Sized> std::fmt::Debug for OsdDisplay<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OsdDisplay(id: {})", self.id)
    }
}

impl<C: ControlChannel + ?Sized> DisplayProtocol for OsdDisplay<'_, C> {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn get_brightness(&mut self) -> Result<u16> {
        self.control.get_brightness(&mut *self.dev)
    }

    fn set_brightness(&mut self, value: i32) -> Result<()> {
        self.control.set_brightness(&mut *self.dev, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OsdError;
    use crate::protocols::usb_osd::TransferTiming;
    use crate::protocols::usb_osd::testing::FakeBridge;
    use std::time::Duration;

    fn control() -> MonitorControl {
        let config = OsdConfig::default().with_timing(TransferTiming {
            settle_delay: Duration::ZERO,
            ..TransferTiming::default()
        });
        MonitorControl::new(&config)
    }

    #[test]
    fn test_brightness_get_set() {
        let mut bridge = FakeBridge::new().with_register(&[0x10], 42);
        let control = control();

        assert_eq!(control.get_brightness(&mut bridge).unwrap(), 42);
        control.set_brightness(&mut bridge, 70).unwrap();
        assert_eq!(control.get_brightness(&mut bridge).unwrap(), 70);
        assert_eq!(bridge.set_payloads(), vec![vec![0x10, 0x00, 70]]);
    }

    #[test]
    fn test_brightness_is_clamped() {
        let mut bridge = FakeBridge::new();
        let control = control();

        control.set_brightness(&mut bridge, -5).unwrap();
        control.set_brightness(&mut bridge, 10_000).unwrap();
        assert_eq!(
            bridge.set_payloads(),
            vec![vec![0x10, 0x00, 0], vec![0x10, 0x00, 100]]
        );
    }

    #[test]
    fn test_volume_get_set() {
        let mut bridge = FakeBridge::new().with_register(&[0x62], 15);
        let control = control();

        assert_eq!(control.get_volume(&mut bridge).unwrap(), 15);
        control.set_volume(&mut bridge, 250).unwrap();
        assert_eq!(bridge.set_payloads(), vec![vec![0x62, 0x00, 100]]);
    }

    #[test]
    fn test_kvm_status() {
        let mut bridge = FakeBridge::new().with_register(&[224, 105], 1);
        let control = control();

        assert_eq!(control.get_kvm_status(&mut bridge).unwrap(), 1);
        control.set_kvm_status(&mut bridge, 0).unwrap();
        assert_eq!(bridge.set_payloads(), vec![vec![224, 105, 0]]);
    }

    #[test]
    fn test_toggle_kvm_from_zero() {
        let mut bridge = FakeBridge::new().with_register(&[224, 105], 0);

        assert_eq!(control().toggle_kvm(&mut bridge).unwrap(), 1);
        assert_eq!(bridge.set_payloads(), vec![vec![224, 105, 1]]);
    }

    #[test]
    fn test_toggle_kvm_from_one() {
        let mut bridge = FakeBridge::new().with_register(&[224, 105], 1);

        assert_eq!(control().toggle_kvm(&mut bridge).unwrap(), 0);
        assert_eq!(bridge.set_payloads(), vec![vec![224, 105, 0]]);
    }

    #[test]
    fn test_toggle_kvm_read_failure_writes_nothing() {
        let mut bridge = FakeBridge::new();
        bridge.fail_next_in = Some(rusb::Error::Timeout);

        assert!(matches!(
            control().toggle_kvm(&mut bridge),
            Err(OsdError::Transport(_))
        ));
        assert!(bridge.set_payloads().is_empty());
    }

    #[test]
    fn test_transition_on_the_wire() {
        let mut bridge = FakeBridge::new().with_register(&[0x10], 50);

        let report = control().transition_brightness(&mut bridge, 65).unwrap();
        assert_eq!(report.display, "usb-osd");
        assert_eq!(report.start, 50);
        assert_eq!(report.writes, 5);

        let values: Vec<u8> = bridge.set_payloads().iter().map(|p| p[2]).collect();
        assert_eq!(values, vec![53, 56, 59, 62, 65]);
        // One get (write + read) up front, then one write per step
        assert_eq!(bridge.transfers.len(), 2 + 5);
    }

    #[test]
    fn test_transition_target_is_clamped() {
        let mut bridge = FakeBridge::new().with_register(&[0x10], 95);

        let report = control()
            .transition_brightness_with_step(&mut bridge, 400, 3)
            .unwrap();
        assert_eq!(report.target, 100);

        let values: Vec<u8> = bridge.set_payloads().iter().map(|p| p[2]).collect();
        assert_eq!(values, vec![98, 100]);
    }

    #[test]
    fn test_transition_invalid_step_touches_nothing() {
        let mut bridge = FakeBridge::new();

        assert!(matches!(
            control().transition_brightness_with_step(&mut bridge, 10, 0),
            Err(OsdError::InvalidStep(0))
        ));
        assert!(bridge.transfers.is_empty());
    }
}
