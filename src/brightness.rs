// SPDX-License-Identifier: GPL-3.0-only
//! Smooth brightness transitions
//!
//! The monitor applies every brightness write as a visible jump, so fading
//! is done by walking the value through intermediate steps. Every step is
//! one "set" round trip on the bus.

use crate::error::{OsdError, Result};
use crate::protocols::DisplayProtocol;

/// Outcome of a completed transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionReport {
    /// Id of the display that was faded
    pub display: String,
    /// Brightness read before the first step
    pub start: u16,
    pub target: u16,
    /// Number of brightness writes issued
    pub writes: usize,
}

/// A stepped ramp towards a target brightness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrightnessTransition {
    target: u16,
    step: i32,
}

impl BrightnessTransition {
    /// Create a transition towards `target` moving `step` units per write
    ///
    /// The direction is derived from the current reading, so `step` must be
    /// positive; zero or negative steps would never terminate.
    pub fn new(target: u16, step: i32) -> Result<Self> {
        if step <= 0 {
            return Err(OsdError::InvalidStep(step));
        }
        Ok(Self { target, step })
    }

    pub fn target(&self) -> u16 {
        self.target
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    /// Values written, in order, when starting from `start`
    ///
    /// Full steps are taken while at least one whole step of distance
    /// remains, then a single correction lands on the target if needed.
    pub fn plan(&self, start: u16) -> Vec<u16> {
        let target = i32::from(self.target);
        let mut current = i32::from(start);
        let mut diff = (target - current).abs();
        let signed_step = if current <= target { self.step } else { -self.step };

        let mut values = Vec::new();
        while diff >= self.step {
            current += signed_step;
            values.push(current as u16);
            diff -= self.step;
        }
        if current != target {
            values.push(self.target);
        }
        values
    }

    /// Read the current brightness and walk it to the target
    pub fn run<D: DisplayProtocol + ?Sized>(&self, panel: &mut D) -> Result<TransitionReport> {
        let id = panel.id();
        let start = panel.get_brightness()?;
        let plan = self.plan(start);

        debug!(
            "Transition on {} from {} to {} in {} write(s)",
            id,
            start,
            self.target,
            plan.len()
        );

        for value in &plan {
            trace!(panel = %id, value, "Brightness step");
            panel.set_brightness(i32::from(*value))?;
        }

        Ok(TransitionReport {
            display: id,
            start,
            target: self.target,
            writes: plan.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Display that records every write
    #[derive(Debug)]
    struct RecordingDisplay {
        brightness: u16,
        writes: Vec<i32>,
        fail_after: Option<usize>,
    }

    impl RecordingDisplay {
        fn at(brightness: u16) -> Self {
            Self {
                brightness,
                writes: Vec::new(),
                fail_after: None,
            }
        }
    }

    impl DisplayProtocol for RecordingDisplay {
        fn id(&self) -> String {
            "recording".to_string()
        }

        fn get_brightness(&mut self) -> Result<u16> {
            Ok(self.brightness)
        }

        fn set_brightness(&mut self, value: i32) -> Result<()> {
            if self.fail_after == Some(self.writes.len()) {
                return Err(crate::error::TransportError::Usb {
                    operation: "control write",
                    source: rusb::Error::NoDevice,
                }
                .into());
            }
            self.writes.push(value);
            self.brightness = value as u16;
            Ok(())
        }
    }

    #[test]
    fn test_rising_example() {
        let mut display = RecordingDisplay::at(50);
        let report = BrightnessTransition::new(65, 3)
            .unwrap()
            .run(&mut display)
            .unwrap();

        assert_eq!(display.writes, vec![53, 56, 59, 62, 65]);
        assert_eq!(
            report,
            TransitionReport {
                display: "recording".to_string(),
                start: 50,
                target: 65,
                writes: 5
            }
        );
    }

    #[test]
    fn test_falling_with_correction() {
        let mut display = RecordingDisplay::at(60);
        BrightnessTransition::new(50, 3)
            .unwrap()
            .run(&mut display)
            .unwrap();

        assert_eq!(display.writes, vec![57, 54, 51, 50]);
    }

    #[test]
    fn test_already_at_target() {
        let mut display = RecordingDisplay::at(40);
        let report = BrightnessTransition::new(40, 3)
            .unwrap()
            .run(&mut display)
            .unwrap();

        assert!(display.writes.is_empty());
        assert_eq!(report.writes, 0);
    }

    #[test]
    fn test_step_larger_than_distance() {
        let mut display = RecordingDisplay::at(40);
        BrightnessTransition::new(42, 10)
            .unwrap()
            .run(&mut display)
            .unwrap();

        assert_eq!(display.writes, vec![42]);
    }

    #[test]
    fn test_rejects_non_positive_step() {
        assert!(matches!(
            BrightnessTransition::new(10, 0),
            Err(OsdError::InvalidStep(0))
        ));
        assert!(matches!(
            BrightnessTransition::new(10, -3),
            Err(OsdError::InvalidStep(-3))
        ));
    }

    #[test]
    fn test_write_count_is_ceil_of_distance() {
        for start in (0..=100u16).step_by(7) {
            for target in (0..=100u16).step_by(9) {
                for step in 1..=12 {
                    let plan = BrightnessTransition::new(target, step).unwrap().plan(start);
                    let distance = (i32::from(target) - i32::from(start)).unsigned_abs() as usize;
                    let expected = distance.div_ceil(step as usize);

                    assert_eq!(plan.len(), expected, "start={start} target={target} step={step}");
                    if start != target {
                        assert_eq!(plan.last(), Some(&target));
                    }
                }
            }
        }
    }

    #[test]
    fn test_plan_is_monotonic() {
        let plan = BrightnessTransition::new(0, 4).unwrap().plan(30);
        assert!(plan.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(plan, vec![26, 22, 18, 14, 10, 6, 2, 0]);
    }

    #[test]
    fn test_error_stops_transition() {
        let mut display = RecordingDisplay::at(0);
        display.fail_after = Some(2);

        let result = BrightnessTransition::new(30, 3).unwrap().run(&mut display);
        assert!(matches!(result, Err(OsdError::Transport(_))));
        assert_eq!(display.writes, vec![3, 6]);
    }
}
