// SPDX-License-Identifier: GPL-3.0-only
//! OSD control for monitors behind a VIA Labs USB billboard bridge
//!
//! Monitors such as the Gigabyte M27Q expose DDC/CI style VCP features
//! (brightness, volume, KVM input) through vendor USB control transfers.
//! This crate frames those commands, drives them over `rusb`, and manages
//! claiming the bridge from the kernel driver for the length of a session.

#[macro_use]
extern crate tracing;

pub mod brightness;
pub mod config;
pub mod devices;
pub mod error;
pub mod monitor;
pub mod protocols;

pub use brightness::{BrightnessTransition, TransitionReport};
pub use config::OsdConfig;
pub use error::{OsdError, Result, TransportError};
pub use monitor::{DeviceSession, MonitorControl, with_session};
