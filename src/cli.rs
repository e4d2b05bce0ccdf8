use std::time::Duration;

use clap::{Parser, Subcommand};

use usb_osd_control::Result;
use usb_osd_control::config::OsdConfig;
use usb_osd_control::monitor::{ClaimedDevice, MonitorControl, UsbHandle};
use usb_osd_control::protocols::usb_osd::TransferTiming;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(
    name = "usb-osd-control",
    version,
    about = "Control brightness, volume and KVM input of USB OSD monitors (Gigabyte M27Q)"
)]
pub struct Cli {
    /// USB vendor ID of the OSD bridge (hex with 0x prefix, or decimal)
    #[arg(long, default_value = "0x2109", env = "OSD_VENDOR_ID", value_parser = parse_usb_id)]
    pub vendor_id: u16,

    /// USB product ID of the OSD bridge (hex with 0x prefix, or decimal)
    #[arg(long, default_value = "0x8883", env = "OSD_PRODUCT_ID", value_parser = parse_usb_id)]
    pub product_id: u16,

    /// Pause after every USB transfer, in milliseconds
    #[arg(long, default_value_t = 50, env = "OSD_SETTLE_MS")]
    pub settle_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Read, set or fade brightness
    Brightness {
        #[command(subcommand)]
        action: BrightnessAction,
    },
    /// Read or set volume
    Volume {
        #[command(subcommand)]
        action: VolumeAction,
    },
    /// Read, set or toggle the active KVM input
    Kvm {
        #[command(subcommand)]
        action: KvmAction,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum BrightnessAction {
    Get,
    /// Jump to a value (clamped to the monitor's range)
    Set {
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },
    /// Walk to a value in small steps
    Fade {
        #[arg(allow_negative_numbers = true)]
        target: i32,
        #[arg(long, allow_negative_numbers = true)]
        step: Option<i32>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum VolumeAction {
    Get,
    Set {
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum KvmAction {
    Get,
    Set {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
        status: u8,
    },
    Toggle,
}

impl Cli {
    pub fn config(&self) -> OsdConfig {
        OsdConfig::default()
            .with_identity(self.vendor_id, self.product_id)
            .with_timing(TransferTiming {
                settle_delay: Duration::from_millis(self.settle_ms),
                ..TransferTiming::default()
            })
    }
}

impl Command {
    /// Run the command against one claimed device, printing any reading
    pub fn apply<H: UsbHandle>(
        &self,
        control: &MonitorControl,
        device: &mut ClaimedDevice<H>,
    ) -> Result<()> {
        let id = device.id();
        let dev = device.handle_mut();

        match self {
            Command::Brightness { action } => match action {
                BrightnessAction::Get => {
                    println!("{id}: brightness {}", control.get_brightness(dev)?);
                }
                BrightnessAction::Set { value } => control.set_brightness(dev, *value)?,
                BrightnessAction::Fade { target, step } => {
                    let report = control.transition_device(device, *target, *step)?;
                    info!(
                        "{}: brightness {} -> {} in {} step(s)",
                        report.display, report.start, report.target, report.writes
                    );
                }
            },
            Command::Volume { action } => match action {
                VolumeAction::Get => println!("{id}: volume {}", control.get_volume(dev)?),
                VolumeAction::Set { value } => control.set_volume(dev, *value)?,
            },
            Command::Kvm { action } => match action {
                KvmAction::Get => println!("{id}: kvm {}", control.get_kvm_status(dev)?),
                KvmAction::Set { status } => control.set_kvm_status(dev, *status)?,
                KvmAction::Toggle => {
                    let status = control.toggle_kvm(dev)?;
                    println!("{id}: kvm {status}");
                }
            },
        }
        Ok(())
    }
}

/// Parse a USB ID given as `0x2109` or `8457`
fn parse_usb_id(s: &str) -> std::result::Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid USB ID '{s}': {e}"))
}
