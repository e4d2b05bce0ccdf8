use anyhow::Context;
use clap::Parser;

use usb_osd_control::monitor::{MonitorControl, with_session};

use crate::cli::Cli;

#[macro_use]
extern crate tracing;

mod cli;

fn setup_logs() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = fmt::layer().with_target(false);
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new(format!(
        "warn,{}=warn",
        env!("CARGO_CRATE_NAME")
    )));

    if let Ok(journal_layer) = tracing_journald::layer() {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .with(journal_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    setup_logs();

    let cli = Cli::parse();
    let config = cli.config();
    let control = MonitorControl::new(&config);

    info!(
        "Targeting {} ({:04x}:{:04x})",
        config.name, config.vendor_id, config.product_id
    );

    with_session(&config, |session| {
        for device in session.devices_mut() {
            cli.command.apply(&control, device)?;
        }
        Ok(())
    })
    .with_context(|| {
        format!(
            "OSD command failed on {:04x}:{:04x}",
            config.vendor_id, config.product_id
        )
    })
}
