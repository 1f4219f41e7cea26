//! Output device listing command.

use clap::Args;
use wavesynth_io::{default_output_device, enumerate};

#[derive(Args)]
pub struct DevicesArgs {
    /// Only show the host's default output device
    #[arg(long)]
    default: bool,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let default = default_output_device()?;

    if args.default {
        match default {
            Some(name) => println!("Default output: {}", name),
            None => println!("No default output device."),
        }
        return Ok(());
    }

    let devices = enumerate()?;
    if devices.is_empty() {
        println!("No output devices found.");
        return Ok(());
    }

    println!("Output Devices");
    println!("==============\n");
    for line in device_lines(&devices, default.as_deref()) {
        println!("{}", line);
    }
    println!();
    println!("Total: {} output(s)", devices.len());
    println!();
    println!("Tip: Use a device index or partial name with --output:");
    println!("  wavesynth play --output 0");

    Ok(())
}

fn device_lines(devices: &[String], default: Option<&str>) -> Vec<String> {
    devices
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let marker = if Some(name.as_str()) == default {
                " (default)"
            } else {
                ""
            };
            format!("  [{}] {}{}", idx, name, marker)
        })
        .collect()
}
