use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "pilot.toml")]
    pub config: String,

    /// Run the interactive controller calibration instead of flying
    #[arg(long)]
    pub calibrate: bool,

    /// Override the binding file path from the configuration
    #[arg(short, long)]
    pub bindings: Option<String>,

    /// Override the evdev device path (empty config means auto-detect)
    #[arg(short, long)]
    pub device: Option<String>,
}
