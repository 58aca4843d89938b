//! LCT Cooler Control CLI
//!
//! Command-line interface for discovering and controlling LCT21001/LCT22002
//! Bluetooth LE liquid coolers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use lct_cooler::config::{CONNECT_TIMEOUT, SCAN_WINDOW};
use lct_cooler::cooling::orchestrator;
use lct_cooler::cooling::{AutoController, ControlMode, FanCurve, Intent};
use lct_cooler::device::{DeviceSession, discovery};
use lct_cooler::error::CoolerError;
use lct_cooler::storage;
use lct_cooler::transport::{BleTransport, DiscoveredDevice, Transport};
use lct_cooler::utils::parsing::{
    parse_color, parse_curve_point, parse_fan_power, parse_poll_interval, parse_pump_voltage,
    parse_rgb_mode,
};
use lct_cooler::utils::sensors::SystemSensors;

// =============================================================================
// CLI Arguments
// =============================================================================

/// LCT Cooler Control Tool
#[derive(Parser, Debug)]
#[command(name = "lct-cooler-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan for Bluetooth LE devices and highlight supported coolers
    Scan {
        /// Keep scanning until a supported cooler appears
        #[arg(short, long)]
        watch: bool,
    },

    /// Apply saved cooling and lighting settings
    Apply {
        /// Device address (skips discovery)
        #[arg(short, long)]
        address: Option<String>,

        /// Fan power: low, medium or max
        #[arg(long)]
        fan: Option<String>,

        /// Pump voltage: 7, 8, 11 or 12
        #[arg(long)]
        pump: Option<String>,

        /// RGB mode: static, breathing or rainbow
        #[arg(long)]
        rgb: Option<String>,

        /// RGB color: name, R,G,B or #RRGGBB
        #[arg(long)]
        color: Option<String>,
    },

    /// Set the RGB lighting
    Rgb {
        /// Mode: static, breathing or rainbow
        mode: String,

        /// Color: name, R,G,B or #RRGGBB
        #[arg(short, long)]
        color: Option<String>,

        /// Device address (skips discovery)
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Set a fixed fan duty
    SetFan {
        /// Raw duty (0-255, 0 stops the fan)
        duty: u8,

        /// Device address (skips discovery)
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Set the pump voltage
    SetPump {
        /// Voltage: 7, 8, 11 or 12
        voltage: String,

        /// Device address (skips discovery)
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Stop the fan, turn the pump off and switch the lighting off
    Off {
        /// Device address (skips discovery)
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Drive the fan from a CPU temperature curve until interrupted
    Curve {
        /// Device address (skips discovery)
        #[arg(short, long)]
        address: Option<String>,

        /// Poll interval in seconds: 0.5, 1, 2, 5 or 10
        #[arg(short, long)]
        interval: Option<String>,

        /// Curve point as TEMP:DUTY; repeat for more points
        #[arg(short, long = "point")]
        points: Vec<String>,
    },

    /// Diagnostic: List all available system sensors
    Sensors,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Scan { watch } => cmd_scan(watch).await,
        Command::Apply {
            address,
            fan,
            pump,
            rgb,
            color,
        } => cmd_apply(address, fan, pump, rgb, color).await,
        Command::Rgb {
            mode,
            color,
            address,
        } => cmd_rgb(&mode, color, address).await,
        Command::SetFan { duty, address } => cmd_set_fan(duty, address).await,
        Command::SetPump { voltage, address } => cmd_set_pump(&voltage, address).await,
        Command::Off { address } => cmd_off(address).await,
        Command::Curve {
            address,
            interval,
            points,
        } => cmd_curve(address, interval, points).await,
        Command::Sensors => cmd_sensors(),
    }
}

// =============================================================================
// Connection Helpers
// =============================================================================

/// Spawn a task that flips `cancel` on Ctrl+C.
fn cancel_on_ctrl_c(cancel: &CancellationToken) {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n🛑 Stopping...");
            cancel.cancel();
        }
    });
}

/// Use the given address, or scan once and take the first supported cooler.
async fn resolve_address(transport: &BleTransport, address: Option<String>) -> Result<String> {
    if let Some(address) = address {
        return Ok(address);
    }

    println!("🔍 Scanning for a supported cooler...");
    let coolers = discovery::discover(transport).await.context("Scan failed")?;
    let Some(cooler) = coolers.first() else {
        return Err(CoolerError::DeviceNotFound.into());
    };
    println!("✅ Using {} at {}", cooler.name, cooler.address);
    Ok(cooler.address.clone())
}

async fn open_session(
    transport: BleTransport,
    address: &str,
) -> Result<DeviceSession<BleTransport>> {
    let mut session = DeviceSession::new(transport);
    println!("🔗 Connecting to {}...", address);
    session
        .connect(address, CONNECT_TIMEOUT)
        .await
        .with_context(|| format!("Failed to connect to {}", address))?;
    println!("✅ Connected.");
    Ok(session)
}

// =============================================================================
// Command Implementations
// =============================================================================

async fn cmd_scan(watch: bool) -> Result<()> {
    let transport = BleTransport::new()
        .await
        .context("Failed to initialize Bluetooth")?;

    if watch {
        println!("🔍 Scanning until a supported cooler appears (Ctrl+C to stop)...");
        let cancel = CancellationToken::new();
        cancel_on_ctrl_c(&cancel);

        match discovery::discover_until_found(&transport, &cancel).await? {
            Some(coolers) => print_coolers(&coolers),
            None => println!("👋 Scan stopped."),
        }
        return Ok(());
    }

    println!("🔍 Scanning for {} seconds...", SCAN_WINDOW.as_secs());
    let devices = transport.scan(SCAN_WINDOW).await.context("Scan failed")?;

    if devices.is_empty() {
        println!("❌ No Bluetooth LE devices found.");
        return Ok(());
    }

    println!("✅ Found {} device(s):\n", devices.len());
    println!("   {:<28} | {:<18} | RSSI", "Name", "Address");
    println!("{}", "─".repeat(62));
    for device in &devices {
        let rssi = device
            .rssi
            .map(|r| format!("{} dBm", r))
            .unwrap_or_else(|| "-".to_string());
        let marker = if discovery::is_supported_model(&device.name) {
            "👉"
        } else {
            "  "
        };
        println!(
            "{} {:<28} | {:<18} | {}",
            marker, device.name, device.address, rssi
        );
    }
    println!("{}", "─".repeat(62));
    println!("👉 = supported cooler");

    Ok(())
}

fn print_coolers(coolers: &[DiscoveredDevice]) {
    println!("✅ Found {} supported cooler(s):\n", coolers.len());
    for (i, cooler) in coolers.iter().enumerate() {
        let rssi = cooler
            .rssi
            .map(|r| format!("{} dBm", r))
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  {}. {} at {} (RSSI: {})",
            i + 1,
            cooler.name,
            cooler.address,
            rssi
        );
    }
}

async fn cmd_apply(
    address: Option<String>,
    fan: Option<String>,
    pump: Option<String>,
    rgb: Option<String>,
    color: Option<String>,
) -> Result<()> {
    let mut settings = storage::load_settings();

    if let Some(fan) = &fan {
        settings.fan_power = parse_fan_power(fan)?;
    }
    if let Some(pump) = &pump {
        settings.pump_voltage = parse_pump_voltage(pump)?;
    }
    if let Some(rgb) = &rgb {
        settings.rgb_mode = parse_rgb_mode(rgb)?;
    }
    if let Some(color) = &color {
        settings.rgb_color = parse_color(color)?;
    }

    let transport = BleTransport::new()
        .await
        .context("Failed to initialize Bluetooth")?;
    let address = resolve_address(&transport, address).await?;
    let session = open_session(transport, &address).await?;

    let mut controller = AutoController::new(session, SystemSensors::new());
    orchestrator::apply_all(
        &mut controller,
        settings.fan_power,
        settings.pump_voltage,
        settings.rgb_mode,
        settings.rgb_color,
    )
    .await
    .context("Failed to apply settings")?;

    println!(
        "✅ Applied: fan {}, pump {}, {} lighting",
        settings.fan_power, settings.pump_voltage, settings.rgb_mode
    );

    if let Err(e) = storage::save_settings(&settings) {
        eprintln!("⚠️  Could not save settings: {}", e);
    }
    Ok(())
}

async fn cmd_rgb(mode: &str, color: Option<String>, address: Option<String>) -> Result<()> {
    let mut settings = storage::load_settings();
    settings.rgb_mode = parse_rgb_mode(mode)?;
    if let Some(color) = &color {
        settings.rgb_color = parse_color(color)?;
    }

    let transport = BleTransport::new()
        .await
        .context("Failed to initialize Bluetooth")?;
    let address = resolve_address(&transport, address).await?;
    let session = open_session(transport, &address).await?;

    let mut controller = AutoController::new(session, SystemSensors::new());
    orchestrator::apply_rgb(&mut controller, settings.rgb_mode, settings.rgb_color)
        .await
        .context("Failed to set lighting")?;

    println!("✅ Lighting set to {} mode", settings.rgb_mode);

    if let Err(e) = storage::save_settings(&settings) {
        eprintln!("⚠️  Could not save settings: {}", e);
    }
    Ok(())
}

async fn cmd_set_fan(duty: u8, address: Option<String>) -> Result<()> {
    let transport = BleTransport::new()
        .await
        .context("Failed to initialize Bluetooth")?;
    let address = resolve_address(&transport, address).await?;
    let mut session = open_session(transport, &address).await?;

    session.send_fan(duty).await.context("Failed to set fan")?;
    if duty == 0 {
        println!("✅ Fan stopped");
    } else {
        println!("✅ Fan duty set to {}", duty);
    }
    Ok(())
}

async fn cmd_set_pump(voltage: &str, address: Option<String>) -> Result<()> {
    let voltage = parse_pump_voltage(voltage)?;

    let transport = BleTransport::new()
        .await
        .context("Failed to initialize Bluetooth")?;
    let address = resolve_address(&transport, address).await?;
    let mut session = open_session(transport, &address).await?;

    session
        .send_pump(voltage)
        .await
        .context("Failed to set pump")?;
    println!("✅ Pump set to {}", voltage);
    Ok(())
}

async fn cmd_off(address: Option<String>) -> Result<()> {
    let transport = BleTransport::new()
        .await
        .context("Failed to initialize Bluetooth")?;
    let address = resolve_address(&transport, address).await?;
    let mut session = open_session(transport, &address).await?;

    session.send_fan(0).await.context("Failed to stop fan")?;
    session
        .send_pump_off()
        .await
        .context("Failed to turn pump off")?;
    session
        .send_rgb_off()
        .await
        .context("Failed to turn lighting off")?;

    println!("✅ Fan stopped, pump off, lighting off");
    Ok(())
}

fn cmd_sensors() -> Result<()> {
    println!("🔍 Scanning for system sensors...");
    let sensors = SystemSensors::new();
    let count = sensors.count();

    if count == 0 {
        println!("❌ No sensors detected. (Check permissions?)");
        return Ok(());
    }

    println!("✅ Found {} sensors:\n", count);
    println!("{:<40} | {:<10} | {:<10}", "Label", "Temp", "Critical");
    println!("{}", "─".repeat(66));

    for sensor in sensors.list_all() {
        let critical = sensor
            .critical
            .map(|c| format!("{:.1}°C", c))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<40} | {:<10} | {}",
            sensor.label,
            format!("{:.1}°C", sensor.temperature),
            critical
        );
    }

    println!("{}", "─".repeat(66));
    match sensors.find_cpu_temp() {
        Some(temp) => println!("🌡️  CPU reading used for the curve: {:.1}°C", temp),
        None => println!("⚠️  No sensor matches the CPU label patterns."),
    }
    if let Some(temp) = sensors.find_gpu_temp() {
        println!("🌡️  GPU reading: {:.1}°C", temp);
    }

    Ok(())
}

// =============================================================================
// Curve Control
// =============================================================================

async fn cmd_curve(
    address: Option<String>,
    interval: Option<String>,
    points: Vec<String>,
) -> Result<()> {
    let mut settings = storage::load_settings();

    let poll_interval = match &interval {
        Some(text) => parse_poll_interval(text)?,
        None => settings.poll_interval(),
    };

    let curve = if points.is_empty() {
        settings.fan_curve()
    } else {
        let mut parsed = Vec::new();
        for point in &points {
            parsed.push(parse_curve_point(point)?);
        }
        FanCurve::from_points(parsed)?
    };

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(&cancel);

    let transport = BleTransport::new()
        .await
        .context("Failed to initialize Bluetooth")?;

    let address = match address {
        Some(address) => address,
        None => {
            println!("🔍 Waiting for a supported cooler (Ctrl+C to stop)...");
            match discovery::discover_until_found(&transport, &cancel).await? {
                Some(coolers) => {
                    let cooler = &coolers[0];
                    println!("✅ Found {} at {}", cooler.name, cooler.address);
                    cooler.address.clone()
                }
                None => return Ok(()),
            }
        }
    };

    let session = open_session(transport, &address).await?;

    let mut controller =
        AutoController::new(session, SystemSensors::new()).with_curve(curve.clone());
    controller.set_poll_interval(poll_interval);
    controller.set_mode(ControlMode::Automatic);

    println!("🌡️  Curve control running (Ctrl+C to stop)");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Points:   {}", format_curve(&curve));
    println!("   Interval: {}s", poll_interval.as_secs_f64());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Tick details at RUST_LOG=lct_cooler=debug");
    println!();

    let (intents, intent_rx) = mpsc::channel(16);
    // First duty goes out right away instead of waiting one interval.
    intents.send(Intent::ApplyCurve).await.ok();

    controller.run(intent_rx, cancel).await;

    controller.session_mut().disconnect().await;
    println!("👋 Curve control stopped.");

    settings.curve_points = curve.points().to_vec();
    settings.poll_interval_secs = poll_interval.as_secs_f64();
    if let Err(e) = storage::save_settings(&settings) {
        eprintln!("⚠️  Could not save settings: {}", e);
    }
    Ok(())
}

fn format_curve(curve: &FanCurve) -> String {
    curve
        .points()
        .iter()
        .map(|p| format!("{}°C:{}%", p.temp_c, p.duty_pct))
        .collect::<Vec<_>>()
        .join(", ")
}
