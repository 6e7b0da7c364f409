//! # termica CLI
//!
//! Command-line interface for ESC/POS serial thermal printers.
//!
//! ## Usage
//!
//! ```bash
//! # Print a line of text
//! termica print --size medium --align center "Hello"
//!
//! # Print from stdin
//! fortune | termica print
//!
//! # QR code and barcode (type by name or wire code)
//! termica qr "https://example.com" --level h
//! termica barcode --type ean13 4006381333931
//! termica barcode --type 8 ABC-123
//!
//! # Text turned 90 degrees
//! termica rotate --degrees 90 "SALE"
//!
//! # Paper usage, and reset it after loading a new roll
//! termica usage
//! termica usage --reset
//!
//! # Run the HTTP API
//! termica serve --listen 0.0.0.0:8080
//!
//! # See the bytes without a printer attached
//! termica --dry-run print "Hello"
//! ```
//!
//! Logging goes to stderr and honours `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use termica::{
    TermicaError,
    flow::SystemClock,
    printer::{PrinterSettings, ThermalPrinter},
    protocol::{
        barcode::{barcode1d::BarcodeType, qr::QrErrorLevel},
        text::{Alignment, Rotation, TextSize},
    },
    queue::job::DEFAULT_QR_SIZE,
    server::{self, DEFAULT_LISTEN_ADDR, ServerConfig},
    transport::MemoryTransport,
    usage::MemoryStore,
};

/// termica - Serial thermal printer utility
#[derive(Parser, Debug)]
#[command(name = "termica")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Serial device, overrides the settings file
    #[arg(long, global = true)]
    device: Option<PathBuf>,

    /// Baud rate, overrides the settings file
    #[arg(long, global = true)]
    baud: Option<u32>,

    /// Print nothing; dump the bytes that would be sent
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print text (reads stdin when no text is given)
    Print {
        text: Vec<String>,

        /// small, medium or large (also s/m/l or 1-3)
        #[arg(long, default_value = "small", value_parser = parse_size)]
        size: TextSize,

        /// left, center or right (also 0-2)
        #[arg(long, default_value = "left", value_parser = parse_align)]
        align: Alignment,

        #[arg(long)]
        bold: bool,
    },

    /// Print a QR code
    Qr {
        data: String,

        /// Module size in dots (1-16)
        #[arg(long, default_value_t = DEFAULT_QR_SIZE)]
        size: u8,

        /// Error correction: l, m, q or h (also 0-3)
        #[arg(long, default_value = "m", value_parser = parse_level)]
        level: QrErrorLevel,
    },

    /// Print a 1D barcode
    Barcode {
        data: String,

        /// upc-a, upc-e, ean13, ean8, code39, itf, codabar, code93, code128,
        /// or the wire code 0-8
        #[arg(long = "type", default_value = "code128", value_parser = parse_barcode_type)]
        barcode_type: BarcodeType,
    },

    /// Print rotated text
    Rotate {
        text: String,

        /// 0, 90, 180 or 270
        #[arg(long, default_value = "90", value_parser = parse_rotation)]
        degrees: Rotation,
    },

    /// Feed paper
    Feed {
        #[arg(default_value_t = 3)]
        lines: u8,
    },

    /// Print a test line, or the firmware's test page
    Test {
        #[arg(long)]
        page: bool,
    },

    /// Show printer status as JSON
    Status {
        /// Query cover and online flags (needs a handshake line)
        #[arg(long)]
        detailed: bool,
    },

    /// Show or change paper usage
    Usage {
        /// Zero the counters (after loading a new roll)
        #[arg(long)]
        reset: bool,

        /// New roll length in mm
        #[arg(long, value_name = "MM")]
        roll_length: Option<f32>,

        /// Paper advance per printed line in mm
        #[arg(long, value_name = "MM")]
        line_height: Option<f32>,
    },

    /// Sound the buzzer
    Beep,

    /// Drain, reset and re-wake a confused printer
    Recover,

    /// Start the HTTP API
    Serve {
        #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
        listen: String,

        /// Scheduler tick interval in milliseconds
        #[arg(long, default_value_t = 100)]
        tick_ms: u64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error [{}]: {}", e.code(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), TermicaError> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => PrinterSettings::load(path)?,
        None => PrinterSettings::default(),
    };
    if let Some(device) = cli.device {
        settings.device = device;
    }
    if let Some(baud) = cli.baud {
        settings.baud_rate = baud;
        settings.validate();
    }

    let (mut printer, dry_run) = open_printer(&settings, cli.dry_run)?;
    printer.setup()?;

    match cli.command {
        Commands::Print {
            text,
            size,
            align,
            bold,
        } => {
            let text = if text.is_empty() {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                text.join(" ")
            };
            printer.print_immediate(&text, size, align, bold)?;
        }
        Commands::Qr { data, size, level } => printer.print_qr_code(&data, size, level)?,
        Commands::Barcode { data, barcode_type } => printer.print_barcode(barcode_type, &data)?,
        Commands::Rotate { text, degrees } => printer.print_rotated_text(&text, degrees)?,
        Commands::Feed { lines } => printer.feed(lines)?,
        Commands::Test { page } => {
            if page {
                printer.test_page()?;
            } else {
                printer.test_print()?;
            }
        }
        Commands::Status { detailed } => {
            let json = if detailed {
                serde_json::to_string_pretty(&printer.detailed_status()?)
            } else {
                serde_json::to_string_pretty(&printer.status())
            }
            .map_err(|e| TermicaError::Config(format!("Failed to encode status: {}", e)))?;
            println!("{}", json);
        }
        Commands::Usage {
            reset,
            roll_length,
            line_height,
        } => {
            if reset {
                printer.reset_usage()?;
            }
            if let Some(mm) = roll_length {
                printer.set_roll_length(mm)?;
            }
            if let Some(mm) = line_height {
                printer.set_line_height_calibration(mm)?;
            }
            let usage = printer.usage();
            println!(
                "Used {:.0}mm of {:.0}mm ({:.1}%), {:.0}mm left",
                usage.usage_mm, usage.roll_length_mm, usage.usage_percent, usage.remaining_mm
            );
            println!(
                "{} lines, {} characters, {} feeds",
                usage.counters.lines, usage.counters.characters, usage.counters.feeds
            );
        }
        Commands::Beep => printer.beep()?,
        Commands::Recover => printer.recover_from_error()?,
        Commands::Serve { listen, tick_ms } => {
            let config = ServerConfig {
                listen_addr: listen,
                tick_interval: Duration::from_millis(tick_ms.max(1)),
            };
            let runtime = tokio::runtime::Runtime::new()?;
            return runtime.block_on(server::serve(printer, config));
        }
    }

    printer.encoder_mut().ledger_mut().persist()?;
    if let Some(transport) = dry_run {
        dump_bytes(&transport.sent());
    }
    Ok(())
}

/// Open the configured serial printer, or an in-memory one for `--dry-run`.
fn open_printer(
    settings: &PrinterSettings,
    dry_run: bool,
) -> Result<(ThermalPrinter, Option<MemoryTransport>), TermicaError> {
    if !dry_run {
        return Ok((ThermalPrinter::open(settings)?, None));
    }
    let transport = MemoryTransport::with_paper();
    let printer = ThermalPrinter::new(
        Box::new(transport.clone()),
        None,
        Box::new(MemoryStore::new()),
        SystemClock::shared(),
        settings,
    );
    Ok((printer, Some(transport)))
}

/// Hex dump, 16 bytes per row.
fn dump_bytes(bytes: &[u8]) {
    println!("{} bytes", bytes.len());
    for (i, row) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = row.iter().map(|b| format!("{:02X}", b)).collect();
        let ascii: String = row
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        println!("{:06X}  {:<48} {}", i * 16, hex.join(" "), ascii);
    }
}

fn parse_size(s: &str) -> Result<TextSize, String> {
    let mut chars = s.chars();
    let letter = match (chars.next(), chars.next()) {
        (Some(c), None) => TextSize::from_letter(c),
        _ => None,
    };
    match s.to_ascii_lowercase().as_str() {
        "small" => Ok(TextSize::Small),
        "medium" => Ok(TextSize::Medium),
        "large" => Ok(TextSize::Large),
        _ => letter
            .or_else(|| s.parse().ok().map(TextSize::from_index))
            .ok_or_else(|| format!("unknown size '{}'", s)),
    }
}

fn parse_align(s: &str) -> Result<Alignment, String> {
    match s.to_ascii_lowercase().as_str() {
        "l" | "left" => Ok(Alignment::Left),
        "c" | "center" | "centre" => Ok(Alignment::Center),
        "r" | "right" => Ok(Alignment::Right),
        _ => s
            .parse()
            .map(Alignment::from_index)
            .map_err(|_| format!("unknown alignment '{}'", s)),
    }
}

fn parse_level(s: &str) -> Result<QrErrorLevel, String> {
    match s.to_ascii_lowercase().as_str() {
        "l" => Ok(QrErrorLevel::L),
        "m" => Ok(QrErrorLevel::M),
        "q" => Ok(QrErrorLevel::Q),
        "h" => Ok(QrErrorLevel::H),
        _ => s
            .parse()
            .map(QrErrorLevel::from_index)
            .map_err(|_| format!("unknown error correction level '{}'", s)),
    }
}

fn parse_barcode_type(s: &str) -> Result<BarcodeType, String> {
    BarcodeType::parse(s)
        .or_else(|| s.parse().ok().and_then(BarcodeType::from_code))
        .ok_or_else(|| format!("unknown barcode type '{}'", s))
}

fn parse_rotation(s: &str) -> Result<Rotation, String> {
    match s.trim_end_matches('°').parse::<u16>() {
        Ok(deg) if deg % 90 == 0 && deg < 360 => Ok(Rotation::from_index((deg / 90) as u8)),
        _ => Err(format!("rotation must be 0, 90, 180 or 270, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_forms() {
        assert_eq!(parse_size("Large"), Ok(TextSize::Large));
        assert_eq!(parse_size("m"), Ok(TextSize::Medium));
        assert_eq!(parse_size("1"), Ok(TextSize::Small));
        assert_eq!(parse_size("3"), Ok(TextSize::Large));
        assert!(parse_size("huge").is_err());
    }

    #[test]
    fn test_numeric_forms() {
        assert_eq!(parse_align("1"), Ok(Alignment::Center));
        assert_eq!(parse_level("3"), Ok(QrErrorLevel::H));
        assert_eq!(parse_barcode_type("2"), Ok(BarcodeType::Ean13));
        assert_eq!(parse_barcode_type("code-39"), Ok(BarcodeType::Code39));
        assert!(parse_barcode_type("9").is_err());
        assert!(parse_align("middle").is_err());
    }

    #[test]
    fn test_rotation_degrees() {
        assert_eq!(parse_rotation("90"), Ok(Rotation::Cw90));
        assert_eq!(parse_rotation("270°"), Ok(Rotation::Cw270));
        assert_eq!(parse_rotation("0"), Ok(Rotation::None));
        assert!(parse_rotation("45").is_err());
        assert!(parse_rotation("360").is_err());
    }

    #[test]
    fn test_cli_parses_beep_and_rotate() {
        let cli = Cli::try_parse_from(["termica", "--dry-run", "beep"]).unwrap();
        assert!(cli.dry_run);
        assert!(matches!(cli.command, Commands::Beep));

        let cli = Cli::try_parse_from(["termica", "rotate", "SALE", "--degrees", "180"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Rotate { degrees: Rotation::Cw180, .. }
        ));
    }
}
