use clap::{Parser, Subcommand};
use qr_registry::api::ScanResponse;
use qr_registry::detector::FinderDetector;
use qr_registry::pipeline::decode_symbols;
use qr_registry::utils::binarization::hybrid_binarize;
use qr_registry::{
    DecoderConfig, ECLevel, EncodeOptions, QrEncoder, RenderOptions, Version, decode, render,
    to_png,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qrtool", version, about = "QR encode/decode tools")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode text into a PNG symbol
    Encode {
        text: String,
        /// Error correction level (L, M, Q, H)
        #[arg(long, default_value = "M")]
        level: ECLevel,
        /// Output file
        #[arg(long, default_value = "qr.png")]
        out: PathBuf,
        /// Pixels per module
        #[arg(long)]
        module_px: Option<u32>,
        /// Quiet zone width in modules
        #[arg(long)]
        border: Option<u32>,
        /// Pin the symbol version instead of picking the smallest
        #[arg(long)]
        version: Option<u8>,
        /// Also print the module grid to stdout
        #[arg(long)]
        print: bool,
    },
    /// Decode an image and print the outcome as JSON
    Decode {
        image: PathBuf,
        /// Also print version, level and corners of each decoded symbol
        #[arg(long)]
        verbose: bool,
    },
    /// Print finder patterns found in an image
    Detect { image: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let result = match cli.command {
        Command::Encode {
            text,
            level,
            out,
            module_px,
            border,
            version,
            print,
        } => encode_cmd(&text, level, &out, module_px, border, version, print),
        Command::Decode { image, verbose } => decode_cmd(&image, verbose),
        Command::Detect { image } => detect_cmd(&image),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn encode_cmd(
    text: &str,
    level: ECLevel,
    out: &Path,
    module_px: Option<u32>,
    border: Option<u32>,
    version: Option<u8>,
    print: bool,
) -> Result<(), String> {
    let options = match version {
        Some(number) => {
            let version =
                Version::new(number).ok_or_else(|| format!("version {number} is not in 1..=40"))?;
            EncodeOptions::fixed_version(version)
        }
        None => EncodeOptions::default(),
    };
    let symbol = QrEncoder::new(options)
        .encode(text.as_bytes(), level)
        .map_err(|e| e.to_string())?;

    let defaults = RenderOptions::default();
    let raster = render(
        &symbol,
        module_px.unwrap_or(defaults.module_px),
        border.unwrap_or(defaults.border),
        defaults.foreground,
        defaults.background,
    )
    .map_err(|e| e.to_string())?;
    let png = to_png(&raster).map_err(|e| e.to_string())?;
    std::fs::write(out, &png).map_err(|e| format!("writing {}: {e}", out.display()))?;

    println!(
        "{}: version {} level {} mask {} ({}x{} px)",
        out.display(),
        symbol.version(),
        symbol.ec_level(),
        symbol.mask().index(),
        raster.width(),
        raster.height()
    );
    if print {
        print!("{}", symbol.to_text());
    }
    Ok(())
}

fn decode_cmd(path: &Path, verbose: bool) -> Result<(), String> {
    let image = image::open(path).map_err(|e| format!("loading {}: {e}", path.display()))?;
    let start = Instant::now();
    let outcome = decode(&image);
    debug!(elapsed_ms = start.elapsed().as_millis() as u64, "decoded");

    let response = ScanResponse::from(&outcome);
    let json = serde_json::to_string_pretty(&response).map_err(|e| e.to_string())?;
    println!("{json}");

    if verbose {
        for symbol in decode_symbols(&image.to_luma8(), &DecoderConfig::default()) {
            let corners: Vec<String> = symbol
                .position
                .iter()
                .map(|p| format!("({:.1}, {:.1})", p.x, p.y))
                .collect();
            println!(
                "  version={} level={} mask={} corrected={} corners={}",
                symbol.version,
                symbol.ec_level,
                symbol.mask_pattern.index(),
                symbol.corrected_errors,
                corners.join(" ")
            );
        }
    }
    Ok(())
}

fn detect_cmd(path: &Path) -> Result<(), String> {
    let gray = image::open(path)
        .map_err(|e| format!("loading {}: {e}", path.display()))?
        .to_luma8();
    let config = DecoderConfig::default();
    let binary = hybrid_binarize(&gray, config.tile_size, config.min_dynamic_range);
    let dark = binary.count_ones();

    println!("Image: {} ({}x{})", path.display(), gray.width(), gray.height());
    println!(
        "Binary: dark_pixels={} ratio={:.2}%",
        dark,
        100.0 * dark as f64 / (gray.width() as f64 * gray.height() as f64).max(1.0)
    );

    let patterns = FinderDetector::detect(&binary);
    println!("Found {} finder patterns", patterns.len());
    for (i, pattern) in patterns.iter().take(10).enumerate() {
        println!(
            "  Pattern {}: center=({:.1}, {:.1}) module_size={:.2} hits={}",
            i, pattern.center.x, pattern.center.y, pattern.module_size, pattern.hits
        );
    }
    Ok(())
}
