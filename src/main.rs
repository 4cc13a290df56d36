//! phash CLI - perceptual fingerprint toolbox
//!
//! Command-line interface for inspecting, comparing, converting and
//! rendering stored fingerprints.

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use phash_core::error::PhashError;
use phash_core::{
    BlockRenderer, Config, Fingerprint, FuzzyFingerprint, HashFormat, Result, StoredFingerprint,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "phash")]
#[command(author = "phash-core Contributors")]
#[command(version)]
#[command(about = "Perceptual fingerprint toolbox", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a stored fingerprint
    Info {
        /// Fingerprint file to inspect
        file: PathBuf,
    },

    /// Compute the distance between two stored fingerprints
    Compare {
        /// First fingerprint file
        first: PathBuf,

        /// Second fingerprint file
        second: PathBuf,

        /// Skip the algorithm compatibility check
        #[arg(long)]
        fast: bool,
    },

    /// Create a fingerprint from binary digits, first digit most significant
    Create {
        /// Payload bits, e.g. 1011001
        #[arg(short, long)]
        bits: String,

        /// Algorithm id of the fingerprint
        #[arg(short, long, allow_negative_numbers = true)]
        algorithm_id: i32,

        /// Output fingerprint file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Create a fingerprint from canonical hex bytes
    Import {
        /// Canonical magnitude bytes as hex, guard bit included
        hex: String,

        /// Number of payload bits
        #[arg(short, long)]
        bit_length: u32,

        /// Algorithm id of the fingerprint
        #[arg(short, long, allow_negative_numbers = true)]
        algorithm_id: i32,

        /// Output fingerprint file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the canonical hex bytes of a stored fingerprint
    Export {
        /// Fingerprint file
        file: PathBuf,
    },

    /// Render a stored fingerprint as a PNG block image
    Render {
        /// Fingerprint file
        file: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Pixel size of each bit block (default from config)
        #[arg(short, long)]
        block_size: Option<u32>,
    },

    /// Merge stored fingerprints into a fuzzy fingerprint
    Merge {
        /// Fingerprint files to merge
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output fingerprint file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = load_config(cli.config.as_deref()).and_then(|config| run(cli.command, config));

    if let Err(e) = result {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Config::from_file(path)
        }
        None => Ok(Config::default()),
    }
}

fn run(command: Commands, config: Config) -> Result<()> {
    let format = HashFormat::new(config.storage.clone());

    match command {
        Commands::Info { file } => show_info(&format, file),
        Commands::Compare {
            first,
            second,
            fast,
        } => compare(&format, first, second, fast),
        Commands::Create {
            bits,
            algorithm_id,
            output,
        } => create(&format, &bits, algorithm_id, output),
        Commands::Import {
            hex,
            bit_length,
            algorithm_id,
            output,
        } => import(&format, &hex, bit_length, algorithm_id, output),
        Commands::Export { file } => export(&format, file),
        Commands::Render {
            file,
            output,
            block_size,
        } => render(&format, config, file, output, block_size),
        Commands::Merge { files, output } => merge(&format, files, output),
    }
}

fn show_info(format: &HashFormat, file: PathBuf) -> Result<()> {
    let record = format.read_file(&file)?;
    let fp = record.fingerprint();

    println!("File:         {}", file.display());
    println!("Kind:         {:?}", record.kind());
    println!("Algorithm id: {}", fp.algorithm_id());
    println!("Bit length:   {}", fp.bit_length());
    println!("Guard bit:    {}", if fp.has_guard_bit() { "present" } else { "missing" });
    println!("{}", fp);

    if let StoredFingerprint::Fuzzy(fuzzy) = &record {
        println!("Merged:       {}", fuzzy.merged());
        let mean_certainty = (0..fuzzy.bit_length())
            .map(|bit| fuzzy.certainty(bit))
            .sum::<Result<f64>>()?
            / f64::from(fuzzy.bit_length());
        println!("Certainty:    {:.4}", mean_certainty);
    }
    Ok(())
}

fn compare(format: &HashFormat, first: PathBuf, second: PathBuf, fast: bool) -> Result<()> {
    let a = format.read_file(&first)?;
    let b = format.read_file(&second)?;

    let (distance, normalized) = if fast {
        (
            a.fingerprint().hamming_distance_fast(b.fingerprint()),
            a.fingerprint().normalized_hamming_distance_fast(b.fingerprint()),
        )
    } else {
        (
            a.fingerprint().hamming_distance(b.fingerprint())?,
            a.fingerprint().normalized_hamming_distance(b.fingerprint())?,
        )
    };

    println!("Hamming distance:    {}", distance);
    println!("Normalized distance: {:.4}", normalized);

    if let (StoredFingerprint::Fuzzy(fuzzy), false) = (&a, fast) {
        println!(
            "Weighted distance:   {:.4}",
            fuzzy.weighted_distance(b.fingerprint())?
        );
    }
    Ok(())
}

fn create(format: &HashFormat, bits: &str, algorithm_id: i32, output: PathBuf) -> Result<()> {
    let parsed = bits
        .chars()
        .filter(|c| *c != '_')
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            other => Err(PhashError::InvalidArgument(format!(
                "'{}' is not a binary digit",
                other
            ))),
        })
        .collect::<Result<Vec<bool>>>()?;

    let fp = Fingerprint::from_bit_stream(parsed, algorithm_id)?;
    format.write_file(&output, &StoredFingerprint::Plain(fp.clone()))?;

    println!("{}", fp);
    println!("Saved to {}", output.display());
    Ok(())
}

fn import(
    format: &HashFormat,
    hex: &str,
    bit_length: u32,
    algorithm_id: i32,
    output: PathBuf,
) -> Result<()> {
    if bit_length == 0 {
        return Err(PhashError::InvalidArgument(
            "bit length must be greater than zero".to_string(),
        ));
    }

    let bytes = decode_hex(hex)?;
    let fp = Fingerprint::from_bytes(&bytes, bit_length, algorithm_id);
    if !fp.has_guard_bit() {
        warn!(
            "imported magnitude has {} significant bits, expected {} payload bits plus guard bit",
            fp.magnitude().bits(),
            bit_length
        );
    }
    format.write_file(&output, &StoredFingerprint::Plain(fp.clone()))?;

    println!("{}", fp);
    println!("Saved to {}", output.display());
    Ok(())
}

fn export(format: &HashFormat, file: PathBuf) -> Result<()> {
    let record = format.read_file(&file)?;
    let fp = record.fingerprint();
    println!("{}", hex::encode(fp.to_bytes()));
    info!(
        "bit length {} and algorithm id {} are not part of the bytes",
        fp.bit_length(),
        fp.algorithm_id()
    );
    Ok(())
}

fn render(
    format: &HashFormat,
    mut config: Config,
    file: PathBuf,
    output: PathBuf,
    block_size: Option<u32>,
) -> Result<()> {
    if let Some(block_size) = block_size {
        config.render.block_size = block_size;
    }
    let renderer = BlockRenderer::new(config.render);
    let record = format.read_file(&file)?;

    match &record {
        StoredFingerprint::Plain(fp) => renderer.save_png(fp, &output)?,
        StoredFingerprint::Fuzzy(fuzzy) => {
            renderer
                .render_certainty(fuzzy)?
                .save_with_format(&output, image::ImageFormat::Png)?;
        }
    }

    let side = phash_core::render::grid_side(record.fingerprint().bit_length());
    if side * side != record.fingerprint().bit_length() {
        warn!(
            "{} bits do not form a square, only the first {} are drawn",
            record.fingerprint().bit_length(),
            side * side
        );
    }
    println!("Rendered to {}", output.display());
    Ok(())
}

fn merge(format: &HashFormat, files: Vec<PathBuf>, output: PathBuf) -> Result<()> {
    let fingerprints = files
        .iter()
        .map(|file| format.read_file(file).map(StoredFingerprint::into_fingerprint))
        .collect::<Result<Vec<_>>>()?;

    let fuzzy = FuzzyFingerprint::from_fingerprints(&fingerprints)?;
    format.write_file(&output, &StoredFingerprint::Fuzzy(fuzzy.clone()))?;

    println!("Merged {} fingerprints", fuzzy.merged());
    println!("{}", fuzzy.fingerprint());
    println!("Saved to {}", output.display());
    Ok(())
}

/// Decodes hex digits into bytes; an odd digit count gets a leading zero.
fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let digits = input.trim();
    let digits = digits.strip_prefix("0x").unwrap_or(digits);
    let padded = if digits.len() % 2 == 1 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };

    hex::decode(padded)
        .map_err(|e| PhashError::InvalidArgument(format!("invalid hex input {:?}: {}", input, e)))
}
