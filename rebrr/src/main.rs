use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rebrr::{EncodeOptions, UNITY_PITCH};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rebrr")]
#[command(author = "NellowTCS")]
#[command(version = "0.1.0")]
#[command(about = "SNES BRR sample converter", long_about = None)]
struct Cli {
    /// Log encoder decisions (set RUST_LOG for finer control)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode audio file to brr
    Encode {
        /// Input audio file (mp3, wav, flac, ogg, etc.)
        input: PathBuf,
        /// Output brr file
        output: PathBuf,
        /// Loop start in samples
        #[arg(long)]
        loop_start: Option<usize>,
        /// Pitch step (hex with 0x prefix or decimal); derived from the input rate by default
        #[arg(long, value_parser = parse_pitch)]
        pitch: Option<u16>,
        /// Overflow correction attempts per block
        #[arg(long)]
        max_retries: Option<u32>,
    },
    /// Decode brr file to WAV
    Decode {
        /// Input brr file
        input: PathBuf,
        /// Output WAV file
        output: PathBuf,
        /// Resample through the gaussian interpolation filter
        #[arg(short, long)]
        gaussian: bool,
        /// Playback pitch step (hex with 0x prefix or decimal)
        #[arg(long, value_parser = parse_pitch, default_value = "0x1000")]
        pitch: u16,
    },
    /// Show information about a brr file
    Info {
        /// Input brr file
        input: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Pitch step used for the duration
        #[arg(long, value_parser = parse_pitch, default_value = "0x1000")]
        pitch: u16,
    },
    /// Validate a brr file
    Validate {
        /// Input brr file
        input: PathBuf,
        /// Byte offset of the loop block
        #[arg(long)]
        loop_offset: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Encode {
            input,
            output,
            loop_start,
            pitch,
            max_retries,
        } => {
            let mut options = EncodeOptions {
                loop_start,
                ..Default::default()
            };
            if let Some(pitch) = pitch {
                options = options.with_pitch_step(pitch);
            }
            if let Some(retries) = max_retries {
                options = options.with_max_retries(retries);
            }
            encode(&input, &output, &options)?;
        }
        Commands::Decode {
            input,
            output,
            gaussian,
            pitch,
        } => {
            decode(&input, &output, gaussian, pitch)?;
        }
        Commands::Info { input, json, pitch } => {
            info(&input, json, pitch)?;
        }
        Commands::Validate { input, loop_offset } => {
            validate(&input, loop_offset)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_pitch(value: &str) -> Result<u16, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse::<u16>(),
    };
    match parsed {
        Ok(0) => Err("pitch step must be non-zero".to_string()),
        Ok(p) if p > 0x3FFF => Err(format!("pitch step {:#06x} exceeds 0x3fff", p)),
        Ok(p) => Ok(p),
        Err(e) => Err(format!("invalid pitch step '{}': {}", value, e)),
    }
}

fn encode(input: &PathBuf, output: &PathBuf, options: &EncodeOptions) -> Result<()> {
    println!("Reading {}...", input.display());

    // Read audio file
    let audio_bytes = fs::read(input).context("Failed to read input file")?;

    let info = rebrr::get_audio_info(&audio_bytes).context("Failed to read audio file")?;

    if let Some(ref format) = info.source_format {
        println!("  Format: {}", format);
    }
    println!("  Sample rate: {} Hz", info.sample_rate);
    println!("  Channels: {}", info.channels);
    println!("  Duration: {:.2}s", info.duration_secs);
    if info.channels > 1 {
        println!("  Mixing {} channels down to mono", info.channels);
    }

    println!("Encoding to brr...");

    let encoded =
        rebrr::encode_from_audio(&audio_bytes, options).context("Failed to encode audio")?;

    fs::write(output, &encoded.brr).context("Failed to write output file")?;

    let original_size = encoded.pcm.len() * 2;
    let ratio = original_size as f32 / encoded.brr.len() as f32;

    println!("Done!");
    println!("  Output: {}", output.display());
    println!(
        "  Size: {} bytes, {} blocks ({:.1}x compression)",
        encoded.brr.len(),
        encoded.block_count(),
        ratio
    );
    println!("  Pitch step: {:#06x}", encoded.pitch_step);
    match encoded.loop_offset {
        Some(offset) => println!("  Loop offset: {} bytes", offset),
        None => println!("  Loop: off"),
    }
    println!(
        "  Error: avg {:.1}, min {:.1}, max {:.1}",
        encoded.stats.average, encoded.stats.min, encoded.stats.max
    );

    Ok(())
}

fn decode(input: &PathBuf, output: &PathBuf, gaussian: bool, pitch: u16) -> Result<()> {
    println!("Reading {}...", input.display());

    let brr_data = fs::read(input).context("Failed to read brr file")?;
    if brr_data.is_empty() {
        bail!("{} is empty", input.display());
    }

    let file_info = rebrr::get_brr_info(&brr_data, pitch);

    println!("  Blocks: {}", file_info.blocks);
    println!("  Samples: {}", file_info.samples);
    if !file_info.valid {
        println!("  Warning: stream structure is not valid, decoding anyway");
    }

    if gaussian {
        println!("Decoding with gaussian interpolation...");
    } else {
        println!("Decoding...");
    }

    let wav_bytes =
        rebrr::decode_to_wav(&brr_data, gaussian, pitch).context("Failed to decode brr file")?;

    println!("Writing WAV...");

    fs::write(output, wav_bytes).context("Failed to write WAV file")?;

    println!("Done!");
    println!("  Output: {}", output.display());

    Ok(())
}

fn info(input: &PathBuf, json: bool, pitch: u16) -> Result<()> {
    let brr_data = fs::read(input).context("Failed to read brr file")?;

    let file_info = rebrr::get_brr_info(&brr_data, pitch);

    if json {
        let json_str =
            serde_json::to_string_pretty(&file_info).context("Failed to serialize info")?;
        println!("{}", json_str);
        return Ok(());
    }

    println!("BRR Sample");
    println!("───────────────────────────────");
    println!("  File size:   {} bytes", file_info.file_size);
    println!("  Blocks:      {}", file_info.blocks);
    println!("  Samples:     {}", file_info.samples);
    match file_info.end_block {
        Some(end) => println!("  End block:   {}", end),
        None => println!("  End block:   missing"),
    }
    println!(
        "  Looping:     {}",
        if file_info.looping { "yes" } else { "no" }
    );
    println!(
        "  Pitch:       {:#06x} ({} Hz)",
        file_info.pitch_step, file_info.playback_rate
    );
    if file_info.pitch_step != UNITY_PITCH {
        println!("  (unity pitch is {:#06x})", UNITY_PITCH);
    }
    println!("  Duration:    {:.3}s", file_info.duration_secs);
    println!("  Compression: {:.1}x", file_info.compression_ratio);
    println!(
        "  Valid:       {}",
        if file_info.valid { "yes" } else { "no" }
    );

    Ok(())
}

fn validate(input: &PathBuf, loop_offset: Option<usize>) -> Result<()> {
    let brr_data = fs::read(input).context("Failed to read brr file")?;

    match rebrr::validate_brr(&brr_data, loop_offset) {
        Ok(()) => {
            println!("✓ {} is valid", input.display());
            Ok(())
        }
        Err(e) => {
            println!("✗ {} is INVALID", input.display());
            bail!("{}", e)
        }
    }
}
