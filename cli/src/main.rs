mod config;

use clap::{Args, Parser, Subcommand};
use config::{CarrierPreset, ConfigFile, Overrides};
use fskwave_core::{
    read_wav, write_wav, ChannelNoise, Comparison, Decoded, Decoder, Encoder, ModemConfig,
    ModemError,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fskwave")]
#[command(about = "Two-tone FSK audio modem with a synthetic noisy channel")]
struct Cli {
    #[command(flatten)]
    modem: ModemArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ModemArgs {
    /// JSON config file (flags take precedence)
    #[arg(long, global = true, value_name = "CONFIG.JSON")]
    config: Option<PathBuf>,

    /// Sample rate in Hz
    #[arg(long, global = true)]
    sample_rate: Option<u32>,

    /// Symbols per second
    #[arg(long, global = true)]
    bitrate: Option<f64>,

    /// Carrier pair preset
    #[arg(long, global = true, value_enum)]
    carriers: Option<CarrierPreset>,

    /// Leave windows with no in-band energy unclassified instead of assuming 0 Hz
    #[arg(long, global = true)]
    erase_empty_bands: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode text or a file to a WAV file
    Encode {
        /// Text to encode
        text: Option<String>,

        /// Encode the contents of this file instead of text
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Noise level (0-5) applied after modulation
        #[arg(short, long)]
        noise_level: Option<u8>,

        /// Seed for the noise generator
        #[arg(long)]
        seed: Option<u64>,

        /// Output WAV file
        #[arg(short, long, default_value = "output.wav", value_name = "OUTPUT.WAV")]
        output: PathBuf,
    },

    /// Add channel noise to a WAV file in place, keeping a backup
    Noise {
        /// WAV file to corrupt
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Noise level (0-5)
        level: u8,

        /// Seed for the noise generator
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Decode a WAV file back to bits, text and bytes
    Decode {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Original payload to compare against
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Write the recovered bytes here
        #[arg(short, long, value_name = "OUTPUT.BIN")]
        output: Option<PathBuf>,
    },

    /// Encode, add noise and decode in memory, then compare
    Roundtrip {
        /// Text to send
        text: Option<String>,

        /// Send the contents of this file instead of text
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Noise level (0-5)
        #[arg(short, long)]
        noise_level: Option<u8>,

        /// Seed for the noise generator
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            text,
            file,
            noise_level,
            seed,
            output,
        } => {
            let config = load_config(&cli.modem, noise_level)?;
            encode_command(&config, text.as_deref(), file.as_deref(), seed, &output)?
        }
        Commands::Noise { input, level, seed } => {
            let config = load_config(&cli.modem, Some(level))?;
            noise_command(&config, &input, seed)?
        }
        Commands::Decode {
            input,
            file,
            output,
        } => {
            let config = load_config(&cli.modem, None)?;
            decode_command(&config, &input, file.as_deref(), output.as_deref())?
        }
        Commands::Roundtrip {
            text,
            file,
            noise_level,
            seed,
        } => {
            let config = load_config(&cli.modem, noise_level)?;
            roundtrip_command(&config, text.as_deref(), file.as_deref(), seed)?
        }
    }

    Ok(())
}

fn load_config(
    args: &ModemArgs,
    noise_level: Option<u8>,
) -> Result<ModemConfig, config::ConfigError> {
    let file = match &args.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    let overrides = Overrides {
        sample_rate: args.sample_rate,
        bitrate: args.bitrate,
        noise_level,
        carriers: args.carriers,
        erase_empty_bands: args.erase_empty_bands,
    };
    let config = config::resolve(&file, &overrides)?;
    log::debug!("Resolved configuration: {:?}", config);
    Ok(config)
}

fn read_payload(
    text: Option<&str>,
    file: Option<&Path>,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    match (file, text) {
        (Some(path), _) => {
            if !path.exists() {
                return Err(ModemError::ResourceNotFound(path.to_path_buf()).into());
            }
            let data = std::fs::read(path)?;
            println!("Read {} bytes from {}", data.len(), path.display());
            Ok(data)
        }
        (None, Some(text)) => Ok(text.as_bytes().to_vec()),
        (None, None) => Err("provide TEXT or --file <PATH>".into()),
    }
}

fn encode_command(
    config: &ModemConfig,
    text: Option<&str>,
    file: Option<&Path>,
    seed: Option<u64>,
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_payload(text, file)?;

    let waveform = Encoder::new(config)?.encode_noisy(&data, seed);
    println!(
        "Encoded {} bytes to {} samples ({:.2} s at {} Hz)",
        data.len(),
        waveform.len(),
        waveform.duration(),
        waveform.sample_rate
    );
    if !config.noise_level.is_none() {
        println!("Applied noise level {}", config.noise_level);
    }

    write_wav(output_path, &waveform)?;
    println!("Wrote {}", output_path.display());
    Ok(())
}

/// `dir/name.wav` -> `dir/name_orig.wav`
fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_orig.{}", stem, ext.to_string_lossy()),
        None => format!("{}_orig", stem),
    };
    path.with_file_name(name)
}

fn noise_command(
    config: &ModemConfig,
    input_path: &Path,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let waveform = read_wav(input_path)?;

    let backup = backup_path(input_path);
    std::fs::copy(input_path, &backup)?;
    println!("Backup written to {}", backup.display());

    if config.noise_level.is_none() {
        println!("Noise level 0, leaving {} unchanged", input_path.display());
        return Ok(());
    }

    let mut noise = match seed {
        Some(seed) => ChannelNoise::with_seed(config.noise_level, config.band, seed),
        None => ChannelNoise::new(config.noise_level, config.band),
    };
    let noisy = noise.apply(&waveform);
    write_wav(input_path, &noisy)?;
    println!(
        "Applied noise level {} to {}",
        config.noise_level,
        input_path.display()
    );
    Ok(())
}

fn print_decoded(decoded: &Decoded) {
    println!("Recovered bits:");
    println!("{}", decoded.bits);
    match decoded.text() {
        Ok(text) => {
            println!("Recovered text:");
            println!("{}", text);
        }
        Err(e) => println!("[{}] {}", e, e.lossy_text()),
    }
    if decoded.symbols.has_short_final_window() {
        println!("Final window was shorter than one symbol");
    }
}

fn print_comparison(original: &[u8], recovered: &[u8]) {
    let comparison = Comparison::new(original, recovered);
    println!("[BLAKE3] original:  {}", blake3::hash(original).to_hex());
    println!("[BLAKE3] recovered: {}", blake3::hash(recovered).to_hex());
    println!(
        "Bit errors: {} ({:.4} BER)",
        comparison.bit_errors,
        comparison.bit_error_rate()
    );
    if comparison.matches {
        println!("[OK] payload recovered exactly");
    } else {
        println!("[NG] payload corrupted");
    }
}

fn decode_command(
    config: &ModemConfig,
    input_path: &Path,
    original: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let decoder = Decoder::new(config)?;
    let decoded = decoder.decode_file(input_path)?;
    println!(
        "Decoded {} symbols into {} bytes",
        decoded.symbols.len(),
        decoded.bytes.len()
    );
    print_decoded(&decoded);

    if let Some(path) = output_path {
        std::fs::write(path, &decoded.bytes)?;
        println!("Wrote {} bytes to {}", decoded.bytes.len(), path.display());
    }

    if let Some(path) = original {
        let original = read_payload(None, Some(path))?;
        print_comparison(&original, &decoded.bytes);
    }
    Ok(())
}

fn roundtrip_command(
    config: &ModemConfig,
    text: Option<&str>,
    file: Option<&Path>,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_payload(text, file)?;

    let received = Encoder::new(config)?.encode_noisy(&data, seed);
    let decoded = Decoder::new(config)?.decode(&received)?;

    println!(
        "Sent {} bytes over {} samples at noise level {}",
        data.len(),
        received.len(),
        config.noise_level
    );
    print_decoded(&decoded);
    print_comparison(&data, &decoded.bytes);
    Ok(())
}
