use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use wavaug_core::audio::domain::audio_decoder::AudioDecoder;
use wavaug_core::audio::domain::audio_encoder::AudioEncoder;
use wavaug_core::audio::infrastructure::hound_encoder::HoundEncoder;
use wavaug_core::audio::infrastructure::sound_assets::default_decoder;
use wavaug_core::pipeline::augmenter::Augmenter;
use wavaug_core::pipeline::pipeline_config::PipelineConfig;

/// Apply a randomized augmentation pipeline to an audio file.
#[derive(Parser)]
#[command(name = "wavaug")]
struct Cli {
    /// Input audio file.
    input: PathBuf,

    /// Output WAV file. With --repeat, variants are written as NAME_0.wav, NAME_1.wav, ...
    output: PathBuf,

    /// Pipeline description (JSON).
    #[arg(long)]
    config: PathBuf,

    /// Random seed; overrides the seed in the config file.
    #[arg(long)]
    seed: Option<u64>,

    /// Save the sampled parameters of each run as JSON.
    #[arg(long)]
    save_params: Option<PathBuf>,

    /// Replay parameters saved by an earlier run instead of sampling.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Number of variants to write.
    #[arg(long, default_value = "1")]
    repeat: usize,

    /// Print the sampled parameters of each run to stdout.
    #[arg(long)]
    print_params: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = PipelineConfig::load(&cli.config)?;
    let seed = cli.seed.or(config.seed);
    let root = config.build()?;
    let mut augmenter = match seed {
        Some(seed) => Augmenter::new(root, seed),
        None => Augmenter::from_entropy(root),
    };
    if let Some(ref replay) = cli.replay {
        augmenter.replay_parameters(replay)?;
    }

    let decoded = default_decoder().decode(&cli.input)?;
    log::info!(
        "{}: {} channel(s), {} Hz, {:.2}s",
        cli.input.display(),
        decoded.waveform.channels(),
        decoded.sample_rate,
        decoded.waveform.duration(decoded.sample_rate)
    );

    let encoder = HoundEncoder;
    for i in 0..cli.repeat {
        let output = augmenter.run(decoded.waveform.clone(), decoded.sample_rate)?;
        let output_path = variant_path(&cli.output, i, cli.repeat);
        encoder.encode(&output_path, &output, decoded.sample_rate)?;
        eprintln!("Wrote {}", output_path.display());

        if let Some(ref save_params) = cli.save_params {
            augmenter.save_parameters(&variant_path(save_params, i, cli.repeat))?;
        }
        if cli.print_params {
            println!("{}", serde_json::to_string(&augmenter.parameters())?);
        }
    }

    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !cli.config.exists() {
        return Err(format!("Config file not found: {}", cli.config.display()).into());
    }
    if cli.repeat == 0 {
        return Err("--repeat must be at least 1".into());
    }
    if cli.replay.is_some() && cli.save_params.is_some() {
        return Err("--replay and --save-params are mutually exclusive".into());
    }
    Ok(())
}

/// `out.wav` stays as is for a single run; otherwise becomes `out_<i>.wav`.
fn variant_path(path: &Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{index}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{index}"),
    };
    path.with_file_name(name)
}
