use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use satpop::core::analysis::{analyze_labels, compute_channel_stats};
use satpop::logging::setup_logging;
use satpop::{resolve_index, Dataset, DatasetConfig, DatasetSplit, SatImageDataset, StorageProfile};

#[derive(Parser, Debug)]
#[command(author, version, about = "Satellite population dataset tools", long_about = None)]
struct Cli {
    /// Dataset config JSON; defaults to the platform config file if present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for log files
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a split and report its size and class distribution
    Inspect(DataArgs),
    /// Compute per-channel mean/std of a split as JSON
    Stats {
        #[command(flatten)]
        data: DataArgs,
        /// Write the JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Draw one augmented sample and report its shape and label
    Sample {
        #[command(flatten)]
        data: DataArgs,
        /// Sample index; negative values are rejected
        #[arg(long, allow_hyphen_values = true, default_value_t = 0)]
        index: i64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Enable random flips
        #[arg(long)]
        flip: bool,
        #[arg(long)]
        flip_prob: Option<f64>,
    },
}

#[derive(Args, Debug)]
struct DataArgs {
    #[arg(long, value_enum)]
    split: Option<SplitArg>,
    #[arg(long, value_enum)]
    storage: Option<StorageArg>,
    /// Override the root directory of the selected storage profile
    #[arg(long)]
    root: Option<PathBuf>,
    /// Number of class bins (6 or 16)
    #[arg(long)]
    classes: Option<u32>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SplitArg {
    Train,
    Test,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StorageArg {
    Local,
    Colab,
}

impl DataArgs {
    fn apply(&self, config: &mut DatasetConfig) {
        if let Some(split) = self.split {
            config.split = match split {
                SplitArg::Train => DatasetSplit::Train,
                SplitArg::Test => DatasetSplit::Test,
            };
        }
        if let Some(storage) = self.storage {
            config.storage = match storage {
                StorageArg::Local => StorageProfile::Local,
                StorageArg::Colab => StorageProfile::Colab,
            };
        }
        if let Some(root) = &self.root {
            match config.storage {
                StorageProfile::Local => config.roots.local = root.clone(),
                StorageProfile::Colab => config.roots.colab = root.clone(),
            }
        }
        if let Some(classes) = self.classes {
            config.classes = classes;
        }
    }
}

fn base_config(path: Option<&PathBuf>) -> Result<DatasetConfig> {
    match path {
        Some(path) => DatasetConfig::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(DatasetConfig::load_or_default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_dir).context("failed to set up logging")?;
    info!("Starting satpop {:?}", cli.command);

    let mut config = base_config(cli.config.as_ref())?;

    match &cli.command {
        Command::Inspect(data) => {
            data.apply(&mut config);
            let dataset = SatImageDataset::load(&config)?;
            let dist = analyze_labels(dataset.labels(), dataset.options().scheme);
            println!("split: {}", config.split.as_str());
            println!("root: {}", config.root().display());
            println!("samples: {}", dataset.len());
            for (class_id, count) in dist.counts.iter().enumerate() {
                println!(
                    "class {:>2}: {:>6} ({:.1}%)",
                    class_id,
                    count,
                    dist.get_percentage(class_id as u8)
                );
            }
            let empty = dist.empty_classes();
            if !empty.is_empty() {
                warn!("Classes without samples: {:?}", empty);
            }
        }
        Command::Stats { data, output } => {
            data.apply(&mut config);
            config.normalize = false;
            let dataset = SatImageDataset::load(&config)?;
            let stats = compute_channel_stats(dataset.images())?;
            let json = serde_json::to_string_pretty(&stats)?;
            match output {
                Some(path) => {
                    std::fs::write(path, &json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("Channel statistics written to {:?}", path);
                }
                None => println!("{}", json),
            }
        }
        Command::Sample {
            data,
            index,
            seed,
            flip,
            flip_prob,
        } => {
            data.apply(&mut config);
            config.flip |= *flip;
            if let Some(p) = flip_prob {
                config.flip_prob = *p;
            }
            let dataset = SatImageDataset::load(&config)?;
            let index = resolve_index(*index, dataset.len())?;
            let mut rng = StdRng::seed_from_u64(*seed);
            let sample = dataset.get(index, &mut rng)?;
            println!("index: {}", index);
            println!("image shape: {:?}", sample.image.dim());
            println!("flip: {:?}", sample.flip);
            println!("class: {}", sample.label.class_id());
            println!("label rows:\n{}", sample.label.rows());
        }
    }

    Ok(())
}
