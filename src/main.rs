use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use digits::{
    annotation_dir, evaluate_on_custom_images, evaluate_on_labeled_set, mnist, plot, MetricsLog, Preprocessor,
    SweepConfig, SweepTrainer, Topology,
};

const STATS_FILE: &str = "digits-stats.json";

/// Hyperparameter sweeps and evaluation for MNIST digit classifiers
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Train one model per hyperparameter combination and keep the best
    Train {
        /// Folder holding the MNIST IDX files (raw or gzipped)
        #[arg(long)]
        mnist: PathBuf,
        /// JSON sweep configuration; the built-in grid is used when absent
        #[arg(long)]
        config: Option<PathBuf>,
        /// Where retained models and the metrics log are written
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Score saved models on the MNIST test split and on custom photographs
    Test {
        #[arg(long)]
        mnist: PathBuf,
        /// Folder searched for `*.model.gz` files
        #[arg(long)]
        models: PathBuf,
        /// Photographs containing handwritten digits
        #[arg(long, num_args = 0..)]
        images: Vec<PathBuf>,
        /// Where annotated photographs are written
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Chart one combination's recorded metrics as HTML
    Plot {
        #[arg(long, default_value = STATS_FILE)]
        stats: PathBuf,
        /// Combination key, e.g. "(100, (300,), 16, '0.99')"
        #[arg(long)]
        key: String,
        #[arg(long, default_value = "digits-stats.html")]
        out: PathBuf,
    },
}

fn train(mnist_dir: &Path, config: Option<&Path>, out: &Path) -> Result<()> {
    let config = match config {
        Some(path) => {
            let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            SweepConfig::from_json(&json)?
        }
        None => SweepConfig::default(),
    };
    let data = mnist::load(mnist_dir).context("loading MNIST")?;

    let report = SweepTrainer::new(config).run(&data.training, &data.validation)?;

    fs::create_dir_all(out)?;
    for path in report.best.save_all(out)? {
        info!("saved {}", path.display());
    }
    report.metrics.save_json(out.join(STATS_FILE))?;
    Ok(())
}

fn test(mnist_dir: &Path, models: &Path, images: &[PathBuf], out: &Path) -> Result<()> {
    let data = mnist::load(mnist_dir).context("loading MNIST")?;
    let preprocessor = Preprocessor::default();
    fs::create_dir_all(out)?;

    let mut paths: Vec<PathBuf> = fs::read_dir(models)
        .with_context(|| format!("listing {}", models.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.to_string_lossy().ends_with(".model.gz"))
        .collect();
    paths.sort();

    for path in paths {
        let model = Topology::load(&path).with_context(|| format!("loading {}", path.display()))?;
        let accuracy = evaluate_on_labeled_set(&model, data.test.inputs.view(), data.test.targets.view());
        println!("model: {} | MNIST test accuracy: {:.2}%", path.display(), accuracy * 100.0);

        if !images.is_empty() {
            evaluate_on_custom_images(&model, images, &preprocessor, Some(&annotation_dir(out, &path)))?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    match Args::parse().command {
        Command::Train { mnist, config, out } => train(&mnist, config.as_deref(), &out),
        Command::Test {
            mnist,
            models,
            images,
            out,
        } => test(&mnist, &models, &images, &out),
        Command::Plot { stats, key, out } => {
            let log = MetricsLog::load_json(&stats).with_context(|| format!("reading {}", stats.display()))?;
            plot::plot_stats(&log, &key, &out)?;
            println!("wrote {}", out.display());
            Ok(())
        }
    }
}
