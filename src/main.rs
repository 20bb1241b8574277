use std::path::PathBuf;

use anyhow::{Context, Result};
use attention_demos::{init_logging, run_demo, DemoConfig, Variant};
use clap::Parser;

fn main() {
    if let Err(err) = run() {
        eprintln!("attention demo failed: {err:#}");
        std::process::exit(1);
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Scaled dot-product self-attention walkthroughs", long_about = None)]
struct Args {
    #[arg(long, value_enum, default_value_t = Variant::Single, help = "Which walkthrough to run")]
    variant: Variant,

    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "TOML or JSON file with walkthrough hyperparameters"
    )]
    config: Option<PathBuf>,

    #[arg(long, help = "Sentence to tokenize and attend over")]
    sentence: Option<String>,

    #[arg(long, help = "Seed for embedding and projection parameters")]
    seed: Option<u64>,

    #[arg(long, help = "Number of heads for the multi-head walkthrough")]
    heads: Option<usize>,

    #[arg(long, help = "Apply the causal mask regardless of variant")]
    causal: bool,

    #[arg(short, long, help = "Log pipeline progress at debug level")]
    verbose: bool,
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => DemoConfig::from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => DemoConfig::default(),
    };
    if let Some(sentence) = args.sentence {
        config.sentence = sentence;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(heads) = args.heads {
        if args.variant != Variant::MultiHead {
            log::warn!("--heads {heads} has no effect on the {} walkthrough", args.variant);
        }
        config.heads = heads;
    }
    if args.causal {
        config.causal = Some(true);
    }

    let stdout = std::io::stdout();
    run_demo(args.variant, &config, &mut stdout.lock())
        .with_context(|| format!("running the {} walkthrough", args.variant))?;
    Ok(())
}
