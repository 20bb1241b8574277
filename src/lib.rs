//! Walkthroughs of scaled dot-product self-attention over a toy sentence.
//!
//! Each [`Variant`] tokenizes the configured sentence, embeds it, projects it
//! to queries, keys and values, and prints every intermediate tensor.

pub mod config;
pub mod report;

use std::io::Write;

use candle_core::Device;
use env_logger::{Builder, Env};
use model::{run_sentence, PipelineError, PipelineOutput};
use thiserror::Error;

pub use config::{ConfigError, DemoConfig, Variant, DEFAULT_SENTENCE};

#[derive(Debug, Error)]
pub enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Installs the logger. `RUST_LOG` wins over the `verbose` default.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    // Tests and repeated calls may find a logger already installed.
    let _ = Builder::from_env(Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

pub fn setup_device() -> Device {
    if std::env::var("CANDLE_FORCE_CPU").is_ok() {
        log::info!("CANDLE_FORCE_CPU set, using CPU backend");
        return Device::Cpu;
    }
    match Device::cuda_if_available(0) {
        Ok(device) if device.is_cuda() => {
            log::info!("CUDA device selected: {device:?}");
            device
        }
        Ok(_) | Err(_) => {
            log::debug!("using CPU backend");
            Device::Cpu
        }
    }
}

/// Runs `variant` with `config` and writes the report to `out`.
pub fn run_demo<W: Write>(
    variant: Variant,
    config: &DemoConfig,
    out: &mut W,
) -> Result<PipelineOutput, DemoError> {
    config.validate_for(variant)?;
    let mut pipeline_config = config.to_pipeline_config(variant);
    pipeline_config.device = setup_device();

    log::info!(
        "running {variant} on {:?} (heads={:?}, causal={})",
        config.sentence,
        pipeline_config.heads,
        pipeline_config.causal
    );
    let (pipeline, output) = run_sentence(pipeline_config, &config.sentence)?;
    report::render(out, variant, &config.sentence, &pipeline, &output)?;
    Ok(output)
}
