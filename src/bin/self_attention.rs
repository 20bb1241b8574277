use anyhow::{Context, Result};
use attention_demos::{init_logging, run_demo, DemoConfig, Variant};

fn main() -> Result<()> {
    init_logging(false);
    let stdout = std::io::stdout();
    run_demo(Variant::Single, &DemoConfig::default(), &mut stdout.lock())
        .context("self attention walkthrough failed")?;
    Ok(())
}
