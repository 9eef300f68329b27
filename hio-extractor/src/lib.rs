pub mod config;
pub mod export;
pub mod git;
pub mod logging;
pub mod scheduled;

use anyhow::Context;

use config::ExtractorConfig;

/// One complete run: extract the timetable, write the export, publish it.
pub fn run_pipeline(config: &ExtractorConfig) -> anyhow::Result<()> {
    let export = hio_core::run_extraction(&config.session_settings())
        .with_context(|| format!("extracting timetable from {}", config.hio_instance))?;

    export::write_export(&config.export_dir, &export).context("writing export files")?;
    git::publish(&config.export_dir).context("publishing export")?;

    Ok(())
}
