use hio_extractor::config::ExtractorConfig;
use hio_extractor::git;
use hio_extractor::logging;
use hio_extractor::scheduled::RunScheduler;

use std::path::PathBuf;
use std::process;

/// Exit code when the export directory cannot be turned into a repository
const EXIT_REPOSITORY: i32 = 7;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);

    let config = match ExtractorConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_fallback_logging();
            tracing::error!("{}", e);
            process::exit(e.exit_code());
        }
    };

    let _logging_guard = logging::init_logging(&config.log_dir, "hio-extractor", &config.log_level)?;

    tracing::info!("HIO timetable extractor starting...");
    tracing::info!(
        "Instance {}, exporting to {}",
        config.hio_instance,
        config.export_dir.display()
    );

    if let Err(e) = git::init_repository(&config.export_dir, &config.git_url) {
        tracing::error!("{}", e);
        process::exit(EXIT_REPOSITORY);
    }

    RunScheduler::for_config(config).run().await;

    Ok(())
}
