use admin_flag::logger::*;
use admin_flag::settings::*;
use admin_flag::supervisor::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    logger.reload_from_settings(&project_settings.log)?;
    project_settings.validate()?;

    if let Some(index) = cli.worker {
        return run_worker(&project_settings, index, cli.run_id.as_deref()).await;
    }

    info!(?project_settings);
    let workers = cli
        .workers
        .or(project_settings.workers)
        .unwrap_or_else(num_cpus::get);
    if workers == 0 {
        return Err(anyhow::anyhow!("--workers must be at least 1"));
    }

    let mut args = Vec::new();
    if let Some(path) = &cli.settings {
        args.push("--settings".to_string());
        args.push(path.clone());
    }

    let supervisor = Supervisor::new(std::env::current_exe()?, args, workers);
    let exits = supervisor.run().await;
    info!(workers = exits.len(), "all workers exited");

    Ok(())
}
