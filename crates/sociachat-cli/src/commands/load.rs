use anyhow::{Context, Result};
use sociachat_etl::{build_pipeline, Config, LoadJob};

pub async fn run_load(config: Config) -> Result<()> {
    tracing::info!(
        "Loading {} into {}",
        config.data_dir.display(),
        config.collection_name
    );

    let parent = config
        .database_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
    let state_path = parent.join("pipeline.db");

    let workflow = build_pipeline(config).context("Failed to build pipeline")?;

    // Create a state store for the pipeline
    let mut store = treadle::SqliteStateStore::open(&state_path)
        .await
        .context("Failed to open pipeline state store")?;

    // Every load is a fresh work item so the state store never skips it
    let load_job = LoadJob::new(format!("load-{}", uuid::Uuid::new_v4()));

    // Subscribe to events for progress display
    let mut events = workflow.subscribe();
    let progress = tokio::spawn(async move {
        let mut failure = None;
        while let Ok(event) = events.recv().await {
            match event {
                treadle::WorkflowEvent::StageStarted { stage, .. } => {
                    eprintln!("  [{stage}] Starting...");
                }
                treadle::WorkflowEvent::StageCompleted { stage, .. } => {
                    eprintln!("  [{stage}] Complete");
                }
                treadle::WorkflowEvent::StageFailed { stage, error, .. } => {
                    eprintln!("  [{stage}] FAILED: {error}");
                    if failure.is_none() {
                        failure = Some(error);
                    }
                }
                _ => {}
            }
        }
        failure
    });

    // Execute the workflow
    workflow
        .advance(&load_job, &mut store)
        .await
        .context("Pipeline execution failed")?;

    // Closing the workflow ends the event stream
    drop(workflow);
    if let Some(error) = progress.await.context("Progress reporter panicked")? {
        anyhow::bail!("Load failed: {error}");
    }

    Ok(())
}
