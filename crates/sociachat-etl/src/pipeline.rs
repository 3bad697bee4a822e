use treadle::Workflow;

use crate::config::Config;
use crate::IndexStage;

/// Build the single-stage indexing pipeline.
///
/// # Errors
/// Returns an error if the configuration is invalid or the workflow cannot
/// be built.
pub fn build_pipeline(config: Config) -> treadle::Result<Workflow> {
    config.validate_load().map_err(|e| {
        treadle::TreadleError::InvalidWorkflow(format!("Invalid configuration: {e}"))
    })?;

    Workflow::builder().stage("index", IndexStage::new(config)).build()
}
