use anyhow::{Context, Result};
use sociachat_etl::Config;
use sociachat_search::retrieve;

pub fn run_query(config: &Config, text: &str) -> Result<()> {
    config.validate_query()?;

    let client = config
        .open_client()
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;
    let collection = client.get_collection(&config.collection_name)?;

    let summary = retrieve(&collection, text, &config.retrieve_options())?;
    println!("{summary}");

    Ok(())
}
