use anyhow::Result;
use sociachat_etl::Config;
use sociachat_search::Client;

pub fn show_status(config: &Config) -> Result<()> {
    let client = Client::open(&config.database_path)?;
    let collections = client.list_collections()?;

    println!("\nSociachat Status\n");
    println!("  Database: {}", config.database_path.display());
    println!("  Collections: {}", collections.len());

    for info in &collections {
        let count = client.document_count(info)?;
        println!(
            "    {} ({} documents, {}, {}, {} dims, created {})",
            info.name,
            count,
            info.embedder,
            info.space,
            info.dimensions,
            info.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    if collections.is_empty() {
        println!("\n  Run `sociachat load <DIR>` to index a directory of CSV files");
    }

    Ok(())
}
