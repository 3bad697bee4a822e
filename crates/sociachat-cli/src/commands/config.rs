use anyhow::{Context, Result};
use sociachat_core::model::DistanceSpace;
use sociachat_etl::{config, Config, EmbedderKind};
use toml_edit::{value, DocumentMut};

const KEYS: &[&str] = &[
    "database_path",
    "collection_name",
    "data_dir",
    "text_column",
    "topic",
    "batch_size",
    "top_k",
    "candidate_limit",
    "distance",
    "embedder",
    "model_dir",
];

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow::anyhow!("Unknown config key: {}\n\nValid keys: {}", key, KEYS.join(", "))
}

/// Render one effective config value.
fn lookup(config: &Config, key: &str) -> Result<String> {
    let rendered = match key {
        "database_path" => config.database_path.display().to_string(),
        "collection_name" => config.collection_name.clone(),
        "data_dir" => config.data_dir.display().to_string(),
        "text_column" => config.text_column.clone(),
        "topic" => config.topic.clone(),
        "batch_size" => config.batch_size.to_string(),
        "top_k" => config.top_k.to_string(),
        "candidate_limit" => config.candidate_limit.to_string(),
        "distance" => config.distance.to_string(),
        "embedder" => config.embedder.to_string(),
        "model_dir" => config.model_dir.display().to_string(),
        _ => return Err(unknown_key(key)),
    };
    Ok(rendered)
}

/// Show the current effective configuration.
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    for key in KEYS {
        println!("  {}: {}", key, lookup(&config, key)?);
    }

    println!("\nPriority: CLI args > ENV vars (SOCIACHAT_*) > Config file > Defaults");

    Ok(())
}

/// Get a specific config value.
pub fn get_config(key: Option<String>) -> Result<()> {
    if let Some(key) = key {
        let config = Config::load()?;
        println!("{}", lookup(&config, &key)?);
    } else {
        // No key provided, show entire config file contents
        let config_path = config::config_file_path();

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            print!("{}", contents);
        } else {
            println!("Config file does not exist: {}", config_path.display());
            println!("\nRun 'sociachat config init' to create it.");
        }
    }

    Ok(())
}

/// Write `key = raw` into `contents`, keeping comments and layout.
///
/// Numeric keys are stored as integers and checked to parse.
fn edit_document(contents: &str, key: &str, raw: &str) -> Result<String> {
    let mut doc: DocumentMut = contents.parse().context("Failed to parse config file")?;

    match key {
        "batch_size" | "top_k" | "candidate_limit" => {
            let number: i64 = raw
                .parse()
                .with_context(|| format!("{key} must be a non-negative integer, got {raw:?}"))?;
            if number < 0 {
                anyhow::bail!("{key} must be a non-negative integer, got {raw:?}");
            }
            doc[key] = value(number);
        }
        "distance" => {
            let space: DistanceSpace = raw.parse()?;
            doc[key] = value(space.as_str());
        }
        "embedder" => {
            let kind: EmbedderKind = raw.parse()?;
            doc[key] = value(kind.as_str());
        }
        _ if KEYS.contains(&key) => {
            doc[key] = value(raw);
        }
        _ => return Err(unknown_key(key)),
    }

    Ok(doc.to_string())
}

/// Set a config value.
pub fn set_config(key: &str, raw: &str) -> Result<()> {
    let config_path = config::config_file_path();

    // Ensure config file exists
    config::ensure_config_file()?;

    let contents = std::fs::read_to_string(&config_path)
        .context("Failed to read config file")?;
    let updated = edit_document(&contents, key, raw)?;

    std::fs::write(&config_path, updated)
        .context("Failed to write config file")?;

    println!("Updated {} = {}", key, raw);
    println!("  in {}", config_path.display());

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    let config_path = config::config_file_path();
    println!("{}", config_path.display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("Created config file: {}", config_path.display());
        println!("\nEdit this file to configure sociachat.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_keeps_comments() {
        let updated = edit_document(config::example_config(), "topic", "ekonomi").unwrap();
        assert!(updated.contains("topic = \"ekonomi\""));
        assert!(updated.contains("# Sociachat Configuration File"));
    }

    #[test]
    fn test_edit_numeric_key() {
        let updated = edit_document("", "batch_size", "250").unwrap();
        assert_eq!(updated.trim(), "batch_size = 250");
        assert!(edit_document("", "top_k", "ten").is_err());
        assert!(edit_document("", "top_k", "-1").is_err());
    }

    #[test]
    fn test_edit_distance_is_normalized() {
        let updated = edit_document("", "distance", "Cosine").unwrap();
        assert_eq!(updated.trim(), "distance = \"cosine\"");
        assert!(edit_document("", "distance", "manhattan").is_err());
    }

    #[test]
    fn test_edit_embedder_is_checked() {
        let updated = edit_document("", "embedder", "Hash").unwrap();
        assert_eq!(updated.trim(), "embedder = \"hash\"");
        assert!(edit_document("", "embedder", "word2vec").is_err());
    }

    #[test]
    fn test_edit_uncommented_database_path() {
        let updated = edit_document("", "database_path", "/tmp/x.db").unwrap();
        assert_eq!(updated.trim(), "database_path = \"/tmp/x.db\"");
    }

    #[test]
    fn test_unknown_key() {
        assert!(edit_document("", "colour", "red").is_err());
        assert!(lookup(&Config::default(), "colour").is_err());
    }

    #[test]
    fn test_lookup_defaults() {
        let config = Config::default();
        assert_eq!(lookup(&config, "collection_name").unwrap(), "politik2");
        assert_eq!(lookup(&config, "distance").unwrap(), "l2");
        assert_eq!(lookup(&config, "batch_size").unwrap(), "5000");
        assert_eq!(lookup(&config, "embedder").unwrap(), "onnx");
    }
}
