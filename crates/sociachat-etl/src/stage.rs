use treadle::{Stage, StageContext, StageOutcome};

use crate::config::Config;
use crate::error::EtlResult;
use crate::loader::{load_and_index, IndexReport};
use crate::INDEX_COMPLETE_MESSAGE;

/// The Index stage: read `config.data_dir` and add it to the collection.
#[derive(Debug)]
pub struct IndexStage {
    config: Config,
}

impl IndexStage {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn run(&self) -> EtlResult<IndexReport> {
        let client = self.config.open_client()?;
        let (_, report) = load_and_index(&client, &self.config)?;
        Ok(report)
    }
}

#[async_trait::async_trait]
impl Stage for IndexStage {
    fn name(&self) -> &str {
        "index"
    }

    async fn execute(
        &self,
        _item: &dyn treadle::WorkItem,
        _context: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        log::info!(
            "Starting index of {} into {}",
            self.config.data_dir.display(),
            self.config.collection_name
        );

        match self.run() {
            Ok(report) => {
                println!("{}", report.duplicates);
                println!("{INDEX_COMPLETE_MESSAGE}");
                Ok(StageOutcome::Complete)
            }
            Err(e) => Err(treadle::TreadleError::StageExecution(format!(
                "Index failed: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbedderKind;
    use sociachat_search::Client;
    use std::fs;
    use tempfile::TempDir;

    fn stage_for(temp_dir: &TempDir) -> IndexStage {
        IndexStage::new(Config {
            data_dir: temp_dir.path().to_path_buf(),
            database_path: temp_dir.path().join("store.db"),
            embedder: EmbedderKind::Hash,
            ..Config::default()
        })
    }

    #[test]
    fn test_run_persists_documents() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.csv"), "tweet\nhalo\nhalo\n").unwrap();

        let report = stage_for(&temp_dir).run().unwrap();
        assert_eq!(report.duplicates, 1);

        let client = Client::open(temp_dir.path().join("store.db")).unwrap();
        assert_eq!(client.get_collection("politik2").unwrap().count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_execute_completes() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.csv"), "tweet\nhalo\n").unwrap();

        let stage = stage_for(&temp_dir);
        let item = crate::LoadJob::new("test");
        let mut context = StageContext::new("test".to_string());

        let outcome = stage.execute(&item, &mut context).await.unwrap();
        assert_eq!(outcome, StageOutcome::Complete);
    }

    #[tokio::test]
    async fn test_execute_reports_stage_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.csv"), "text\nhalo\n").unwrap();

        let stage = stage_for(&temp_dir);
        let item = crate::LoadJob::new("test");
        let mut context = StageContext::new("test".to_string());

        let result = stage.execute(&item, &mut context).await;
        assert!(matches!(
            result,
            Err(treadle::TreadleError::StageExecution(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_fails_without_model_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.csv"), "tweet\nhalo\n").unwrap();

        let stage = IndexStage::new(Config {
            data_dir: temp_dir.path().to_path_buf(),
            database_path: temp_dir.path().join("store.db"),
            model_dir: temp_dir.path().join("no-model"),
            ..Config::default()
        });
        let item = crate::LoadJob::new("test");
        let mut context = StageContext::new("test".to_string());

        let result = stage.execute(&item, &mut context).await;
        match result {
            Err(treadle::TreadleError::StageExecution(message)) => {
                assert!(message.contains("ONNX model not found"));
            }
            other => panic!("expected stage error, got {other:?}"),
        }
    }

    #[test]
    fn test_completion_message() {
        assert_eq!(
            INDEX_COMPLETE_MESSAGE,
            "---- Data telah berhasil ditambahkan ke Chroma! ----"
        );
    }
}
