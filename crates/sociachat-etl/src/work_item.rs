use serde::{Deserialize, Serialize};
use std::fmt;
use treadle::WorkItem;

/// One indexing run.
///
/// This is the treadle `WorkItem` that flows through the index stage. The
/// stage takes everything it reads from its [`Config`](crate::Config), so
/// the job carries only the id the state store tracks it by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadJob {
    id: String,
}

impl LoadJob {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl WorkItem for LoadJob {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for LoadJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load job {}", self.id)
    }
}
