use crate::fetcher::FetchReport;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Why a batch was refused before anything was dispatched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// Names missing from the catalog, in request order
    UnknownResources { names: Vec<String> },

    /// Two resources in the batch would write the same file
    DuplicateDestination {
        path: PathBuf,
        first: String,
        second: String,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnknownResources { names } => {
                write!(f, "unknown resource(s): {}", names.join(", "))
            }
            Rejection::DuplicateDestination {
                path,
                first,
                second,
            } => write!(
                f,
                "'{}' and '{}' both write to {}",
                first,
                second,
                path.display()
            ),
        }
    }
}

/// Result of [`FetchService::fetch`](super::FetchService::fetch)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Every task ran; individual failures are in the report
    Completed { batch_id: Uuid, report: FetchReport },
    Rejected(Rejection),
}

impl BatchOutcome {
    pub fn report(&self) -> Option<&FetchReport> {
        match self {
            BatchOutcome::Completed { report, .. } => Some(report),
            BatchOutcome::Rejected(_) => None,
        }
    }

    /// True only when the batch ran and every download succeeded
    pub fn is_success(&self) -> bool {
        self.report().is_some_and(FetchReport::is_success)
    }
}
