use thiserror::Error;

use crate::dataset::Column;
use crate::report::ReportKind;

/// Failure of a single report computation. The dataset is untouched either way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("{report} needs column `{column}`, which the loaded data does not have")]
    MissingColumn { report: ReportKind, column: Column },
}

pub type StatsResult<T> = Result<T, StatsError>;
