use std::num::NonZeroUsize;

use crate::bench::{OrgId, Repeats};
use crate::error::{AppError, AppResult, ConfigError};

pub(crate) fn parse_repeats(s: &str) -> AppResult<Repeats> {
    let value = s
        .trim()
        .parse::<i64>()
        .map_err(|err| ConfigError::InvalidRepeatsNumber {
            value: s.to_owned(),
            source: err,
        })?;
    Repeats::try_from(value).map_err(AppError::from)
}

pub(crate) fn parse_worker_count(s: &str) -> Result<NonZeroUsize, ConfigError> {
    s.trim()
        .parse::<usize>()
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| ConfigError::InvalidWorkerCount {
            value: s.to_owned(),
        })
}

/// Splits a comma-separated id list; empty items are skipped, so an empty
/// string yields no ids.
pub(crate) fn parse_org_ids(s: &str) -> Result<Vec<OrgId>, ConfigError> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<OrgId>()
                .map_err(|err| ConfigError::InvalidOrgId {
                    value: item.to_owned(),
                    source: err,
                })
        })
        .collect()
}
