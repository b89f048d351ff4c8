use std::io::BufRead;

use anyhow::Context;
use tracing::{debug, info};

use crate::entities::actions::Action;
use crate::store::Store;

/// Counters for one replay run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Actions read and dispatched.
    pub applied: usize,
    /// Actions that changed the tree.
    pub changed: usize,
    /// Actions whose type the reducer does not handle.
    pub ignored: usize,
}

/// Feed a JSON-lines action log through `store`, one envelope per line.
/// Blank lines and lines starting with `#` are skipped.
pub fn replay<R: BufRead>(store: &mut Store, reader: R) -> anyhow::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let action = Action::from_json(trimmed).with_context(|| format!("line {line_no}"))?;
        if matches!(action, Action::Unknown(_)) {
            summary.ignored += 1;
        }

        let changed = store.dispatch(&action);
        debug!(line = line_no, action = action.kind(), changed, "replayed action");

        summary.applied += 1;
        if changed {
            summary.changed += 1;
        }
    }

    info!(
        applied = summary.applied,
        changed = summary.changed,
        ignored = summary.ignored,
        version = store.version(),
        "replay finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_blank_and_comment_lines() {
        let log = "\n# seed\n{\"type\":\"RECEIVED_TOTAL_CHANNEL_COUNT\",\"data\":3}\n   \n";
        let mut store = Store::default();
        let summary = replay(&mut store, log.as_bytes()).unwrap();
        assert_eq!(
            summary,
            ReplaySummary {
                applied: 1,
                changed: 1,
                ignored: 0,
            }
        );
        assert_eq!(store.snapshot().total_count, 3);
    }

    #[test]
    fn test_counts_unknown_actions() {
        let log = "{\"type\":\"RECEIVED_POSTS\",\"data\":{}}\n";
        let mut store = Store::default();
        let summary = replay(&mut store, log.as_bytes()).unwrap();
        assert_eq!(summary.ignored, 1);
        assert_eq!(summary.changed, 0);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let log = "{\"type\":\"LOGOUT_SUCCESS\"}\nnot json\n";
        let mut store = Store::default();
        let err = replay(&mut store, log.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }
}
