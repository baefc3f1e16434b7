//! Policy ingestion for pacekeeper
//!
//! Turns policy text into a validated [`Policy`] or nothing at all. This
//! crate never errors outward: malformed text, unreadable files, and
//! documents without the framework marker all resolve to "no policy", which
//! the engine treats as "always proceed".
//!
//! Candidate locations are probed in precedence order, closest scope first;
//! the first location that parses to an accepted policy wins.

mod policy;
mod scan;

pub use policy::*;
pub use scan::*;

use std::path::PathBuf;

/// Parse policy text. Returns `None` for anything that is not a complete,
/// marker-carrying policy.
pub fn parse_policy(text: &str) -> Option<Policy> {
    Policy::from_value(&parse_document(text))
}

/// Load the first valid policy from `paths`, probed in order.
pub fn load_policy(paths: &[PathBuf]) -> Option<Policy> {
    for path in paths {
        let Ok(text) = std::fs::read_to_string(path) else {
            continue;
        };
        if let Some(policy) = parse_policy(&text) {
            tracing::debug!(path = %path.display(), "Policy loaded");
            return Some(policy);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_text(marker: &str, start: &str) -> String {
        format!(
            "framework: {marker}\nschedule:\n  allowed_hours:\n    start: \"{start}\"\n    end: \"17:00\"\n"
        )
    }

    #[test]
    fn load_returns_none_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![dir.path().join("missing.yml")];
        assert!(load_policy(&paths).is_none());
    }

    #[test]
    fn closest_scope_wins() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project.yml");
        let global = dir.path().join("global.yml");
        std::fs::write(&project, policy_text(FRAMEWORK_MARKER, "08:00")).unwrap();
        std::fs::write(&global, policy_text(FRAMEWORK_MARKER, "10:00")).unwrap();

        let policy = load_policy(&[project, global]).unwrap();
        assert_eq!(policy.allowed_hours.start.hour, 8);
    }

    #[test]
    fn invalid_candidate_falls_through_to_next() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project.yml");
        let global = dir.path().join("global.yml");
        // Wrong marker in the project file: not a policy, keep probing
        std::fs::write(&project, policy_text("other-framework", "08:00")).unwrap();
        std::fs::write(&global, policy_text(FRAMEWORK_MARKER, "10:00")).unwrap();

        let policy = load_policy(&[project, global]).unwrap();
        assert_eq!(policy.allowed_hours.start.hour, 10);
    }

    #[test]
    fn unreadable_and_garbage_files_yield_none() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = dir.path().join("garbage.yml");
        std::fs::write(&garbage, ": : : [[[").unwrap();
        assert!(load_policy(&[garbage, dir.path().join("missing.yml")]).is_none());
    }
}
