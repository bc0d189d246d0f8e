//! Required file resolution.

use super::elapsed_ms;
use crate::plan::ArtifactReference;
use crate::platform::process::ProcessRunner;
use crate::{CheckResult, LaunchError};
use std::path::PathBuf;
use std::time::Instant;

/// Return the first candidate that exists.
pub fn resolve(
    runner: &dyn ProcessRunner,
    check_id: &str,
    artifact: &ArtifactReference,
) -> Result<(PathBuf, CheckResult), LaunchError> {
    let start = Instant::now();

    match artifact
        .candidates
        .iter()
        .position(|candidate| runner.path_exists(candidate))
    {
        Some(index) => {
            let path = artifact.candidates[index].clone();
            let duration_ms = elapsed_ms(start);
            let result = if index == 0 {
                CheckResult::Pass {
                    message: format!("found {}", path.display()),
                    duration_ms,
                }
            } else {
                CheckResult::Pass {
                    message: format!(
                        "found {} (candidate {} of {})",
                        path.display(),
                        index + 1,
                        artifact.candidates.len()
                    ),
                    duration_ms,
                }
            };
            Ok((path, result))
        }
        None => Err(LaunchError::ArtifactMissing {
            check_id: check_id.to_string(),
            label: artifact.label.clone(),
            hint: artifact.hint.clone(),
            searched: artifact.candidates.clone(),
        }),
    }
}
