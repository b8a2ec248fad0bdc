//! Whole-document battery persistence.
//!
//! Load and save are blocking, all-or-nothing operations: the entire document
//! is read and the battery fully reconstructed, or the entire in-memory state
//! is serialized and written in one pass. There is no incremental or streaming
//! persistence and no partial-write recovery.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::core::errors::{NeuronormError, Result};
use crate::report::battery::Battery;

/// Serialize `battery` to pretty-printed JSON and write it to `path`.
pub fn save_battery(path: impl AsRef<Path>, battery: &Battery) -> Result<()> {
    let path = path.as_ref();
    let json = battery.to_json()?;

    fs::write(path, json)
        .map_err(|e| NeuronormError::io(format!("failed to write {}", path.display()), e))?;

    info!(
        path = %path.display(),
        domains = battery.domains().len(),
        tests = battery.test_count(),
        "battery saved"
    );
    Ok(())
}

/// Read the document at `path` and reconstruct its battery.
///
/// I/O failures surface as the I/O variant; a structurally invalid document is
/// [`MalformedDocument`](NeuronormError::MalformedDocument).
pub fn load_battery(path: impl AsRef<Path>) -> Result<Battery> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading battery document");

    let json = fs::read_to_string(path)
        .map_err(|e| NeuronormError::io(format!("failed to read {}", path.display()), e))?;
    let battery = Battery::from_json(&json)?;

    info!(
        path = %path.display(),
        domains = battery.domains().len(),
        tests = battery.test_count(),
        "battery loaded"
    );
    Ok(battery)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::core::scales::NormScale;
    use crate::report::result::TestResult;

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("battery.json");

        let mut battery = Battery::new("Baseline", "Roe, Rachel");
        battery.add_test(
            TestResult::builder("Boston Naming Test", "Language")
                .scale(NormScale::Z)
                .score(-0.8)
                .build(),
        );

        save_battery(&path, &battery).unwrap();
        let restored = load_battery(&path).unwrap();
        assert_eq!(restored, battery);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_battery(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, NeuronormError::Io { .. }));
    }

    #[test]
    fn test_load_garbage_is_malformed_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        fs::write(&path, "this is not json").unwrap();

        let err = load_battery(&path).unwrap_err();
        assert!(matches!(err, NeuronormError::MalformedDocument { .. }));
    }
}
