//! Model files on disk (JSON)

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use tracing::info;

use crate::{Model, ModelError};

/// Load a model, filling in any missing standard sets.
///
/// The returned model remembers `path` as its input file.
pub fn load_model(path: &Path) -> Result<Model, ModelError> {
    let text = fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut model: Model = serde_json::from_str(&text).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    model.ensure_standard_sets();
    model.set_input_file(Some(path.to_path_buf()));
    info!("loaded model '{}' from {}", model.name, path.display());
    Ok(model)
}

pub fn save_model(model: &Model, path: &Path) -> Result<(), ModelError> {
    let json = serde_json::to_string_pretty(model).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("saved model '{}' to {}", model.name, path.display());
    Ok(())
}

/// Modification time of a file
pub fn last_write_time(path: &Path) -> Result<SystemTime, ModelError> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Component, ComponentPath, BODYSET};

    #[test]
    fn test_save_then_load_keeps_structure_and_sets_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut model = Model::new("leg");
        model
            .add_component(&Model::set_path(BODYSET), Component::body("femur", 7.0, [0.0; 3], [0.1; 3]))
            .unwrap();
        save_model(&model, &path).unwrap();

        let loaded = load_model(&path).unwrap();
        assert_eq!(loaded.name, "leg");
        assert!(loaded.contains(&ComponentPath::new("/bodyset/femur")));
        assert_eq!(loaded.input_file(), Some(path.as_path()));
        assert!(last_write_time(&path).is_ok());
    }

    #[test]
    fn test_load_fills_in_missing_sets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.json");
        fs::write(&path, r#"{"name": "bare"}"#).unwrap();

        let loaded = load_model(&path).unwrap();
        assert!(loaded.contains(&ComponentPath::new("/ground")));
        assert!(loaded.contains(&ComponentPath::new("/jointset")));
    }

    #[test]
    fn test_load_reports_parse_and_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = dir.path().join("garbage.json");
        fs::write(&garbage, "not json").unwrap();
        assert!(matches!(load_model(&garbage), Err(ModelError::Parse { .. })));
        assert!(matches!(
            load_model(&dir.path().join("missing.json")),
            Err(ModelError::Io { .. })
        ));
    }
}
