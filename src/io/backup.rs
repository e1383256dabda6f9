use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

/// Copy the database file to a timestamped path in the backup directory,
/// creating the directory if needed. Returns `Ok(None)` when there is no
/// database file yet (nothing to back up is not an error). Read-only with
/// respect to the ledger.
pub fn backup_database(db_path: &Path, backup_dir: &Path) -> Result<Option<PathBuf>> {
    if !db_path.exists() {
        return Ok(None);
    }

    std::fs::create_dir_all(backup_dir).with_context(|| {
        format!("Failed to create backup directory {}", backup_dir.display())
    })?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let backup_file = backup_dir.join(format!("fiado_backup_{}.db", timestamp));

    std::fs::copy(db_path, &backup_file).with_context(|| {
        format!(
            "Failed to copy {} to {}",
            db_path.display(),
            backup_file.display()
        )
    })?;

    Ok(Some(backup_file))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_backup_copies_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("fiado.db");
        std::fs::write(&db_path, b"ledger bytes").unwrap();

        let backup_dir = temp_dir.path().join("backups");
        let result = backup_database(&db_path, &backup_dir).unwrap();

        let backup_file = result.expect("backup should be created");
        assert!(backup_file.starts_with(&backup_dir));
        assert_eq!(std::fs::read(&backup_file).unwrap(), b"ledger bytes");
    }

    #[test]
    fn test_backup_without_database_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("missing.db");
        let backup_dir = temp_dir.path().join("backups");

        let result = backup_database(&db_path, &backup_dir).unwrap();
        assert!(result.is_none());
    }
}
