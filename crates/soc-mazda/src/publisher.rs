//! Writes the state of charge where openWB picks it up

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// `soc` for charge point 1, `soc1` for any other
pub fn soc_file_path(ramdisk_dir: &Path, chargepoint: u32) -> PathBuf {
    if chargepoint == 1 {
        ramdisk_dir.join("soc")
    } else {
        ramdisk_dir.join("soc1")
    }
}

/// Plain decimal: `80`, `80.5`
pub fn format_soc(soc: f64) -> String {
    soc.to_string()
}

/// Overwrite the charge point's SoC file and return its path
pub fn publish(ramdisk_dir: &Path, chargepoint: u32, soc: f64) -> Result<PathBuf> {
    let path = soc_file_path(ramdisk_dir, chargepoint);
    std::fs::write(&path, format_soc(soc))
        .with_context(|| format!("Failed to write SoC file: {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_path_per_chargepoint() {
        let dir = Path::new("/ramdisk");
        assert_eq!(soc_file_path(dir, 1), PathBuf::from("/ramdisk/soc"));
        assert_eq!(soc_file_path(dir, 2), PathBuf::from("/ramdisk/soc1"));
        assert_eq!(soc_file_path(dir, 7), PathBuf::from("/ramdisk/soc1"));
    }

    #[test]
    fn test_format() {
        assert_eq!(format_soc(80.0), "80");
        assert_eq!(format_soc(80.5), "80.5");
        assert_eq!(format_soc(0.0), "0");
    }

    #[test]
    fn test_publish_overwrites() {
        let dir = tempfile::tempdir().unwrap();

        publish(dir.path(), 1, 55.0).unwrap();
        let path = publish(dir.path(), 1, 56.0).unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "56");
        assert!(!dir.path().join("soc1").exists());
    }

    #[test]
    fn test_publish_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(publish(&missing, 2, 10.0).is_err());
    }
}
