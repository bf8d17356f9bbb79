use std::path::Path;

use anyhow::{Context, Result, bail};

use capsim_core::CapsimConfig;

/// Write a scaffold capsim.toml to `path`.
pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }

    let content = CapsimConfig::scaffold().to_toml_string()?;
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    println!("✓ Generated {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_loadable_scaffold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capsim.toml");
        init(&path, false).unwrap();

        let loaded = CapsimConfig::from_file(&path).unwrap();
        assert_eq!(loaded, CapsimConfig::scaffold());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capsim.toml");
        std::fs::write(&path, "keep me").unwrap();

        assert!(init(&path, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");

        init(&path, true).unwrap();
        assert!(CapsimConfig::from_file(&path).is_ok());
    }
}
