//! Compiler configuration
//!
//! Controls the pieces around the core pipeline: which C compiler the
//! `build` path invokes, where imported headers are searched for, and
//! whether the intermediate `.c` file is kept. A project can pin these
//! in an `ahoy.toml` manifest next to its sources:
//!
//! ```toml
//! [build]
//! cc = "clang"
//! include_paths = ["vendor/include"]
//! keep_c = true
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The project manifest file name.
pub const MANIFEST_NAME: &str = "ahoy.toml";

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// C compiler executable for `build`
    pub cc: String,
    /// Extra directories searched for imported headers
    pub include_paths: Vec<PathBuf>,
    /// Keep the generated `.c` file after a successful build
    pub keep_c: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            cc: "cc".to_string(),
            include_paths: Vec::new(),
            keep_c: false,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct Manifest {
    #[serde(default)]
    build: BuildSection,
}

#[derive(Debug, Deserialize, Default)]
struct BuildSection {
    cc: Option<String>,
    include_paths: Option<Vec<PathBuf>>,
    keep_c: Option<bool>,
}

impl CompilerConfig {
    /// Parse a manifest file.
    pub fn from_manifest(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let manifest: Manifest = toml::from_str(&text)
            .map_err(|e| format!("Invalid manifest {}: {}", path.display(), e))?;
        let mut config = CompilerConfig::default();
        if let Some(cc) = manifest.build.cc {
            config.cc = cc;
        }
        if let Some(paths) = manifest.build.include_paths {
            config.include_paths = paths;
        }
        if let Some(keep_c) = manifest.build.keep_c {
            config.keep_c = keep_c;
        }
        Ok(config)
    }

    /// Load `ahoy.toml` from the given directory if present, otherwise
    /// the defaults.
    pub fn load(dir: &Path) -> Result<Self, String> {
        let manifest = dir.join(MANIFEST_NAME);
        if manifest.is_file() {
            Self::from_manifest(&manifest)
        } else {
            Ok(CompilerConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.cc, "cc");
        assert!(config.include_paths.is_empty());
        assert!(!config.keep_c);
    }

    #[test]
    fn test_manifest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_NAME);
        std::fs::write(
            &path,
            "[build]\ncc = \"clang\"\ninclude_paths = [\"vendor\"]\nkeep_c = true\n",
        )
        .unwrap();
        let config = CompilerConfig::load(dir.path()).unwrap();
        assert_eq!(config.cc, "clang");
        assert_eq!(config.include_paths, vec![PathBuf::from("vendor")]);
        assert!(config.keep_c);
    }

    #[test]
    fn test_missing_manifest_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CompilerConfig::load(dir.path()).unwrap();
        assert_eq!(config.cc, "cc");
    }

    #[test]
    fn test_partial_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_NAME);
        std::fs::write(&path, "[build]\ncc = \"gcc\"\n").unwrap();
        let config = CompilerConfig::load(dir.path()).unwrap();
        assert_eq!(config.cc, "gcc");
        assert!(!config.keep_c);
    }

    #[test]
    fn test_invalid_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_NAME);
        std::fs::write(&path, "not toml [").unwrap();
        assert!(CompilerConfig::from_manifest(&path).is_err());
    }
}
