//! Lowering configuration types.

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Optimization level the instruction buffer is created with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    /// Release code, no debug instrumentation
    #[default]
    Release,
    /// Debug code; intrinsics are still lowered as Release
    Debug,
}

/// Output format for lowered bodies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Disassembly listing
    #[default]
    Human,
    /// JSON array of method bodies
    Json,
}

/// Configuration for a lowering run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LowerConfig {
    pub optimization: OptimizationLevel,
    /// Default the CLI logger to trace level, which shows every emitted
    /// instruction. The library only emits `log` records and never reads this.
    pub trace: bool,
    /// Module generation recorded in each body's debug id
    pub generation: u32,
    /// First StandAloneSig row handed to intrinsics (rows are 1-based)
    pub first_signature_slot: u32,
    /// Re-verify every body after it is sealed
    pub verify: bool,
    pub format: OutputFormat,
}

impl Default for LowerConfig {
    fn default() -> Self {
        Self {
            optimization: OptimizationLevel::Release,
            trace: false,
            generation: 0,
            first_signature_slot: 1,
            verify: cfg!(debug_assertions),
            format: OutputFormat::Human,
        }
    }
}

impl LowerConfig {
    /// Load a configuration from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        Self::parse(&content).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let config: LowerConfig = toml::from_str(content).map_err(|e| e.to_string())?;
        if config.first_signature_slot == 0 {
            return Err("first_signature_slot must be at least 1".to_string());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LowerConfig::default();
        assert_eq!(config.optimization, OptimizationLevel::Release);
        assert_eq!(config.first_signature_slot, 1);
        assert_eq!(config.format, OutputFormat::Human);
    }

    #[test]
    fn test_parse_partial() {
        let config = LowerConfig::parse("generation = 2\nformat = \"json\"\n").unwrap();
        assert_eq!(config.generation, 2);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.first_signature_slot, 1);
    }

    #[test]
    fn test_parse_rejects_zero_slot() {
        let err = LowerConfig::parse("first_signature_slot = 0").unwrap_err();
        assert!(err.contains("at least 1"));
    }

    #[test]
    fn test_parse_rejects_unknown_key() {
        assert!(LowerConfig::parse("jit = true").is_err());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "optimization = \"debug\"").unwrap();
        writeln!(file, "verify = true").unwrap();
        writeln!(file, "first_signature_slot = 10").unwrap();

        let config = LowerConfig::load(file.path()).unwrap();
        assert_eq!(config.optimization, OptimizationLevel::Debug);
        assert!(config.verify);
        assert_eq!(config.first_signature_slot, 10);
    }

    #[test]
    fn test_load_missing_file() {
        let err = LowerConfig::load(Path::new("/nonexistent/calli.toml")).unwrap_err();
        assert!(err.starts_with("failed to read"));
    }
}
