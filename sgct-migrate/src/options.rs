//! Conversion options, loadable from a TOML or JSON file.
//!
//! ```toml
//! validation = "Strict"
//!
//! [foreign]
//! master_address = "10.0.0.1"
//! base_port = 30400
//! ```

use std::path::Path;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

/// What to do with the schema validation result of a converted document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationPolicy {
    /// Validate and report, but always hand out the converted text.
    #[default]
    BestEffort,
    /// Treat a schema violation as a conversion failure.
    Strict,
    /// Do not run the validator.
    Skip,
}

/// Values synthesized by the foreign-format transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForeignDefaults {
    pub master_address: String,
    /// Prefix of MPCDI buffer ids, followed by the node number.
    pub buffer_prefix: String,
    /// Prefix of the generated node addresses, followed by the node number.
    pub address_prefix: String,
    /// Node `n` listens on `base_port + n`.
    pub base_port: u16,
    pub eye_separation: f64,
    /// Factor between the buffer size and the window render resolution.
    pub render_scale: f64,
}

impl Default for ForeignDefaults {
    fn default() -> Self {
        Self {
            master_address: "localhost".to_string(),
            buffer_prefix: "surface".to_string(),
            address_prefix: "DSGP".to_string(),
            base_port: 20400,
            eye_separation: 0.065,
            render_scale: 2.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub validation: ValidationPolicy,
    pub foreign: ForeignDefaults,
}

impl ConvertOptions {
    /// Reads options from `path`; the extension selects the format.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let ext = path
            .extension()
            .map(|s| format!("{}", s.display()))
            .unwrap_or_default();
        Self::from_str_ext(&content, &ext)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn from_str_ext(s: &str, ext: &str) -> anyhow::Result<Self> {
        let options = match ext {
            "json" => serde_json::from_str::<Self>(s)?,
            "toml" => toml::from_str::<Self>(s)?,
            _ => {
                bail!("unsupported options file extension: {ext:?}");
            }
        };
        debug!("loaded conversion options: {options:?}");
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let options = ConvertOptions::default();
        assert_eq!(options.validation, ValidationPolicy::BestEffort);
        assert_eq!(options.foreign.base_port, 20400);
        assert_eq!(options.foreign.address_prefix, "DSGP");
    }

    #[test]
    fn test_load_toml_with_partial_table() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "validation = \"Strict\"\n\n[foreign]\nbase_port = 30400\n"
        )
        .unwrap();

        let options = ConvertOptions::load(file.path()).unwrap();
        assert_eq!(options.validation, ValidationPolicy::Strict);
        assert_eq!(options.foreign.base_port, 30400);
        assert_eq!(options.foreign.master_address, "localhost");
    }

    #[test]
    fn test_load_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "validation": "Skip" }}"#).unwrap();

        let options = ConvertOptions::load(file.path()).unwrap();
        assert_eq!(options.validation, ValidationPolicy::Skip);
        assert_eq!(options.foreign, ForeignDefaults::default());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConvertOptions::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("unsupported options file extension"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConvertOptions::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }
}
