//! Entry points turning raw configuration text into current JSON text.

use serde_json::Value;
use sgct_config::{SchemaValidator, ValidationReport};

use crate::{
    error::{MigrateError, Result},
    mpcdi,
    options::{ConvertOptions, ValidationPolicy},
    tree::{self, Tree},
    version,
    xml::{TreeParser, XmlTreeParser},
};

/// Output of a successful conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Pretty-printed JSON document.
    pub content: String,
    /// Schema validation outcome for `content`.
    pub report: ValidationReport,
}

/// Drives parsing, migration and validation.
///
/// The schema is compiled once per converter, so reuse one instance for
/// batches of files.
pub struct Converter<P = XmlTreeParser> {
    options: ConvertOptions,
    parser: P,
    validator: SchemaValidator,
}

impl Converter {
    /// Converter with default options.
    pub fn new() -> Result<Self> {
        Self::with_options(ConvertOptions::default())
    }

    pub fn with_options(options: ConvertOptions) -> Result<Self> {
        Self::with_parser(options, XmlTreeParser)
    }
}

impl<P: TreeParser> Converter<P> {
    /// Converter using a custom text-to-tree parser.
    pub fn with_parser(options: ConvertOptions, parser: P) -> Result<Self> {
        Ok(Self {
            options,
            parser,
            validator: SchemaValidator::new()?,
        })
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Upgrades a configuration of any supported version.
    ///
    /// `extension` is the format hint of `content` (`xml`, `.xml`, `json`, ...).
    /// XML input is parsed and migrated. Other input is read as JSON: a legacy
    /// document (no `version`, with a `Node` key) is migrated, anything else
    /// is returned byte for byte.
    pub fn migrate_version(&self, content: &str, extension: &str) -> Result<Conversion> {
        if is_xml(extension) {
            let tree = self.parser.parse(content)?;
            let migrated = Value::from(version::migrate(tree)?);
            return self.finish(&migrated);
        }

        let value: Value = serde_json::from_str(content)?;
        if is_legacy_json(&value) {
            info!("JSON input has the legacy layout, migrating");
            let migrated = Value::from(version::migrate(Tree::from(value))?);
            return self.finish(&migrated);
        }
        if let Value::Object(root) = &value {
            let version = root.get("version").cloned().map(Tree::from);
            version::classify(version.as_ref())?;
        }

        debug!("input is already current, passing it through");
        let report = self.validate(&value)?;
        Ok(Conversion {
            content: content.to_string(),
            report,
        })
    }

    /// Builds a configuration from an MPCDI descriptor.
    pub fn migrate_foreign(&self, content: &str) -> Result<Conversion> {
        let tree = self.parser.parse(content)?;
        let config = mpcdi::transform(&tree, &self.options.foreign)?;
        let mut document = serde_json::to_value(&config)?;
        tree::integral_numbers(&mut document);
        self.finish(&document)
    }

    fn finish(&self, document: &Value) -> Result<Conversion> {
        let report = self.validate(document)?;
        Ok(Conversion {
            content: serde_json::to_string_pretty(document)?,
            report,
        })
    }

    fn validate(&self, document: &Value) -> Result<ValidationReport> {
        if self.options.validation == ValidationPolicy::Skip {
            return Ok(ValidationReport::skipped());
        }
        let report = self.validator.validate(document);
        if !report.valid {
            for diagnostic in &report.diagnostics {
                warn!("schema violation: {diagnostic}");
            }
            if self.options.validation == ValidationPolicy::Strict {
                return Err(MigrateError::Invalid(report));
            }
        }
        Ok(report)
    }
}

fn is_xml(extension: &str) -> bool {
    extension
        .trim_start_matches('.')
        .eq_ignore_ascii_case("xml")
}

fn is_legacy_json(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|root| !root.contains_key("version") && root.contains_key("Node"))
}

/// [`Converter::migrate_version`] with default options.
pub fn migrate_version(content: &str, extension: &str) -> Result<String> {
    Ok(Converter::new()?.migrate_version(content, extension)?.content)
}

/// [`Converter::migrate_foreign`] with default options.
pub fn migrate_foreign(content: &str) -> Result<String> {
    Ok(Converter::new()?.migrate_foreign(content)?.content)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const LEGACY: &str = r#"<?xml version="1.0" ?>
<Cluster masterAddress="localhost">
  <Node ip="127.0.0.1" port="20401">
    <Window fullScreen="false">
      <Size x="1280" y="720" />
      <Viewport>
        <Pos x="0.0" y="0.0" />
        <Size x="1.0" y="1.0" />
        <PlanarProjection>
          <FOV down="25.267007" left="40.0" right="40.0" up="25.267007" />
          <Orientation heading="0.0" pitch="0.0" roll="0.0" />
        </PlanarProjection>
      </Viewport>
    </Window>
  </Node>
  <User eyeSeparation="0.06">
    <Pos x="0.0" y="0.0" z="0.0" />
  </User>
</Cluster>
"#;

    fn strict() -> Converter {
        Converter::with_options(ConvertOptions {
            validation: ValidationPolicy::Strict,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_xml_hint_is_case_insensitive() {
        assert!(is_xml("xml"));
        assert!(is_xml(".XML"));
        assert!(!is_xml("json"));
        assert!(!is_xml(""));
    }

    #[test]
    fn test_legacy_xml_is_migrated_and_valid() {
        let conversion = strict().migrate_version(LEGACY, ".xml").unwrap();
        assert!(conversion.report.valid, "{}", conversion.report);

        let doc: Value = serde_json::from_str(&conversion.content).unwrap();
        assert_eq!(doc["version"], json!(1));
        assert_eq!(
            doc["nodes"][0]["windows"][0]["viewports"][0]["projection"]["fov"],
            json!({ "hfov": 80, "vfov": 50.534014 })
        );
        assert_eq!(doc["users"][0]["eyeseparation"], json!(0.06));
    }

    #[test]
    fn test_current_json_passes_through_unchanged() {
        let content = "{\n    \"version\": 1,\n    \"nodes\": []\n}";
        let conversion = Converter::new()
            .unwrap()
            .migrate_version(content, "json")
            .unwrap();
        assert_eq!(conversion.content, content);
        assert!(conversion.report.valid);
    }

    #[test]
    fn test_legacy_json_is_migrated() {
        let content = json!({ "Node": [{ "ip": ["10.0.0.2"], "port": ["20401"], "Window": [] }] });
        let conversion = Converter::new()
            .unwrap()
            .migrate_version(&content.to_string(), "json")
            .unwrap();
        let doc: Value = serde_json::from_str(&conversion.content).unwrap();
        assert_eq!(
            doc,
            json!({ "version": 1, "nodes": [{ "address": "10.0.0.2", "port": 20401, "windows": [] }] })
        );
    }

    #[test]
    fn test_invalid_output_is_reported_not_fatal() {
        let conversion = Converter::new()
            .unwrap()
            .migrate_version("<Cluster masterAddress=\"localhost\"/>", "xml")
            .unwrap();
        assert!(!conversion.report.valid);
        assert!(!conversion.report.diagnostics.is_empty());
    }

    #[test]
    fn test_viewport_without_projection_is_reported() {
        let content = LEGACY.replace(
            r#"        <PlanarProjection>
          <FOV down="25.267007" left="40.0" right="40.0" up="25.267007" />
          <Orientation heading="0.0" pitch="0.0" roll="0.0" />
        </PlanarProjection>
"#,
            "",
        );
        let conversion = Converter::new()
            .unwrap()
            .migrate_version(&content, "xml")
            .unwrap();
        let doc: Value = serde_json::from_str(&conversion.content).unwrap();
        assert!(
            doc["nodes"][0]["windows"][0]["viewports"][0]
                .get("projection")
                .is_none()
        );
        assert!(!conversion.report.valid);
        assert!(
            conversion
                .report
                .diagnostics
                .iter()
                .any(|d| d.contains("projection")),
            "{}",
            conversion.report
        );
    }

    #[test]
    fn test_strict_policy_rejects_invalid_output() {
        let err = strict()
            .migrate_version("<Cluster masterAddress=\"localhost\"/>", "xml")
            .unwrap_err();
        assert!(matches!(err, MigrateError::Invalid(report) if !report.valid));
    }

    #[test]
    fn test_skip_policy() {
        let converter = Converter::with_options(ConvertOptions {
            validation: ValidationPolicy::Skip,
            ..Default::default()
        })
        .unwrap();
        let conversion = converter.migrate_version("{}", "json").unwrap();
        assert_eq!(conversion.report, ValidationReport::skipped());
    }

    #[test]
    fn test_unsupported_version_in_json() {
        let err = Converter::new()
            .unwrap()
            .migrate_version(r#"{ "version": 3, "nodes": [] }"#, "json")
            .unwrap_err();
        assert!(matches!(err, MigrateError::UnrecognizedVersion(_)));
    }

    #[test]
    fn test_parse_errors() {
        let converter = Converter::new().unwrap();
        assert!(matches!(
            converter.migrate_version("<Cluster>", "xml"),
            Err(MigrateError::Xml(_))
        ));
        assert!(matches!(
            converter.migrate_version("{", "json"),
            Err(MigrateError::Json(_))
        ));
    }

    #[test]
    fn test_current_json_with_wrapped_version() {
        let content = r#"{ "version": ["1"], "nodes": [] }"#;
        let conversion = Converter::with_options(ConvertOptions {
            validation: ValidationPolicy::Skip,
            ..Default::default()
        })
        .unwrap()
        .migrate_version(content, "json")
        .unwrap();
        assert_eq!(conversion.content, content);
    }

    #[test]
    fn test_foreign_output_writes_integral_numbers() {
        let content = r#"<MPCDI profile="3d">
  <display>
    <buffer id="surface3" Xresolution="1920" Yresolution="1080">
      <region id="A" x="0" y="0" xsize="1" ysize="1">
        <frustum>
          <yaw>0</yaw><pitch>0</pitch><roll>0</roll>
          <rightAngle>40</rightAngle><leftAngle>-40</leftAngle>
          <upAngle>20</upAngle><downAngle>-20</downAngle>
        </frustum>
      </region>
    </buffer>
  </display>
</MPCDI>"#;
        let out = Converter::new()
            .unwrap()
            .migrate_foreign(content)
            .unwrap()
            .content;
        assert!(out.contains("\"x\": 1920"), "{out}");
        assert!(out.contains("\"x\": 3840"), "{out}");
        assert!(out.contains("\"left\": 40"), "{out}");
        assert!(out.contains("\"eyeseparation\": 0.065"), "{out}");
        assert!(!out.contains(".0,") && !out.contains(".0\n"), "{out}");
    }

    #[test]
    fn test_free_functions_use_defaults() {
        let out = migrate_version(LEGACY, "xml").unwrap();
        assert!(out.starts_with("{\n  \"version\": 1,"));
    }
}
