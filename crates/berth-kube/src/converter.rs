//! Conversion orchestration
//!
//! Walks a normalized document service by service, runs the generator and
//! the advisor on each, serializes every produced resource, and folds it all
//! into one [`ConversionResult`]. A failure in one service or volume never
//! discards what was generated for the others.

use std::collections::HashMap;

use berth_compose::Document;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::advisor;
use crate::error::{ConversionError, ConversionWarning, Result, errors, warnings};
use crate::generator::{self, Manifest, storage};
use crate::options::GeneratorOptions;
use crate::registry::Converter;

/// A serialized resource, ready to be written out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// File name (`web-deployment.yaml`)
    pub name: String,
    /// YAML document
    pub content: String,
    /// Resource type tag (`deployment`, `service`, ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Suggested relative path (`deployments/web-deployment.yaml`)
    pub path: String,
}

/// How a conversion went, as far as a caller deciding an exit status cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No errors (warnings allowed)
    Succeeded,
    /// Some resources generated, some errors
    Partial,
    /// Errors and nothing generated
    Failed,
}

/// Result of a conversion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// True iff `errors` is empty
    pub success: bool,
    pub files: Vec<GeneratedFile>,
    pub errors: Vec<ConversionError>,
    pub warnings: Vec<ConversionWarning>,
    pub metadata: IndexMap<String, Value>,
}

impl ConversionResult {
    /// A failed result carrying a single error and no files
    pub fn failed(error: ConversionError) -> Self {
        Self {
            success: false,
            errors: vec![error],
            ..Default::default()
        }
    }

    pub fn outcome(&self) -> Outcome {
        if self.errors.is_empty() {
            Outcome::Succeeded
        } else if self.files.is_empty() {
            Outcome::Failed
        } else {
            Outcome::Partial
        }
    }

    /// All files as one multi-document YAML stream
    pub fn to_yaml_stream(&self) -> String {
        let mut stream = self
            .files
            .iter()
            .map(|file| file.content.trim_end())
            .collect::<Vec<_>>()
            .join("\n---\n");
        if !stream.is_empty() {
            stream.push('\n');
        }
        stream
    }

    /// Files of one resource type
    pub fn files_of_type<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a GeneratedFile> + 'a {
        self.files.iter().filter(move |f| f.kind == kind)
    }

    /// Get a success message
    pub fn summary(&self) -> String {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        let mut msg = format!("Generated {} file{}", self.files.len(), plural(self.files.len()));
        if !self.errors.is_empty() {
            msg.push_str(&format!(", {} error{}", self.errors.len(), plural(self.errors.len())));
        }
        if !self.warnings.is_empty() {
            msg.push_str(&format!(
                ", {} warning{}",
                self.warnings.len(),
                plural(self.warnings.len())
            ));
        }
        msg
    }
}

/// File name and path of a generated resource
///
/// `owner` is the service (or top-level volume) the resource belongs to;
/// `index` numbers the claims of one service.
fn file_location(owner: &str, manifest: &Manifest, index: usize) -> (String, String) {
    let (dir, name) = match manifest {
        Manifest::Deployment(_) => ("deployments", format!("{}-deployment.yaml", owner)),
        Manifest::Service(_) => ("services", format!("{}-service.yaml", owner)),
        Manifest::ConfigMap(_) => ("configmaps", format!("{}-configmap.yaml", owner)),
        Manifest::PersistentVolumeClaim(_) => ("pvcs", format!("{}-pvc-{}.yaml", owner, index)),
        Manifest::PersistentVolume(_) => ("volumes", format!("{}-pv.yaml", owner)),
    };
    let path = format!("{}/{}", dir, name);
    (name, path)
}

fn serialize(owner: &str, manifest: &Manifest, index: usize) -> std::result::Result<GeneratedFile, ConversionError> {
    let content = manifest.to_yaml().map_err(|e| {
        errors::yaml_marshal(&format!("{} '{}'", manifest.kind(), manifest.name()), &e)
    })?;
    let (name, path) = file_location(owner, manifest, index);
    Ok(GeneratedFile {
        name,
        content,
        kind: manifest.type_tag().to_string(),
        path,
    })
}

/// Convert a parsed document
pub fn convert_document(doc: &Document, options: &GeneratorOptions) -> ConversionResult {
    let mut result = ConversionResult::default();
    let mut services_converted = 0usize;
    let mut volumes_converted = 0usize;
    // claim name -> owning service
    let mut claim_owners: HashMap<String, String> = HashMap::new();

    for (name, service) in &doc.services {
        let mut generated = generator::generate_service(name, service, options);
        result.errors.extend(generated.errors);

        let clashes: Vec<ConversionError> = generated
            .manifests
            .iter()
            .filter(|m| matches!(m, Manifest::PersistentVolumeClaim(_)))
            .filter_map(|m| {
                claim_owners
                    .get(m.name())
                    .map(|owner| errors::duplicate_claim(name, m.name(), owner))
            })
            .collect();
        if !clashes.is_empty() {
            // The pod template would bind another service's claim.
            generated.manifests.retain(|m| {
                !matches!(m, Manifest::Deployment(_) | Manifest::PersistentVolumeClaim(_))
            });
            for err in &clashes {
                tracing::warn!(service = %name, code = %err.code, "{}", err.message);
            }
            result.errors.extend(clashes);
        }

        let mut claim_index = 0;
        for manifest in &generated.manifests {
            let index = match manifest {
                Manifest::PersistentVolumeClaim(_) => {
                    claim_index += 1;
                    claim_index - 1
                }
                _ => 0,
            };
            match serialize(name, manifest, index) {
                Ok(file) => {
                    match manifest {
                        Manifest::Deployment(_) => services_converted += 1,
                        Manifest::PersistentVolumeClaim(_) => {
                            claim_owners.insert(manifest.name().to_string(), name.clone());
                        }
                        _ => {}
                    }
                    result.files.push(file);
                }
                Err(err) => result.errors.push(err),
            }
        }

        result.warnings.extend(advisor::advise(name, service));
    }

    for (name, definition) in &doc.volumes {
        if definition.external {
            result.warnings.push(warnings::external_volume(name));
            continue;
        }
        let generated = storage::persistent_volume(name, definition, options)
            .map(Manifest::PersistentVolume)
            .and_then(|manifest| serialize(name, &manifest, 0));
        match generated {
            Ok(file) => {
                volumes_converted += 1;
                result.files.push(file);
            }
            Err(err) => {
                tracing::warn!(volume = %name, code = %err.code, "{}", err.message);
                result.errors.push(err);
            }
        }
    }

    result.success = result.errors.is_empty();
    result.metadata = IndexMap::from([
        ("services_converted".to_string(), Value::from(services_converted)),
        ("volumes_converted".to_string(), Value::from(volumes_converted)),
        ("compose_version".to_string(), Value::from(doc.version.clone())),
        ("services_total".to_string(), Value::from(doc.services.len())),
        ("files_generated".to_string(), Value::from(result.files.len())),
    ]);

    tracing::debug!(
        files = result.files.len(),
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "conversion finished"
    );

    result
}

// =============================================================================
// Compose converter
// =============================================================================

/// Converter for compose documents
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeConverter;

impl ComposeConverter {
    pub const NAME: &'static str = "docker-compose-to-kubernetes";
    pub const TYPES: [&'static str; 2] = ["docker-compose", "compose"];
}

impl Converter for ComposeConverter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Converts Docker Compose files to Kubernetes manifests"
    }

    fn supported_types(&self) -> &[&'static str] {
        &Self::TYPES
    }

    fn convert(&self, content: &str, options: &GeneratorOptions) -> ConversionResult {
        match berth_compose::parse(content) {
            Ok(doc) => convert_document(&doc, options),
            Err(err) => {
                tracing::warn!(error = %err, "compose document rejected");
                ConversionResult::failed(errors::parse_error(&err))
            }
        }
    }

    fn validate(&self, content: &str) -> Result<()> {
        berth_compose::parse(content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn convert(yaml: &str) -> ConversionResult {
        ComposeConverter.convert(yaml, &GeneratorOptions::default())
    }

    #[test]
    fn test_outcome() {
        let mut result = ConversionResult::default();
        assert_eq!(result.outcome(), Outcome::Succeeded);

        result.errors.push(ConversionError::new(ErrorCode::MissingImage, "x"));
        assert_eq!(result.outcome(), Outcome::Failed);

        result.files.push(GeneratedFile {
            name: "a.yaml".into(),
            content: "a: 1\n".into(),
            kind: "deployment".into(),
            path: "deployments/a.yaml".into(),
        });
        assert_eq!(result.outcome(), Outcome::Partial);
    }

    #[test]
    fn test_parse_error_is_single_error() {
        let result = convert("services:\n  web:\n    image: nginx\n    environment: 42\n");
        assert!(!result.success);
        assert!(result.files.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ErrorCode::ParseError);
        assert_eq!(result.errors[0].field.as_deref(), Some("services.web.environment"));
    }

    #[test]
    fn test_file_locations() {
        let result = convert(
            "services:\n  db:\n    image: postgres\n    ports: [\"5432\"]\n    environment: [A=1]\n    volumes: [\"a:/a\", \"b:/b\"]\nvolumes:\n  a:\n  b:\n",
        );
        let paths: Vec<&str> = result.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "deployments/db-deployment.yaml",
                "services/db-service.yaml",
                "configmaps/db-configmap.yaml",
                "pvcs/db-pvc-0.yaml",
                "pvcs/db-pvc-1.yaml",
                "volumes/a-pv.yaml",
                "volumes/b-pv.yaml",
            ]
        );
        assert_eq!(result.files[3].name, "db-pvc-0.yaml");
        assert_eq!(result.files[3].kind, "persistentvolumeclaim");
    }

    #[test]
    fn test_metadata() {
        let result = convert("version: \"3.9\"\nservices:\n  a:\n    image: x\n  b:\n    build: .\nvolumes:\n  data:\n");
        assert_eq!(result.metadata["services_converted"], 1);
        assert_eq!(result.metadata["services_total"], 2);
        assert_eq!(result.metadata["volumes_converted"], 1);
        assert_eq!(result.metadata["compose_version"], "3.9");
        assert_eq!(result.metadata["files_generated"], 2);
    }

    #[test]
    fn test_external_volume_warns() {
        let result = convert("services: {}\nvolumes:\n  shared:\n    external: true\n");
        assert!(result.success);
        assert!(result.files.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, crate::error::WarningCode::ExternalVolume);
    }

    #[test]
    fn test_yaml_stream() {
        let result = convert("services:\n  a:\n    image: x\n  b:\n    image: y\n");
        let stream = result.to_yaml_stream();
        assert_eq!(stream.matches("\n---\n").count(), 1);
        assert!(stream.ends_with('\n'));
        assert_eq!(ConversionResult::default().to_yaml_stream(), "");
    }

    #[test]
    fn test_summary() {
        let result = convert("services:\n  a:\n    image: x\n    depends_on: [b]\n");
        assert_eq!(result.summary(), "Generated 1 file, 1 warning");
    }

    #[test]
    fn test_validate() {
        assert!(ComposeConverter.validate("services:\n  a:\n    image: x\n").is_ok());
        assert!(ComposeConverter.validate("").is_err());
    }
}
