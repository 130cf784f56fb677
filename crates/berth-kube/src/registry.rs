//! Named converter lookup
//!
//! Maps content-type strings to converters. Lookups take a shared lock and
//! registration an exclusive one, so a registry can sit behind a `'static`
//! and serve concurrent requests.

use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::converter::{ComposeConverter, ConversionResult};
use crate::error::{ConvertError, Result, errors};
use crate::options::GeneratorOptions;

/// A document converter selectable by content type
pub trait Converter: Send + Sync {
    /// Unique converter name
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Content types this converter accepts
    fn supported_types(&self) -> &[&'static str];

    /// Convert a document. Never fails as a whole: problems are reported
    /// inside the result.
    fn convert(&self, content: &str, options: &GeneratorOptions) -> ConversionResult;

    /// Check that a document can be parsed, without generating anything
    fn validate(&self, content: &str) -> Result<()>;

    fn supports(&self, content_type: &str) -> bool {
        let wanted = content_type.trim();
        self.supported_types()
            .iter()
            .any(|t| t.eq_ignore_ascii_case(wanted))
    }
}

/// Converter listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConverterInfo {
    pub name: String,
    pub description: String,
    pub types: Vec<String>,
}

/// Thread-safe converter registry
pub struct ConverterRegistry {
    converters: RwLock<IndexMap<String, Arc<dyn Converter>>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            converters: RwLock::new(IndexMap::new()),
        }
    }

    /// Create a registry holding the built-in converters
    pub fn with_defaults() -> Self {
        let compose: Arc<dyn Converter> = Arc::new(ComposeConverter);
        let mut converters = IndexMap::new();
        converters.insert(compose.name().to_string(), compose);
        Self {
            converters: RwLock::new(converters),
        }
    }

    /// Register a converter; names must be unique
    pub fn register(&self, converter: Arc<dyn Converter>) -> Result<()> {
        let mut converters = self
            .converters
            .write()
            .map_err(|_| ConvertError::RegistryPoisoned)?;

        let name = converter.name().to_string();
        if converters.contains_key(&name) {
            return Err(ConvertError::DuplicateConverter(name));
        }
        tracing::debug!(converter = %name, "registered converter");
        converters.insert(name, converter);
        Ok(())
    }

    /// Look up a converter by name
    pub fn get(&self, name: &str) -> Result<Option<Arc<dyn Converter>>> {
        let converters = self
            .converters
            .read()
            .map_err(|_| ConvertError::RegistryPoisoned)?;
        Ok(converters.get(name).cloned())
    }

    /// First converter (in registration order) accepting a content type
    pub fn for_type(&self, content_type: &str) -> Result<Arc<dyn Converter>> {
        let converters = self
            .converters
            .read()
            .map_err(|_| ConvertError::RegistryPoisoned)?;
        converters
            .values()
            .find(|c| c.supports(content_type))
            .cloned()
            .ok_or_else(|| ConvertError::UnsupportedType(content_type.to_string()))
    }

    /// Every registered converter
    pub fn list(&self) -> Result<Vec<ConverterInfo>> {
        let converters = self
            .converters
            .read()
            .map_err(|_| ConvertError::RegistryPoisoned)?;
        Ok(converters
            .values()
            .map(|c| ConverterInfo {
                name: c.name().to_string(),
                description: c.description().to_string(),
                types: c.supported_types().iter().map(|t| t.to_string()).collect(),
            })
            .collect())
    }

    /// Every accepted content type, in registration order
    pub fn supported_types(&self) -> Result<Vec<String>> {
        Ok(self.list()?.into_iter().flat_map(|info| info.types).collect())
    }

    /// Convert with the converter registered for `content_type`
    ///
    /// An unknown type yields a failed result rather than an error.
    pub fn convert(
        &self,
        content: &str,
        content_type: &str,
        options: &GeneratorOptions,
    ) -> ConversionResult {
        match self.for_type(content_type) {
            Ok(converter) => converter.convert(content, options),
            Err(ConvertError::UnsupportedType(_)) => {
                let known = self.supported_types().unwrap_or_default();
                ConversionResult::failed(errors::unsupported_type(content_type, &known))
            }
            Err(err) => ConversionResult::failed(errors::internal(&err)),
        }
    }

    /// Validate with the converter registered for `content_type`
    pub fn validate(&self, content: &str, content_type: &str) -> Result<()> {
        self.for_type(content_type)?.validate(content)
    }
}

static DEFAULT_REGISTRY: Lazy<ConverterRegistry> = Lazy::new(ConverterRegistry::with_defaults);

/// Process-wide registry with the built-in converters, built on first use
pub fn default_registry() -> &'static ConverterRegistry {
    &DEFAULT_REGISTRY
}
