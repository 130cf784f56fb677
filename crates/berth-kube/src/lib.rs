//! Berth Kube - compose to Kubernetes manifest generation
//!
//! Takes a normalized compose [`Document`](berth_compose::Document) and
//! produces Kubernetes manifests, one service at a time:
//!
//! | Compose                  | Kubernetes              |
//! |--------------------------|-------------------------|
//! | service                  | `Deployment`            |
//! | `ports`                  | `Service`               |
//! | `environment`            | `ConfigMap`             |
//! | named volume mount       | `PersistentVolumeClaim` |
//! | top-level `volumes` entry| `PersistentVolume`      |
//!
//! Conversion never stops at the first problem. A service with a bad port
//! still gets its Deployment, a service without an image does not prevent
//! its siblings from converting, and features Kubernetes has no answer for
//! (`depends_on`, custom networks, `pid: host`, ...) become warnings with a
//! suggested alternative.
//!
//! # Example
//!
//! ```
//! use berth_kube::{GeneratorOptions, convert};
//!
//! let compose = r#"
//! services:
//!   web:
//!     image: nginx:1.25
//!     ports: ["8080:80"]
//!     depends_on: [api]
//! "#;
//!
//! let result = convert(compose, "docker-compose", &GeneratorOptions::default());
//! assert!(result.success);
//! assert_eq!(result.files.len(), 2);
//!
//! for warning in &result.warnings {
//!     println!("{}", warning);
//! }
//! ```

pub mod advisor;
pub mod converter;
pub mod error;
pub mod generator;
pub mod options;
pub mod registry;

// Re-exports
pub use converter::{ComposeConverter, ConversionResult, GeneratedFile, Outcome, convert_document};
pub use error::{
    ConversionError, ConversionWarning, ConvertError, ErrorCode, Result, WarningCategory,
    WarningCode, WarningSeverity,
};
pub use generator::{Generated, Manifest, generate_service};
pub use options::{GeneratorOptions, ImagePullPolicy, ParseOptionError, ServiceType};
pub use registry::{Converter, ConverterInfo, ConverterRegistry, default_registry};

/// Convert a document with the converter registered for `content_type`
///
/// Never fails as a whole: an unknown type or an unparsable document comes
/// back as a result with `success == false` and a single error.
pub fn convert(content: &str, content_type: &str, options: &GeneratorOptions) -> ConversionResult {
    default_registry().convert(content, content_type, options)
}

/// Check that a document parses, without generating anything
pub fn validate(content: &str, content_type: &str) -> Result<()> {
    default_registry().validate(content, content_type)
}
