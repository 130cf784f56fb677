//! Berth Compose - compose document parser and field normalizer
//!
//! Compose documents are deliberately loose: most fields accept a scalar, a
//! list or a map, and several of those shapes mean the same thing. This
//! crate turns such a document into a canonical [`Document`] in which every
//! field has exactly one shape, so downstream generators never need to
//! branch on how the source was written.
//!
//! ```
//! use berth_compose::parse;
//!
//! let doc = parse(r#"
//! services:
//!   web:
//!     image: nginx:1.25
//!     environment: ["A=1", "B"]
//!     command: nginx -g "daemon off;"
//! "#).unwrap();
//!
//! let web = &doc.services["web"];
//! assert_eq!(web.environment["A"], "1");
//! assert_eq!(web.environment["B"], "");
//! assert_eq!(web.command[0], "nginx");
//! ```

pub mod error;
pub mod model;
pub mod normalize;
pub mod parser;

pub use error::{ComposeError, NormalizeError, Result};
pub use model::{
    BuildSpec, DEFAULT_VERSION, Deploy, Document, HealthCheck, Logging, NetworkAttachment,
    NetworkDefinition, ResourceSpec, Resources, Service, VolumeDefinition,
};
pub use parser::{parse, validate_port};
