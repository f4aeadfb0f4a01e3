//! `plait_core` is the engine behind [plait](https://github.com/plait-rs/plait), a server-side markup templating engine. It turns a document with custom element tags and `${...}` variables into plain text by merging it into a master template, expanding tags through pluggable tag libraries and substituting variables from a data context.
//!
//! ## Processing Pipeline
//!
//! ```text
//! raw document
//!   → Composer (taglib declarations, master merge, part inclusion)
//!   → Normalizer (prefix tags → shared marker, ${expr} → ${fingerprint:expr})
//!   → Compiled-template cache (keyed by the raw document fingerprint)
//!   → Expander (span locator + tag registry, outside-in)
//!   → Resolver (variables against the data context)
//! ```
//!
//! ## Documents
//!
//! ```html
//! <taglib prefix="ui" namespace="acme.ui" />
//! <page:template file="layout.html" />
//! <page:content id="body">
//!   <core:if exp="user.admin">
//!     <core:link href="/admin">Admin</core:link>
//!     <else>Hello ${user.name}</else>
//!   </core:if>
//! </page:content>
//! ```
//!
//! Tags are addressed as `prefix:name`. The `core` prefix maps to the
//! built-in `plait.core` library holding `if` and `link`; other prefixes are
//! declared inline with `<taglib />`, in `plait.toml` or through
//! [`Engine::with_taglib`]. A tag renders from its raw inner content before
//! any nested tag is touched, so a branch the `if` tag discards is never
//! expanded.
//!
//! ## Key Types
//!
//! - [`Engine`]: Renders files and strings end to end.
//! - [`Tag`]: The contract custom tags implement.
//! - [`TagLibrary`] / [`TagRegistry`]: Tag factories grouped by namespace.
//! - [`DataContext`]: The nested value graph variables resolve against.
//! - [`PlaitConfig`]: Configuration loaded from `plait.toml`.
//! - [`CompiledTemplateCache`]: Normalized documents stored by fingerprint.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plait_core::DataContext;
//! use plait_core::Engine;
//! use serde_json::json;
//! use std::path::Path;
//!
//! let engine = Engine::new();
//! let context = DataContext::from(json!({ "user": { "name": "Ana" } }));
//! let html = engine.render_file(Path::new("views/home.html"), &context).unwrap();
//! println!("{html}");
//! ```

pub use cache::*;
pub use composer::Composed;
pub use composer::compose;
pub use config::*;
pub use context::*;
pub use data::*;
pub use engine::*;
pub use error::*;
pub use expander::*;
pub use fingerprint::*;
pub use locator::TagSpan;
pub use locator::find_span;
pub use markup::strip_bom;
pub use normalizer::normalize;
pub use registry::*;
pub use resolver::resolve;
pub use tag::*;

mod cache;
mod composer;
pub mod config;
mod context;
mod data;
mod engine;
#[allow(unused_assignments)]
mod error;
mod expander;
mod fingerprint;
pub mod locator;
pub(crate) mod markup;
mod normalizer;
pub(crate) mod placeholder;
mod registry;
mod resolver;
mod tag;
pub mod tags;
