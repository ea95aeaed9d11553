//! docweave - template-composition document compiler
//!
//! Resolves a tree of template sources into rendered output. Templates call
//! each other as parameterized macros, embed markdown that is expanded by the
//! same engine before HTML conversion, and read variables from a lexically
//! scoped chain seeded by command-line defines.
//!
//! # Modules
//!
//! - [`scope`] - immutable scope chain with parent fallback
//! - [`args`] - `key=value` argument and relaxed boolean parsing
//! - [`registry`] - named templates and per-file delimiter override
//! - [`helpers`] - `macro`, `markdown`, `value`, `include`, `closure`
//! - [`markdown`] - markdown to HTML with anchors and table of contents
//! - [`executor`] - discovery, compilation and execution of documents
//! - [`process`] - external program adapter with timeouts
//!
//! # Example
//!
//! ```ignore
//! use docweave::{CompileMode, Config, Delimiters, DocumentExecutor};
//!
//! let config = Config::default();
//! let exec = DocumentExecutor::new(&config, Delimiters::Standard, &["title=Docs"])?;
//! exec.run(&CompileMode::Isolated, &["site/index.html".into()], "public/index.html".as_ref())?;
//! ```

pub mod args;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod helpers;
pub mod markdown;
pub mod process;
pub mod registry;
pub mod scope;
pub mod server;

pub use args::{Bindings, parse_args, parse_bool};
pub use config::Config;
pub use discovery::{DiscoveredEntry, Discovery, DiscoveryPolicy, WalkDiscovery};
pub use error::{CompileError, Result};
pub use executor::{CompileMode, Document, DocumentExecutor};
pub use helpers::{Capabilities, Invoker};
pub use markdown::{MarkdownConfig, MarkdownRenderer};
pub use registry::{Delimiters, RegistryOptions, TemplateRegistry};
pub use scope::Scope;
