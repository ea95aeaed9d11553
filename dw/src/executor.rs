//! Document Executor
//!
//! Drives a full run: populate a registry, build the root scope from the
//! command-line defines, execute root templates and stream the results into
//! one output sink.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::args::{Bindings, parse_args};
use crate::config::Config;
use crate::discovery::{DiscoveryPolicy, WalkDiscovery, source_files, split_document};
use crate::error::{CompileError, Result};
use crate::helpers::{Capabilities, Invoker};
use crate::markdown::MarkdownRenderer;
use crate::registry::{Delimiters, RegistryOptions, TemplateRegistry};
use crate::scope::Scope;

/// How positional inputs map onto registries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileMode {
    /// Every input is a root document with its own registry and scope
    Isolated,
    /// Inputs are compiled in order into one registry, then `root` (or the
    /// last input) is executed once
    Shared { root: Option<String> },
}

/// A root template plus the directory its sources live in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source_root: PathBuf,
    pub name: String,
}

impl Document {
    pub fn from_path(path: &Path) -> Self {
        let (source_root, name) = split_document(path);
        Self { source_root, name }
    }
}

/// One compilation run
pub struct DocumentExecutor<'a> {
    config: &'a Config,
    delimiters: Delimiters,
    defines: Bindings,
}

impl<'a> DocumentExecutor<'a> {
    /// Parse `defines` as `key=value` literals; a malformed one is fatal
    pub fn new<S: AsRef<str>>(config: &'a Config, delimiters: Delimiters, defines: &[S]) -> Result<Self> {
        let defines = parse_args(defines)?;
        debug!(?defines, ?delimiters, "DocumentExecutor::new: called");
        Ok(Self {
            config,
            delimiters,
            defines,
        })
    }

    /// Open `output` and compile `inputs` into it
    pub fn run(&self, mode: &CompileMode, inputs: &[PathBuf], output: &Path) -> Result<()> {
        debug!(?mode, ?inputs, ?output, "DocumentExecutor::run: called");
        if inputs.iter().any(|input| same_file(input, output)) {
            return Err(CompileError::OutputIsInput {
                path: output.to_path_buf(),
            });
        }
        let file = File::create(output).map_err(|source| CompileError::OutputOpen {
            path: output.to_path_buf(),
            source,
        })?;
        let mut sink = BufWriter::new(file);

        match mode {
            CompileMode::Isolated => {
                for input in inputs {
                    self.execute_document(&Document::from_path(input), &mut sink)?;
                }
            }
            CompileMode::Shared { root } => {
                self.execute_shared(inputs, root.as_deref(), &mut sink)?;
            }
        }

        sink.flush().map_err(|source| CompileError::OutputWrite {
            path: output.to_path_buf(),
            source,
        })?;
        info!("Wrote {}", output.display());
        Ok(())
    }

    /// Discover, compile and execute a single document in its own registry
    pub fn execute_document<W: Write>(&self, document: &Document, sink: W) -> Result<()> {
        info!("Compiling document {} in {}", document.name, document.source_root.display());
        let (mut registry, invoker) = self.prepare(&document.source_root);

        let discovery = WalkDiscovery::new(self.discovery_policy());
        for relative in source_files(&discovery, &document.source_root)? {
            registry.compile_file(&document.source_root, &relative)?;
        }

        self.execute(&registry, &invoker, &document.name, sink)
    }

    /// Compile `files` in order into one registry and execute the root
    pub fn execute_shared<W: Write>(&self, files: &[PathBuf], root: Option<&str>, sink: W) -> Result<()> {
        let source_root = PathBuf::from(".");
        let (mut registry, invoker) = self.prepare(&source_root);

        let mut last = None;
        for file in files {
            let (_, name) = split_document(file);
            let text = std::fs::read_to_string(file).map_err(|source| CompileError::Read {
                path: file.clone(),
                source,
            })?;
            info!("Compiling template {} from {}", name, file.display());
            registry.compile(&name, &text)?;
            last = Some(name);
        }

        let root = root.map(str::to_string).or(last).ok_or_else(|| CompileError::TemplateNotFound {
            name: "<no inputs>".to_string(),
        })?;
        self.execute(&registry, &invoker, &root, sink)
    }

    fn execute<W: Write>(&self, registry: &TemplateRegistry, invoker: &Invoker, name: &str, sink: W) -> Result<()> {
        debug!(templates = ?registry.names(), "DocumentExecutor::execute: registry populated");
        if !registry.contains(name) {
            return Err(CompileError::TemplateNotFound { name: name.to_string() });
        }
        info!("Executing {}", name);
        registry.render_to(name, &invoker.current(), sink)
    }

    fn prepare(&self, source_root: &Path) -> (TemplateRegistry, Arc<Invoker>) {
        let templates = &self.config.templates;
        let invoker = Arc::new(Invoker::new(
            Scope::root(&self.defines),
            source_root,
            templates.max_depth,
        ));

        let mut registry = TemplateRegistry::new(RegistryOptions {
            delimiters: self.delimiters,
            markup_extensions: templates.markup_extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
            strict: templates.strict,
        });
        registry.install(Capabilities::builtin(
            invoker.clone(),
            MarkdownRenderer::new(self.config.markdown.clone()),
            &self.config.process,
        ));
        (registry, invoker)
    }

    fn discovery_policy(&self) -> DiscoveryPolicy {
        if self.config.discovery.recursive {
            DiscoveryPolicy::Recursive
        } else {
            DiscoveryPolicy::Flat
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
