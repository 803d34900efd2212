//! Rust client generation for AWS service definitions
//!
//! This crate transforms a parsed [`ServiceDefinition`] into a standalone
//! client crate:
//! - Cargo.toml and README.md
//! - the client with one method per operation
//! - input builders that serialize requests
//! - outputs, value objects and enums that parse responses
//! - paginators and waiters
//! - the runtime the generated code relies on

mod client;
mod code;
mod context;
mod deserialize;
pub mod documentation;
mod enums;
mod input;
mod output;
mod pagination;
mod serialize;
pub mod templates;
pub mod type_mapper;
pub mod usage;
mod value_object;
mod waiter;
pub mod writer;

pub use writer::{DryRunWriter, FsWriter, SourceWriter};

use context::ServiceContext;
use sdkgen_common::{naming, GeneratorError, Result, ServiceDefinition};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tera::Tera;

/// Options of one generated crate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Package name; defaults to `aws-lite-<service>`
    pub crate_name: Option<String>,
    pub crate_version: String,
    /// Operations to generate; empty selects every operation
    pub operations: Vec<String>,
    /// Generate page iterators for operations with paginator metadata
    pub paginators: bool,
    /// Generate waiters
    pub waiters: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            crate_name: None,
            crate_version: "0.1.0".to_string(),
            operations: Vec::new(),
            paginators: true,
            waiters: true,
        }
    }
}

impl GenerationOptions {
    /// Package name of the crate generated for `service`
    pub fn crate_name_for(&self, service: &ServiceDefinition) -> String {
        self.crate_name
            .clone()
            .unwrap_or_else(|| format!("aws-lite-{}", service.name.replace('_', "-")))
    }
}

/// Template view of a `mod`/`pub use` pair
#[derive(Debug, Clone, Serialize)]
struct ModuleEntry {
    module: String,
    type_name: String,
}

/// Template view of a client method in the README
#[derive(Debug, Clone, Serialize)]
struct OperationEntry {
    operation: String,
    method: String,
}

/// Template view of a service in the workspace files
#[derive(Debug, Clone, Serialize)]
struct ServiceEntry {
    crate_name: String,
    service_full_name: String,
    api_version: String,
    protocol: String,
    operations: usize,
}

/// Service crate generator
///
/// Transforms a ServiceDefinition into a complete client crate:
/// - Cargo.toml, README.md
/// - src/lib.rs, src/runtime.rs, src/client.rs
/// - src/input, src/output and src/types modules
/// - src/pagination.rs and src/waiters.rs when any apply
pub struct ServiceGenerator {
    service: ServiceDefinition,
    options: GenerationOptions,
    tera: Tera,
}

impl ServiceGenerator {
    /// Create a generator, checking the operation selection against the service
    pub fn new(service: ServiceDefinition, options: GenerationOptions) -> Result<Self> {
        ServiceContext::new(&service, &options.operations)?;
        let tera = templates::load_templates()?;
        Ok(Self {
            service,
            options,
            tera,
        })
    }

    pub fn service(&self) -> &ServiceDefinition {
        &self.service
    }

    pub fn crate_name(&self) -> String {
        self.options.crate_name_for(&self.service)
    }

    /// Generate the crate into `output_dir` on disk
    pub fn generate_to_directory(&self, output_dir: &Path) -> Result<Vec<PathBuf>> {
        self.generate_with_writer(output_dir, &FsWriter)
    }

    /// Generate the crate through `writer`, returning the paths written in order
    pub fn generate_with_writer(
        &self,
        output_dir: &Path,
        writer: &dyn SourceWriter,
    ) -> Result<Vec<PathBuf>> {
        let cx = ServiceContext::new(&self.service, &self.options.operations)?;
        let mut out = Output::new(writer);

        let src_dir = output_dir.join("src");
        for dir in [
            output_dir.to_path_buf(),
            src_dir.clone(),
            src_dir.join("input"),
            src_dir.join("output"),
            src_dir.join("types"),
        ] {
            writer.create_dir(&dir)?;
        }

        out.write(
            &src_dir.join("runtime.rs"),
            &templates::render(&self.tera, "runtime.rs", &tera::Context::new())?,
        )?;
        out.write(&src_dir.join("client.rs"), &client::render(&cx, &self.tera)?)?;

        self.generate_operations(&cx, &src_dir, &mut out)?;
        self.generate_types(&cx, &src_dir.join("types"), &mut out)?;

        let paginators = if self.options.paginators {
            pagination::render(&cx, &self.tera)?
        } else {
            None
        };
        let paginator_names = match paginators {
            Some((source, names)) => {
                out.write(&src_dir.join("pagination.rs"), &source)?;
                names
            }
            None => Vec::new(),
        };

        let waiters = if self.options.waiters {
            waiter::render(&cx, &self.tera)?
        } else {
            None
        };
        let waiter_names = match waiters {
            Some((source, names)) => {
                out.write(&src_dir.join("waiters.rs"), &source)?;
                names
            }
            None => Vec::new(),
        };

        let mut context = self.create_context(&cx);
        context.insert("has_pagination", &!paginator_names.is_empty());
        context.insert("has_waiters", &!waiter_names.is_empty());
        context.insert("paginators", &paginator_names);
        context.insert("waiters", &waiter_names);

        out.write(
            &src_dir.join("lib.rs"),
            &templates::render(&self.tera, "lib.rs", &context)?,
        )?;
        out.write(
            &output_dir.join("Cargo.toml"),
            &templates::render(&self.tera, "Cargo.toml", &context)?,
        )?;
        out.write(
            &output_dir.join("README.md"),
            &templates::render(&self.tera, "README.md", &context)?,
        )?;

        tracing::info!(
            service = %self.service.name,
            crate_name = %self.crate_name(),
            files = out.files.len(),
            "generated service crate"
        );

        Ok(out.files)
    }

    /// Input and output modules, one file per operation
    fn generate_operations(
        &self,
        cx: &ServiceContext<'_>,
        src_dir: &Path,
        out: &mut Output<'_>,
    ) -> Result<()> {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();

        for name in &cx.usage.operations {
            let operation = cx.service.operation(name).ok_or_else(|| {
                GeneratorError::Generation(format!("Unknown operation {}", name))
            })?;
            let module = naming::module_name(&operation.name);

            out.write(
                &src_dir.join("input").join(format!("{}.rs", module)),
                &input::render(cx, &self.tera, operation)?,
            )?;
            inputs.push(ModuleEntry {
                module: module.clone(),
                type_name: input::input_type(operation),
            });

            if let Some(source) = output::render(cx, &self.tera, operation)? {
                out.write(
                    &src_dir.join("output").join(format!("{}.rs", module)),
                    &source,
                )?;
                outputs.push(ModuleEntry {
                    module,
                    type_name: output::output_type(operation),
                });
            }
        }

        self.write_module(
            &src_dir.join("input").join("mod.rs"),
            "Operation inputs",
            &inputs,
            out,
        )?;
        self.write_module(
            &src_dir.join("output").join("mod.rs"),
            "Operation outputs",
            &outputs,
            out,
        )
    }

    /// Value objects and enums reachable from the selected operations
    fn generate_types(
        &self,
        cx: &ServiceContext<'_>,
        types_dir: &Path,
        out: &mut Output<'_>,
    ) -> Result<()> {
        let mut entries = Vec::new();

        for name in cx.usage.structures() {
            let structure = cx.service.structure(name).ok_or_else(|| {
                GeneratorError::Generation(format!("Shape {} is not a structure", name))
            })?;
            let module = cx.types.module_name(name);
            out.write(
                &types_dir.join(format!("{}.rs", module)),
                &value_object::render(cx, &self.tera, structure)?,
            )?;
            entries.push(ModuleEntry {
                module,
                type_name: cx.types.type_name(name),
            });
        }

        for name in &cx.usage.enums {
            let module = cx.types.module_name(name);
            out.write(
                &types_dir.join(format!("{}.rs", module)),
                &enums::render(cx, &self.tera, name)?,
            )?;
            entries.push(ModuleEntry {
                module,
                type_name: cx.types.type_name(name),
            });
        }

        entries.sort_by(|a, b| a.module.cmp(&b.module));
        self.write_module(
            &types_dir.join("mod.rs"),
            "Structures and enums shared by inputs and outputs",
            &entries,
            out,
        )
    }

    fn write_module(
        &self,
        path: &Path,
        title: &str,
        modules: &[ModuleEntry],
        out: &mut Output<'_>,
    ) -> Result<()> {
        let mut context = tera::Context::new();
        context.insert("title", title);
        context.insert("modules", modules);
        out.write(path, &templates::render(&self.tera, "module.rs", &context)?)
    }

    /// Create template context shared by the crate-level files
    fn create_context(&self, cx: &ServiceContext<'_>) -> tera::Context {
        let methods: Vec<OperationEntry> = cx
            .usage
            .operations
            .iter()
            .filter_map(|name| cx.service.operation(name))
            .map(|operation| OperationEntry {
                operation: operation.name.clone(),
                method: client::method_name(operation),
            })
            .collect();

        let metadata = &self.service.metadata;
        let mut context = tera::Context::new();
        context.insert("crate_name", &self.crate_name());
        context.insert("crate_version", &self.options.crate_version);
        context.insert("service_full_name", &metadata.service_full_name);
        context.insert("api_version", &metadata.api_version);
        context.insert("protocol", metadata.protocol.name());
        context.insert("client_name", &client::client_name(&self.service));
        context.insert("methods", &methods);
        context
    }
}

/// Writes files through a SourceWriter, remembering their paths
struct Output<'w> {
    writer: &'w dyn SourceWriter,
    files: Vec<PathBuf>,
}

impl<'w> Output<'w> {
    fn new(writer: &'w dyn SourceWriter) -> Self {
        Self {
            writer,
            files: Vec::new(),
        }
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        self.writer.write_file(path, contents)?;
        self.files.push(path.to_path_buf());
        Ok(())
    }
}

/// Generate a service crate (convenience function)
pub fn generate_service(
    service: ServiceDefinition,
    options: GenerationOptions,
    output_path: &Path,
) -> Result<Vec<PathBuf>> {
    let generator = ServiceGenerator::new(service, options)?;
    generator.generate_to_directory(output_path)
}

/// Workspace generator for multi-service runs
///
/// Writes a Cargo workspace whose members are one crate per service:
/// - Cargo.toml (workspace manifest)
/// - README.md (service overview)
/// - `<crate_name>/` for every service
pub struct WorkspaceGenerator {
    services: Vec<ServiceGenerator>,
    tera: Tera,
}

impl WorkspaceGenerator {
    /// Create a workspace generator; crate names must be distinct
    pub fn new(services: Vec<(ServiceDefinition, GenerationOptions)>) -> Result<Self> {
        let mut generators = Vec::with_capacity(services.len());
        let mut crate_names = BTreeSet::new();

        for (service, options) in services {
            let generator = ServiceGenerator::new(service, options)?;
            if !crate_names.insert(generator.crate_name()) {
                return Err(GeneratorError::Validation(format!(
                    "Crate name {} is used by more than one service",
                    generator.crate_name()
                )));
            }
            generators.push(generator);
        }

        let tera = templates::load_workspace_templates()?;
        Ok(Self {
            services: generators,
            tera,
        })
    }

    pub fn generate_to_directory(&self, output_dir: &Path) -> Result<Vec<PathBuf>> {
        self.generate_with_writer(output_dir, &FsWriter)
    }

    pub fn generate_with_writer(
        &self,
        output_dir: &Path,
        writer: &dyn SourceWriter,
    ) -> Result<Vec<PathBuf>> {
        writer.create_dir(output_dir)?;
        let mut out = Output::new(writer);

        let context = self.create_context()?;
        out.write(
            &output_dir.join("Cargo.toml"),
            &templates::render(&self.tera, "workspace_Cargo.toml", &context)?,
        )?;
        out.write(
            &output_dir.join("README.md"),
            &templates::render(&self.tera, "workspace_README.md", &context)?,
        )?;

        for generator in &self.services {
            let crate_dir = output_dir.join(generator.crate_name());
            let files = generator.generate_with_writer(&crate_dir, writer)?;
            out.files.extend(files);
        }

        Ok(out.files)
    }

    fn create_context(&self) -> Result<tera::Context> {
        let mut services = Vec::with_capacity(self.services.len());
        for generator in &self.services {
            let service = generator.service();
            let usage = usage::Usage::analyze(service, &generator.options.operations)?;
            services.push(ServiceEntry {
                crate_name: generator.crate_name(),
                service_full_name: service.metadata.service_full_name.clone(),
                api_version: service.metadata.api_version.clone(),
                protocol: service.metadata.protocol.name().to_string(),
                operations: usage.operations.len(),
            });
        }
        services.sort_by(|a, b| a.crate_name.cmp(&b.crate_name));

        let mut context = tera::Context::new();
        context.insert("services", &services);
        Ok(context)
    }
}
