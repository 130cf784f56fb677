//! Convert command - turn a compose document into Kubernetes manifests

use std::fs;
use std::path::{Component, Path, PathBuf};

use berth_kube::{
    ConversionResult, GeneratorOptions, ImagePullPolicy, Outcome, ServiceType, default_registry,
};
use clap::Args;

use crate::display;
use crate::error::{CliError, Result};
use crate::exit_codes;
use crate::input::{self, DEFAULT_MAX_INPUT_SIZE};

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Compose file, or `-` for stdin
    pub file: PathBuf,

    /// Content type of the input document
    #[arg(short = 't', long = "type", default_value = "docker-compose")]
    pub content_type: String,

    /// Target namespace (empty to omit)
    #[arg(short, long, env = "BERTH_NAMESPACE", default_value = "default")]
    pub namespace: String,

    /// Extra label on every resource (key=value)
    #[arg(long = "label")]
    pub labels: Vec<String>,

    /// Extra annotation on every resource (key=value)
    #[arg(long = "annotation")]
    pub annotations: Vec<String>,

    /// Container image pull policy
    #[arg(long, env = "BERTH_IMAGE_PULL_POLICY", default_value = "IfNotPresent")]
    pub image_pull_policy: ImagePullPolicy,

    /// Kubernetes Service type
    #[arg(long, env = "BERTH_SERVICE_TYPE", default_value = "ClusterIP")]
    pub service_type: ServiceType,

    /// Replica count for every Deployment (overrides deploy.replicas)
    #[arg(long, env = "BERTH_REPLICAS", value_parser = clap::value_parser!(i32).range(0..))]
    pub replicas: Option<i32>,

    /// Write one file per resource under this directory instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the full conversion result as JSON
    #[arg(long)]
    pub json: bool,

    /// Maximum input size in bytes
    #[arg(long = "max-size", env = "BERTH_MAX_INPUT_SIZE", default_value_t = DEFAULT_MAX_INPUT_SIZE)]
    pub max_size: u64,

    /// Write into a non-empty output directory
    #[arg(long)]
    pub force: bool,
}

impl ConvertArgs {
    pub fn generator_options(&self) -> Result<GeneratorOptions> {
        Ok(GeneratorOptions {
            namespace: self.namespace.clone(),
            labels: input::parse_key_values("label", &self.labels)?,
            annotations: input::parse_key_values("annotation", &self.annotations)?,
            image_pull_policy: self.image_pull_policy,
            service_type: self.service_type,
            replicas: self.replicas,
        })
    }
}

pub fn run(args: &ConvertArgs) -> Result<i32> {
    let options = args.generator_options()?;
    let converter = default_registry().for_type(&args.content_type)?;

    if let Some(dir) = &args.output {
        check_output_dir(dir, args.force)?;
    }

    let content = input::read_document(&args.file, args.max_size)?;
    tracing::debug!(
        converter = converter.name(),
        bytes = content.len(),
        "converting document"
    );
    let result = converter.convert(&content, &options);

    if let Some(dir) = &args.output {
        write_files(&result, dir)?;
    }

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::internal(format!("Failed to serialize result: {}", e)))?;
        println!("{}", json);
    } else {
        display::print_header(&input::display_name(&args.file));
        display::print_errors(&result.errors);
        display::print_warnings(&result.warnings);
        match &args.output {
            Some(dir) if !result.files.is_empty() => display::print_written(&result.files, dir),
            Some(_) => {}
            None => print!("{}", result.to_yaml_stream()),
        }
        display::print_summary(&result);
    }

    Ok(exit_code(&result))
}

fn exit_code(result: &ConversionResult) -> i32 {
    match result.outcome() {
        Outcome::Succeeded => exit_codes::SUCCESS,
        Outcome::Partial => exit_codes::PARTIAL,
        Outcome::Failed => exit_codes::VALIDATION_ERROR,
    }
}

fn check_output_dir(dir: &Path, force: bool) -> Result<()> {
    if !dir.exists() || force {
        return Ok(());
    }
    if !dir.is_dir() {
        return Err(CliError::usage(format!(
            "Output path {} exists and is not a directory",
            dir.display()
        )));
    }
    let mut entries = fs::read_dir(dir).map_err(|e| CliError::io_at(dir, e))?;
    if entries.next().is_some() {
        return Err(CliError::usage_with_help(
            format!("Output directory {} is not empty", dir.display()),
            "Use --force to write into it anyway",
        ));
    }
    Ok(())
}

/// Relative path made only of plain components, so it stays under the output dir
fn is_contained(path: &str) -> bool {
    let path = Path::new(path);
    path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}

fn write_files(result: &ConversionResult, dir: &Path) -> Result<()> {
    if let Some(file) = result.files.iter().find(|f| !is_contained(&f.path)) {
        return Err(CliError::internal(format!(
            "Refusing to write {} outside {}",
            file.path,
            dir.display()
        )));
    }

    for file in &result.files {
        let path = dir.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CliError::io_at(parent, e))?;
        }
        fs::write(&path, &file.content).map_err(|e| CliError::io_at(&path, e))?;
        tracing::debug!(path = %path.display(), "wrote manifest");
    }
    Ok(())
}
