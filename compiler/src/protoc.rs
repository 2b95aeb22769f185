//! Invokes the external protobuf compiler on a `.proto` file or directory.

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use tracing::{error, info};

use crate::error::SchemaError;

pub const DEFAULT_PROGRAM: &str = "protoc";

/// One output requested from the compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputDir {
    /// `--<plugin>_out=<dir>`, e.g. `python`, `grpc_python`, `rust`.
    Plugin { plugin: String, dir: PathBuf },
    /// `--descriptor_set_out=<file>` plus `--include_imports`.
    DescriptorSet(PathBuf),
}

impl OutputDir {
    pub fn plugin(plugin: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        OutputDir::Plugin {
            plugin: plugin.into(),
            dir:    dir.into(),
        }
    }

    fn args(&self) -> Vec<String> {
        match self {
            OutputDir::Plugin { plugin, dir } => vec![format!("--{}_out={}", plugin, dir.display())],
            OutputDir::DescriptorSet(file) => vec![
                format!("--descriptor_set_out={}", file.display()),
                "--include_imports".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Protoc {
    program: PathBuf,
}

impl Default for Protoc {
    fn default() -> Self {
        Protoc::new(DEFAULT_PROGRAM)
    }
}

impl Protoc {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Protoc {
            program: program.into(),
        }
    }

    /// Builds the argument list for compiling `source`. Every `.proto` file
    /// directly inside the source directory (or the directory containing a
    /// source file) is passed, in name order.
    pub fn arguments(
        &self,
        source: &Path,
        outputs: &[OutputDir],
        include_paths: &[PathBuf],
    ) -> Result<Vec<String>, SchemaError> {
        if !source.exists() {
            return Err(SchemaError::MissingSource(source.to_path_buf()));
        }

        let mut args = vec!["-I.".to_string()];
        for path in include_paths {
            args.push(format!("-I{}", path.display()));
        }
        for output in outputs {
            args.extend(output.args());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(listing_dir(source))? {
            let path = entry?.path();
            if path.is_file() && path.extension().map_or(false, |ext| ext == "proto") {
                files.push(path);
            }
        }
        files.sort();
        args.extend(files.iter().map(|p| p.display().to_string()));
        Ok(args)
    }

    /// Runs the compiler once and waits for it. A non-zero exit becomes
    /// [`SchemaError::CompilationFailure`] with the exit code.
    pub fn compile(
        &self,
        source: &Path,
        outputs: &[OutputDir],
        include_paths: &[PathBuf],
    ) -> Result<(), SchemaError> {
        let args = self.arguments(source, outputs, include_paths)?;
        for output in outputs {
            if let OutputDir::Plugin { dir, .. } = output {
                fs::create_dir_all(dir)?;
            }
        }

        let command = format!("{} {}", self.program.display(), args.join(" "));
        let status = Command::new(&self.program).args(&args).status()?;
        if status.success() {
            info!(source = %source.display(), "compiled protobuf sources");
            Ok(())
        } else {
            error!(command = %command, code = ?status.code(), "protobuf compiler failed");
            Err(SchemaError::CompilationFailure {
                command,
                code: status.code(),
            })
        }
    }
}

/// Directory whose `.proto` files are compiled for `source`. A single file
/// pulls in its siblings so cross-file imports resolve.
fn listing_dir(source: &Path) -> &Path {
    if !source.is_file() {
        return source;
    }
    match source.parent() {
        // A bare file name has an empty parent
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
