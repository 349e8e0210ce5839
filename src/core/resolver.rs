//! Tool and output path resolution
//!
//! Everything the resolver looks at (install location, working directory,
//! workspace roots) comes in through [`ResolverContext`], so resolution is
//! deterministic for a given context and filesystem state.

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::error::GenerationError;
use super::request::{GenerationRequest, Target};

/// Location of the bundled generator, relative to the install root
pub const BUNDLED_TOOL: &str = "resources/uml-generator.jar";

/// Conventional locations checked against the current directory, in order
pub const CONVENTIONAL_TOOL_PATHS: &[&str] = &[
    "./uml-generator.jar",
    "../v2/target/uml-generator.jar",
    "./v2/target/uml-generator.jar",
];

/// Extension of generated diagram files
pub const DIAGRAM_EXTENSION: &str = "puml";

/// Environment the resolver is allowed to consult
#[derive(Debug, Clone, Default)]
pub struct ResolverContext {
    pub install_root: Option<PathBuf>,
    pub current_dir: PathBuf,
    pub workspace_roots: Vec<PathBuf>,
}

/// Paths computed for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub tool_executable_path: PathBuf,
    pub output_directory: PathBuf,
    pub output_file_path: PathBuf,
}

pub struct Resolver {
    context: ResolverContext,
    source_extensions: Vec<String>,
}

impl Resolver {
    pub fn new(context: ResolverContext) -> Self {
        Self {
            context,
            source_extensions: vec!["java".to_string()],
        }
    }

    /// Replace the list of extensions stripped from file targets
    pub fn with_source_extensions(mut self, extensions: Vec<String>) -> Self {
        self.source_extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Resolve tool and output paths, creating the output directory if needed
    pub fn resolve(&self, request: &GenerationRequest) -> Result<ResolvedPaths, GenerationError> {
        let tool_executable_path =
            self.resolve_tool(request.options().custom_tool_path.as_deref())?;
        let (output_directory, output_file_path) = self.output_paths(request);

        if !output_directory.exists() {
            debug!("Creating output directory: {}", output_directory.display());
            fs::create_dir_all(&output_directory)
                .map_err(|e| GenerationError::output_directory(&output_directory, e))?;
        }

        Ok(ResolvedPaths {
            tool_executable_path,
            output_directory,
            output_file_path,
        })
    }

    /// Find the generator: configured path, bundled copy, then conventional locations
    pub fn resolve_tool(&self, configured: Option<&Path>) -> Result<PathBuf, GenerationError> {
        let mut searched = Vec::new();

        if let Some(configured) = configured {
            let candidate = normalize(&self.context.current_dir.join(configured));
            if candidate.exists() {
                debug!("Using configured tool: {}", candidate.display());
                return Ok(candidate);
            }
            debug!("Configured tool does not exist: {}", candidate.display());
            searched.push(candidate);
        }

        if let Some(root) = &self.context.install_root {
            let bundled = root.join(BUNDLED_TOOL);
            if bundled.exists() {
                debug!("Using bundled tool: {}", bundled.display());
                return Ok(bundled);
            }
            searched.push(bundled);
        }

        for relative in CONVENTIONAL_TOOL_PATHS {
            let candidate = normalize(&self.context.current_dir.join(relative));
            if candidate.exists() {
                debug!("Using tool found at conventional path: {}", candidate.display());
                return Ok(candidate);
            }
            searched.push(candidate);
        }

        Err(GenerationError::tool_not_found(&searched))
    }

    /// Compute output directory and file without touching the filesystem
    pub fn output_paths(&self, request: &GenerationRequest) -> (PathBuf, PathBuf) {
        let input = request.input_path();
        let target = request.target();

        // Directory targets anchor on themselves, file targets on their parent
        let anchor = match target {
            Target::Directory => input.to_path_buf(),
            Target::File => input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };

        let output_directory = match &request.options().custom_output_directory {
            // Without a workspace root, fall back to the input-relative anchor
            Some(custom) => match self.context.workspace_roots.first() {
                Some(root) => normalize(&root.join(custom)),
                None => {
                    debug!(
                        "No workspace root, resolving {} against {}",
                        custom.display(),
                        anchor.display()
                    );
                    normalize(&anchor.join(custom))
                }
            },
            None => anchor,
        };

        let file_name = format!("{}.{}", self.basename(input, target), DIAGRAM_EXTENSION);
        let output_file_path = output_directory.join(file_name);
        (output_directory, output_file_path)
    }

    fn basename(&self, input: &Path, target: Target) -> String {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "diagram".to_string());

        if target.is_directory() {
            return name;
        }

        let strip = input
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.source_extensions.contains(&e.to_lowercase()))
            .unwrap_or(false);

        match (strip, input.file_stem()) {
            (true, Some(stem)) => stem.to_string_lossy().into_owned(),
            _ => name,
        }
    }
}

/// Lexically fold `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
