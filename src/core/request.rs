use std::path::{Path, PathBuf};

/// What kind of input a request points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    File,
    Directory,
}

impl Target {
    pub fn from_is_directory(is_directory: bool) -> Self {
        if is_directory {
            Target::Directory
        } else {
            Target::File
        }
    }

    pub fn is_directory(self) -> bool {
        matches!(self, Target::Directory)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::File => write!(f, "file"),
            Target::Directory => write!(f, "directory"),
        }
    }
}

/// Per-request knobs supplied by the caller
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub include_relationships: bool,
    pub verbose: bool,
    pub auto_open_result: bool,
    pub custom_output_directory: Option<PathBuf>,
    pub custom_tool_path: Option<PathBuf>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            include_relationships: true,
            verbose: false,
            auto_open_result: true,
            custom_output_directory: None,
            custom_tool_path: None,
        }
    }
}

/// A single generation request. Built once per invocation and never mutated.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    input_path: PathBuf,
    target: Target,
    options: GenerationOptions,
}

impl GenerationRequest {
    pub fn new(input_path: impl Into<PathBuf>, target: Target, options: GenerationOptions) -> Self {
        Self {
            input_path: input_path.into(),
            target,
            options,
        }
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_flag() {
        assert_eq!(Target::from_is_directory(true), Target::Directory);
        assert_eq!(Target::from_is_directory(false), Target::File);
        assert!(Target::Directory.is_directory());
    }

    #[test]
    fn test_default_options_match_config_defaults() {
        let options = GenerationOptions::default();
        assert!(options.include_relationships);
        assert!(!options.verbose);
        assert!(options.auto_open_result);
        assert!(options.custom_output_directory.is_none());
        assert!(options.custom_tool_path.is_none());
    }
}
