//! Generation orchestration
//!
//! One call to [`Orchestrator::generate`] walks a request through
//! resolve → launch → run → validate and always ends in exactly one
//! [`GenerationOutcome`]. Nothing here retries; that is left to the caller.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::{ErrorKind, GenerationError, GenerationOutcome};
use super::process::{self, ProcessResult, ToolCommand};
use super::request::GenerationRequest;
use super::resolver::Resolver;

pub const START_MARKER: &str = "@startuml";
pub const END_MARKER: &str = "@enduml";

const NO_ERROR_OUTPUT: &str = "No error output";

pub struct Orchestrator {
    resolver: Resolver,
    java: PathBuf,
    timeout: Option<Duration>,
    /// Requests writing the same artifact take turns
    output_locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            java: PathBuf::from("java"),
            timeout: None,
            output_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Java launcher used for `.jar` tools
    pub fn with_java(mut self, java: impl Into<PathBuf>) -> Self {
        self.java = java.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one request to completion
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        info!(
            "Generating UML for {} {}",
            request.target(),
            request.input_path().display()
        );

        let result = self.try_generate(request).await;
        match &result {
            Ok(path) => info!("UML diagram generated successfully: {}", path.display()),
            Err(e) => warn!("Generation failed ({}): {}", e.kind, e.message),
        }
        result.into()
    }

    async fn try_generate(&self, request: &GenerationRequest) -> Result<PathBuf, GenerationError> {
        let paths = self.resolver.resolve(request)?;
        let options = request.options();

        let command = ToolCommand::assemble(&self.java, &paths, request.input_path(), options);
        debug!("Running command: {}", command.command_line());
        debug!("Expected output file: {}", paths.output_file_path.display());

        let lock = self.lock_for(&paths.output_file_path);
        let _guard = lock.lock().await;

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, process::run(&command, options.verbose))
                .await
                .map_err(|_| GenerationError::timed_out(limit))??,
            None => process::run(&command, options.verbose).await?,
        };

        debug!("Generator exited with code: {:?}", result.exit_code);
        debug!("stdout: {}", result.stdout);
        debug!("stderr: {}", result.stderr);

        validate(&result, &paths.output_file_path)?;
        Ok(paths.output_file_path)
    }

    fn lock_for(&self, output: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .output_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(output.to_path_buf()).or_default().clone()
    }
}

/// Check the exit status and the produced artifact, first failure wins
pub fn validate(result: &ProcessResult, output: &Path) -> Result<(), GenerationError> {
    if !result.succeeded() {
        let stderr = if result.stderr.trim().is_empty() {
            NO_ERROR_OUTPUT
        } else {
            result.stderr.as_str()
        };
        let status = match result.exit_code {
            Some(code) => format!("code {}", code),
            None => "a signal".to_string(),
        };
        return Err(GenerationError::new(
            ErrorKind::ProcessExitNonZero,
            format!(
                "Generator failed with {} (expected output {}). Error: {}",
                status,
                output.display(),
                stderr
            ),
        ));
    }

    let metadata = match fs::metadata(output) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(GenerationError::new(
                ErrorKind::OutputMissing,
                format!("Output file was not created: {}", output.display()),
            ));
        }
        Err(e) => {
            return Err(GenerationError::new(
                ErrorKind::OutputUnreadable,
                format!("Could not inspect output file {}: {}", output.display(), e),
            ));
        }
    };

    if metadata.len() == 0 {
        return Err(GenerationError::new(
            ErrorKind::OutputEmpty,
            format!("Output file is empty: {}", output.display()),
        ));
    }

    let bytes = fs::read(output).map_err(|e| {
        GenerationError::new(
            ErrorKind::OutputUnreadable,
            format!("Could not read output file {}: {}", output.display(), e),
        )
    })?;
    let content = String::from_utf8_lossy(&bytes);

    if content.trim().is_empty() {
        return Err(GenerationError::new(
            ErrorKind::OutputBlank,
            format!("Output file contains no content: {}", output.display()),
        ));
    }

    let missing: Vec<&str> = [START_MARKER, END_MARKER]
        .into_iter()
        .filter(|marker| !content.contains(marker))
        .collect();
    if !missing.is_empty() {
        return Err(GenerationError::new(
            ErrorKind::OutputMalformed,
            format!(
                "Output file does not contain valid PlantUML content (missing {}): {}",
                missing.join(" and "),
                output.display()
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exited(code: i32, stderr: &str) -> ProcessResult {
        ProcessResult {
            exit_code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    fn kind(result: Result<(), GenerationError>) -> ErrorKind {
        result.unwrap_err().kind
    }

    #[test]
    fn test_non_zero_exit_carries_stderr() {
        let err = validate(&exited(2, "Exception in thread main"), Path::new("/x/Foo.puml"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ProcessExitNonZero);
        assert!(err.message.contains("code 2"));
        assert!(err.message.contains("Exception in thread main"));
    }

    #[test]
    fn test_non_zero_exit_without_stderr_uses_placeholder() {
        let err = validate(&exited(1, ""), Path::new("/x/Foo.puml")).unwrap_err();
        assert!(err.message.contains(NO_ERROR_OUTPUT));

        let signalled = ProcessResult::default();
        let err = validate(&signalled, Path::new("/x/Foo.puml")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ProcessExitNonZero);
        assert!(err.message.contains("a signal"));
    }

    #[test]
    fn test_exit_code_checked_before_output() {
        // Even a perfect artifact does not rescue a failed run
        let dir = tempdir().unwrap();
        let out = dir.path().join("Foo.puml");
        fs::write(&out, "@startuml\n@enduml\n").unwrap();
        assert_eq!(kind(validate(&exited(1, "boom"), &out)), ErrorKind::ProcessExitNonZero);
    }

    #[test]
    fn test_output_predicates() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("Foo.puml");
        let ok = exited(0, "");

        assert_eq!(kind(validate(&ok, &out)), ErrorKind::OutputMissing);

        fs::write(&out, "").unwrap();
        assert_eq!(kind(validate(&ok, &out)), ErrorKind::OutputEmpty);

        fs::write(&out, " \n\t\n").unwrap();
        assert_eq!(kind(validate(&ok, &out)), ErrorKind::OutputBlank);

        fs::write(&out, "class Foo\n@enduml\n").unwrap();
        let err = validate(&ok, &out).unwrap_err();
        assert_eq!(err.kind, ErrorKind::OutputMalformed);
        assert!(err.message.contains(START_MARKER));
        assert!(err.message.contains(&out.display().to_string()));

        fs::write(&out, "@startuml\nclass Foo\n").unwrap();
        assert_eq!(kind(validate(&ok, &out)), ErrorKind::OutputMalformed);

        fs::write(&out, "@startuml\nclass Foo\n@enduml\n").unwrap();
        assert!(validate(&ok, &out).is_ok());
    }

    #[cfg(unix)]
    mod subprocess {
        use super::*;
        use crate::core::request::{GenerationOptions, Target};
        use crate::core::resolver::ResolverContext;
        use std::os::unix::fs::PermissionsExt;
        use std::time::Instant;

        /// Stand-in generator: parses `-o` and then runs `body`
        fn write_tool(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("generate.sh");
            let script = format!(
                "#!/bin/sh\nwhile [ $# -gt 0 ]; do\n  case \"$1\" in\n    -o) out=\"$2\"; shift ;;\n  esac\n  shift\ndone\n{}\n",
                body
            );
            fs::write(&path, script).unwrap();
            let mut perms = fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&path, perms).unwrap();
            path
        }

        fn setup(body: &str) -> (tempfile::TempDir, Orchestrator, GenerationRequest) {
            let dir = tempdir().unwrap();
            let tool = write_tool(dir.path(), body);
            let input = dir.path().join("Foo.java");
            fs::write(&input, "class Foo {}").unwrap();

            let orchestrator = Orchestrator::new(Resolver::new(ResolverContext {
                install_root: None,
                current_dir: dir.path().to_path_buf(),
                workspace_roots: vec![],
            }));
            let request = GenerationRequest::new(
                input,
                Target::File,
                GenerationOptions {
                    custom_tool_path: Some(tool),
                    ..Default::default()
                },
            );
            (dir, orchestrator, request)
        }

        #[tokio::test]
        async fn test_success_reports_resolved_path() {
            let (dir, orchestrator, request) =
                setup("printf '@startuml\\nclass Foo\\n@enduml\\n' > \"$out\"");
            match orchestrator.generate(&request).await {
                GenerationOutcome::Success { output_file_path } => {
                    assert_eq!(output_file_path, dir.path().join("Foo.puml"));
                }
                other => panic!("expected success, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_failing_tool_surfaces_stderr() {
            let (_dir, orchestrator, request) = setup("echo 'bad input' >&2\nexit 4");
            let outcome = orchestrator.generate(&request).await;
            match outcome {
                GenerationOutcome::Failure { kind, message } => {
                    assert_eq!(kind, ErrorKind::ProcessExitNonZero);
                    assert!(message.contains("bad input"));
                }
                other => panic!("expected failure, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_silent_tool_without_output() {
            let (_dir, orchestrator, request) = setup("exit 0");
            let outcome = orchestrator.generate(&request).await;
            assert_eq!(outcome.error_kind(), Some(ErrorKind::OutputMissing));
        }

        #[tokio::test]
        async fn test_missing_tool_never_spawns() {
            let (dir, orchestrator, _) = setup("exit 0");
            let request = GenerationRequest::new(
                dir.path().join("Foo.java"),
                Target::File,
                GenerationOptions {
                    custom_tool_path: Some(dir.path().join("absent.jar")),
                    ..Default::default()
                },
            );
            let outcome = orchestrator.generate(&request).await;
            assert_eq!(outcome.error_kind(), Some(ErrorKind::ToolNotFound));
        }

        #[tokio::test]
        async fn test_timeout_kills_generator() {
            let (_dir, orchestrator, request) = setup("sleep 5");
            let orchestrator = orchestrator.with_timeout(Some(Duration::from_millis(200)));
            let started = Instant::now();
            let outcome = orchestrator.generate(&request).await;
            assert_eq!(outcome.error_kind(), Some(ErrorKind::TimedOut));
            assert!(started.elapsed() < Duration::from_secs(4));
        }

        #[tokio::test]
        async fn test_same_output_path_is_serialized() {
            // The tool refuses to run while another instance holds the marker
            let (_dir, orchestrator, request) = setup(
                "if [ -e \"$out.busy\" ]; then exit 9; fi\n\
                 touch \"$out.busy\"\n\
                 sleep 0.2\n\
                 printf '@startuml\\n@enduml\\n' > \"$out\"\n\
                 rm \"$out.busy\"",
            );
            let (a, b) = tokio::join!(orchestrator.generate(&request), orchestrator.generate(&request));
            assert!(a.is_success(), "{:?}", a);
            assert!(b.is_success(), "{:?}", b);
        }
    }
}
