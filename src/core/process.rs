//! Subprocess invocation of the external generator
//!
//! The whole process lifecycle is a single future that resolves to a
//! [`ProcessResult`] once the child exits. Output buffering stays inside.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::error::GenerationError;
use super::request::GenerationOptions;
use super::resolver::ResolvedPaths;

/// Fully assembled generator invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// Build the invocation for a resolved request.
    ///
    /// Jars go through `<java> -jar <tool>`; anything else is executed
    /// directly. Flag order is fixed: `-i`, `-o`, `--no-relationship`, `-v`.
    pub fn assemble(
        java: &Path,
        paths: &ResolvedPaths,
        input: &Path,
        options: &GenerationOptions,
    ) -> Self {
        let tool = &paths.tool_executable_path;
        let mut args: Vec<OsString> = Vec::new();

        let program = if is_jar(tool) {
            args.push("-jar".into());
            args.push(tool.as_os_str().to_owned());
            java.to_path_buf()
        } else {
            tool.clone()
        };

        args.push("-i".into());
        args.push(input.as_os_str().to_owned());
        args.push("-o".into());
        args.push(paths.output_file_path.as_os_str().to_owned());

        if !options.include_relationships {
            args.push("--no-relationship".into());
        }
        if options.verbose {
            args.push("-v".into());
        }

        Self {
            program,
            args,
            working_dir: tool.parent().map(Path::to_path_buf),
        }
    }

    /// Single-line rendering for logs
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

fn is_jar(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jar"))
        .unwrap_or(false)
}

/// Everything observed from one generator run
#[derive(Debug, Clone, Default)]
pub struct ProcessResult {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Launch the command and wait for it to exit.
///
/// When `echo` is set every chunk is logged as it arrives. The child is
/// killed if the returned future is dropped before completion.
pub async fn run(command: &ToolCommand, echo: bool) -> Result<ProcessResult, GenerationError> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &command.working_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| GenerationError::launch(&command.program, e))?;
    debug!("Spawned generator (pid {:?})", child.id());

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (stdout, stderr, status) = tokio::join!(
        drain(stdout, Stream::Stdout, echo),
        drain(stderr, Stream::Stderr, echo),
        child.wait(),
    );

    let status = status.map_err(|e| GenerationError::launch(&command.program, e))?;

    Ok(ProcessResult {
        exit_code: status.code(),
        stdout,
        stderr,
    })
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>, stream: Stream, echo: bool) -> String {
    let Some(mut reader) = reader else {
        return String::new();
    };

    let mut collected = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                if echo {
                    let text = String::from_utf8_lossy(&chunk[..n]);
                    match stream {
                        Stream::Stdout => info!("stdout: {}", text.trim_end()),
                        Stream::Stderr => warn!("stderr: {}", text.trim_end()),
                    }
                }
                collected.extend_from_slice(&chunk[..n]);
            }
            Err(e) => {
                warn!("Stopped reading generator output: {}", e);
                break;
            }
        }
    }

    String::from_utf8_lossy(&collected).into_owned()
}
