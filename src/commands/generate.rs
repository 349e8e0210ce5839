use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{self, Settings};
use crate::core::{
    GenerationError, GenerationOptions, GenerationOutcome, GenerationRequest, Orchestrator,
    Resolver, ResolverContext, Target,
};
use crate::output::{self, open, Format, Report};

pub struct GenerateArgs {
    pub paths: Vec<String>,
    pub target: Target,
    pub tool: Option<PathBuf>,
    pub java: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub workspace: Option<PathBuf>,
    pub no_relationships: bool,
    pub no_open: bool,
    pub reveal: bool,
    pub timeout: Option<u64>,
    pub parallelism: usize,
    pub verbose: bool,
    pub format: Option<Format>,
    pub config: Option<PathBuf>,
}

pub async fn run(args: GenerateArgs) -> Result<()> {
    let settings = config::load(args.config.as_deref())?;
    let current_dir = std::env::current_dir()?;

    let inputs = resolve_inputs(&args.paths, args.target)?;
    let options = build_options(&args, &settings);
    let format = args.format.unwrap_or(settings.output.format);

    let context = ResolverContext {
        install_root: std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf)),
        workspace_roots: args
            .workspace
            .as_ref()
            .or(settings.output.workspace_root.as_ref())
            .map(|root| vec![current_dir.join(root)])
            .unwrap_or_default(),
        current_dir,
    };
    debug!("Resolver context: {:?}", context);

    let timeout = args
        .timeout
        .or(settings.generator.timeout_secs)
        .map(Duration::from_secs);
    let java = args
        .java
        .clone()
        .unwrap_or_else(|| settings.generator.java_path.clone());

    let resolver = Resolver::new(context)
        .with_source_extensions(settings.generator.source_extensions.clone());
    let orchestrator = Orchestrator::new(resolver)
        .with_java(java)
        .with_timeout(timeout);

    let requests: Vec<GenerationRequest> = inputs
        .into_iter()
        .map(|input| GenerationRequest::new(input, args.target, options.clone()))
        .collect();

    let spinner_style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{prefix:.bold.dim} {spinner} {wide_msg}")?;
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style);
    pb.set_prefix(format!("[0/{}]", requests.len()));
    pb.set_message("Running UML generator...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let reports = generate_all(&orchestrator, &requests, args.parallelism, &pb).await;

    let succeeded = reports.iter().filter(|r| r.outcome.is_success()).count();
    pb.finish_with_message(format!(
        "Generated {} of {} diagram(s)",
        succeeded,
        reports.len()
    ));

    for report in &reports {
        if let GenerationOutcome::Success { output_file_path } = &report.outcome {
            if options.auto_open_result {
                if let Err(e) = open::open_file(output_file_path) {
                    warn!("{:#}", e);
                }
            }
            if args.reveal {
                if let Err(e) = open::reveal(output_file_path) {
                    warn!("{:#}", e);
                }
            }
        }
    }

    print!("{}", output::render(&reports, format)?);

    let failed = reports.len() - succeeded;
    if failed > 0 {
        anyhow::bail!("{} of {} generation(s) failed", failed, reports.len());
    }

    info!("Done!");
    Ok(())
}

/// Run every request with bounded parallelism, stopping early on Ctrl-C.
///
/// Reports come back in request order. Requests still in flight when the
/// interrupt arrives have their generator killed and are reported as cancelled.
async fn generate_all(
    orchestrator: &Orchestrator,
    requests: &[GenerationRequest],
    parallelism: usize,
    pb: &ProgressBar,
) -> Vec<Report> {
    let mut outcomes: Vec<Option<GenerationOutcome>> = vec![None; requests.len()];

    {
        let mut pending = stream::iter(requests.iter().enumerate())
            .map(|(index, request)| async move { (index, orchestrator.generate(request).await) })
            .buffer_unordered(parallelism.max(1));

        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);

        let mut done = 0;
        loop {
            tokio::select! {
                next = pending.next() => match next {
                    Some((index, outcome)) => {
                        outcomes[index] = Some(outcome);
                        done += 1;
                        pb.set_prefix(format!("[{}/{}]", done, requests.len()));
                    }
                    None => break,
                },
                _ = &mut interrupt => {
                    warn!("Interrupted, cancelling in-flight generation");
                    break;
                }
            }
        }
        // Dropping the stream kills any generator still running
    }

    requests
        .iter()
        .zip(outcomes)
        .map(|(request, outcome)| Report {
            input: request.input_path().to_path_buf(),
            outcome: outcome.unwrap_or_else(|| {
                Err::<PathBuf, _>(GenerationError::cancelled(request.input_path())).into()
            }),
        })
        .collect()
}

/// Layer CLI flags (and their env fallbacks) over the config file
fn build_options(args: &GenerateArgs, settings: &Settings) -> GenerationOptions {
    GenerationOptions {
        include_relationships: settings.diagram.include_relationships && !args.no_relationships,
        verbose: settings.generator.verbose || args.verbose,
        auto_open_result: settings.output.auto_open_file && !args.no_open,
        custom_output_directory: args
            .output_dir
            .clone()
            .or_else(|| settings.output.directory.clone()),
        custom_tool_path: args
            .tool
            .clone()
            .or_else(|| settings.generator.tool_path.clone()),
    }
}

/// Canonicalize inputs and check they match the requested target kind
fn resolve_inputs(paths: &[String], target: Target) -> Result<Vec<PathBuf>> {
    paths
        .iter()
        .map(|raw| {
            let path = Path::new(raw)
                .canonicalize()
                .with_context(|| format!("Input not found: {}", raw))?;
            let matches = match target {
                Target::File => path.is_file(),
                Target::Directory => path.is_dir(),
            };
            if !matches {
                anyhow::bail!("{} is not a {}", path.display(), target);
            }
            Ok(path)
        })
        .collect()
}
