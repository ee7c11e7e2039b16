use crate::cli::TrajArgs;
use crate::config::PartialTrajConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use anmo::core::io::read_model;
use anmo::core::io::tinker::TinkerArc;
use anmo::core::io::traits::Trajectory;
use anmo::engine::progress::ProgressReporter;
use anmo::workflows;
use tracing::{info, warn};

pub fn run(args: TrajArgs, quiet: bool) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialTrajConfig::from_file(path)?,
        None => PartialTrajConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial_config.merge_with_cli(&args)?;

    info!("Loading model from {:?}", &args.model);
    let model = read_model(&args.model).map_err(|e| CliError::FileParsing {
        path: args.model.clone(),
        source: e.into(),
    })?;
    let subset = settings.selection.apply(&model)?;
    info!(
        "Selection '{}' picked {} of {} atoms.",
        settings.selection,
        subset.len(),
        model.len()
    );

    let mut trajectory = TinkerArc::open(&args.traj).map_err(|e| CliError::FileParsing {
        path: args.traj.clone(),
        source: e.into(),
    })?;
    if trajectory.atom_count() != model.len() {
        warn!(
            "Trajectory frames have {} atoms but the model has {}.",
            trajectory.atom_count(),
            model.len()
        );
    }

    let progress_handler = CliProgressHandler::new(quiet);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let header = invocation_header(std::env::args());

    if !quiet {
        println!(
            "Analyzing {} frames of {} over {} atoms...",
            frames_after_skip(trajectory.frame_count(), settings.config.skip),
            args.traj.display(),
            subset.len()
        );
    }
    let report = workflows::traj::run(
        &subset,
        &mut trajectory,
        &settings.config,
        &header,
        &reporter,
    )?;

    if !quiet {
        println!(
            "Analyzed {} frames. Results written to {}_s.asc and {}_{}.asc",
            report.frames(),
            settings.config.output_prefix,
            settings.config.output_prefix,
            report.tag
        );
    }
    Ok(())
}

fn frames_after_skip(frame_count: usize, skip: usize) -> usize {
    frame_count.saturating_sub(skip)
}

/// The command line that produced an artifact, followed by the tool version.
fn invocation_header(args: impl IntoIterator<Item = String>) -> String {
    let command = args.into_iter().collect::<Vec<_>>().join(" ");
    format!("{} - anmo v{}", command, env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_records_command_line_and_version() {
        let header = invocation_header(
            ["anmo", "traj", "model.pdb", "run.arc", "-O"]
                .iter()
                .map(|s| s.to_string()),
        );
        assert!(header.starts_with("anmo traj model.pdb run.arc -O - anmo v"));
        assert!(header.ends_with(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn announced_frame_count_excludes_skipped_frames() {
        assert_eq!(frames_after_skip(12, 0), 12);
        assert_eq!(frames_after_skip(12, 5), 7);
        assert_eq!(frames_after_skip(12, 12), 0);
        assert_eq!(frames_after_skip(12, 20), 0);
    }
}
