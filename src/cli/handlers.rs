//! Command handling
//!
//! Turns a parsed CLI invocation into a sync run, prints the human summary
//! to stdout, and maps failures to the process exit code.

use super::commands::CliArgs;
use crate::build::patcher::PatchAction;
use crate::output::ScanReport;
use crate::sync::{SyncError, SyncOptions, SyncReport, SyncService};
use tracing::error;

/// Runs the sync pipeline and returns the process exit code.
pub fn handle_sync(args: &CliArgs) -> i32 {
    let options = SyncOptions {
        jobs: args.jobs,
        check: args.check,
    };

    let service = match SyncService::new(args.project_root.clone(), options) {
        Ok(service) => service,
        Err(err) => return fail(err),
    };

    let report = match service.run() {
        Ok(report) => report,
        Err(err) => return fail(err),
    };

    if let Some(path) = &args.dump_json {
        let artifact = ScanReport::build(&report.table, &report.graph);
        if let Err(err) = artifact.write_to(path) {
            error!(error = %err, "Failed to write JSON report");
            eprintln!("Error: {err}");
            return 1;
        }
    }

    if !args.quiet {
        print_summary(&report, args.check);
    }

    0
}

fn fail(err: SyncError) -> i32 {
    error!(error = %err, "Sync failed");
    eprintln!("{}", err.help_message());
    1
}

fn print_summary(report: &SyncReport, check: bool) {
    println!(
        "Modules: {} (from {} interface files)",
        report.table.len(),
        report.interface_file_count
    );
    println!("Modules with dependencies: {}", report.graph.len());
    println!("Total dependencies: {}", report.graph.total_dependencies());

    let invalid = report.table.invalid_filenames();
    println!("Filename convention violations: {}", invalid.len());
    for info in &invalid {
        let actual = info
            .source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "  {} -> expected {}, actual {}",
            info.name, info.expected_filename, actual
        );
    }

    println!("Build targets: {}", report.targets.len());
    for (target, action) in &report.outcome.updated {
        let verb = match action {
            PatchAction::Replaced => "updated",
            PatchAction::Inserted => "added",
        };
        println!("  {verb} module_dependencies of {target}");
    }

    if report.outcome.written {
        println!("Descriptor updated: {}", report.descriptor_path.display());
    } else if report.outcome.changed && check {
        println!(
            "Descriptor out of date (check mode): {}",
            report.descriptor_path.display()
        );
    } else {
        println!("Descriptor already up to date");
    }

    println!("Elapsed: {} ms", report.elapsed_ms);
}
