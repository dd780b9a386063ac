use clap::Parser;
use std::path::PathBuf;

/// Module dependency scanner and BUILD descriptor synchronizer
#[derive(Parser, Debug)]
#[command(
    name = "modsync",
    about = "Module dependency scanner and BUILD descriptor synchronizer for C++20 modules",
    version,
    long_about = "modsync scans a project tree for C++20 module interface files (.ixx), \
                  reconstructs the inter-module dependency graph including partitions, and \
                  rewrites the module_dependencies field of each cc_module_library and \
                  cc_module_binary target in the BUILD file to match.\n\n\
                  Examples:\n  \
                  modsync\n  \
                  modsync /path/to/project\n  \
                  modsync --check /path/to/project\n  \
                  modsync --jobs 1 --dump-json deps.json"
)]
pub struct CliArgs {
    #[arg(
        value_name = "PROJECT_ROOT",
        default_value = ".",
        help = "Project root containing the BUILD file and interface files"
    )]
    pub project_root: PathBuf,

    #[arg(
        short = 'j',
        long,
        value_name = "N",
        help = "Number of scan worker threads (defaults to available parallelism)"
    )]
    pub jobs: Option<usize>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Write the module table and dependency graph as JSON"
    )]
    pub dump_json: Option<PathBuf>,

    #[arg(long, help = "Report changes without rewriting the BUILD file")]
    pub check: bool,

    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, help = "Verbose output (debug logging)")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["modsync"]);
        assert_eq!(args.project_root, PathBuf::from("."));
        assert!(args.jobs.is_none());
        assert!(!args.check);
        assert!(!args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_positional_root_and_flags() {
        let args = CliArgs::parse_from([
            "modsync",
            "/tmp/project",
            "--jobs",
            "2",
            "--check",
            "--dump-json",
            "deps.json",
        ]);
        assert_eq!(args.project_root, PathBuf::from("/tmp/project"));
        assert_eq!(args.jobs, Some(2));
        assert!(args.check);
        assert_eq!(args.dump_json, Some(PathBuf::from("deps.json")));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(CliArgs::try_parse_from(["modsync", "-v", "-q"]).is_err());
    }
}
