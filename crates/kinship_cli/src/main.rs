//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `kinship_core` linkage.
//! - Render a bulk text family file as generation rows.

use clap::Parser;
use kinship_core::{FamilyOptions, FamilyService, LevelGroup};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "kinship_cli")]
#[command(about = "Print core linkage info and render a family file as generations")]
struct Args {
    /// Bulk text family file (`NAME:..; PARENTS:..` per line)
    path: Option<PathBuf>,

    /// Show the neighborhood of this member instead of the full tree
    #[arg(requires = "path")]
    focus: Option<String>,

    /// Skip sibling inference from shared parents
    #[arg(long)]
    no_infer_siblings: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    println!("kinship_core ping={}", kinship_core::ping());
    println!("kinship_core version={}", kinship_core::core_version());

    let Some(path) = args.path else {
        return ExitCode::SUCCESS;
    };
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("cannot read `{}`: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut service = FamilyService::new(FamilyOptions {
        infer_siblings: !args.no_infer_siblings,
    });
    let change = service.import_bulk_text(&text);
    println!("members={} edges={}", service.store().len(), change.edges_added);

    let groups = match args.focus {
        Some(focus) => {
            let Some(member) = service.store().get(&focus) else {
                eprintln!("unknown member `{focus}`");
                return ExitCode::FAILURE;
            };
            match service.connected_family_of(member.id) {
                Ok(groups) => groups,
                Err(err) => {
                    eprintln!("{err}");
                    return ExitCode::FAILURE;
                }
            }
        }
        None => service.all_levels(),
    };
    print_levels(&groups);

    let unplaced = service.unplaced_members();
    if !unplaced.is_empty() {
        let names = unplaced
            .iter()
            .map(|member| member.name.as_str())
            .collect::<Vec<_>>();
        println!("unknown generation: {}", names.join(", "));
    }
    ExitCode::SUCCESS
}

fn print_levels(groups: &[LevelGroup]) {
    for group in groups {
        println!("level {}: {}", group.level, group.names().join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::error::ErrorKind;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn help_flag_shows_usage_instead_of_reading_a_file() {
        let err = Args::try_parse_from(["kinship_cli", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn path_and_focus_are_positional() {
        let args = Args::try_parse_from(["kinship_cli", "family.txt", "Ann"]).unwrap();
        assert_eq!(args.path, Some(PathBuf::from("family.txt")));
        assert_eq!(args.focus.as_deref(), Some("Ann"));
        assert!(!args.no_infer_siblings);
    }

    #[test]
    fn no_arguments_only_probes_linkage() {
        let args = Args::try_parse_from(["kinship_cli"]).unwrap();
        assert!(args.path.is_none());
        assert!(args.focus.is_none());
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let err = Args::try_parse_from(["kinship_cli", "--verbose"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }
}
