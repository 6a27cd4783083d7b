//! Build tool report parsing
//!
//! The fetch task prints sections headed `Copied artifacts:`,
//! `Missing artifacts:` and `Modified artifacts:`. Lines under a header are
//! collected until a blank line or the next header.

use std::path::{Path, PathBuf};

const COPIED: &str = "Copied artifacts:";
const MISSING: &str = "Missing artifacts:";
const MODIFIED: &str = "Modified artifacts:";

/// Artifacts reported by one build tool run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub copied: Vec<PathBuf>,
    pub missing: Vec<String>,
    pub modified: Vec<PathBuf>,
}

#[derive(Clone, Copy)]
enum Section {
    Copied,
    Missing,
    Modified,
}

impl FetchReport {
    /// Parse tool stdout. Paths are resolved against `dest`. Output without
    /// any recognised section yields an empty report.
    pub fn parse(stdout: &str, dest: &Path) -> Self {
        let mut report = Self::default();
        let mut section = None;

        for raw in stdout.lines() {
            let line = raw.trim();
            match line {
                COPIED => section = Some(Section::Copied),
                MISSING => section = Some(Section::Missing),
                MODIFIED => section = Some(Section::Modified),
                "" => section = None,
                _ => match section {
                    Some(Section::Copied) => report.copied.push(resolve(dest, line)),
                    Some(Section::Missing) => report.missing.push(line.to_string()),
                    Some(Section::Modified) => report.modified.push(resolve(dest, line)),
                    None => {}
                },
            }
        }
        report
    }
}

fn resolve(dest: &Path, line: &str) -> PathBuf {
    dest.join(line.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections() {
        let dest = Path::new("/proj/Plugins");
        let report = FetchReport::parse(
            "Copied artifacts:\nlibs/a.aar\n\nMissing artifacts:\ngroup:artifact:1.0\n",
            dest,
        );
        assert_eq!(report.copied, vec![PathBuf::from("/proj/Plugins/libs/a.aar")]);
        assert_eq!(report.missing, vec!["group:artifact:1.0".to_string()]);
        assert!(report.modified.is_empty());
    }

    #[test]
    fn header_ends_previous_section() {
        let report = FetchReport::parse(
            "> Task :copyPackages\nCopied artifacts:\na.aar\nModified artifacts:\nb.aar\nnoise after\n\ntrailing\n",
            Path::new("/d"),
        );
        assert_eq!(report.copied, vec![PathBuf::from("/d/a.aar")]);
        assert_eq!(
            report.modified,
            vec![PathBuf::from("/d/b.aar"), PathBuf::from("/d/noise after")]
        );
    }

    #[test]
    fn windows_separators_normalized() {
        let report = FetchReport::parse("Copied artifacts:\nsub\\c.jar\n", Path::new("/d"));
        assert_eq!(report.copied, vec![PathBuf::from("/d/sub/c.jar")]);
    }

    #[test]
    fn unrecognised_output_is_empty() {
        assert_eq!(
            FetchReport::parse("BUILD SUCCESSFUL\n", Path::new("/d")),
            FetchReport::default()
        );
    }
}
