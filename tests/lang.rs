//! Runs every script under `tests/lox/` and compares what it printed with
//! the `// expect: ` annotations in the script. When a run fails, each
//! diagnostic's first line is appended to the output, so error scripts
//! annotate the expected message the same way.

mod common;

use std::fs;
use std::path::{Path, PathBuf};

use lox_interpreter::RunError;
use pretty_assertions::assert_eq;

const EXPECT_COMMENT: &str = "// expect: ";

fn scripts() -> Vec<PathBuf> {
    let dir: PathBuf = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("lox");

    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("could not read {}: {}", dir.display(), e))
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "lox"))
        .collect();

    paths.sort();
    paths
}

fn expected_output(source: &str) -> String {
    let mut expected = String::new();

    for line in source.lines() {
        if let Some(idx) = line.find(EXPECT_COMMENT) {
            expected += &line[idx + EXPECT_COMMENT.len()..];
            expected += "\n";
        }
    }

    expected
}

fn actual_output(source: &str) -> String {
    let (mut session, buffer) = common::session();

    let mut diagnostics: Vec<String> = Vec::new();
    match session.run(source) {
        Ok(()) => {}
        Err(RunError::Static(errors)) => {
            diagnostics.extend(errors.iter().map(ToString::to_string));
        }
        Err(RunError::Runtime(e)) => diagnostics.push(e.to_string()),
    }

    let mut output: String = buffer.contents();
    for diagnostic in diagnostics {
        output += diagnostic.lines().next().unwrap_or_default();
        output += "\n";
    }

    output
}

#[test]
fn lox_scripts() {
    let paths: Vec<PathBuf> = scripts();
    assert!(!paths.is_empty(), "no .lox scripts found");

    for path in paths {
        let source: String = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("could not read {}: {}", path.display(), e));

        assert_eq!(
            expected_output(&source),
            actual_output(&source),
            "script {}",
            path.display()
        );
    }
}
