//! Table of contents and session statistics files

use crate::error::{ProjectError, ProjectResult};
use crate::tree::{ItemClass, ProjectTree};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// File name of the table of contents in the project root
pub const TOC_FILE: &str = "ToC.txt";

/// File name of the session log inside the meta folder
pub const STATS_FILE: &str = "sessionStats.log";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Word totals of a tree, split into novel text and notes
pub fn word_totals(tree: &ProjectTree) -> (usize, usize) {
    tree.walk()
        .into_iter()
        .filter(|item| item.is_file())
        .fold((0, 0), |(novel, notes), item| {
            if item.class == ItemClass::Novel {
                (novel + item.word_count, notes)
            } else {
                (novel, notes + item.word_count)
            }
        })
}

/// Write `ToC.txt`, one line per file item in tree order
pub fn write_toc(project_path: &Path, tree: &ProjectTree) -> ProjectResult<()> {
    let path = project_path.join(TOC_FILE);
    let mut text = String::new();
    text.push_str("Table of Contents\n");
    text.push_str("=================\n\n");
    let _ = writeln!(
        text,
        "{:<25}  {:<9}  {:<10}  Document Label",
        "File Name", "Class", "Layout"
    );
    text.push_str(&"-".repeat(80));
    text.push('\n');

    for item in tree.walk().into_iter().filter(|item| item.is_file()) {
        let _ = writeln!(
            text,
            "{:<25}  {:<9}  {:<10}  {}",
            format!("content/{}.nwd", item.handle),
            item.class.to_string(),
            item.layout.to_string(),
            item.name()
        );
    }
    text.push('\n');

    fs::write(&path, text).map_err(|e| ProjectError::path(&path, e))
}

/// Append one session record to `meta/sessionStats.log`
///
/// A header line is written when the log is created.
pub fn append_session_stats(
    meta_path: &Path,
    start: DateTime<Local>,
    end: DateTime<Local>,
    novel_words: usize,
    note_words: usize,
) -> ProjectResult<()> {
    let path = meta_path.join(STATS_FILE);
    let is_new = !path.exists();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| ProjectError::path(&path, e))?;

    if is_new {
        writeln!(file, "# Offset 0")?;
        writeln!(file, "# Start Time         End Time                Novel     Notes")?;
    }
    writeln!(
        file,
        "{}  {}  {:8}  {:8}",
        start.format(TIME_FORMAT),
        end.format(TIME_FORMAT),
        novel_words,
        note_words
    )?;
    Ok(())
}
