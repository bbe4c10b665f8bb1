//! Frame-sequence grouping for delivery reports.
//!
//! Successful destinations named `<prefix><sep><digits>.<ext>` (`sep` is `.` or `_`) are grouped
//! by parent directory, prefix and extension. Groups of two or more collapse to
//! `<prefix>.[<first>-<last>].<ext>` with the frame numbers printed without padding; ranges are
//! min to max and gaps are not reported.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use consign_model::ItemResult;
use regex::Regex;
use serde::Serialize;

static FRAME_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn frame_pattern() -> Option<&'static Regex> {
    FRAME_PATTERN
        .get_or_init(|| Regex::new(r"^(.*?)[._](\d+)\.([a-zA-Z0-9]+)$").ok())
        .as_ref()
}

/// One row of a grouped delivery report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayEntry {
    /// Source label: a base file name, a collapsed range, or the full path of a failure.
    pub source: String,
    /// Destination label, same conventions as `source`.
    pub destination: String,
    /// Description carried from the result (lowest frame for ranges).
    pub description: Option<String>,
    /// Whether the entry represents delivered files.
    pub success: bool,
    /// Failure detail for failed entries.
    pub error: Option<String>,
}

impl DisplayEntry {
    fn unchanged(result: &ItemResult) -> Self {
        Self {
            source: result.source.clone(),
            destination: result.destination.clone(),
            description: result.description.clone(),
            success: result.success,
            error: result.error.clone(),
        }
    }

    fn single(result: &ItemResult) -> Self {
        Self {
            source: base_name(&result.source),
            destination: base_name(&result.destination),
            description: result.description.clone(),
            success: true,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SequenceKey {
    parent: String,
    prefix: String,
    extension: String,
}

struct Frame<'a> {
    number: u64,
    result: &'a ItemResult,
}

enum Slot<'a> {
    Sequence {
        prefix: String,
        extension: String,
        frames: Vec<Frame<'a>>,
    },
    Single(&'a ItemResult),
}

/// Collapse numbered frames into ranges for display.
///
/// Successful entries come first, in the order their group (or lone file) was first seen;
/// failures follow unmodified in their original order and never join a group.
#[must_use]
pub fn group_sequences(results: &[ItemResult]) -> Vec<DisplayEntry> {
    let mut slots: Vec<Slot<'_>> = Vec::new();
    let mut index: HashMap<SequenceKey, usize> = HashMap::new();
    let mut failures = Vec::new();

    for result in results {
        if !result.success {
            failures.push(DisplayEntry::unchanged(result));
            continue;
        }

        let Some((key, frame)) = parse_frame(result) else {
            slots.push(Slot::Single(result));
            continue;
        };

        if let Some(&slot) = index.get(&key) {
            if let Slot::Sequence { frames, .. } = &mut slots[slot] {
                frames.push(frame);
            }
        } else {
            index.insert(key.clone(), slots.len());
            slots.push(Slot::Sequence {
                prefix: key.prefix,
                extension: key.extension,
                frames: vec![frame],
            });
        }
    }

    let mut entries: Vec<DisplayEntry> = slots.into_iter().map(collapse).collect();
    entries.extend(failures);
    entries
}

fn collapse(slot: Slot<'_>) -> DisplayEntry {
    match slot {
        Slot::Single(result) => DisplayEntry::single(result),
        Slot::Sequence {
            prefix,
            extension,
            mut frames,
        } => {
            if frames.len() == 1 {
                return DisplayEntry::single(frames[0].result);
            }
            frames.sort_by_key(|frame| frame.number);
            let first = &frames[0];
            let last = &frames[frames.len() - 1];
            let label = format!("{prefix}.[{}-{}].{extension}", first.number, last.number);
            DisplayEntry {
                source: label.clone(),
                destination: label,
                description: first.result.description.clone(),
                success: true,
                error: None,
            }
        }
    }
}

fn parse_frame(result: &ItemResult) -> Option<(SequenceKey, Frame<'_>)> {
    let destination = Path::new(&result.destination);
    let name = destination.file_name()?.to_str()?;
    let captures = frame_pattern()?.captures(name)?;
    let prefix = captures.get(1)?.as_str();
    let digits = captures.get(2)?.as_str();
    let extension = captures.get(3)?.as_str();
    let number = digits.parse::<u64>().ok()?;

    let parent = destination
        .parent()
        .map(|parent| parent.to_string_lossy().into_owned())
        .unwrap_or_default();

    Some((
        SequenceKey {
            parent,
            prefix: prefix.to_string(),
            extension: extension.to_string(),
        },
        Frame { number, result },
    ))
}

fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map_or_else(|| path.to_string(), |name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(destination: &str) -> ItemResult {
        ItemResult::succeeded(
            format!("/src/{destination}"),
            format!("/out/PKG/{destination}"),
            None,
        )
    }

    #[test]
    fn consecutive_frames_collapse_to_a_range() {
        let mut results = vec![
            ok("sh010/shot.1003.exr"),
            ok("sh010/shot.1001.exr"),
            ok("sh010/shot.1002.exr"),
        ];
        results[1].description = Some("Final comp".into());
        let entries = group_sequences(&results);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].destination, "shot.[1001-1003].exr");
        assert_eq!(entries[0].source, "shot.[1001-1003].exr");
        assert_eq!(entries[0].description.as_deref(), Some("Final comp"));
        assert!(entries[0].success);
    }

    #[test]
    fn gaps_are_not_reported() {
        let results = vec![ok("a_0001.dpx"), ok("a_0005.dpx"), ok("a_0003.dpx")];
        let entries = group_sequences(&results);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].destination, "a.[1-5].dpx");
    }

    #[test]
    fn range_bounds_drop_zero_padding() {
        let results = vec![ok("a.0001.dpx"), ok("a.0002.dpx"), ok("a.0005.dpx")];
        let entries = group_sequences(&results);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, "a.[1-5].dpx");
        assert_eq!(entries[0].destination, "a.[1-5].dpx");
    }

    #[test]
    fn singles_and_other_files_show_base_names() {
        let results = vec![ok("sh010/shot.1001.exr"), ok("docs/other.txt")];
        let entries = group_sequences(&results);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].destination, "shot.1001.exr");
        assert_eq!(entries[0].source, "shot.1001.exr");
        assert_eq!(entries[1].destination, "other.txt");
    }

    #[test]
    fn groups_are_split_by_directory_and_extension() {
        let results = vec![
            ok("a/shot.1001.exr"),
            ok("b/shot.1001.exr"),
            ok("a/shot.1002.exr"),
            ok("b/shot.1002.exr"),
            ok("a/shot.1001.jpg"),
        ];
        let entries = group_sequences(&results);
        let labels: Vec<&str> = entries.iter().map(|e| e.destination.as_str()).collect();
        assert_eq!(
            labels,
            ["shot.[1001-1002].exr", "shot.[1001-1002].exr", "shot.1001.jpg"]
        );
    }

    #[test]
    fn failures_never_merge_and_come_last() {
        let results = vec![
            ItemResult::failed("/src/shot.1000.exr", "/out/PKG/shot.1000.exr", None, "io"),
            ok("shot.1001.exr"),
            ok("shot.1002.exr"),
            ItemResult::failed("/src/missing", "", None, "source not found"),
        ];
        let entries = group_sequences(&results);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].destination, "shot.[1001-1002].exr");
        assert!(!entries[1].success);
        assert_eq!(entries[1].source, "/src/shot.1000.exr");
        assert_eq!(entries[1].error.as_deref(), Some("io"));
        assert_eq!(entries[2].source, "/src/missing");
    }

    #[test]
    fn empty_input_yields_no_entries() {
        assert!(group_sequences(&[]).is_empty());
    }
}
