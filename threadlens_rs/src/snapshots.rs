//! Several snapshots of the same JVM, analyzed side by side.
//!
//! Dumps are usually captured a few seconds apart as
//! `threaddump-1-<millis>.txt`, `threaddump-2-<millis>.txt`, ... Each one is
//! analyzed into its own [`Analysis`]; nothing is shared between them, so the
//! snapshots are processed on separate threads.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::analyzer::Analysis;
use crate::analyzer::regexes::regex_dump_file_name;
use crate::config::PoolConfig;
use crate::error::ThreadlensError;
use crate::report::{AnalysisSummary, combine_summaries};

/// Highest snapshot index picked up from a directory.
pub const MAX_SNAPSHOTS: usize = 3;

/// Find `threaddump-<N>-<digits>.txt` files directly inside `dir`, keeping
/// the first file (by name) for each `N` in `1..=MAX_SNAPSHOTS`.
pub fn discover_dump_files(dir: &Path) -> Result<Vec<(usize, PathBuf)>, ThreadlensError> {
    let mut found: BTreeMap<usize, PathBuf> = BTreeMap::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|e| ThreadlensError::Io {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        let Some(caps) = regex_dump_file_name().captures(file_name) else {
            continue;
        };
        let Ok(index) = caps[1].parse::<usize>() else {
            continue;
        };
        if (1..=MAX_SNAPSHOTS).contains(&index) {
            found.entry(index).or_insert_with(|| entry.path().to_path_buf());
        }
    }

    for index in 1..=MAX_SNAPSHOTS {
        if !found.contains_key(&index) {
            warn!("no thread dump file matching threaddump-{index}-*.txt");
        }
    }

    if found.is_empty() {
        return Err(ThreadlensError::NoSnapshots {
            dir: dir.to_path_buf(),
        });
    }
    Ok(found.into_iter().collect())
}

/// Independently owned analyses keyed by snapshot index.
#[derive(Debug, Default)]
pub struct SnapshotSet {
    pub snapshots: BTreeMap<usize, Analysis>,
}

impl SnapshotSet {
    /// Analyze in-memory dumps, one thread per snapshot.
    pub fn analyze_texts(texts: Vec<(usize, String)>, pools: &PoolConfig) -> Self {
        let snapshots = std::thread::scope(|scope| {
            let handles: Vec<_> = texts
                .iter()
                .map(|(index, text)| {
                    let index = *index;
                    scope.spawn(move || {
                        let mut analysis = Analysis::new(
                            index,
                            format!("Thread Dump Analysis {index}"),
                            pools.clone(),
                        );
                        analysis.analyze(text);
                        analysis
                    })
                })
                .collect();

            handles
                .into_iter()
                .filter_map(|handle| match handle.join() {
                    Ok(analysis) => Some((analysis.id, analysis)),
                    Err(_) => {
                        warn!("snapshot analysis thread panicked");
                        None
                    }
                })
                .collect()
        });
        Self { snapshots }
    }

    /// Read and analyze dump files. Unreadable files are skipped.
    pub fn analyze_files(files: &[(usize, PathBuf)], pools: &PoolConfig) -> Self {
        let texts = files
            .iter()
            .filter_map(|(index, path)| match std::fs::read_to_string(path) {
                Ok(text) => {
                    info!("loaded snapshot {index} from {}", path.display());
                    Some((*index, text))
                }
                Err(e) => {
                    warn!("failed to read {}: {e}", path.display());
                    None
                }
            })
            .collect();
        Self::analyze_texts(texts, pools)
    }

    /// Discover and analyze the dumps in `dir`.
    pub fn analyze_dir(dir: &Path, pools: &PoolConfig) -> Result<Self, ThreadlensError> {
        let files = discover_dump_files(dir)?;
        Ok(Self::analyze_files(&files, pools))
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Analysis> {
        self.snapshots.get(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Analysis> {
        self.snapshots.values()
    }

    /// Frames of the first thread named `thread_name`, searching snapshots
    /// in index order.
    pub fn stack_trace(&self, thread_name: &str) -> Option<&[String]> {
        self.iter()
            .find_map(|analysis| analysis.thread_by_name(thread_name))
            .map(|thread| thread.frames.as_slice())
    }

    pub fn summaries(&self) -> Vec<AnalysisSummary> {
        self.iter().map(AnalysisSummary::from_analysis).collect()
    }

    /// Text renderings of every snapshot, separated by blank lines.
    pub fn combined_text(&self) -> String {
        combine_summaries(&self.summaries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Severity;
    use tempfile::TempDir;

    fn dump(name: &str, frame: &str) -> String {
        format!(
            "\"{name}\" prio=5 tid=0x1 nid=0x1 runnable\n   java.lang.Thread.State: RUNNABLE\n\tat {frame}\n"
        )
    }

    #[test]
    fn discovers_first_file_per_index() {
        let temp = TempDir::new().expect("temp dir");
        for name in [
            "threaddump-2-200.txt",
            "threaddump-1-150.txt",
            "threaddump-1-100.txt",
            "threaddump-4-400.txt",
            "notes.txt",
        ] {
            std::fs::write(temp.path().join(name), "x").expect("write");
        }

        let files = discover_dump_files(temp.path()).expect("discover");
        let names: Vec<(usize, String)> = files
            .iter()
            .map(|(i, p)| (*i, p.file_name().unwrap().to_string_lossy().into_owned()))
            .collect();
        assert_eq!(
            names,
            vec![
                (1, "threaddump-1-100.txt".to_string()),
                (2, "threaddump-2-200.txt".to_string()),
            ]
        );
    }

    #[test]
    fn empty_dir_is_an_error() {
        let temp = TempDir::new().expect("temp dir");
        let err = discover_dump_files(temp.path()).unwrap_err();
        assert!(matches!(err, ThreadlensError::NoSnapshots { .. }));
    }

    #[test]
    fn snapshots_are_independent() {
        let set = SnapshotSet::analyze_texts(
            vec![
                (1, dump("alpha", "A.run(A.java:1)")),
                (2, dump("beta", "B.run(B.java:2)")),
            ],
            &PoolConfig::default(),
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).map(|a| a.name.as_str()), Some("Thread Dump Analysis 1"));
        assert!(set.get(1).unwrap().thread_by_name("beta").is_none());
        assert_eq!(
            set.stack_trace("beta"),
            Some(&["B.run(B.java:2)".to_string()][..])
        );
        assert!(set.stack_trace("gamma").is_none());
        assert!(set
            .iter()
            .all(|a| a.deadlock_status.severity == Severity::NoRisk));
    }

    #[test]
    fn stack_trace_prefers_earliest_snapshot() {
        let set = SnapshotSet::analyze_texts(
            vec![
                (2, dump("same", "Later.run(L.java:2)")),
                (1, dump("same", "Earlier.run(E.java:1)")),
            ],
            &PoolConfig::default(),
        );
        assert_eq!(
            set.stack_trace("same").map(|f| f[0].as_str()),
            Some("Earlier.run(E.java:1)")
        );
    }

    #[test]
    fn analyze_dir_skips_missing_indices() {
        let temp = TempDir::new().expect("temp dir");
        std::fs::write(
            temp.path().join("threaddump-3-999.txt"),
            dump("only", "O.run(O.java:3)"),
        )
        .expect("write");

        let set = SnapshotSet::analyze_dir(temp.path(), &PoolConfig::default()).expect("analyze");
        assert_eq!(set.len(), 1);
        assert!(set.get(3).is_some());
        assert!(set.combined_text().contains("    only"));
    }

    #[test]
    fn unreadable_file_is_skipped() {
        let temp = TempDir::new().expect("temp dir");
        let present = temp.path().join("a.txt");
        std::fs::write(&present, dump("here", "H.run(H.java:1)")).expect("write");
        let files = vec![(1, present), (2, temp.path().join("missing.txt"))];

        let set = SnapshotSet::analyze_files(&files, &PoolConfig::default());
        assert_eq!(set.len(), 1);
        assert!(set.get(2).is_none());
    }
}
