//! # threadlens
//!
//! **JVM thread dump analyzer** - turns raw `jstack`-style thread dumps into
//! structured thread records, groups them by state and pool, builds the
//! lock wait-for graph and flags deadlocks.
//!
//! ## Features
//!
//! - **Tolerant parsing** - vendor/version differences, names spanning lines,
//!   unrecognised lines are counted instead of rejected
//! - **Thread status** - running, waiting to acquire, awaiting notification, ...
//! - **Pools** - bucket threads by configured name fragments
//! - **Synchronizers** - holders, lock waiters and notification waiters per lock
//! - **Deadlock detection** - per-lock risk and an overall verdict
//! - **Snapshots** - several dumps of one JVM, analyzed independently
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust
//! use threadlens::analyzer::{Severity, ThreadStatus, analyze_text};
//! use threadlens::config::PoolConfig;
//!
//! let dump = "\"main\" #1 prio=5 os_prio=0 tid=0x01 nid=0x02 runnable\n   java.lang.Thread.State: RUNNABLE\n\tat com.example.Foo.bar(Foo.java:10)";
//! let analysis = analyze_text(dump, &PoolConfig::default());
//!
//! assert_eq!(analysis.threads[0].name, "main");
//! assert_eq!(analysis.status_of(0), Some(ThreadStatus::Running));
//! assert_eq!(analysis.deadlock_status.severity, Severity::NoRisk);
//! ```
//!
//! ## Several Snapshots
//!
//! ```rust,no_run
//! use std::path::Path;
//! use threadlens::config::PoolConfig;
//! use threadlens::snapshots::SnapshotSet;
//!
//! let pools = PoolConfig::from_names(["http-nio", "ForkJoinPool"]);
//! let set = SnapshotSet::analyze_dir(Path::new("dumps"), &pools).unwrap();
//! println!("{}", set.combined_text());
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! threadlens dump.txt                     # Terminal report
//! threadlens dumps/ --pools pools.json    # threaddump-1..3 from a folder
//! threadlens dump.txt --json              # Machine-readable output
//! threadlens dumps/ --thread main         # Stack trace of one thread
//! ```

/// Parsing, classification, pools, synchronizers and deadlock detection.
///
/// # Submodules
///
/// - [`analyzer::thread`] - parsed thread records
/// - [`analyzer::status`] - thread status classification
/// - [`analyzer::pools`] - pool grouping
/// - [`analyzer::synchronizers`] - lock registry
/// - [`analyzer::deadlocks`] - deadlock detection
/// - [`analyzer::counter`] - string frequency tallies
pub mod analyzer;

/// Pool configuration (JSON or TOML).
pub mod config;

/// Errors of the loading layer.
pub mod error;

/// Summary, text and terminal renderings.
pub mod report;

/// Multi-snapshot loading and lookup.
pub mod snapshots;

pub use analyzer::{Analysis, analyze_text};
pub use config::PoolConfig;
pub use error::ThreadlensError;
