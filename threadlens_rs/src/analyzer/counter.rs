//! Frequency tally of strings (ignored lines, running-method hotspots).

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct Tally {
    count: usize,
    sources: Vec<usize>,
}

/// Counts occurrences of strings, optionally remembering which thread
/// (by index into `Analysis::threads`) contributed each occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StringCounter {
    strings: BTreeMap<String, Tally>,
    total: usize,
}

/// One row of [`StringCounter::entries`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountedString {
    pub count: usize,
    pub string: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<usize>,
}

impl StringCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, string: &str) {
        self.tally(string);
    }

    pub fn add_with_source(&mut self, string: &str, source: usize) {
        self.tally(string).sources.push(source);
    }

    fn tally(&mut self, string: &str) -> &mut Tally {
        self.total += 1;
        let tally = self.strings.entry(string.to_string()).or_default();
        tally.count += 1;
        tally
    }

    pub fn contains(&self, string: &str) -> bool {
        self.strings.contains_key(string)
    }

    pub fn count(&self, string: &str) -> usize {
        self.strings.get(string).map_or(0, |tally| tally.count)
    }

    /// Total number of `add` calls.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn distinct(&self) -> usize {
        self.strings.len()
    }

    /// Rows sorted by count (descending), then string.
    pub fn entries(&self) -> Vec<CountedString> {
        let mut rows: Vec<CountedString> = self
            .strings
            .iter()
            .map(|(string, tally)| CountedString {
                count: tally.count,
                string: string.clone(),
                sources: tally.sources.clone(),
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.string.cmp(&b.string)));
        rows
    }

    pub fn sort_sources_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&usize, &usize) -> Ordering,
    {
        for tally in self.strings.values_mut() {
            tally.sources.sort_by(&mut compare);
        }
    }
}

impl fmt::Display for StringCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.entries();
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{} {}", row.count, row.string)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_sorts() {
        let mut counter = StringCounter::new();
        counter.add("b");
        counter.add("a");
        counter.add("b");
        counter.add("c");

        assert_eq!(counter.len(), 4);
        assert_eq!(counter.distinct(), 3);
        assert_eq!(counter.count("b"), 2);
        assert_eq!(counter.count("zzz"), 0);
        assert!(counter.contains("a"));

        let strings: Vec<String> = counter.entries().into_iter().map(|e| e.string).collect();
        assert_eq!(strings, vec!["b", "a", "c"]);
        assert_eq!(counter.to_string(), "2 b\n1 a\n1 c");
    }

    #[test]
    fn keeps_and_sorts_sources() {
        let mut counter = StringCounter::new();
        counter.add_with_source("Foo.run", 7);
        counter.add_with_source("Foo.run", 2);
        counter.sort_sources_by(|a, b| a.cmp(b));

        let entries = counter.entries();
        assert_eq!(entries[0].sources, vec![2, 7]);
    }

    #[test]
    fn empty_counter_renders_nothing() {
        let counter = StringCounter::new();
        assert!(counter.is_empty());
        assert_eq!(counter.to_string(), "");
    }
}
