use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Bump whenever the on-disk layout of [`PhiloGraph`] changes.
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("edge chain from \"{0}\" loops back on itself")]
    CycleDetected(String),
    #[error("\"{0}\" has no recorded edge")]
    MissingEdge(String),
}

/// A `Title -> V` map bucketed by the title's first character. The buckets keep
/// the serialized file browsable and make per-letter scans cheap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionedMap<V> {
    buckets: HashMap<char, HashMap<String, V>>,
}

impl<V> PartitionedMap<V> {
    pub fn new() -> Self {
        Self { buckets: HashMap::new() }
    }

    fn bucket_of(title: &str) -> char {
        title.chars().next().unwrap_or('\0')
    }

    pub fn get(&self, title: &str) -> Option<&V> {
        self.buckets.get(&Self::bucket_of(title))?.get(title)
    }

    pub fn get_mut(&mut self, title: &str) -> Option<&mut V> {
        self.buckets.get_mut(&Self::bucket_of(title))?.get_mut(title)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.get(title).is_some()
    }

    pub fn insert(&mut self, title: String, value: V) {
        self.buckets
            .entry(Self::bucket_of(&title))
            .or_default()
            .insert(title, value);
    }

    pub fn remove(&mut self, title: &str) -> Option<V> {
        self.buckets.get_mut(&Self::bucket_of(title))?.remove(title)
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(|bucket| bucket.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(|bucket| bucket.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.buckets.values().flat_map(|bucket| bucket.iter())
    }
}

impl<V> Default for PartitionedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide crawl state: one resolved outgoing edge per title, the
/// memoized hop-count to the root, and how many finished walks passed through
/// each title. All three are persisted together as one versioned document.
#[derive(Debug, Serialize, Deserialize)]
pub struct PhiloGraph {
    version: u32,
    root: String,
    links: PartitionedMap<String>,
    distance: PartitionedMap<u32>,
    hubs: PartitionedMap<u64>,
}

impl PhiloGraph {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            version: SAVE_VERSION,
            root: root.into(),
            links: PartitionedMap::new(),
            distance: PartitionedMap::new(),
            hubs: PartitionedMap::new(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn has(&self, title: &str) -> bool {
        self.links.contains(title)
    }

    pub fn get(&self, title: &str) -> Option<&String> {
        self.links.get(title)
    }

    /// Record `title -> link_title`. First write wins: a title that already has
    /// an edge keeps it, so re-crawling a known page is a no-op.
    pub fn put(&mut self, title: &str, link_title: &str) {
        if !self.links.contains(title) {
            self.links.insert(title.to_string(), link_title.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> impl Iterator<Item = (&String, &String)> {
        self.links.iter()
    }

    pub fn distances(&self) -> impl Iterator<Item = (&String, &u32)> {
        self.distance.iter()
    }

    pub fn hubs(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.hubs.iter()
    }

    pub fn distance_of(&self, title: &str) -> Option<u32> {
        self.distance.get(title).copied()
    }

    pub fn hub_count(&self, title: &str) -> Option<u64> {
        self.hubs.get(title).copied()
    }

    /// Compute (and memoize) the hop-count from `title` to the root, walking
    /// stored edges. Keeps the invariant `distance[t] == distance[edge(t)] + 1`
    /// with `distance == 1` exactly for direct neighbors of the root.
    ///
    /// Iterative with an explicit visited set, so a chain that loops without
    /// reaching the root fails fast instead of recursing forever.
    pub fn ensure_distance(&mut self, title: &str) -> Result<u32, GraphError> {
        let mut pending: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut current = title.to_string();

        let mut hops = loop {
            if let Some(known) = self.distance.get(&current) {
                break *known;
            }
            let next = self
                .links
                .get(&current)
                .ok_or_else(|| GraphError::MissingEdge(current.clone()))?
                .clone();
            if next == self.root {
                self.distance.insert(current.clone(), 1);
                break 1;
            }
            if !seen.insert(current.clone()) {
                return Err(GraphError::CycleDetected(title.to_string()));
            }
            pending.push(current);
            current = next;
        };

        while let Some(waiting) = pending.pop() {
            hops += 1;
            self.distance.insert(waiting, hops);
        }
        Ok(hops)
    }

    /// Bump the hub count for every title between `title` and the root. The
    /// root itself is never counted.
    pub fn record_walk(&mut self, title: &str) -> Result<(), GraphError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut current = title.to_string();
        while current != self.root {
            if !seen.insert(current.clone()) {
                return Err(GraphError::CycleDetected(title.to_string()));
            }
            let next = self
                .links
                .get(&current)
                .ok_or_else(|| GraphError::MissingEdge(current.clone()))?
                .clone();
            match self.hubs.get_mut(&current) {
                Some(count) => *count += 1,
                None => self.hubs.insert(current, 1),
            }
            current = next;
        }
        Ok(())
    }

    /// Maintenance: walk the chain of predecessors of `title` (one hop at a
    /// time, following whichever title points at the current one) and drop
    /// those edges. Used to repair a chain built from a bad resolution.
    /// `title`'s own edge is left alone.
    pub fn unlink_chain(&mut self, title: &str) {
        let mut doomed: Vec<String> = Vec::new();
        let mut current = title.to_string();
        while let Some(prev) = self.find_predecessor(&current) {
            if doomed.contains(&prev) {
                break;
            }
            doomed.push(prev.clone());
            current = prev;
        }
        for t in &doomed {
            self.links.remove(t);
        }
    }

    fn find_predecessor(&self, title: &str) -> Option<String> {
        self.links
            .iter()
            .find(|(_, link)| link.as_str() == title)
            .map(|(t, _)| t.clone())
    }

    /// Load persisted state, or start empty when no file exists yet.
    pub fn load(path: &Path, root: &str) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::new(root));
        }
        let raw = fs::read_to_string(path)?;
        let graph: Self = serde_json::from_str(&raw)?;
        if graph.version != SAVE_VERSION {
            anyhow::bail!(
                "data file {:?} has version {}, this build expects {}",
                path,
                graph.version,
                SAVE_VERSION
            );
        }
        Ok(graph)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "Philosophy";

    fn graph_with(edges: &[(&str, &str)]) -> PhiloGraph {
        let mut graph = PhiloGraph::new(ROOT);
        for (title, link) in edges {
            graph.put(title, link);
        }
        graph
    }

    #[test]
    fn put_is_first_write_wins() {
        let mut graph = graph_with(&[("Anarchism", "State")]);
        graph.put("Anarchism", "Government");
        assert_eq!(graph.get("Anarchism"), Some(&"State".to_string()));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn distance_counts_hops_to_root() {
        let mut graph = graph_with(&[("A", "B"), ("B", "C"), ("C", ROOT)]);
        assert_eq!(graph.ensure_distance("A"), Ok(3));
        assert_eq!(graph.distance_of("B"), Some(2));
        assert_eq!(graph.distance_of("C"), Some(1));
    }

    #[test]
    fn distance_reuses_memoized_tail() {
        let mut graph = graph_with(&[("A", "B"), ("B", ROOT), ("X", "B")]);
        assert_eq!(graph.ensure_distance("A"), Ok(2));
        // X shares B's tail; only B's memoized value is consulted.
        assert_eq!(graph.ensure_distance("X"), Ok(2));
        assert_eq!(graph.distance_of("B"), Some(1));
    }

    #[test]
    fn distance_invariant_holds_across_the_chain() {
        let mut graph = graph_with(&[("A", "B"), ("B", "C"), ("C", ROOT)]);
        graph.ensure_distance("A").unwrap();
        for (title, d) in graph.distances() {
            assert!(*d >= 1);
            let edge = graph.get(title).unwrap();
            if edge == ROOT {
                assert_eq!(*d, 1);
            } else {
                assert_eq!(*d, graph.distance_of(edge).unwrap() + 1);
            }
        }
    }

    #[test]
    fn distance_on_a_loop_fails_fast() {
        let mut graph = graph_with(&[("A", "B"), ("B", "A")]);
        assert_eq!(
            graph.ensure_distance("A"),
            Err(GraphError::CycleDetected("A".to_string()))
        );
        assert_eq!(graph.distance_of("A"), None);
        assert_eq!(graph.distance_of("B"), None);
    }

    #[test]
    fn distance_on_a_dangling_chain_reports_the_gap() {
        let mut graph = graph_with(&[("A", "B")]);
        assert_eq!(
            graph.ensure_distance("A"),
            Err(GraphError::MissingEdge("B".to_string()))
        );
    }

    #[test]
    fn record_walk_counts_every_hop_but_the_root() {
        let mut graph = graph_with(&[("A", "B"), ("B", "C"), ("C", ROOT)]);
        graph.record_walk("A").unwrap();
        assert_eq!(graph.hub_count("A"), Some(1));
        assert_eq!(graph.hub_count("B"), Some(1));
        assert_eq!(graph.hub_count("C"), Some(1));
        assert_eq!(graph.hub_count(ROOT), None);
    }

    #[test]
    fn hub_counts_grow_across_shared_subpaths() {
        let mut graph = graph_with(&[("A", "B"), ("B", "C"), ("C", ROOT)]);
        graph.record_walk("A").unwrap();
        graph.record_walk("B").unwrap();
        assert_eq!(graph.hub_count("A"), Some(1));
        assert_eq!(graph.hub_count("B"), Some(2));
        assert_eq!(graph.hub_count("C"), Some(2));
    }

    #[test]
    fn record_walk_on_a_loop_fails_fast() {
        let mut graph = graph_with(&[("A", "B"), ("B", "A")]);
        assert_eq!(
            graph.record_walk("A"),
            Err(GraphError::CycleDetected("A".to_string()))
        );
    }

    #[test]
    fn unlink_chain_drops_the_backward_chain() {
        let mut graph = graph_with(&[("X", "Y"), ("Y", "Z"), ("Z", ROOT)]);
        graph.unlink_chain("Z");
        assert!(!graph.has("X"));
        assert!(!graph.has("Y"));
        // The named title keeps its own edge.
        assert_eq!(graph.get("Z"), Some(&ROOT.to_string()));
    }

    #[test]
    fn unlink_chain_terminates_on_predecessor_loops() {
        let mut graph = graph_with(&[("A", "B"), ("B", "A")]);
        graph.unlink_chain("A");
        assert!(!graph.has("B"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");

        let mut graph = graph_with(&[("A", "B"), ("B", ROOT)]);
        graph.ensure_distance("A").unwrap();
        graph.record_walk("A").unwrap();
        graph.save(&path).unwrap();

        let reloaded = PhiloGraph::load(&path, ROOT).unwrap();
        assert_eq!(reloaded.get("A"), Some(&"B".to_string()));
        assert_eq!(reloaded.distance_of("A"), Some(2));
        assert_eq!(reloaded.hub_count("B"), Some(1));
        assert_eq!(reloaded.root(), ROOT);
    }

    #[test]
    fn load_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let graph = PhiloGraph::load(&dir.path().join("nope.json"), ROOT).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.root(), ROOT);
    }

    #[test]
    fn load_rejects_an_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");

        let graph = graph_with(&[("A", ROOT)]);
        graph.save(&path).unwrap();

        let mut value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        value["version"] = serde_json::json!(SAVE_VERSION + 1);
        std::fs::write(&path, value.to_string()).unwrap();

        assert!(PhiloGraph::load(&path, ROOT).is_err());
    }
}
