//! Read-only views over a finished [`PhiloGraph`]: superlatives, path
//! printing, and a plain-text edge-list export.

use std::collections::HashSet;
use std::io::{self, Write};

use crate::graph::{GraphError, PhiloGraph};

/// Titles at the maximum recorded distance from the root, with that distance.
/// Ties are all returned, sorted.
pub fn farthest(graph: &PhiloGraph) -> (u32, Vec<String>) {
    let mut max = 0;
    let mut titles: Vec<String> = Vec::new();
    for (title, d) in graph.distances() {
        if *d > max {
            max = *d;
            titles.clear();
        }
        if *d == max {
            titles.push(title.clone());
        }
    }
    titles.sort();
    (max, titles)
}

/// Titles the most completed walks have passed through, with that count.
pub fn most_popular(graph: &PhiloGraph) -> (u64, Vec<String>) {
    let mut max = 0;
    let mut titles: Vec<String> = Vec::new();
    for (title, count) in graph.hubs() {
        if *count > max {
            max = *count;
            titles.clear();
        }
        if *count == max {
            titles.push(title.clone());
        }
    }
    titles.sort();
    (max, titles)
}

/// Every title whose stored edge points straight at the root.
pub fn nearest_neighbors(graph: &PhiloGraph) -> Vec<String> {
    let mut titles: Vec<String> = graph
        .links()
        .filter(|(_, link)| link.as_str() == graph.root())
        .map(|(title, _)| title.clone())
        .collect();
    titles.sort();
    titles
}

/// The stored chain from `title` down to the root, inclusive.
pub fn path_to_root(graph: &PhiloGraph, title: &str) -> Result<Vec<String>, GraphError> {
    let mut path = vec![title.to_string()];
    let mut seen: HashSet<String> = HashSet::from([title.to_string()]);
    let mut current = title.to_string();
    while current != graph.root() {
        let next = graph
            .get(&current)
            .ok_or_else(|| GraphError::MissingEdge(current.clone()))?
            .clone();
        if !seen.insert(next.clone()) {
            return Err(GraphError::CycleDetected(title.to_string()));
        }
        path.push(next.clone());
        current = next;
    }
    Ok(path)
}

/// Indented one-line-per-hop rendering of a path.
pub fn format_path(path: &[String]) -> String {
    let mut out = String::new();
    for (i, title) in path.iter().enumerate() {
        if i == 0 {
            out.push_str(title);
        } else {
            out.push('\n');
            out.push_str(&"  ".repeat(i - 1));
            out.push_str("> ");
            out.push_str(title);
        }
    }
    out
}

/// Write the whole link graph as `{"a"->"b","c"->"d"}`, keys sorted. Titles
/// starting with any blocklisted prefix are left out.
pub fn export_edges<W: Write>(
    graph: &PhiloGraph,
    out: &mut W,
    blocklist: &[String],
) -> io::Result<()> {
    let mut edges: Vec<(&String, &String)> = graph
        .links()
        .filter(|(title, _)| !blocklist.iter().any(|prefix| title.starts_with(prefix.as_str())))
        .collect();
    edges.sort();

    out.write_all(b"{")?;
    for (i, (title, link)) in edges.iter().enumerate() {
        if i > 0 {
            out.write_all(b",")?;
        }
        write!(out, "\"{}\"->\"{}\"", title, link)?;
    }
    out.write_all(b"}")?;
    Ok(())
}
