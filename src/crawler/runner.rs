use log2::*;
use reqwest::Client;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tokio::time::{Duration, sleep};
use url::Url;

use super::config::CrawlerConfig;
use super::fetch::{FetchError, build_client, fetch_document};
use super::resolve::{ResolveError, Resolved, resolve_first_link};
use crate::graph::{GraphError, PhiloGraph};

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// A stored chain ended at a title with no edge and no URL left to fetch.
    /// Happens when an earlier walk failed partway and left a stub behind.
    #[error("stored chain dangles at \"{0}\"")]
    DanglingChain(String),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Terminal state of a single walk. Failures are the `Err` side of
/// [`run_walk`]; neither `Cycle` nor a failure touches the indexes.
#[derive(Debug, PartialEq, Eq)]
pub enum WalkOutcome {
    Reached { start: String, steps: usize },
    Cycle { start: String, at: String },
}

async fn step(url: &Url, client: &Client, cfg: &CrawlerConfig) -> Result<Resolved, WalkError> {
    let document = fetch_document(url, client, cfg.request_timeout_sec).await?;
    Ok(resolve_first_link(&document, &cfg.base_url, cfg.max_link_retries)?)
}

/// One walk: start from a random article and follow first links until the
/// root, a repeated title, or a failure.
///
/// Titles already in the graph are followed through their stored edge without
/// refetching. Once on stored edges there is no URL to resolve from, so a
/// chain that stops short of the root ends the walk as `DanglingChain`.
/// Only a walk that reaches the root updates the distance and hub indexes.
pub async fn run_walk(
    graph: &mut PhiloGraph,
    client: &Client,
    cfg: &CrawlerConfig,
) -> Result<WalkOutcome, WalkError> {
    let Resolved { title: mut current, next_url } = step(&cfg.random_url, client, cfg).await?;
    debug!("\t{}\t\t{}", current, next_url);

    let start = current.clone();
    let mut pending_url = Some(next_url);
    let mut seen: HashSet<String> = HashSet::new();
    let mut steps = 0usize;

    loop {
        if current == cfg.root_title {
            if start != cfg.root_title {
                graph.ensure_distance(&start)?;
                graph.record_walk(&start)?;
            }
            return Ok(WalkOutcome::Reached { start, steps });
        }
        if !seen.insert(current.clone()) {
            return Ok(WalkOutcome::Cycle { start, at: current });
        }

        if let Some(next) = graph.get(&current) {
            current = next.clone();
            pending_url = None;
            steps += 1;
            continue;
        }

        let (next_title, next_url) = match cfg.override_for(&current) {
            Some((next_title, next_url)) => (next_title.clone(), next_url.clone()),
            None => {
                let Some(url) = pending_url.take() else {
                    return Err(WalkError::DanglingChain(current));
                };
                if cfg.request_delay_ms > 0 {
                    sleep(Duration::from_millis(cfg.request_delay_ms)).await;
                }
                let resolved = step(&url, client, cfg).await?;
                (resolved.title, resolved.next_url)
            }
        };

        debug!("\t{}\t\t{}", next_title, next_url);
        graph.put(&current, &next_title);
        current = next_title;
        pending_url = Some(next_url);
        steps += 1;
    }
}

/// Drive `walks` sequential walks. Per-walk failures are logged and never
/// abort the batch; the graph is saved after every walk so an interrupted
/// batch loses at most the walk in flight.
pub async fn run_walks(
    graph: &mut PhiloGraph,
    cfg: &CrawlerConfig,
    walks: usize,
    data_file: &Path,
) -> anyhow::Result<()> {
    let client = build_client()?;

    for i in 1..=walks {
        info!("Walk {} of {}", i, walks);
        match run_walk(graph, &client, cfg).await {
            Ok(WalkOutcome::Reached { start, steps }) => {
                info!("Reached {} from \"{}\" in {} steps", cfg.root_title, start, steps);
            }
            Ok(WalkOutcome::Cycle { start, at }) => {
                info!("Closed loop: \"{}\" came back around at \"{}\"", start, at);
            }
            Err(e) => {
                warn!("Walk failed: {}", e);
            }
        }
        graph.save(data_file)?;
    }

    Ok(())
}
