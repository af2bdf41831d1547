use anyhow::Result;
use log2::*;
use philopath::config::{Command, Config};
use philopath::graph::PhiloGraph;
use philopath::{crawler, report};
use std::time::Instant;
use url::Url;

/// Indicates start time of the process, lazily initialized
pub static START_TIME: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

#[tokio::main]
async fn main() -> Result<()> {
    let _ = *START_TIME;
    let cfg = Config::new();
    cfg.validate()?;
    let _log2 = stdout()
        .module(true) // include module name
        .module_with_line(true) // include line number from module
        .module_filter(|module| module.starts_with("philopath"))
        .compress(false)
        .level(cfg.log_level.to_string())
        .start();

    let mut graph = PhiloGraph::load(&cfg.data_file, crawler::ROOT_TITLE)?;
    debug!("Loaded {} recorded edges from {:?}", graph.len(), cfg.data_file);

    match cfg.command {
        Command::Crawl { walks, request_delay, base_url } => {
            let base_url = Url::parse(&base_url)?;
            let crawler_cfg =
                crawler::CrawlerConfig::new(base_url).with_request_delay(request_delay);
            crawler::run_walks(&mut graph, &crawler_cfg, walks, &cfg.data_file).await?;
            info!(
                "Done after {:?}. Graph now holds {} edges.",
                START_TIME.elapsed(),
                graph.len()
            );
        }
        Command::Report => {
            let (max_distance, farthest) = report::farthest(&graph);
            info!(
                "Farthest from {} (distance {}): {:?}",
                graph.root(),
                max_distance,
                farthest
            );
            let (max_count, popular) = report::most_popular(&graph);
            info!("Busiest hubs ({} walks through): {:?}", max_count, popular);
            let neighbors = report::nearest_neighbors(&graph);
            info!(
                "{} titles link straight to {}: {:?}",
                neighbors.len(),
                graph.root(),
                neighbors
            );
        }
        Command::Path { title } => {
            let path = report::path_to_root(&graph, &title)?;
            println!("{}", report::format_path(&path));
        }
        Command::Export { output, exclude } => {
            let mut out = std::fs::File::create(&output)?;
            report::export_edges(&graph, &mut out, &exclude)?;
            info!("Exported {} to {:?}", graph.len(), output);
        }
    }

    Ok(())
}
