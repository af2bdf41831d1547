use philopath::crawler::{self, CrawlerConfig, ROOT_TITLE};
use philopath::graph::PhiloGraph;
use philopath::report;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn article(title: &str, next_ref: &str) -> String {
    format!(
        "<html><head><title>{title} - Wikipedia</title></head>\n<!-- bodytext -->\n\
         <p>Start <a href=\"{next_ref}\">next</a> end.</p></html>"
    )
}

async fn mount_article(server: &MockServer, at: &str, title: &str, next_ref: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(article(title, next_ref)))
        .mount(server)
        .await;
}

/// Two walks over a small mock wiki: the first resolves the whole chain, the
/// second starts from the same random article and rides the stored edges.
#[tokio::test]
async fn walks_build_persist_and_report_a_chain() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    mount_article(&server, "/wiki/Special:Random", "Aardvark", "/wiki/Mammal").await;
    mount_article(&server, "/wiki/Mammal", "Mammal", "/wiki/Animal").await;
    mount_article(&server, "/wiki/Animal", "Animal", "/wiki/Philosophy").await;
    mount_article(&server, "/wiki/Philosophy", "Philosophy", "/wiki/Reality").await;

    let dir = tempfile::tempdir()?;
    let data_file = dir.path().join("graph.json");

    let base_url = Url::parse(&server.uri())?;
    let cfg = CrawlerConfig::new(base_url).with_request_delay(0);
    let mut graph = PhiloGraph::load(&data_file, ROOT_TITLE)?;

    crawler::run_walks(&mut graph, &cfg, 2, &data_file).await?;

    // Chain recorded once, first write wins.
    assert_eq!(graph.get("Aardvark"), Some(&"Mammal".to_string()));
    assert_eq!(graph.get("Mammal"), Some(&"Animal".to_string()));
    assert_eq!(graph.get("Animal"), Some(&"Philosophy".to_string()));
    assert_eq!(graph.len(), 3);

    // Distances hold the +1 invariant down the chain.
    assert_eq!(graph.distance_of("Aardvark"), Some(3));
    assert_eq!(graph.distance_of("Mammal"), Some(2));
    assert_eq!(graph.distance_of("Animal"), Some(1));

    // Both walks passed through every title on the chain.
    assert_eq!(graph.hub_count("Aardvark"), Some(2));
    assert_eq!(graph.hub_count("Animal"), Some(2));
    assert_eq!(graph.hub_count("Philosophy"), None);

    // The reporting views agree.
    assert_eq!(report::farthest(&graph), (3, vec!["Aardvark".to_string()]));
    assert_eq!(report::nearest_neighbors(&graph), vec!["Animal".to_string()]);
    let path = report::path_to_root(&graph, "Aardvark")?;
    assert_eq!(path, vec!["Aardvark", "Mammal", "Animal", "Philosophy"]);

    // And the state survives a reload.
    let reloaded = PhiloGraph::load(&data_file, ROOT_TITLE)?;
    assert_eq!(reloaded.len(), 3);
    assert_eq!(reloaded.distance_of("Aardvark"), Some(3));
    assert_eq!(reloaded.hub_count("Mammal"), Some(2));

    Ok(())
}

/// A failing page must not take the batch down with it.
#[tokio::test]
async fn a_broken_page_does_not_abort_the_batch() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    mount_article(&server, "/wiki/Special:Random", "Loner", "/wiki/Dead_End").await;
    Mock::given(method("GET"))
        .and(path("/wiki/Dead_End"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><title>Dead End - Wikipedia</title>\n<!-- bodytext -->\n\
             <p>No links at all.</p></html>",
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let data_file = dir.path().join("graph.json");

    let base_url = Url::parse(&server.uri())?;
    let cfg = CrawlerConfig::new(base_url).with_request_delay(0);
    let mut graph = PhiloGraph::load(&data_file, ROOT_TITLE)?;

    // Both walks fail with NoLinks; run_walks still returns Ok.
    crawler::run_walks(&mut graph, &cfg, 2, &data_file).await?;

    assert!(graph.is_empty());
    assert!(data_file.exists());
    Ok(())
}
