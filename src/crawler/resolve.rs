use thiserror::Error;
use url::Url;

/// Marker pairs whose imbalance puts an offset "inside" a region we refuse to
/// take a link from: parenthetical asides, tables, and div containers.
const REGION_MARKERS: [(&str, &str); 3] = [("(", ")"), ("<table", "</table"), ("<div", "</div")];

const TITLE_MARKER: &str = "<title>";
const SITE_SUFFIX: &str = " - Wikipedia";
const BODY_MARKER: &str = "<!-- bodytext -->";
const PARAGRAPH_MARKER: &str = "<p>";
const ANCHOR_MARKER: &str = "<a href=";
/// Skips the anchor marker plus its opening quote.
const TARGET_OFFSET: usize = ANCHOR_MARKER.len() + 1;

const ARTICLE_PREFIX: &str = "/wiki/";
const META_SECTION: &str = "Wikipedia";
const FILE_SECTION: &str = "File";
const DISAMBIGUATION_MARK: &str = "(disambiguation)";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Title, body marker, or every paragraph start is missing or unusable.
    #[error("document has no recognizable title or body")]
    Malformed,
    /// Not a single anchor in the searchable region.
    #[error("no links found in the article body")]
    NoLinks,
    /// Every candidate was rejected before the retry cap ran out.
    #[error("too many rejected link candidates, probably a broken page")]
    BrokenPage,
}

/// The outcome of resolving a raw article document: the page's own title and
/// the absolute URL of its first valid body link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub title: String,
    pub next_url: Url,
}

/// Tracks how many region markers have opened and closed before a given
/// offset. The cursor only moves forward, so checking a sequence of ascending
/// offsets costs one pass over the text instead of a rescan per candidate.
#[derive(Debug, Default)]
pub struct RegionCounters {
    cursor: usize,
    opens: [usize; REGION_MARKERS.len()],
    closes: [usize; REGION_MARKERS.len()],
}

impl RegionCounters {
    /// True if `offset` sits inside an unclosed parenthetical, table, or div.
    /// A region that opened and closed again before `offset` counts as
    /// balanced. Heuristic: an unbalanced prefix is all we look for.
    pub fn is_invalid_region(&mut self, text: &str, offset: usize) -> bool {
        self.advance(text, offset);
        !self.balanced()
    }

    fn advance(&mut self, text: &str, offset: usize) {
        let end = offset.min(text.len());
        if end <= self.cursor {
            return;
        }
        let window = &text[self.cursor..end];
        for (i, (open, close)) in REGION_MARKERS.iter().enumerate() {
            self.opens[i] += window.matches(open).count();
            self.closes[i] += window.matches(close).count();
        }
        self.cursor = end;
    }

    fn balanced(&self) -> bool {
        self.opens.iter().zip(&self.closes).all(|(open, close)| open == close)
    }
}

/// Find the next anchor at or after `from` and extract its target reference,
/// the text between the opening quote and the next `"`. Returns the reference
/// and the anchor's offset. Truncated or malformed markup yields `None`,
/// never a panic.
pub fn next_link_candidate(text: &str, mut from: usize) -> Option<(&str, usize)> {
    while from < text.len() {
        let at = from + text[from..].find(ANCHOR_MARKER)?;
        let target_start = at + TARGET_OFFSET;
        if target_start > text.len() || !text.is_char_boundary(target_start) {
            from = at + 1;
            continue;
        }
        let target_len = text[target_start..].find('"')?;
        return Some((&text[target_start..target_start + target_len], at));
    }
    None
}

/// The first `<p>` whose preceding text has no unclosed region. Each probe
/// moves past the previous match, so the scan is bounded by the text length
/// even when every paragraph start is rejected.
fn paragraph_start(body: &str) -> Option<usize> {
    let mut regions = RegionCounters::default();
    let mut from = 0;
    while from < body.len() {
        let at = from + body[from..].find(PARAGRAPH_MARKER)?;
        if !regions.is_invalid_region(body, at) {
            return Some(at);
        }
        from = at + PARAGRAPH_MARKER.len();
    }
    None
}

fn target_is_invalid(target: &str) -> bool {
    if target.contains(DISAMBIGUATION_MARK) {
        return true;
    }
    let Some(article) = target.strip_prefix(ARTICLE_PREFIX) else {
        // External link, fragment, or some other non-article reference.
        return true;
    };
    article.starts_with(META_SECTION) || article.starts_with(FILE_SECTION)
}

/// Resolve a raw article document to its title and the first valid body link.
///
/// The searchable region starts at the first paragraph outside any table or
/// div. Candidates are rejected while they sit inside an unclosed region or
/// point at a disambiguation page, a non-article reference, a Wikipedia meta
/// page, or a file. After `max_link_retries` rejections the page is declared
/// broken.
pub fn resolve_first_link(
    document: &str,
    base_url: &Url,
    max_link_retries: usize,
) -> Result<Resolved, ResolveError> {
    let (_, after_title) = document
        .split_once(TITLE_MARKER)
        .ok_or(ResolveError::Malformed)?;
    let (title, rest) = after_title
        .split_once(SITE_SUFFIX)
        .ok_or(ResolveError::Malformed)?;
    let (_, body) = rest.split_once(BODY_MARKER).ok_or(ResolveError::Malformed)?;

    let start = paragraph_start(body).ok_or(ResolveError::Malformed)?;
    let (mut target, mut at) = next_link_candidate(body, start).ok_or(ResolveError::NoLinks)?;

    let mut regions = RegionCounters::default();
    let mut rejected = 0;
    while regions.is_invalid_region(body, at) || target_is_invalid(target) {
        rejected += 1;
        if rejected >= max_link_retries {
            return Err(ResolveError::BrokenPage);
        }
        (target, at) = next_link_candidate(body, at + 1).ok_or(ResolveError::BrokenPage)?;
    }

    let next_url = construct_url(target, base_url.clone()).map_err(|_| ResolveError::Malformed)?;
    Ok(Resolved { title: title.to_string(), next_url })
}

/// If `path` is a full URL, returns it as-is. Otherwise constructs a full URL
/// by merging with `root_url`. Trailing slashes are removed and fragments
/// stripped, so the same article always normalizes to the same URL.
pub fn construct_url(path: &str, root_url: Url) -> Result<Url, url::ParseError> {
    let mut url = if let Ok(parsed_url) = Url::parse(path) {
        if parsed_url.host().is_some() {
            parsed_url
        } else {
            root_url.join(path)?
        }
    } else {
        root_url.join(path)?
    };

    let trimmed_path = url.path().trim_end_matches('/').to_string();
    url.set_path(&trimmed_path);
    url.set_fragment(None);

    Ok(url)
}
