//! Wikipedia task source and article-introduction fetcher.
//!
//! Keys are article titles linked from the "Technology and applied
//! sciences" contents page. Payloads are the leading prose paragraphs of an
//! article's plain-text introduction.

use std::collections::HashSet;

use serde::Deserialize;

use fetchbench_core::error::FetchError;
use fetchbench_core::fetcher::{Fetcher, TaskSource};

use crate::http::HttpClient;
use crate::text::extract_paragraphs;

/// MediaWiki API endpoint.
pub const API_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Page whose links seed the task list.
pub const CONTENTS_PAGE: &str = "Wikipedia:Contents/Technology_and_applied_sciences";

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: ParsedPage,
}

#[derive(Debug, Deserialize)]
struct ParsedPage {
    #[serde(default)]
    links: Vec<PageLink>,
}

#[derive(Debug, Deserialize)]
struct PageLink {
    ns: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: QueryPages,
}

#[derive(Debug, Deserialize)]
struct QueryPages {
    #[serde(default)]
    pages: Vec<ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    extract: Option<String>,
}

/// Article titles from the main namespace, de-duplicated, in page order.
fn select_titles(links: Vec<PageLink>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| link.ns == 0 && !link.title.contains(':'))
        .filter(|link| seen.insert(link.title.clone()))
        .map(|link| link.title)
        .take(limit)
        .collect()
}

fn intro_payload(response: QueryResponse, key: &str, target: usize) -> Result<String, FetchError> {
    let page = response
        .query
        .pages
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Parse(format!("no page in response for {key}")))?;
    if page.missing {
        return Err(FetchError::NotFound(page.title));
    }
    Ok(extract_paragraphs(page.extract.as_deref().unwrap_or_default(), target))
}

/// Lists article titles from the contents page.
pub struct WikipediaSource {
    client: HttpClient,
}

impl WikipediaSource {
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl TaskSource for WikipediaSource {
    fn list_keys(&self, limit: usize) -> Result<Vec<String>, FetchError> {
        let response: ParseResponse = self.client.get_json(
            API_URL,
            &[
                ("action", "parse"),
                ("page", CONTENTS_PAGE),
                ("prop", "links"),
                ("format", "json"),
                ("formatversion", "2"),
            ],
        )?;
        Ok(select_titles(response.parse.links, limit))
    }

    fn name(&self) -> &str {
        "wikipedia"
    }
}

/// Fetches the introduction of one article.
pub struct WikipediaFetcher {
    client: HttpClient,
    payload_size_target: usize,
}

impl WikipediaFetcher {
    /// `payload_size_target` is the minimum number of characters to collect.
    #[must_use]
    pub fn new(client: HttpClient, payload_size_target: usize) -> Self {
        Self {
            client,
            payload_size_target,
        }
    }
}

impl Fetcher for WikipediaFetcher {
    fn fetch(&self, key: &str) -> Result<String, FetchError> {
        let response: QueryResponse = self.client.get_json(
            API_URL,
            &[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("exintro", "1"),
                ("redirects", "1"),
                ("format", "json"),
                ("formatversion", "2"),
                ("titles", key),
            ],
        )?;
        intro_payload(response, key, self.payload_size_target)
    }

    fn name(&self) -> &str {
        "wikipedia"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::NO_DESCRIPTION;

    fn article_titles(body: &str, limit: usize) -> Result<Vec<String>, FetchError> {
        let response: ParseResponse =
            serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
        Ok(select_titles(response.parse.links, limit))
    }

    const LINKS: &str = r#"{"parse":{"title":"Wikipedia:Contents/Technology and applied sciences","links":[
        {"ns":0,"exists":true,"title":"Computer science"},
        {"ns":4,"exists":true,"title":"Wikipedia:Contents"},
        {"ns":0,"exists":true,"title":"Portal:Technology"},
        {"ns":0,"exists":true,"title":"Engineering"},
        {"ns":0,"exists":true,"title":"Computer science"},
        {"ns":0,"exists":true,"title":"Robotics"}
    ]}}"#;

    #[test]
    fn titles_filter_namespaces_and_duplicates() {
        let titles = article_titles(LINKS, 10).unwrap();
        assert_eq!(titles, ["Computer science", "Engineering", "Robotics"]);
    }

    #[test]
    fn titles_respect_limit() {
        assert_eq!(article_titles(LINKS, 2).unwrap().len(), 2);
        assert!(article_titles(LINKS, 0).unwrap().is_empty());
    }

    #[test]
    fn titles_reject_bad_json() {
        assert!(matches!(article_titles("{}", 1), Err(FetchError::Parse(_))));
    }

    fn query(body: &str) -> QueryResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn intro_extracts_prose() {
        let body = r#"{"query":{"pages":[{"pageid":1,"title":"Robotics","extract":"Robotics is the interdisciplinary study and practice of machines.\nShort."}]}}"#;
        let payload = intro_payload(query(body), "Robotics", 10).unwrap();
        assert_eq!(
            payload,
            "Robotics is the interdisciplinary study and practice of machines."
        );
    }

    #[test]
    fn intro_missing_page() {
        let body = r#"{"query":{"pages":[{"title":"Nope","missing":true}]}}"#;
        assert!(matches!(
            intro_payload(query(body), "Nope", 10),
            Err(FetchError::NotFound(t)) if t == "Nope"
        ));
    }

    #[test]
    fn intro_without_extract() {
        let body = r#"{"query":{"pages":[{"pageid":2,"title":"Stub"}]}}"#;
        assert_eq!(intro_payload(query(body), "Stub", 10).unwrap(), NO_DESCRIPTION);
    }
}
