//! Reddit task source and top-posts fetcher.

use std::fmt::Write as _;

use serde::Deserialize;

use fetchbench_core::error::FetchError;
use fetchbench_core::fetcher::{Fetcher, TaskSource};

use crate::http::HttpClient;
use crate::text::truncate;

/// Subreddits fetched, in order.
pub const SUBREDDITS: [&str; 10] = [
    "webscraping",
    "learnpython",
    "datascience",
    "MachineLearning",
    "Python",
    "programming",
    "computerscience",
    "technology",
    "coding",
    "bigdata",
];

/// Largest `limit` the listing endpoint honours.
pub const MAX_POSTS: usize = 100;

/// Post text longer than this is shortened.
pub const MAX_TEXT_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    ups: i64,
    #[serde(default)]
    num_comments: u64,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    selftext: String,
}

fn format_posts(listing: &Listing) -> String {
    let mut out = String::new();
    for (i, child) in listing.data.children.iter().enumerate() {
        let post = &child.data;
        let text = if post.selftext.is_empty() {
            "[No text content]".to_string()
        } else {
            truncate(&post.selftext, MAX_TEXT_CHARS)
        };
        if i > 0 {
            out.push('\n');
        }
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "Post {}\n  Title: {}\n  Author: {}\n  Upvotes: {}\n  Comments: {}\n  URL: https://www.reddit.com{}\n  Text: {}",
            i + 1,
            post.title,
            post.author,
            post.ups,
            post.num_comments,
            post.permalink,
            text
        );
    }
    out
}

/// Fixed list of subreddits.
pub struct RedditSource;

impl TaskSource for RedditSource {
    fn list_keys(&self, limit: usize) -> Result<Vec<String>, FetchError> {
        Ok(SUBREDDITS.iter().take(limit).map(ToString::to_string).collect())
    }

    fn name(&self) -> &str {
        "reddit"
    }
}

/// Fetches and formats the all-time top posts of one subreddit.
pub struct RedditFetcher {
    client: HttpClient,
    post_limit: usize,
}

impl RedditFetcher {
    /// `payload_size_target` is the number of posts, clamped to `1..=100`.
    #[must_use]
    pub fn new(client: HttpClient, payload_size_target: usize) -> Self {
        Self {
            client,
            post_limit: payload_size_target.clamp(1, MAX_POSTS),
        }
    }
}

impl Fetcher for RedditFetcher {
    fn fetch(&self, key: &str) -> Result<String, FetchError> {
        let url = format!("https://www.reddit.com/r/{key}/top.json");
        let limit = self.post_limit.to_string();
        let listing: Listing = self
            .client
            .get_json(&url, &[("limit", limit.as_str()), ("t", "all")])?;
        if listing.data.children.is_empty() {
            return Err(FetchError::NotFound(format!("no posts in r/{key}")));
        }
        Ok(format_posts(&listing))
    }

    fn name(&self) -> &str {
        "reddit"
    }
}
