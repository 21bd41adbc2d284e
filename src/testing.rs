//! Shared test helpers: an in-memory HTTP client and HTML fixtures.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::http::{HttpClient, HttpResponse};

#[derive(Debug, Clone)]
struct MockPage {
    body: String,
    content_type: &'static str,
}

/// HTTP client serving canned pages, redirects and broken audio URLs
#[derive(Debug, Default)]
pub struct MockHttpClient {
    pages: HashMap<String, MockPage>,
    redirects: HashMap<String, String>,
    broken: HashSet<String>,
    requests: Mutex<Vec<String>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            MockPage {
                body: html.to_string(),
                content_type: "text/html; charset=utf-8",
            },
        );
        self
    }

    pub fn with_json_page(mut self, url: &str, json: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            MockPage {
                body: json.to_string(),
                content_type: "application/json",
            },
        );
        self
    }

    pub fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    /// Make `resolve` answer 404 for this URL
    pub fn with_broken(mut self, url: &str) -> Self {
        self.broken.insert(url.to_string());
        self
    }

    /// Every URL requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn follow(&self, url: &str) -> String {
        self.redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string())
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        self.requests.lock().unwrap().push(url.to_string());
        let final_url = self.follow(url);

        Ok(match self.pages.get(&final_url) {
            Some(page) => HttpResponse {
                status: 200,
                final_url,
                content_type: Some(page.content_type.to_string()),
                body: Bytes::from(page.body.clone()),
            },
            None => HttpResponse {
                status: 404,
                final_url,
                content_type: None,
                body: Bytes::from_static(b"Not Found"),
            },
        })
    }

    async fn resolve(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        self.requests.lock().unwrap().push(url.to_string());
        let final_url = self.follow(url);
        let status = if self.broken.contains(url) || self.broken.contains(&final_url) {
            404
        } else {
            200
        };

        Ok(HttpResponse {
            status,
            final_url,
            content_type: Some("audio/mpeg".to_string()),
            body: Bytes::new(),
        })
    }
}

/// Archive listing page with the given `(href, text)` episode links
pub fn archive_html(links: &[(&str, &str)], next: Option<&str>) -> String {
    let articles: String = links
        .iter()
        .map(|(href, text)| {
            format!(
                r#"<article class="node episode"><header><a class="goto-episode" href="{href}">{text}</a></header></article>"#
            )
        })
        .collect();

    let pager = next
        .map(|href| format!(r#"<div class="pager-wrapper"><a class="pager" href="{href}">Older</a></div>"#))
        .unwrap_or_default();

    format!(
        r#"<html><body><div class="view-content">{articles}</div>{pager}</body></html>"#
    )
}

/// Minimal episode detail page
pub struct EpisodeHtml<'a> {
    pub title: &'a str,
    pub audio: Option<&'a str>,
    pub date: &'a str,
    pub summary: &'a str,
    pub acts: Vec<(&'a str, &'a str, &'a str)>,
    pub clean: Option<&'a str>,
}

impl<'a> EpisodeHtml<'a> {
    pub fn new(title: &'a str, audio: &'a str) -> Self {
        Self {
            title,
            audio: Some(audio),
            date: "March 3, 2025",
            summary: "A summary.",
            acts: Vec::new(),
            clean: None,
        }
    }

    pub fn render(&self) -> String {
        let player = match self.audio {
            Some(audio) => format!(r#"{{"title": "{}", "audio": "{}"}}"#, self.title, audio),
            None => format!(r#"{{"title": "{}"}}"#, self.title),
        };

        let acts: String = self
            .acts
            .iter()
            .map(|(label, title, body)| {
                format!(
                    r#"<div class="act"><div class="field-name-field-act-label"><div class="field-item">{label}</div></div><h2 class="act-header">{title}</h2><div class="field-name-body"><p>{body}</p></div></div>"#
                )
            })
            .collect();

        let clean = self
            .clean
            .map(|href| format!(r#"<a class="links-processed" href="{href}">Download clean version</a>"#))
            .unwrap_or_default();

        format!(
            r#"<html><head><script id="playlist-data" type="application/json">{player}</script></head>
<body>
<span class="date-display-single">{date}</span>
<div class="field-name-body"><p>{summary}</p></div>
<div class="episode-acts">{acts}</div>
{clean}
</body></html>"#,
            date = self.date,
            summary = self.summary,
        )
    }
}
