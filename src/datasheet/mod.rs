//! IC datasheet lookup.
//!
//! For every IC on the board (reference starting with `U`) the datasheet
//! index page is fetched, navigation links whose title matches the
//! configured section pattern are followed, and the matching subsection's
//! paragraphs, list items and tables are extracted as plain text.
//!
//! Parsing is kept separate from fetching so it can be tested on HTML
//! strings.

use std::time::Duration;

use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardError, BoardResult};

const FETCHER: &str = "Datasheet fetcher";

fn default_url_template() -> String {
    "https://www.ti.com/document-viewer/{ic}/datasheet".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_section_pattern() -> String {
    "(?i)(description|pin|layout guidelines)".to_string()
}

/// Datasheet fetcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasheetOptions {
    /// Index page URL; `{ic}` is replaced by the IC model.
    #[serde(default = "default_url_template")]
    pub url_template: String,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Regex matched against navigation link titles.
    #[serde(default = "default_section_pattern")]
    pub section_pattern: String,
}

impl Default for DatasheetOptions {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            section_pattern: default_section_pattern(),
        }
    }
}

/// A table from a datasheet section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Header cells.
    pub headers: Vec<String>,
    /// Body rows.
    pub rows: Vec<Vec<String>>,
}

/// Extracted content of one datasheet section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Navigation title of the section.
    pub section: String,
    /// Paragraph texts.
    pub paragraphs: Vec<String>,
    /// List item texts.
    pub lists: Vec<String>,
    /// Tables.
    pub tables: Vec<Table>,
}

/// Datasheet lookup result for one IC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IcDatasheet {
    /// Footprint reference.
    pub reference: String,
    /// IC model derived from the footprint value.
    pub ic_model: String,
    /// Extracted sections, absent if the lookup failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<Section>>,
    /// Failure description, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// IC model for a footprint value: trailing letters (package/grade
/// suffix) are stripped, e.g. `TPS5430DDAR` becomes `TPS5430`.
#[must_use]
pub fn ic_model(value: &str) -> &str {
    value.trim_end_matches(|c: char| c.is_ascii_alphabetic())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn texts(scope: ElementRef<'_>, selector: &Selector) -> Vec<String> {
    scope
        .select(selector)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect()
}

fn selector(css: &str) -> BoardResult<Selector> {
    Selector::parse(css).map_err(|e| {
        BoardError::collaborator("Datasheet parser", format!("invalid selector '{css}': {e}"))
    })
}

/// Navigation links on an index page whose `data-navtitle` matches
/// `pattern`, resolved against `base`.
///
/// # Errors
///
/// Returns [`BoardError::Collaborator`] if the selector cannot be built.
pub fn section_links(html: &str, base: &Url, pattern: &Regex) -> BoardResult<Vec<(String, Url)>> {
    let document = Html::parse_document(html);
    let links = selector("a.no-children[data-navtitle]")?;

    let mut out = Vec::new();
    for link in document.select(&links) {
        let Some(title) = link.value().attr("data-navtitle") else {
            continue;
        };
        if !pattern.is_match(title) {
            continue;
        }
        let href = link.value().attr("href").unwrap_or_default();
        match base.join(href) {
            Ok(url) => out.push((title.to_string(), url)),
            Err(e) => tracing::warn!(href, error = %e, "Skipping unresolvable datasheet link"),
        }
    }
    Ok(out)
}

fn extract_table(table: ElementRef<'_>) -> BoardResult<Option<Table>> {
    let header_row = selector("thead tr")?;
    let body_row = selector("tbody tr")?;
    let cell = selector("th, td")?;

    let headers = table
        .select(&header_row)
        .next()
        .map(|row| row.select(&cell).map(element_text).collect())
        .unwrap_or_default();
    let rows: Vec<Vec<String>> = table
        .select(&body_row)
        .map(|row| row.select(&cell).map(element_text).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect();

    let table = Table { headers, rows };
    Ok((!table.headers.is_empty() || !table.rows.is_empty()).then_some(table))
}

/// Extracts the `div.subsection` whose heading contains `title`
/// (case-insensitive).
///
/// # Errors
///
/// Returns [`BoardError::Collaborator`] if a selector cannot be built.
pub fn extract_section(html: &str, title: &str) -> BoardResult<Option<Section>> {
    let document = Html::parse_document(html);
    let subsections = selector("div.subsection")?;
    let heading = selector("h1, h2, h3, h4, h5, h6")?;
    let paragraph = selector("p")?;
    let item = selector("li")?;
    let table = selector("table")?;

    let wanted = title.to_lowercase();
    let target = document.select(&subsections).find(|div| {
        div.select(&heading)
            .next()
            .is_some_and(|h| element_text(h).to_lowercase().contains(&wanted))
    });
    let Some(target) = target else {
        tracing::debug!(title, "No matching datasheet subsection");
        return Ok(None);
    };

    let mut tables = Vec::new();
    for t in target.select(&table) {
        if let Some(t) = extract_table(t)? {
            tables.push(t);
        }
    }

    Ok(Some(Section {
        section: title.to_string(),
        paragraphs: texts(target, &paragraph),
        lists: texts(target, &item),
        tables,
    }))
}

/// HTTP client for datasheet pages.
#[derive(Debug, Clone)]
pub struct DatasheetClient {
    http: reqwest::Client,
    url_template: String,
    sections: Regex,
}

impl DatasheetClient {
    /// Creates a client from settings.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Collaborator`] if the section pattern is not a
    /// valid regex or the HTTP client cannot be built.
    pub fn new(options: &DatasheetOptions) -> BoardResult<Self> {
        let sections = Regex::new(&options.section_pattern).map_err(|e| {
            BoardError::collaborator_with(FETCHER, "invalid section pattern", e)
        })?;
        let http = reqwest::Client::builder()
            .user_agent(options.user_agent.clone())
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| BoardError::collaborator_with(FETCHER, "cannot build HTTP client", e))?;
        Ok(Self {
            http,
            url_template: options.url_template.clone(),
            sections,
        })
    }

    /// Index page URL for an IC model.
    #[must_use]
    pub fn page_url(&self, ic: &str) -> String {
        self.url_template.replace("{ic}", ic)
    }

    async fn fetch(&self, url: &Url) -> BoardResult<String> {
        tracing::debug!(%url, "Fetching datasheet page");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| BoardError::collaborator_with(FETCHER, format!("GET {url}"), e))?;
        response
            .text()
            .await
            .map_err(|e| BoardError::collaborator_with(FETCHER, format!("reading {url}"), e))
    }

    /// Fetches and extracts the matching sections of one IC's datasheet.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Collaborator`] on any HTTP or URL failure.
    pub async fn sections(&self, ic: &str) -> BoardResult<Vec<Section>> {
        let page = self.page_url(ic);
        let base = Url::parse(&page)
            .map_err(|e| BoardError::collaborator_with(FETCHER, format!("invalid URL {page}"), e))?;
        let index = self.fetch(&base).await?;

        let mut out = Vec::new();
        for (title, url) in section_links(&index, &base, &self.sections)? {
            let detail = self.fetch(&url).await?;
            if let Some(section) = extract_section(&detail, &title)? {
                out.push(section);
            }
        }
        Ok(out)
    }

    /// Looks up every IC on the board. Failures are reported per IC.
    pub async fn lookup(&self, board: &Board) -> Vec<IcDatasheet> {
        let mut out = Vec::new();
        for fp in board.footprints.iter().filter(|fp| fp.reference.starts_with('U')) {
            let ic = ic_model(&fp.value).to_string();
            let (sections, error) = match self.sections(&ic).await {
                Ok(sections) => (Some(sections), None),
                Err(e) => {
                    tracing::warn!(reference = %fp.reference, ic = %ic, error = %e, "Datasheet lookup failed");
                    (None, Some(e.to_string()))
                }
            };
            out.push(IcDatasheet {
                reference: fp.reference.clone(),
                ic_model: ic,
                sections,
                error,
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Footprint;

    const INDEX: &str = r#"
        <html><body><nav>
          <a class="no-children" data-navtitle="Features" href="features">Features</a>
          <a class="no-children" data-navtitle="Detailed Description" href="/doc/desc">Desc</a>
          <a class="no-children" data-navtitle="Pin Configuration and Functions" href="https://other.example/pins">Pins</a>
          <a class="has-children" data-navtitle="Layout" href="layout">Layout</a>
          <a class="no-children" data-navtitle="Layout Guidelines" href="layout#g">Guide</a>
        </nav></body></html>"#;

    const DETAIL: &str = r#"
        <html><body>
          <div class="subsection"><h2>Overview</h2><p>Not this one.</p></div>
          <div class="subsection">
            <h3>7.1  Layout   Guidelines</h3>
            <p>Place the input
               capacitor close to VIN.</p>
            <p>   </p>
            <ul><li>Keep the SW node small.</li><li>Use a ground plane.</li></ul>
            <table>
              <thead><tr><th>Pin</th><th>Name</th></tr></thead>
              <tbody>
                <tr><td>1</td><td> BOOT </td></tr>
                <tr><td></td><td></td></tr>
              </tbody>
            </table>
            <table><tbody></tbody></table>
          </div>
        </body></html>"#;

    fn pattern() -> Regex {
        Regex::new(&default_section_pattern()).unwrap()
    }

    #[test]
    fn trailing_letters_stripped() {
        assert_eq!(ic_model("TPS5430DDAR"), "TPS5430");
        assert_eq!(ic_model("LM358"), "LM358");
        assert_eq!(ic_model("NE555P"), "NE555");
    }

    #[test]
    fn matching_links_resolved() {
        let base = Url::parse("https://www.ti.com/document-viewer/TPS5430/datasheet").unwrap();
        let links = section_links(INDEX, &base, &pattern()).unwrap();
        let titles: Vec<&str> = links.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(
            titles,
            ["Detailed Description", "Pin Configuration and Functions", "Layout Guidelines"]
        );
        assert_eq!(links[0].1.as_str(), "https://www.ti.com/doc/desc");
        assert_eq!(links[1].1.as_str(), "https://other.example/pins");
        assert_eq!(
            links[2].1.as_str(),
            "https://www.ti.com/document-viewer/TPS5430/layout#g"
        );
    }

    #[test]
    fn section_content_extracted() {
        let section = extract_section(DETAIL, "Layout Guidelines").unwrap().unwrap();
        assert_eq!(section.paragraphs, ["Place the input capacitor close to VIN."]);
        assert_eq!(section.lists, ["Keep the SW node small.", "Use a ground plane."]);
        assert_eq!(
            section.tables,
            [Table {
                headers: vec!["Pin".into(), "Name".into()],
                rows: vec![vec!["1".into(), "BOOT".into()]],
            }]
        );
    }

    #[test]
    fn missing_section_is_none() {
        assert!(extract_section(DETAIL, "Thermal").unwrap().is_none());
    }

    #[test]
    fn page_url_substitutes_model() {
        let client = DatasheetClient::new(&DatasheetOptions::default()).unwrap();
        assert_eq!(
            client.page_url("LM358"),
            "https://www.ti.com/document-viewer/LM358/datasheet"
        );
    }

    #[test]
    fn invalid_pattern_rejected() {
        let options = DatasheetOptions {
            section_pattern: "(".into(),
            ..DatasheetOptions::default()
        };
        assert!(DatasheetClient::new(&options).is_err());
    }

    #[tokio::test]
    async fn failures_reported_per_ic() {
        let options = DatasheetOptions {
            url_template: "http://127.0.0.1:9/{ic}".into(),
            timeout_secs: 2,
            ..DatasheetOptions::default()
        };
        let client = DatasheetClient::new(&options).unwrap();
        let mut u1 = Footprint::new("U1", 0.0, 0.0);
        u1.value = "LM358D".into();
        let board = Board {
            footprints: vec![u1, Footprint::new("R1", 1.0, 0.0)],
            ..Board::default()
        };

        let results = client.lookup(&board).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ic_model, "LM358");
        assert!(results[0].sections.is_none());
        assert!(results[0].error.as_deref().unwrap().starts_with(FETCHER));
    }
}
