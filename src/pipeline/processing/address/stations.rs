use deunicode::deunicode;
use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::constants::STATION_BLOCKLIST;
use crate::error::{CleanerError, Result};

/// Metro station names of the capital, read once per run.
///
/// Names are stored transliterated and upper-cased, with spaced dashes
/// collapsed (`"CHARLES DE GAULLE-ETOILE"`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationList {
    names: Vec<String>,
}

impl StationList {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|name| Self::prepare(name.as_ref()))
            .filter(|name| !name.is_empty() && !STATION_BLOCKLIST.contains(&name.as_str()))
            .collect();
        Self { names }
    }

    fn prepare(name: &str) -> String {
        deunicode(name.trim()).replace(" - ", "-").to_uppercase()
    }

    /// One station name per line; blank lines are skipped.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CleanerError::Stations(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let list = Self::from_names(content.lines());
        info!(stations = list.len(), path = %path.display(), "Loaded station list from file");
        Ok(list)
    }

    /// Download the station table page and extract the first link of each row.
    #[instrument(skip(user_agent))]
    pub fn fetch(url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        let body = client.get(url).send()?.error_for_status()?.text()?;
        debug!(bytes = body.len(), "Fetched station page");
        let list = Self::from_html(&body)?;
        info!(stations = list.len(), "Loaded station list from web");
        Ok(list)
    }

    /// Parse the first `table.wikitable` of a station list page, skipping its header row.
    pub fn from_html(html: &str) -> Result<Self> {
        let selector = |css: &str| {
            Selector::parse(css).map_err(|e| CleanerError::Stations(format!("bad selector {css}: {e}")))
        };
        let table_sel = selector("table.wikitable")?;
        let row_sel = selector("tr")?;
        let link_sel = selector("td a")?;

        let document = Html::parse_document(html);
        let table = document
            .select(&table_sel)
            .next()
            .ok_or_else(|| CleanerError::Stations("no station table in page".to_string()))?;

        let names: Vec<String> = table
            .select(&row_sel)
            .skip(1)
            .filter_map(|row| row.select(&link_sel).next())
            .map(|link| link.text().collect::<String>())
            .collect();
        Ok(Self::from_names(names))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Case-insensitive alternation of every station name, in list order.
    /// `None` for an empty list, which would otherwise match anywhere.
    pub fn to_pattern(&self) -> Result<Option<Regex>> {
        if self.names.is_empty() {
            return Ok(None);
        }
        let alternation = self
            .names
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");
        let re = RegexBuilder::new(&format!("({})", alternation))
            .case_insensitive(true)
            .size_limit(50 * (1 << 20))
            .build()?;
        Ok(Some(re))
    }
}
