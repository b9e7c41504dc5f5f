//! Literal pattern tables driving street extraction.
//!
//! The lists are tuned against the scraped corpus; keep them verbatim.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;

/// Street-type keywords, tried in this order, each with the phrasings that
/// must NOT directly follow it for the keyword to count as a street.
pub const STREET_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "rue",
        &[
            r"(?: tres)? calme",
            r" commercante",
            r" pavillonnaire",
            r" pietonne",
            r" sans passage",
            r" tres re",
            r" a deux pas",
            r" au pied de",
        ],
    ),
    (
        "place",
        &[
            r" de? parking",
            r" (?:de )?statio",
            r" dans ",
            r" de moto",
            r" pour y",
            r" les dispo",
            r" perdue",
            r"et de l'ecole",
            r" privative",
            r" a moins de",
        ],
    ),
    ("avenue", &[r" bordee de maisons", r" principale"]),
    ("boulevard", &[r" peripherique"]),
    ("quai", &[r" de seine"]),
];

/// Words allowed after a street keyword to form the street phrase
pub const STREET_TAIL: &str = r"\s+[a-z\s']+";

/// Trailing noise: the street phrase is cut at the first of these.
pub const TRUNCATION_PATTERNS: &[&str] = &[
    r" a (?:montreuil|vincennes|suresnes|asnieres sur seine|neuilly|noisy le sec|ablon sur seine|etampes)",
    r"(?:au)?(?: pied du)? metro",
    r" qui se ",
    r" a$",
    r" a proximite",
    r" (?:un )?studio",
    r" proche",
    r" agreable",
    r" ideal(?:ement)?(?: coloc)?",
    r" deux pieces",
    r" au$",
    r" anime le quartier",
    r" et ",
    r" et$",
    r" appartement",
    r" dans ",
    r" location",
    r" au sein ",
    r" situe ",
    r" en plein",
    r" centre levallois",
    r"place a deux minutes de la gare  ligne  reseau  est ",
];

/// A trailing " paris" is noise too, unless it follows "de" ("rue de paris").
pub const TRAILING_CAPITAL: &str = " paris";
pub const TRAILING_CAPITAL_KEEP_AFTER: &str = "de";

/// Saint-name prefixes glued to the next word ("Saint-Ouen"), case-insensitive
static SAINT_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(sainte?)-(\w+)").unwrap());

/// Join hyphenated saint-name prefixes with a space.
pub fn unhyphenate_saints(text: &str) -> String {
    SAINT_PREFIX.replace_all(text, "${1} ${2}").into_owned()
}

/// Compiled form of [`STREET_KEYWORDS`] and [`TRUNCATION_PATTERNS`].
#[derive(Debug, Clone)]
pub struct StreetMatcher {
    candidate: Regex,
    exclusions: Vec<(&'static str, Regex)>,
    truncation: Regex,
}

impl StreetMatcher {
    pub fn new() -> Result<Self> {
        let keywords: Vec<&str> = STREET_KEYWORDS.iter().map(|(k, _)| *k).collect();
        let candidate = Regex::new(&format!("(?i)({}){}", keywords.join("|"), STREET_TAIL))?;
        let exclusions = STREET_KEYWORDS
            .iter()
            .map(|(keyword, excluded)| -> Result<(&'static str, Regex)> {
                let re = Regex::new(&format!("(?i)^(?:{})", excluded.join("|")))?;
                Ok((*keyword, re))
            })
            .collect::<Result<Vec<_>>>()?;
        let truncation = Regex::new(&TRUNCATION_PATTERNS.join("|"))?;
        Ok(Self {
            candidate,
            exclusions,
            truncation,
        })
    }

    /// First street phrase in an ASCII description whose keyword is not
    /// directly followed by an excluded phrasing.
    pub fn find_street<'t>(&self, text: &'t str) -> Option<&'t str> {
        let mut start = 0;
        while start <= text.len() {
            let caps = self.candidate.captures_at(text, start)?;
            let whole = caps.get(0)?;
            let keyword = caps.get(1)?;
            if !self.is_excluded(keyword.as_str(), &text[keyword.end()..]) {
                return Some(whole.as_str());
            }
            start = whole.start() + text[whole.start()..].chars().next().map_or(1, char::len_utf8);
        }
        None
    }

    fn is_excluded(&self, keyword: &str, rest: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.exclusions
            .iter()
            .find(|(k, _)| *k == keyword)
            .map_or(false, |(_, re)| re.is_match(rest))
    }

    /// Cut a lower-cased street phrase at its first trailing-noise pattern.
    pub fn truncate<'a>(&self, phrase: &'a str) -> &'a str {
        let mut cut = self.truncation.find(phrase).map_or(phrase.len(), |m| m.start());
        if let Some(prefix) = phrase.strip_suffix(TRAILING_CAPITAL) {
            if !prefix.ends_with(TRAILING_CAPITAL_KEEP_AFTER) {
                cut = cut.min(prefix.len());
            }
        }
        &phrase[..cut]
    }
}
