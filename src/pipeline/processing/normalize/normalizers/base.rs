use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::CAPITAL_CITY;
use crate::pipeline::processing::normalize::DropReason;

static DESCR_APARTMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)appartement").unwrap());
static DESCR_HOUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)maison").unwrap());
static DESCR_FURNISHED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)meublé").unwrap());

/// Negation that may directly precede "meublé" in a description
const FURNISHED_NEGATION: &str = "non ";

/// Common parsing helpers shared by the source normalizers
pub struct NormalizerUtils;

impl NormalizerUtils {
    /// Parse a rent such as `"1 200 €"` or `"950€ CC"`: keep the text before the
    /// currency symbol and drop every whitespace thousands separator.
    pub fn parse_price(text: Option<&str>) -> Result<i64, DropReason> {
        let text = text.ok_or(DropReason::UnparseablePrice)?;
        let amount: String = text
            .split('€')
            .next()
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        amount.parse().map_err(|_| DropReason::UnparseablePrice)
    }

    /// Keyword fallback for the property type: `Some(true)` for a house.
    /// Apartment wording wins when both appear.
    pub fn type_from_description(descr: &str) -> Option<bool> {
        if DESCR_APARTMENT.is_match(descr) {
            Some(false)
        } else if DESCR_HOUSE.is_match(descr) {
            Some(true)
        } else {
            None
        }
    }

    /// Furnished status from free text.
    ///
    /// Any "meublé" not directly preceded by "non " means furnished; only
    /// negated mentions mean unfurnished; no mention at all is unknown.
    pub fn furnished_from_description(descr: &str) -> Option<bool> {
        let mut mentioned = false;
        for m in DESCR_FURNISHED.find_iter(descr) {
            mentioned = true;
            if !Self::preceded_by_ignore_case(&descr[..m.start()], FURNISHED_NEGATION) {
                return Some(true);
            }
        }
        mentioned.then_some(false)
    }

    fn preceded_by_ignore_case(before: &str, suffix: &str) -> bool {
        let wanted = suffix.chars().count();
        let mut tail: Vec<char> = before.chars().rev().take(wanted).collect();
        tail.reverse();
        let tail: String = tail.into_iter().collect();
        tail.to_lowercase() == suffix.to_lowercase()
    }

    /// Parse a serialized list of strings such as `['45 m²', "l'entrée"]`.
    ///
    /// Returns `None` when the text is not a well-formed list.
    pub fn parse_string_list(text: &str) -> Option<Vec<String>> {
        let inner = text.trim().strip_prefix('[')?.strip_suffix(']')?;
        let mut items = Vec::new();
        let mut chars = inner.chars().peekable();

        loop {
            while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                chars.next();
            }
            let quote = match chars.next() {
                None => break,
                Some(q @ ('\'' | '"')) => q,
                Some(_) => return None,
            };

            let mut item = String::new();
            loop {
                match chars.next()? {
                    '\\' => match chars.next()? {
                        'n' => item.push('\n'),
                        't' => item.push('\t'),
                        'r' => item.push('\r'),
                        other => item.push(other),
                    },
                    c if c == quote => break,
                    c => item.push(c),
                }
            }
            items.push(item);

            while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                chars.next();
            }
            match chars.next() {
                None => break,
                Some(',') => continue,
                Some(_) => return None,
            }
        }

        Some(items)
    }

    /// First capture group of `re` in `text`, parsed as a count.
    pub fn capture_number(re: &Regex, text: &str) -> Option<u32> {
        re.captures(text)?.get(1)?.as_str().parse().ok()
    }

    pub fn is_capital(city: &str) -> bool {
        city.starts_with(CAPITAL_CITY)
    }

    /// Five-digit capital code from a coarse department and the city's last
    /// two characters: `75` + `PARIS 08` gives `75008`.
    pub fn capital_dept(coarse: &str, city: &str) -> Option<u32> {
        let chars: Vec<char> = city.chars().collect();
        let suffix: String = chars[chars.len().saturating_sub(2)..].iter().collect();
        if suffix.len() != 2 || !suffix.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        format!("{}0{}", coarse.trim(), suffix).parse().ok()
    }
}
