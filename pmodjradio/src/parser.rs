//! Listing page parsing
//!
//! A listing page carries two things:
//!
//! - the channel metadata, a JSON document inside `<textarea id="radio-data">`
//! - one `<tr id="songlist-…" class="…">` row per program, six `<td>` cells wide
//!
//! All knowledge of the page layout lives in this module. [`extract_programs`]
//! is the narrow entry point used by the client and by fixture tests.
//!
//! Any malformed row fails the whole page: there is no skip-on-error policy.
//!
//! Cells are the row's direct `<td>` children. A `<td>` nested deeper
//! inside a cell (an inner table, say) is not counted as a column.

use crate::error::{Error, Result};
use crate::models::{ChannelInfo, Program};
use chrono::{DateTime, Datelike, Local, NaiveDate};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

const METADATA_SELECTOR: &str = "textarea#radio-data";
const ROW_SELECTOR: &str = r#"tr[id^="songlist"][class]"#;

/// Label before the play count ("播放")
const PLAY_COUNT_LABEL_CHARS: usize = 2;
/// Label before the like count ("赞")
const LIKE_COUNT_LABEL_CHARS: usize = 1;
/// "Ten thousand" unit marker
const TEN_THOUSAND_MARKER: char = '万';

/// Everything extracted from one listing page
#[derive(Debug, Clone)]
pub struct ListingPage {
    /// Channel metadata, absent for unknown channels
    pub info: Option<ChannelInfo>,
    /// Programs in document order
    pub programs: Vec<Program>,
}

/// Parses a whole listing page
///
/// Rows are only extracted when the metadata block is present: a page
/// without it belongs to no channel.
pub fn parse_page(content: &str) -> Result<ListingPage> {
    let document = Html::parse_document(content);
    let info = parse_channel_info(&document)?;
    let programs = match info {
        Some(_) => parse_programs(&document)?,
        None => Vec::new(),
    };
    Ok(ListingPage { info, programs })
}

/// Extracts the program records of one page, in document order
pub fn extract_programs(content: &str) -> Result<Vec<Program>> {
    parse_programs(&Html::parse_document(content))
}

/// Reads the embedded channel metadata
///
/// Returns `Ok(None)` when the page has no metadata block.
pub fn parse_channel_info(document: &Html) -> Result<Option<ChannelInfo>> {
    let selector = selector(METADATA_SELECTOR)?;
    match document.select(&selector).next() {
        Some(element) => {
            let text = element.text().collect::<String>();
            Ok(Some(serde_json::from_str(text.trim())?))
        }
        None => Ok(None),
    }
}

/// Extracts every program row of a parsed page
pub fn parse_programs(document: &Html) -> Result<Vec<Program>> {
    let rows = selector(ROW_SELECTOR)?;
    let cells = RowSelectors::new()?;

    let programs = document
        .select(&rows)
        .enumerate()
        .map(|(i, row)| cells.extract(row).map_err(|e| e.at_row(i)))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!("Extracted {} programs from page", programs.len());
    Ok(programs)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::parse(format!("invalid selector {}: {}", css, e)))
}

/// Selectors used inside a program row, compiled once per page
struct RowSelectors {
    num: Selector,
    div: Selector,
    anchor: Selector,
    span: Selector,
}

impl RowSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            num: selector("span.num")?,
            div: selector("div")?,
            anchor: selector("a")?,
            span: selector("span")?,
        })
    }

    fn extract(&self, row: ElementRef<'_>) -> Result<Program> {
        let cols: Vec<ElementRef<'_>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "td")
            .collect();
        if cols.len() < 6 {
            return Err(Error::parse(format!(
                "expected 6 cells, found {}",
                cols.len()
            )));
        }

        let index_text = text_of(cols[0], &self.num, "episode number")?;
        let index: u32 = index_text
            .parse()
            .map_err(|_| Error::parse(format!("invalid episode number: {:?}", index_text)))?;
        if index == 0 {
            return Err(Error::parse("invalid episode number"));
        }

        let title = cols[1]
            .select(&self.div)
            .next()
            .and_then(|div| div.select(&self.anchor).next())
            .and_then(|a| a.value().attr("title"))
            .ok_or_else(|| Error::parse("missing title"))?;
        if title.trim().is_empty() {
            return Err(Error::parse("empty title"));
        }

        Ok(Program {
            index,
            title: title.to_string(),
            play_count: parse_play_count(&text_of(cols[2], &self.span, "play count")?)?,
            like_count: parse_like_count(&text_of(cols[3], &self.span, "like count")?)?,
            publish_date: parse_publish_date(&text_of(cols[4], &self.span, "publish date")?)?,
            duration: parse_duration(&text_of(cols[5], &self.span, "duration")?)?,
        })
    }
}

/// Trimmed text of the first element matching `selector` inside `cell`
fn text_of(cell: ElementRef<'_>, selector: &Selector, what: &str) -> Result<String> {
    cell.select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .ok_or_else(|| Error::parse(format!("missing {}", what)))
}

fn strip_label(text: &str, label_chars: usize) -> String {
    text.trim().chars().skip(label_chars).collect()
}

/// Parses a play count such as `播放299` or `播放13万`
///
/// A trailing `万` is replaced by the digits `5000`, so `播放13万` reads as
/// 135000: the listing rounds to ten-thousands and this keeps the midpoint
/// of the last unit rather than its floor.
pub fn parse_play_count(text: &str) -> Result<u64> {
    let mut count = strip_label(text, PLAY_COUNT_LABEL_CHARS);
    if count.ends_with(TEN_THOUSAND_MARKER) {
        count.pop();
        count.push_str("5000");
    }
    count
        .trim()
        .parse()
        .map_err(|_| Error::parse(format!("invalid play count: {:?}", text)))
}

/// Parses a like count such as `赞12`
pub fn parse_like_count(text: &str) -> Result<u64> {
    strip_label(text, LIKE_COUNT_LABEL_CHARS)
        .trim()
        .parse()
        .map_err(|_| Error::parse(format!("invalid like count: {:?}", text)))
}

/// Parses a `minutes:seconds` duration such as `99:31`
pub fn parse_duration(text: &str) -> Result<Duration> {
    let invalid = || Error::parse(format!("invalid duration: {:?}", text));

    let (minutes, seconds) = text.trim().split_once(':').ok_or_else(invalid)?;
    let minutes: u64 = minutes.trim().parse().map_err(|_| invalid())?;
    let seconds: u64 = seconds.trim().parse().map_err(|_| invalid())?;
    let total = minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or_else(invalid)?;
    Ok(Duration::from_secs(total))
}

/// Parses a publication date leniently
///
/// Dates without a year are placed in the current year.
pub fn parse_publish_date(text: &str) -> Result<NaiveDate> {
    parse_date_in_year(text, Local::now().year())
}

/// Lenient date parsing with an explicit fallback year
///
/// Accepted shapes: `2019-1-25`, `2019/01/25`, `2019.1.25`, `2019年1月25日`,
/// `20190125`, RFC 3339, and `1-25` (month-day). A time of day after a
/// space is ignored.
pub fn parse_date_in_year(text: &str, default_year: i32) -> Result<NaiveDate> {
    let invalid = || Error::parse(format!("invalid date: {:?}", text));
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.date_naive());
    }

    let normalised = text.replace(['年', '月', '/', '.'], "-").replace('日', "");
    let date_part = normalised.split_whitespace().next().ok_or_else(invalid)?;
    let fields: Vec<&str> = date_part.split('-').filter(|f| !f.is_empty()).collect();

    let (year, month, day) = match fields.as_slice() {
        [compact] if compact.len() == 8 && compact.bytes().all(|b| b.is_ascii_digit()) => {
            (&compact[..4], &compact[4..6], &compact[6..])
        }
        [y, m, d] => (*y, *m, *d),
        [m, d] => {
            let month = m.parse().map_err(|_| invalid())?;
            let day = d.parse().map_err(|_| invalid())?;
            return NaiveDate::from_ymd_opt(default_year, month, day).ok_or_else(invalid);
        }
        _ => return Err(invalid()),
    };

    NaiveDate::from_ymd_opt(
        year.parse().map_err(|_| invalid())?,
        month.parse().map_err(|_| invalid())?,
        day.parse().map_err(|_| invalid())?,
    )
    .ok_or_else(invalid)
}
