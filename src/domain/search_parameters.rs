use std::path::Path;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook, Data, DataType, Reader, Xlsx};
use chrono::NaiveDate;

const START_DATE_COLUMN: &str = "start_date";
const END_DATE_COLUMN: &str = "end_date";
const PART_COLUMN: &str = "CFR_Part";
const SUBPART_COLUMN: &str = "CFR_Subpart";
const PAGES_COLUMN: &str = "pages";

const PORTAL_DATE_FORMAT: &str = "%m/%d/%Y";

/// The search parameters for one run, read once from the parameters
/// workbook and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParameters {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cfr_part: String,
    pub cfr_subpart: String,
    /// Number of result pages to harvest before stopping.
    pub page_count: u32,
}

impl SearchParameters {
    pub fn portal_start_date(&self) -> String {
        self.start_date.format(PORTAL_DATE_FORMAT).to_string()
    }

    pub fn portal_end_date(&self) -> String {
        self.end_date.format(PORTAL_DATE_FORMAT).to_string()
    }

    /// Builds parameters from the header row and the first value row of the
    /// parameters sheet. Columns are matched by header name, in any order.
    pub fn from_rows(header: &[Data], values: &[Data]) -> Result<Self> {
        let start_date = date_field(header, values, START_DATE_COLUMN)?;
        let end_date = date_field(header, values, END_DATE_COLUMN)?;
        if end_date < start_date {
            bail!(
                "end_date {} precedes start_date {}",
                end_date,
                start_date
            );
        }

        Ok(SearchParameters {
            start_date,
            end_date,
            cfr_part: text_field(header, values, PART_COLUMN)?,
            cfr_subpart: text_field(header, values, SUBPART_COLUMN)?,
            page_count: count_field(header, values, PAGES_COLUMN)?,
        })
    }
}

/// Reads the search parameters from the first worksheet of the workbook:
/// one header row naming the columns, one value row below it.
pub fn load_search_parameters(path: &Path) -> Result<SearchParameters> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open parameters workbook {}", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .context("Parameters workbook has no worksheets")?
        .context("Failed to read the parameters worksheet")?;

    let mut rows = range.rows();
    let header = rows.next().context("Parameters sheet is empty")?;
    let values = rows
        .next()
        .context("Parameters sheet has no value row below the header")?;

    SearchParameters::from_rows(header, values)
        .with_context(|| format!("Invalid parameters in {}", path.display()))
}

fn field<'a>(header: &[Data], values: &'a [Data], name: &str) -> Result<&'a Data> {
    let index = header
        .iter()
        .position(|cell| {
            cell.as_string()
                .map(|heading| heading.trim().eq_ignore_ascii_case(name))
                .unwrap_or(false)
        })
        .with_context(|| format!("Parameters sheet is missing a {:?} column", name))?;

    values
        .get(index)
        .with_context(|| format!("Parameters row has no value under {:?}", name))
}

fn date_field(header: &[Data], values: &[Data], name: &str) -> Result<NaiveDate> {
    let cell = field(header, values, name)?;

    // Real Excel date cells carry a serial datetime; typed-in text does not.
    if let Some(datetime) = cell.as_datetime() {
        return Ok(datetime.date());
    }

    let raw = cell
        .as_string()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .with_context(|| format!("Column {:?} holds neither a date nor text", name))?;

    NaiveDate::parse_from_str(&raw, PORTAL_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(&raw, "%Y-%m-%d"))
        .with_context(|| {
            format!(
                "Column {:?} value {:?} is not an MM/DD/YYYY or YYYY-MM-DD date",
                name, raw
            )
        })
}

fn text_field(header: &[Data], values: &[Data], name: &str) -> Result<String> {
    field(header, values, name)?
        .as_string()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .with_context(|| format!("Column {:?} must hold a non-empty value", name))
}

fn count_field(header: &[Data], values: &[Data], name: &str) -> Result<u32> {
    let cell = field(header, values, name)?;

    let value = cell
        .as_f64()
        .or_else(|| cell.as_string().and_then(|s| s.trim().parse::<f64>().ok()))
        .with_context(|| format!("Column {:?} must hold a whole number of pages", name))?;

    if value.fract() != 0.0 {
        bail!(
            "Column {:?} must hold a whole number of pages, got {}",
            name,
            value
        );
    }
    if value < 0.0 {
        bail!("Column {:?} must not be negative, got {}", name, value);
    }

    u32::try_from(value as i64)
        .ok()
        .with_context(|| format!("Column {:?} value {} is too large", name, value))
}
