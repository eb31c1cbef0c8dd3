//! Menu models: the contract the Gemini extraction call must conform to.
//!
//! `ParsedMenu` is what the OCR stage asks the model to produce for a single
//! restaurant image; `DailySummary` is the whole-batch summarization output.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Validity of one daily menu block.
///
/// Extracted menus label their validity in wildly inconsistent ways (an exact
/// date, a Mon-Fri range, just a weekday name, "this week", or free text the
/// model could not interpret), so this is an explicit union rather than a
/// string. `Text` is the fallback for anything unparseable and keeps the raw
/// wording intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuDate {
    /// A single calendar date.
    Date { date: NaiveDate },
    /// An inclusive date range.
    Range { start: NaiveDate, end: NaiveDate },
    /// A weekday with no calendar anchor ("Wednesday menu").
    Weekday { weekday: Weekday },
    /// The menu applies to the whole current week.
    WholeWeek,
    /// Raw label that could not be parsed into any of the above.
    Text { raw: String },
}

impl MenuDate {
    /// Whether this menu block can apply to the given date.
    ///
    /// `Text` and `WholeWeek` are treated as applicable: the summarization
    /// prompt instructs the model to include undated menus.
    pub fn applies_to(&self, date: NaiveDate) -> bool {
        match self {
            MenuDate::Date { date: d } => *d == date,
            MenuDate::Range { start, end } => *start <= date && date <= *end,
            MenuDate::Weekday { weekday } => {
                use chrono::Datelike;
                date.weekday() == *weekday
            }
            MenuDate::WholeWeek | MenuDate::Text { .. } => true,
        }
    }
}

/// A single dish on a daily menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub vegetarian: bool,
    /// Price in CZK, when the menu states one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// One day's (or date range's) menu block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMenu {
    pub date: MenuDate,
    pub dishes: Vec<Dish>,
}

/// Structured extraction result for one restaurant image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMenu {
    /// BCP-47-ish language tags seen in the menu text (e.g. "cs", "en").
    #[serde(default)]
    pub languages: Vec<String>,
    /// Menu blocks in the order they appear in the image.
    pub daily_menus: Vec<DailyMenu>,
}

/// The daily summary produced by the summarization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    /// Model scratch-space for step-by-step planning. Logged for diagnostics,
    /// never shown to end users or persisted with the summary artifact.
    #[serde(default)]
    pub reasoning: String,
    /// Markdown summary in Czech.
    pub text: String,
}
