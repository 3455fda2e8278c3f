use tracing::{debug, info};

use crate::errors::{AutomatorError, AutomatorResult};
use crate::helpers::browser::{require, Browser, ElementRef};
use crate::models::timesheet::{parse_row_date, TimesheetRow, MAX_ROWS};

pub const TIMESHEET_ROWS: &str = "#rowsInner>ul>li";
/// Looked up inside a row.
pub const ROW_DATE_CELL: &str = "ul>li>div>div";

/// The delete affordance only exists on rows that already carry a punch.
pub fn punched_marker(index: usize) -> String {
    format!(
        "a[class^='js-toggle-delete-punch'][title='Delete'][data-parent-index='{index}']"
    )
}

/// Reads rows of the current pay period on demand, so that rows before a
/// broken one still get punched.
pub struct RowScanner<'a, B: Browser> {
    browser: &'a B,
    rows: Vec<ElementRef>,
}

impl<'a, B: Browser> RowScanner<'a, B> {
    pub async fn new(browser: &'a B) -> AutomatorResult<Self> {
        let mut rows = browser
            .find_all(None, TIMESHEET_ROWS)
            .await
            .map_err(|e| AutomatorError::browser("cannot find individual timesheet rows", e))?;

        if rows.len() > MAX_ROWS {
            debug!("Ignoring {} rows past the first {}", rows.len() - MAX_ROWS, MAX_ROWS);
            rows.truncate(MAX_ROWS);
        }
        info!("Found {} timesheet row(s)", rows.len());

        Ok(Self { browser, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub async fn read(&self, index: usize) -> AutomatorResult<TimesheetRow> {
        let row_number = index + 1;
        let element = self
            .rows
            .get(index)
            .ok_or_else(|| AutomatorError::ElementNotFound(format!("timesheet row {row_number}")))?;

        let markers = self
            .browser
            .find_all(None, &punched_marker(index))
            .await
            .map_err(|e| AutomatorError::browser("cannot find already punched rows", e))?;
        if !markers.is_empty() {
            debug!("Row {} already punched, not reading its date", row_number);
            return Ok(TimesheetRow {
                index,
                date: None,
                already_punched: true,
            });
        }

        let cell = require(
            self.browser,
            Some(element),
            ROW_DATE_CELL,
            &format!("date for row {row_number}"),
        )
        .await?;
        let raw = self.browser.text(&cell).await.map_err(|e| {
            AutomatorError::browser(format!("cannot get row {row_number}'s date as text"), e)
        })?;
        let date = parse_row_date(&raw).ok_or(AutomatorError::Parse {
            row: row_number,
            text: raw,
        })?;

        Ok(TimesheetRow {
            index,
            date: Some(date),
            already_punched: false,
        })
    }

    /// Every row in order. Stops at the first unreadable one.
    pub async fn read_all(&self) -> AutomatorResult<Vec<TimesheetRow>> {
        let mut rows = Vec::with_capacity(self.rows.len());
        for index in 0..self.rows.len() {
            rows.push(self.read(index).await?);
        }
        Ok(rows)
    }
}
