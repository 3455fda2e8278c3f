//! Drives the portal's add-punch modal for one timesheet row.
//!
//! ```text
//! OpenForm -> SelectPunchType -+-> SelectBenefitType -> EnterHours -+-> Submit -> Done
//!                              +-> EnterTimes ----------------------+
//! ```
//!
//! Every failure is fatal for the whole run; the caller does not move on to
//! the next row.

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::errors::{AutomatorError, AutomatorResult};
use crate::helpers::browser::{require, wait_for, wait_until_gone, Browser, ElementRef, Timeouts};
use crate::models::config::Behavior;
use crate::models::timesheet::TimesheetRow;

pub const PUNCH_MODAL: &str = "#punchModal";
pub const PUNCH_TYPE_SELECT: &str = "#punchType";
pub const PUNCH_TYPE_OPTIONS: &str = "#punchType option";
pub const BENEFIT_TYPE_SELECT: &str = "#benefitType";
pub const BENEFIT_TYPE_OPTIONS: &str = "#benefitType option";
pub const BENEFIT_HOURS_FIELD: &str = "#benefitHours";
pub const NOTES_FIELD: &str = "#punchNotes";
pub const IN_TIME_FIELD: &str = "#inTime";
pub const OUT_TIME_FIELD: &str = "#outTime";
pub const SAVE_AND_CLOSE: &str = "#punchModal button[title='Save and Close']";

pub fn add_control(date: NaiveDate) -> String {
    format!("a[data-date='{}'][title='Add']", date.format("%Y-%m-%d"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    OpenForm,
    SelectPunchType,
    SelectBenefitType,
    EnterHours,
    EnterTimes,
    Submit,
    Done,
}

/// One entry of a dropdown as rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownOption {
    pub element: ElementRef,
    pub label: String,
    pub disabled: bool,
}

/// Exact label match over the enabled options. Duplicate labels resolve to
/// the last one seen.
pub fn match_option(
    options: &[DropdownOption],
    field: &'static str,
    label: &str,
) -> AutomatorResult<ElementRef> {
    let lookup: HashMap<&str, &ElementRef> = options
        .iter()
        .filter(|opt| !opt.disabled)
        .map(|opt| (opt.label.as_str(), &opt.element))
        .collect();

    match lookup.get(label) {
        Some(element) => Ok((*element).clone()),
        None => {
            let mut available: Vec<String> = lookup.keys().map(|k| k.to_string()).collect();
            available.sort();
            Err(AutomatorError::OptionNotFound {
                field,
                label: label.to_string(),
                available,
            })
        }
    }
}

pub struct PunchForm<'a, B: Browser> {
    browser: &'a B,
    behavior: &'a Behavior,
    timeouts: &'a Timeouts,
}

impl<'a, B: Browser> PunchForm<'a, B> {
    pub fn new(browser: &'a B, behavior: &'a Behavior, timeouts: &'a Timeouts) -> Self {
        Self {
            browser,
            behavior,
            timeouts,
        }
    }

    /// Walk the modal from `OpenForm` to `Done` for `row`.
    pub async fn drive(&self, row: &TimesheetRow) -> AutomatorResult<()> {
        info!("Punching {}", row);
        let mut state = FormState::OpenForm;
        while state != FormState::Done {
            let next = self.step(state, row).await?;
            debug!("Row {}: {:?} -> {:?}", row.index + 1, state, next);
            state = next;
        }
        info!("Row {} punched", row.index + 1);
        Ok(())
    }

    pub async fn step(&self, state: FormState, row: &TimesheetRow) -> AutomatorResult<FormState> {
        match state {
            FormState::OpenForm => {
                let date = row.date.ok_or_else(|| {
                    AutomatorError::ElementNotFound(format!("date for row {}", row.index + 1))
                })?;
                let add = require(
                    self.browser,
                    None,
                    &add_control(date),
                    &format!("add button for {date}"),
                )
                .await?;
                self.click(&add, "add button").await?;
                Ok(FormState::SelectPunchType)
            }
            FormState::SelectPunchType => {
                let modal = wait_for(
                    self.browser,
                    PUNCH_MODAL,
                    self.timeouts.modal_open,
                    self.timeouts.poll,
                )
                .await;
                if modal.is_none() {
                    return Err(AutomatorError::ElementNotFound("punch modal".to_string()));
                }

                self.select(
                    PUNCH_TYPE_SELECT,
                    PUNCH_TYPE_OPTIONS,
                    "punch type",
                    &self.behavior.punch_type,
                )
                .await?;

                if self.behavior.is_benefit() {
                    Ok(FormState::SelectBenefitType)
                } else {
                    Ok(FormState::EnterTimes)
                }
            }
            FormState::SelectBenefitType => {
                let populated = wait_for(
                    self.browser,
                    BENEFIT_TYPE_OPTIONS,
                    self.timeouts.benefit_options,
                    self.timeouts.poll,
                )
                .await;
                if populated.is_none() {
                    warn!("Benefit types never populated");
                }

                self.select(
                    BENEFIT_TYPE_SELECT,
                    BENEFIT_TYPE_OPTIONS,
                    "benefit type",
                    &self.behavior.benefit_type,
                )
                .await?;
                Ok(FormState::EnterHours)
            }
            FormState::EnterHours => {
                self.fill(BENEFIT_HOURS_FIELD, "benefit hours field", &self.behavior.benefit_hours)
                    .await?;
                if !self.behavior.notes.is_empty() {
                    self.fill(NOTES_FIELD, "notes field", &self.behavior.notes).await?;
                }
                Ok(FormState::Submit)
            }
            FormState::EnterTimes => {
                self.fill(IN_TIME_FIELD, "in time field", &self.behavior.in_time)
                    .await?;
                self.fill(OUT_TIME_FIELD, "out time field", &self.behavior.out_time)
                    .await?;
                Ok(FormState::Submit)
            }
            FormState::Submit => {
                let save = require(self.browser, None, SAVE_AND_CLOSE, "save and close button").await?;
                self.click(&save, "save and close button").await?;

                let closed = wait_until_gone(
                    self.browser,
                    PUNCH_MODAL,
                    self.timeouts.modal_close,
                    self.timeouts.poll,
                )
                .await;
                if !closed {
                    warn!("Punch modal still open after {:?}", self.timeouts.modal_close);
                }
                Ok(FormState::Done)
            }
            FormState::Done => Ok(FormState::Done),
        }
    }

    async fn click(&self, element: &ElementRef, what: &str) -> AutomatorResult<()> {
        self.browser
            .click(element)
            .await
            .map_err(|e| AutomatorError::browser(format!("cannot click {what}"), e))
    }

    async fn fill(&self, css: &str, what: &str, value: &str) -> AutomatorResult<()> {
        let field = require(self.browser, None, css, what).await?;
        self.click(&field, what).await?;
        self.browser
            .send_keys(&field, value)
            .await
            .map_err(|e| AutomatorError::browser(format!("cannot type into {what}"), e))
    }

    async fn select(
        &self,
        select_css: &str,
        options_css: &str,
        field: &'static str,
        label: &str,
    ) -> AutomatorResult<()> {
        let select = require(self.browser, None, select_css, &format!("{field} selector")).await?;
        self.click(&select, &format!("{field} selector")).await?;

        let elements = self
            .browser
            .find_all(None, options_css)
            .await
            .map_err(|e| AutomatorError::browser(format!("cannot list {field} options"), e))?;

        let mut options = Vec::with_capacity(elements.len());
        for element in elements {
            let shown = self.browser.displayed(&element).await.map_err(|e| {
                AutomatorError::browser(format!("cannot check {field} option is displayed"), e)
            })?;
            if shown {
                options.push(self.read_option(element).await?);
            }
        }

        let choice = match_option(&options, field, label)?;
        debug!("Selecting {} {:?}", field, label);
        self.click(&choice, &format!("{field} option {label:?}")).await
    }

    async fn read_option(&self, element: ElementRef) -> AutomatorResult<DropdownOption> {
        let read_err = |e| AutomatorError::browser("cannot read dropdown option", e);
        let label = self.browser.text(&element).await.map_err(read_err)?;
        let disabled_attr = self
            .browser
            .attribute(&element, "disabled")
            .await
            .map_err(read_err)?;
        let class = self
            .browser
            .attribute(&element, "class")
            .await
            .map_err(read_err)?
            .unwrap_or_default();

        Ok(DropdownOption {
            element,
            label: label.trim().to_string(),
            disabled: disabled_attr.is_some() || class.split_whitespace().any(|c| c == "disabled"),
        })
    }
}
