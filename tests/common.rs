#![allow(dead_code)]
use axum::Router;
use std::time::Duration;
use tokio::net::TcpListener;

use uattend_automator::helpers::{
    auth::{LOGIN_BUTTON, PASSWORD_FIELD, TIMESHEET_READY, USERNAME_FIELD},
    fake::FakeBrowser,
    punch_form::*,
    scanner::{punched_marker, ROW_DATE_CELL, TIMESHEET_ROWS},
};
use uattend_automator::models::config::{Behavior, Config, Credentials, SkipDate};
use uattend_automator::{ElementRef, Timeouts};

/// Bounds small enough that every wait against the fake portal resolves
/// within a few polls.
pub fn immediate_timeouts() -> Timeouts {
    Timeouts {
        login: Duration::from_millis(20),
        modal_open: Duration::from_millis(20),
        benefit_options: Duration::from_millis(20),
        modal_close: Duration::from_millis(20),
        poll: Duration::from_millis(5),
    }
}

pub const STANDARD_PUNCH_TYPES: [&str; 4] = ["In/Out", "Break", "Lunch", "Benefit"];
pub const STANDARD_BENEFIT_TYPES: [&str; 4] = [
    "VAC - Vacation",
    "SIC - Sick",
    "HOL - Holiday",
    "OTH - Other",
];

/// Elements of the add-punch modal. Hidden until an Add button is clicked,
/// hidden again on save.
pub struct PunchModal {
    parts: Vec<ElementRef>,
    pub save: ElementRef,
    pub hours: ElementRef,
}

pub fn install_modal(
    browser: &FakeBrowser,
    punch_types: &[&str],
    benefit_types: &[&str],
) -> PunchModal {
    let mut parts = vec![
        browser.add_hidden(PUNCH_MODAL, ""),
        browser.add_hidden(PUNCH_TYPE_SELECT, ""),
    ];

    let benefit_parts: Vec<ElementRef> = std::iter::once(browser.add_hidden(BENEFIT_TYPE_SELECT, ""))
        .chain(
            benefit_types
                .iter()
                .map(|label| browser.add_hidden(BENEFIT_TYPE_OPTIONS, label)),
        )
        .collect();

    for label in punch_types {
        let option = browser.add_hidden(PUNCH_TYPE_OPTIONS, label);
        if *label == "Benefit" {
            for part in &benefit_parts {
                browser.reveal_on_click(&option, part);
            }
        }
        parts.push(option);
    }

    let hours = browser.add_hidden(BENEFIT_HOURS_FIELD, "");
    parts.push(hours.clone());
    for css in [NOTES_FIELD, IN_TIME_FIELD, OUT_TIME_FIELD] {
        parts.push(browser.add_hidden(css, ""));
    }

    let save = browser.add_hidden(SAVE_AND_CLOSE, "");
    parts.push(save.clone());
    for part in parts.iter().chain(benefit_parts.iter()) {
        browser.hide_on_click(&save, part);
    }

    PunchModal { parts, save, hours }
}

/// An Add control for `iso_date` that opens `modal`.
pub fn add_button(browser: &FakeBrowser, modal: &PunchModal, iso_date: &str) -> ElementRef {
    let add = browser.add(&format!("a[data-date='{iso_date}'][title='Add']"));
    for part in &modal.parts {
        browser.reveal_on_click(&add, part);
    }
    add
}

/// Login form whose button reveals the timesheet.
pub fn install_login(browser: &FakeBrowser) {
    browser.add(USERNAME_FIELD);
    browser.add(PASSWORD_FIELD);
    let button = browser.add(LOGIN_BUTTON);
    let ready = browser.add_hidden(TIMESHEET_READY, "");
    browser.reveal_on_click(&button, &ready);
}

/// One timesheet row per `MM/DD/YY` date.
pub fn install_rows(browser: &FakeBrowser, dates: &[&str]) -> Vec<ElementRef> {
    dates
        .iter()
        .map(|date| {
            let row = browser.add(TIMESHEET_ROWS);
            browser.add_in(&row, ROW_DATE_CELL, &format!("Day\n{date}"));
            row
        })
        .collect()
}

pub fn mark_punched(browser: &FakeBrowser, index: usize) {
    browser.add(&punched_marker(index));
}

pub fn weekday_config(behavior: Behavior) -> Config {
    Config {
        credentials: Credentials {
            login: "jdoe".into(),
            password: "hunter2".into(),
        },
        org_url: "https://acme.uattend.com/login".into(),
        skip_dates: Vec::<SkipDate>::new(),
        workdays: vec![Some(1), Some(2), Some(3), Some(4), Some(5)],
        behavior,
        ..Default::default()
    }
}

pub fn vacation() -> Behavior {
    Behavior {
        punch_type: "Benefit".into(),
        benefit_type: "VAC - Vacation".into(),
        benefit_hours: "8".into(),
        ..Default::default()
    }
}

pub fn in_out() -> Behavior {
    Behavior {
        punch_type: "In/Out".into(),
        in_time: "2024-01-08".into(),
        out_time: "2024-01-08".into(),
        ..Default::default()
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
