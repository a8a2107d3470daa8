use std::time::Duration;

use axum::{routing::get, Router};
use costpoint::domain::{CellRef, Outcome, SkipReason, Subject};
use costpoint::page::{GridPage, GridSnapshot};
use costpoint::{Automation, AutomationConfig, HttpEntrySource, Sequencing, WaitStrategy};

const GRID: &str = r#"{
    "headers": [
        {"id": "hdrDay1", "text": "Tue\n01/17/24"},
        {"id": "hdrDay0", "text": "Mon\n01/16/24"},
        {"id": "hdrTotal", "text": "Total"}
    ],
    "charge_codes": [
        {"id": "UDT02_ID-_0_E", "value": "DEV"},
        {"id": "UDT02_ID-_3_E", "value": "ADMIN"}
    ],
    "cells": [
        {"id": "DAY1_HRS-_0_E", "hours": "4.00", "note": "typed by hand"},
        {"id": "DAY2_HRS-_0_E"},
        {"id": "DAY1_HRS-_3_E", "hours": "1.00", "classes": ["automated"]},
        {"id": "DAY2_HRS-_3_E"}
    ]
}"#;

const ENTRIES: &str = r#"[
    {"charge_code": "DEV", "hours": "8.00", "date": "01/16/24"},
    {"charge_code": "DEV", "hours": "7.50", "date": "01/17/24", "notes": "grid resolver"},
    {"charge_code": "ADMIN", "hours": 0.25, "date": "01/17/24", "notes": "timesheet"},
    {"charge_code": "TRAINING", "hours": "1.00", "date": "01/17/24"}
]"#;

async fn serve_entries() -> String {
    let router = Router::new().route("/api/costpoint", get(|| async { ENTRIES }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api/costpoint", addr)
}

#[tokio::test]
async fn fills_grid_from_entry_server() {
    let grid: GridSnapshot = serde_json::from_str(GRID).unwrap();
    let page = GridPage::new(grid).with_overlay_latency(Duration::from_millis(20));
    let config = AutomationConfig {
        sequencing: Sequencing::Paired {
            pause: Duration::from_millis(5),
        },
        wait: WaitStrategy::Poll {
            interval: Duration::from_millis(5),
            timeout: Duration::from_secs(2),
        },
        ..Default::default()
    };
    let automation = Automation::new(HttpEntrySource::new(serve_entries().await), page, config);

    let report = automation.run().await.unwrap();

    assert_eq!(report.fetched, 4);
    assert_eq!(report.failed(), 0);
    assert!(report.items.iter().any(|item| item.outcome
        == Outcome::skipped(SkipReason::UserOwned)));
    assert!(report.items.iter().any(|item| item.outcome
        == Outcome::skipped(SkipReason::UnmappedChargeCode("TRAINING".to_string()))));
    assert_eq!(report.cleared(), vec![CellRef::new(3, 1)]);
    assert!(report.items.iter().any(|item| item.subject
        == Subject::Write {
            cell: CellRef::new(3, 2)
        }));

    let cells = automation.page().snapshot().cells;
    let cell = |id: &str| cells.iter().find(|c| c.id == id).unwrap();

    assert_eq!(cell("DAY1_HRS-_0_E").hours, "4.00");
    assert_eq!(cell("DAY1_HRS-_0_E").note.as_deref(), Some("typed by hand"));
    assert!(cell("DAY1_HRS-_0_E").classes.is_empty());

    assert_eq!(cell("DAY2_HRS-_0_E").hours, "7.50");
    assert_eq!(cell("DAY2_HRS-_0_E").note.as_deref(), Some("grid resolver"));
    assert_eq!(cell("DAY2_HRS-_0_E").classes, vec!["automated".to_string()]);

    assert_eq!(cell("DAY1_HRS-_3_E").hours, "");
    assert!(cell("DAY1_HRS-_3_E").classes.is_empty());

    assert_eq!(cell("DAY2_HRS-_3_E").hours, "0.25");
    assert_eq!(cell("DAY2_HRS-_3_E").note.as_deref(), Some("timesheet"));

    let rerun = automation.run().await.unwrap();
    assert_eq!(rerun.applied(), 0);
    assert_eq!(rerun.failed(), 0);
}
