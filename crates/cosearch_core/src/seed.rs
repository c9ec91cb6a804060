//! Initial catalog data.
//!
//! Seeding is repeatable: entries whose names already exist fail the
//! integrity check, are logged, and are skipped.

use crate::model::contributor::ContributorUpsert;
use crate::model::tag::TagUpsert;
use crate::service::contributor_service::ContributorService;
use crate::service::tag_service::TagService;
use crate::service::{ServiceError, ServiceResult};
use log::{error, info};
use rusqlite::Connection;

const INITIAL_TAGS: [(&str, &str); 4] = [
    ("Decider", "#991b1b"),
    ("Formal Verification", "#3730a3"),
    ("Individual Machine", "#115e59"),
    ("Meta", "#1f2937"),
];

/// Counts of rows written by one seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub contributors: usize,
    pub tags: usize,
}

fn initial_contributors() -> Vec<ContributorUpsert> {
    vec![
        ContributorUpsert::new("cosmo").with_display_name("Tristan Stérin"),
        ContributorUpsert::new("mxdys"),
    ]
}

pub fn init_data(conn: &Connection) -> ServiceResult<SeedReport> {
    info!("event=seed module=seed status=start");
    let mut report = SeedReport::default();

    let contributors = ContributorService::new(conn);
    for payload in initial_contributors() {
        let handle = payload.local_handle.clone();
        match contributors.create_contributor(payload) {
            Ok(_) => report.contributors += 1,
            Err(ServiceError::Condition(condition)) => error!(
                "event=seed_contributor module=seed status=skipped local_handle={} condition={}",
                handle, condition
            ),
            Err(err) => return Err(err),
        }
    }

    let tags = TagService::new(conn);
    for (display_name, color) in INITIAL_TAGS {
        match tags.create_tag(TagUpsert::new(display_name, color)) {
            Ok(_) => report.tags += 1,
            Err(ServiceError::Condition(condition)) => error!(
                "event=seed_tag module=seed status=skipped display_name={} condition={}",
                display_name, condition
            ),
            Err(err) => return Err(err),
        }
    }

    info!(
        "event=seed module=seed status=ok contributors={} tags={}",
        report.contributors, report.tags
    );
    Ok(report)
}
