use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Application, ApplicationStatus, CategorySlice, Job, ACTIVE_JOB_STATUS};

pub const FALLBACK_CATEGORY: &str = "Other";

/// One slice per distinct category, largest first. Ties keep first-seen order.
pub fn category_breakdown(jobs: &[Job]) -> Vec<CategorySlice> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut slices: Vec<CategorySlice> = Vec::new();

    for job in jobs {
        let category = job
            .category
            .as_deref()
            .filter(|category| !category.is_empty())
            .unwrap_or(FALLBACK_CATEGORY);

        let position = *positions.entry(category).or_insert_with(|| {
            slices.push(CategorySlice {
                name: category.to_string(),
                value: 0,
            });
            slices.len() - 1
        });
        slices[position].value += 1;
    }

    // sort_by is stable
    slices.sort_by(|a, b| b.value.cmp(&a.value));
    slices
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusTally {
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl StatusTally {
    pub fn from_applications(applications: &[Application]) -> Self {
        Self {
            pending: count_status(applications, ApplicationStatus::Pending),
            accepted: count_status(applications, ApplicationStatus::Accepted),
            rejected: count_status(applications, ApplicationStatus::Rejected),
        }
    }
}

pub fn count_status(applications: &[Application], status: ApplicationStatus) -> usize {
    applications
        .iter()
        .filter(|application| status.matches(&application.status))
        .count()
}

pub fn count_active_jobs(jobs: &[Job]) -> usize {
    jobs.iter()
        .filter(|job| job.status == ACTIVE_JOB_STATUS)
        .count()
}
