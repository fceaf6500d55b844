use std::fmt::Write;

use anyhow::{Context, Result};

use crate::dashboard::{EmployerDashboard, SeekerDashboard};
use crate::session::ViewContext;

const BAR_WIDTH: u32 = 20;
const BAR_GLYPH: char = '█';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Markdown,
    Json,
}

/// Scales `count` against the largest value in the series.
fn bar(count: u32, max: u32) -> String {
    if max == 0 || count == 0 {
        return String::new();
    }
    let (count, max) = (u64::from(count), u64::from(max));
    let width = (count * u64::from(BAR_WIDTH)).div_ceil(max);
    std::iter::repeat(BAR_GLYPH).take(width as usize).collect()
}

/// Keeps free text from breaking out of a Markdown table cell.
fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn write_series(output: &mut String, heading: &str, label: &str, rows: &[(&str, u32)]) {
    let max = rows.iter().map(|(_, count)| *count).max().unwrap_or(0);

    let _ = writeln!(output, "## {heading}");
    let _ = writeln!(output);
    let _ = writeln!(output, "| {label} | Count | |");
    let _ = writeln!(output, "|---|---:|---|");
    for (name, count) in rows {
        let _ = writeln!(output, "| {} | {} | {} |", cell(name), count, bar(*count, max));
    }
    let _ = writeln!(output);
}

fn write_greeting(output: &mut String, ctx: &ViewContext) {
    match ctx.user_name() {
        Some(name) if !name.is_empty() => {
            let _ = writeln!(output, "Welcome back, {name}");
        }
        _ => {
            let _ = writeln!(output, "Not signed in.");
        }
    }
    let _ = writeln!(output);
}

pub fn build_employer_report(ctx: &ViewContext, dashboard: &EmployerDashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Employer Dashboard");
    write_greeting(&mut output, ctx);

    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Active Jobs: {}", dashboard.active_jobs);
    let _ = writeln!(output, "- Total Applications: {}", dashboard.total_applications);
    let _ = writeln!(output, "- Pending Review: {}", dashboard.statuses.pending);
    let _ = writeln!(output, "- Accepted: {}", dashboard.statuses.accepted);
    let _ = writeln!(output);

    let monthly: Vec<(&str, u32)> = dashboard
        .monthly
        .iter()
        .map(|bucket| (bucket.month.as_str(), bucket.jobs))
        .collect();
    write_series(&mut output, "Job Postings by Month", "Month", &monthly);

    let _ = writeln!(output, "## Jobs by Category");
    if dashboard.categories.is_empty() {
        let _ = writeln!(output, "No jobs posted yet.");
        let _ = writeln!(output);
    } else {
        let _ = writeln!(output);
        let categories: Vec<(&str, u32)> = dashboard
            .categories
            .iter()
            .map(|slice| (slice.name.as_str(), slice.value))
            .collect();
        let total: u32 = categories.iter().map(|(_, value)| value).sum();
        let _ = writeln!(output, "| Category | Jobs | Share |");
        let _ = writeln!(output, "|---|---:|---:|");
        for (name, value) in categories {
            let share = value as f64 * 100.0 / total as f64;
            let _ = writeln!(output, "| {} | {value} | {share:.0}% |", cell(name));
        }
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "## Recent Applications");
    let _ = writeln!(output);
    let _ = writeln!(output, "| Job Title | Applicant | Date | Status |");
    let _ = writeln!(output, "|---|---|---|---|");
    if dashboard.recent_applications.is_empty() {
        let _ = writeln!(output, "| No applications found | | | |");
    } else {
        for row in &dashboard.recent_applications {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                cell(&row.job_title),
                cell(&row.applicant),
                row.applied_on,
                cell(&row.status)
            );
        }
    }

    output
}

pub fn build_seeker_report(ctx: &ViewContext, dashboard: &SeekerDashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Job Seeker Dashboard");
    write_greeting(&mut output, ctx);

    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Total Applications: {}", dashboard.total_applications);
    let _ = writeln!(output, "- Under Review: {}", dashboard.statuses.pending);
    let _ = writeln!(output, "- Accepted: {}", dashboard.statuses.accepted);
    let _ = writeln!(output, "- Rejected: {}", dashboard.statuses.rejected);
    let _ = writeln!(output);

    let weekly: Vec<(&str, u32)> = dashboard
        .weekly
        .iter()
        .map(|bucket| (bucket.week.as_str(), bucket.applications))
        .collect();
    write_series(&mut output, "Application Activity", "Week", &weekly);

    let _ = writeln!(output, "## Application History");
    let _ = writeln!(output);
    let _ = writeln!(output, "| Job Title | Company | Applied Date | Status |");
    let _ = writeln!(output, "|---|---|---|---|");
    if dashboard.history.is_empty() {
        let _ = writeln!(output, "| No applications found | | | |");
    } else {
        for row in &dashboard.history {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                cell(&row.job_title),
                cell(&row.company),
                row.applied_on,
                cell(&row.status)
            );
        }
    }

    output
}

pub fn render_employer(
    format: ReportFormat,
    ctx: &ViewContext,
    dashboard: &EmployerDashboard,
) -> Result<String> {
    match format {
        ReportFormat::Markdown => Ok(build_employer_report(ctx, dashboard)),
        ReportFormat::Json => {
            serde_json::to_string_pretty(dashboard).context("Failed to serialize dashboard")
        }
    }
}

pub fn render_seeker(
    format: ReportFormat,
    ctx: &ViewContext,
    dashboard: &SeekerDashboard,
) -> Result<String> {
    match format {
        ReportFormat::Markdown => Ok(build_seeker_report(ctx, dashboard)),
        ReportFormat::Json => {
            serde_json::to_string_pretty(dashboard).context("Failed to serialize dashboard")
        }
    }
}
