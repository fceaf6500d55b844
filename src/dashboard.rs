//! Dashboard assembly.
//!
//! Loaders fetch records from a [`JobBoardSource`] and fold them through the
//! aggregators. A failed fetch never leaves a dashboard half-built: it is
//! logged and the empty, fixed-shape dashboard is returned instead.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::breakdown::{category_breakdown, count_active_jobs, StatusTally};
use crate::config::Config;
use crate::dates::format_display_date;
use crate::models::{Application, CategorySlice, Job, JobRef, MonthBucket, UserRef, WeekBucket};
use crate::session::{RefreshGuard, ViewContext};
use crate::source::JobBoardSource;
use crate::timeline::{monthly_postings_with, weekly_buckets, MonthKeying};

pub const UNKNOWN_JOB: &str = "Unknown Job";
pub const UNKNOWN_APPLICANT: &str = "Unknown Applicant";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSettings {
    pub recent_limit: usize,
    pub month_keying: MonthKeying,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            recent_limit: 5,
            month_keying: MonthKeying::MonthOfYear,
        }
    }
}

impl From<&Config> for DashboardSettings {
    fn from(config: &Config) -> Self {
        Self {
            recent_limit: config.dashboard.recent_limit,
            month_keying: config.monthly.keying(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentApplication {
    pub id: String,
    pub job_title: String,
    pub applicant: String,
    pub applied_on: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub job_title: String,
    pub company: String,
    pub applied_on: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployerDashboard {
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub total_applications: usize,
    #[serde(flatten)]
    pub statuses: StatusTally,
    pub monthly: Vec<MonthBucket>,
    pub categories: Vec<CategorySlice>,
    pub recent_applications: Vec<RecentApplication>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeekerDashboard {
    pub total_applications: usize,
    #[serde(flatten)]
    pub statuses: StatusTally,
    pub weekly: Vec<WeekBucket>,
    pub history: Vec<HistoryEntry>,
}

fn populated_job(application: &Application) -> Option<&Job> {
    application.job_id.as_ref().and_then(JobRef::job)
}

fn job_title(application: &Application) -> String {
    populated_job(application)
        .and_then(|job| job.title.clone())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNKNOWN_JOB.to_string())
}

pub fn build_employer<Tz: TimeZone>(
    jobs: &[Job],
    applications: &[Application],
    now: &DateTime<Tz>,
    settings: DashboardSettings,
) -> EmployerDashboard
where
    Tz::Offset: std::fmt::Display,
{
    let tz = now.timezone();
    let recent_applications = applications
        .iter()
        .take(settings.recent_limit)
        .map(|application| RecentApplication {
            id: application.id.clone(),
            job_title: job_title(application),
            applicant: application
                .user_id
                .as_ref()
                .and_then(UserRef::user)
                .map(|user| user.name.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNKNOWN_APPLICANT.to_string()),
            applied_on: format_display_date(application.applied_date.as_deref(), &tz),
            status: application.status.clone(),
        })
        .collect();

    EmployerDashboard {
        total_jobs: jobs.len(),
        active_jobs: count_active_jobs(jobs),
        total_applications: applications.len(),
        statuses: StatusTally::from_applications(applications),
        monthly: monthly_postings_with(jobs, now, settings.month_keying),
        categories: category_breakdown(jobs),
        recent_applications,
    }
}

pub fn build_seeker<Tz: TimeZone>(applications: &[Application], now: &DateTime<Tz>) -> SeekerDashboard
where
    Tz::Offset: std::fmt::Display,
{
    let tz = now.timezone();
    let history = applications
        .iter()
        .map(|application| HistoryEntry {
            id: application.id.clone(),
            job_title: job_title(application),
            company: populated_job(application)
                .and_then(|job| job.company.clone())
                .filter(|company| !company.is_empty())
                .unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
            applied_on: format_display_date(application.applied_date.as_deref(), &tz),
            status: application.status.clone(),
        })
        .collect();

    SeekerDashboard {
        total_applications: applications.len(),
        statuses: StatusTally::from_applications(applications),
        weekly: weekly_buckets(applications, now),
        history,
    }
}

impl EmployerDashboard {
    /// Zero counts with the trailing month labels for `now`.
    pub fn empty<Tz: TimeZone>(now: &DateTime<Tz>, settings: DashboardSettings) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        build_employer(&[], &[], now, settings)
    }
}

impl SeekerDashboard {
    /// Zero counts across the six week labels.
    pub fn empty<Tz: TimeZone>(now: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        build_seeker(&[], now)
    }
}

/// Jobs, then each job's applications one at a time, in job order.
pub async fn fetch_employer_records<S: JobBoardSource>(
    source: &S,
) -> Result<(Vec<Job>, Vec<Application>)> {
    let jobs = source
        .employer_jobs()
        .await
        .context("Failed to fetch employer jobs")?;

    let mut applications = Vec::new();
    for job in &jobs {
        let received = source
            .job_applications(&job.id)
            .await
            .with_context(|| format!("Failed to fetch applications for job {}", job.id))?;
        debug!("Job {} has {} applications", job.id, received.len());
        applications.extend(received);
    }

    Ok((jobs, applications))
}

pub async fn load_employer<S: JobBoardSource, Tz: TimeZone>(
    source: &S,
    ctx: &ViewContext,
    now: &DateTime<Tz>,
    settings: DashboardSettings,
) -> EmployerDashboard
where
    Tz::Offset: std::fmt::Display,
{
    if ctx.current_user.is_none() {
        info!("No signed-in employer, showing empty dashboard");
        return EmployerDashboard::empty(now, settings);
    }

    match fetch_employer_records(source).await {
        Ok((jobs, applications)) => {
            info!(
                "Fetched {} jobs and {} applications",
                jobs.len(),
                applications.len()
            );
            build_employer(&jobs, &applications, now, settings)
        }
        Err(err) => {
            error!("Error fetching employer dashboard data: {:#}", err);
            EmployerDashboard::empty(now, settings)
        }
    }
}

pub async fn load_seeker<S: JobBoardSource, Tz: TimeZone>(
    source: &S,
    ctx: &ViewContext,
    now: &DateTime<Tz>,
) -> SeekerDashboard
where
    Tz::Offset: std::fmt::Display,
{
    if ctx.current_user.is_none() {
        info!("No signed-in job seeker, showing empty dashboard");
        return SeekerDashboard::empty(now);
    }

    match source.user_applications().await {
        Ok(applications) => {
            info!("Fetched {} applications", applications.len());
            build_seeker(&applications, now)
        }
        Err(err) => {
            error!("Error fetching dashboard data: {:#}", err);
            SeekerDashboard::empty(now)
        }
    }
}

/// `None` when a newer refresh started while this one was in flight.
///
/// For embedders that keep one `RefreshGuard` per view and refresh it
/// repeatedly; the CLI calls [`load_employer`] directly.
pub async fn refresh_employer<S: JobBoardSource, Tz: TimeZone>(
    guard: &RefreshGuard,
    source: &S,
    ctx: &ViewContext,
    now: &DateTime<Tz>,
    settings: DashboardSettings,
) -> Option<EmployerDashboard>
where
    Tz::Offset: std::fmt::Display,
{
    let ticket = guard.begin();
    let dashboard = load_employer(source, ctx, now, settings).await;
    let accepted = guard.accept(ticket, dashboard);
    if accepted.is_none() {
        debug!("Discarding superseded employer refresh");
    }
    accepted
}

/// Seeker counterpart of [`refresh_employer`].
pub async fn refresh_seeker<S: JobBoardSource, Tz: TimeZone>(
    guard: &RefreshGuard,
    source: &S,
    ctx: &ViewContext,
    now: &DateTime<Tz>,
) -> Option<SeekerDashboard>
where
    Tz::Offset: std::fmt::Display,
{
    let ticket = guard.begin();
    let dashboard = load_seeker(source, ctx, now).await;
    let accepted = guard.accept(ticket, dashboard);
    if accepted.is_none() {
        debug!("Discarding superseded job seeker refresh");
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use anyhow::anyhow;
    use chrono::Utc;

    #[derive(Default)]
    struct StubSource {
        jobs: Vec<Job>,
        applications: Vec<Application>,
        fail_applications_for: Option<String>,
        fail_user_applications: bool,
        supersede_with: Option<RefreshGuard>,
    }

    impl JobBoardSource for StubSource {
        async fn employer_jobs(&self) -> Result<Vec<Job>> {
            if let Some(guard) = &self.supersede_with {
                guard.begin();
            }
            Ok(self.jobs.clone())
        }

        async fn job_applications(&self, job_id: &str) -> Result<Vec<Application>> {
            if self.fail_applications_for.as_deref() == Some(job_id) {
                return Err(anyhow!("HTTP error! status: 502"));
            }
            Ok(self
                .applications
                .iter()
                .filter(|a| a.job_id.as_ref().map(JobRef::id) == Some(job_id))
                .cloned()
                .collect())
        }

        async fn user_applications(&self) -> Result<Vec<Application>> {
            if self.fail_user_applications {
                return Err(anyhow!("connection refused"));
            }
            if let Some(guard) = &self.supersede_with {
                guard.begin();
            }
            Ok(self.applications.clone())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn signed_in() -> ViewContext {
        ViewContext::new(Some(User {
            id: "u1".to_string(),
            name: "Kiara Patel".to_string(),
            email: "kiara@example.com".to_string(),
            role: None,
        }))
    }

    fn job(id: &str, category: &str, posted: &str, status: &str) -> Job {
        Job {
            id: id.to_string(),
            title: Some(format!("Title {id}")),
            company: Some("Acme".to_string()),
            posted_date: Some(posted.to_string()),
            category: Some(category.to_string()),
            status: status.to_string(),
            ..Job::default()
        }
    }

    fn application(id: &str, job: JobRef, applied: &str, status: &str) -> Application {
        Application {
            id: id.to_string(),
            job_id: Some(job),
            user_id: Some(UserRef::Id("u9".to_string())),
            applied_date: Some(applied.to_string()),
            status: status.to_string(),
        }
    }

    fn employer_source() -> StubSource {
        StubSource {
            jobs: vec![
                job("j1", "Engineering", "2026-10-02T09:00:00Z", "active"),
                job("j2", "Design", "2026-08-11T09:00:00Z", "closed"),
                job("j3", "Engineering", "2026-09-21T09:00:00Z", "active"),
            ],
            applications: vec![
                application("a1", JobRef::Id("j1".into()), "2026-10-10T10:00:00Z", "Pending"),
                application("a2", JobRef::Id("j1".into()), "2026-10-11T10:00:00Z", "Accepted"),
                application("a3", JobRef::Id("j3".into()), "2026-10-12T10:00:00Z", "pending"),
                application("a4", JobRef::Id("j2".into()), "2026-09-01T10:00:00Z", "Rejected"),
            ],
            ..StubSource::default()
        }
    }

    #[tokio::test]
    async fn employer_dashboard_aggregates_everything() {
        let dashboard =
            load_employer(&employer_source(), &signed_in(), &now(), DashboardSettings::default())
                .await;

        assert_eq!(dashboard.total_jobs, 3);
        assert_eq!(dashboard.active_jobs, 2);
        assert_eq!(dashboard.total_applications, 4);
        assert_eq!(dashboard.statuses.pending, 1);
        assert_eq!(dashboard.statuses.accepted, 1);
        assert_eq!(dashboard.statuses.rejected, 1);
        assert_eq!(
            dashboard
                .monthly
                .iter()
                .map(|m| (m.month.as_str(), m.jobs))
                .collect::<Vec<_>>(),
            vec![("May", 0), ("Jun", 0), ("Jul", 0), ("Aug", 1), ("Sep", 1), ("Oct", 1)]
        );
        assert_eq!(dashboard.categories[0].name, "Engineering");
        assert_eq!(dashboard.categories[0].value, 2);
        // applications follow job order: j1, j2, j3
        assert_eq!(
            dashboard
                .recent_applications
                .iter()
                .map(|r| r.id.as_str())
                .collect::<Vec<_>>(),
            vec!["a1", "a2", "a4", "a3"]
        );
        assert_eq!(dashboard.recent_applications[0].job_title, UNKNOWN_JOB);
        assert_eq!(dashboard.recent_applications[0].applicant, UNKNOWN_APPLICANT);
        assert_eq!(dashboard.recent_applications[0].applied_on, "October 10, 2026");
    }

    #[tokio::test]
    async fn recent_applications_respect_limit() {
        let settings = DashboardSettings {
            recent_limit: 2,
            ..DashboardSettings::default()
        };
        let dashboard = load_employer(&employer_source(), &signed_in(), &now(), settings).await;

        assert_eq!(dashboard.recent_applications.len(), 2);
        assert_eq!(dashboard.total_applications, 4);
    }

    #[tokio::test]
    async fn employer_fetch_failure_degrades_to_empty() {
        let source = StubSource {
            fail_applications_for: Some("j3".to_string()),
            ..employer_source()
        };
        let dashboard =
            load_employer(&source, &signed_in(), &now(), DashboardSettings::default()).await;

        assert_eq!(dashboard, EmployerDashboard::empty(&now(), DashboardSettings::default()));
        assert_eq!(dashboard.monthly.len(), 6);
        assert!(dashboard.monthly.iter().all(|m| m.jobs == 0));
        assert!(dashboard.categories.is_empty());
    }

    #[tokio::test]
    async fn signed_out_user_gets_empty_dashboards_without_fetching() {
        let source = StubSource {
            fail_user_applications: true,
            ..employer_source()
        };
        let employer =
            load_employer(&source, &ViewContext::default(), &now(), DashboardSettings::default())
                .await;
        let seeker = load_seeker(&source, &ViewContext::default(), &now()).await;

        assert_eq!(employer.total_jobs, 0);
        assert_eq!(seeker, SeekerDashboard::empty(&now()));
    }

    #[tokio::test]
    async fn seeker_dashboard_uses_populated_jobs() {
        let populated = job("j7", "Engineering", "2026-09-01T00:00:00Z", "active");
        let source = StubSource {
            applications: vec![
                application("a1", JobRef::Populated(populated), "2026-10-18T10:00:00Z", "Pending"),
                application("a2", JobRef::Id("j8".into()), "2026-09-20T10:00:00Z", "Rejected"),
                application("a3", JobRef::Id("j9".into()), "2026-06-01T10:00:00Z", "Accepted"),
            ],
            ..StubSource::default()
        };
        let dashboard = load_seeker(&source, &signed_in(), &now()).await;

        assert_eq!(dashboard.total_applications, 3);
        assert_eq!(
            dashboard.statuses,
            StatusTally {
                pending: 1,
                accepted: 1,
                rejected: 1,
            }
        );
        assert_eq!(
            dashboard.weekly.iter().map(|w| w.applications).collect::<Vec<_>>(),
            vec![0, 1, 0, 0, 0, 1]
        );
        assert_eq!(dashboard.history[0].job_title, "Title j7");
        assert_eq!(dashboard.history[0].company, "Acme");
        assert_eq!(dashboard.history[1].company, UNKNOWN_COMPANY);
    }

    #[tokio::test]
    async fn seeker_fetch_failure_yields_six_zero_weeks() {
        let source = StubSource {
            fail_user_applications: true,
            ..StubSource::default()
        };
        let dashboard = load_seeker(&source, &signed_in(), &now()).await;

        assert_eq!(dashboard.weekly.len(), 6);
        assert!(dashboard.weekly.iter().all(|w| w.applications == 0));
        assert!(dashboard.history.is_empty());
    }

    #[tokio::test]
    async fn superseded_refresh_is_discarded() {
        let guard = RefreshGuard::new();
        let source = StubSource {
            supersede_with: Some(guard.clone()),
            ..employer_source()
        };

        let stale = refresh_employer(&guard, &source, &signed_in(), &now(), DashboardSettings::default())
            .await;
        assert!(stale.is_none());

        let stale_seeker = refresh_seeker(&guard, &source, &signed_in(), &now()).await;
        assert!(stale_seeker.is_none());

        let fresh = refresh_seeker(&guard, &employer_source(), &signed_in(), &now()).await;
        assert!(fresh.is_some());
    }

    #[test]
    fn json_flattens_status_counts() {
        let dashboard = SeekerDashboard::empty(&now());
        let value = serde_json::to_value(&dashboard).unwrap();

        assert_eq!(value["pending"], 0);
        assert_eq!(value["weekly"][5]["week"], "Week 6");
        assert_eq!(value["weekly"].as_array().map(Vec::len), Some(6));
    }
}
