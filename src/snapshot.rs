use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::decode_records;
use crate::models::{Application, Job, JobRef, UserRef};
use crate::source::JobBoardSource;

/// Records loaded from exported files instead of the live backend.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    pub jobs: Vec<Job>,
    pub applications: Vec<Application>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvApplicationRow {
    id: String,
    job_id: Option<String>,
    user_id: Option<String>,
    applied_date: Option<String>,
    status: String,
}

impl From<CsvApplicationRow> for Application {
    fn from(row: CsvApplicationRow) -> Self {
        Application {
            id: row.id,
            job_id: row.job_id.map(JobRef::Id),
            user_id: row.user_id.map(UserRef::Id),
            applied_date: row.applied_date,
            status: row.status,
        }
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// A bare array, or an object whose `key` holds the array. Any other shape
/// is the wrong export and is refused.
fn json_records<T: DeserializeOwned>(path: &Path, key: &str, kind: &str) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} from {}", key, path.display()))?;

    let values = match value {
        Value::Array(values) => values,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(values)) => values,
            Some(_) => bail!("\"{}\" in {} is not a list", key, path.display()),
            None => bail!(
                "{} has no \"{}\" list; is it the right export?",
                path.display(),
                key
            ),
        },
        _ => bail!(
            "{} holds neither a list nor a \"{}\" object",
            path.display(),
            key
        ),
    };
    Ok(decode_records(kind, values))
}

/// Rows that fail to decode are logged and skipped. A file without the
/// `required` column is refused.
fn csv_records<R: DeserializeOwned>(path: &Path, required: &str, kind: &str) -> Result<Vec<R>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read the header of {}", path.display()))?;
    if !headers.iter().any(|header| header == required) {
        bail!(
            "{} has no \"{}\" column; is it the right export?",
            path.display(),
            required
        );
    }

    let mut records = Vec::new();
    for (row, result) in reader.deserialize::<R>().enumerate() {
        match result {
            Ok(record) => records.push(record),
            Err(err) => warn!("Skipping {} row {} in {}: {}", kind, row + 1, path.display(), err),
        }
    }
    Ok(records)
}

pub fn load_jobs(path: &Path) -> Result<Vec<Job>> {
    let jobs = if is_csv(path) {
        csv_records(path, "postedDate", "job")?
    } else {
        json_records(path, "jobs", "job")?
    };

    info!("Loaded {} jobs from {}", jobs.len(), path.display());
    Ok(jobs)
}

pub fn load_applications(path: &Path) -> Result<Vec<Application>> {
    let applications = if is_csv(path) {
        csv_records::<CsvApplicationRow>(path, "appliedDate", "application")?
            .into_iter()
            .map(Application::from)
            .collect()
    } else {
        json_records(path, "applications", "application")?
    };

    info!(
        "Loaded {} applications from {}",
        applications.len(),
        path.display()
    );
    Ok(applications)
}

impl SnapshotSource {
    pub fn from_paths(jobs: Option<&Path>, applications: Option<&Path>) -> Result<Self> {
        Ok(Self {
            jobs: jobs.map(load_jobs).transpose()?.unwrap_or_default(),
            applications: applications
                .map(load_applications)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

impl JobBoardSource for SnapshotSource {
    async fn employer_jobs(&self) -> Result<Vec<Job>> {
        Ok(self.jobs.clone())
    }

    async fn job_applications(&self, job_id: &str) -> Result<Vec<Application>> {
        Ok(self
            .applications
            .iter()
            .filter(|application| {
                application
                    .job_id
                    .as_ref()
                    .is_some_and(|job| job.id() == job_id)
            })
            .cloned()
            .collect())
    }

    async fn user_applications(&self) -> Result<Vec<Application>> {
        Ok(self.applications.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_jobs_from_csv_with_empty_category() {
        let file = write_file(
            ".csv",
            "id,title,company,location,postedDate,category,status\n\
             j1,Backend Engineer,Acme,Remote,2026-09-02T10:00:00Z,Engineering,active\n\
             j2,Recruiter,Acme,Berlin,2026-10-01T10:00:00Z,,closed\n",
        );
        let jobs = load_jobs(file.path()).unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].category.as_deref(), Some("Engineering"));
        assert_eq!(jobs[1].category, None);
        assert_eq!(jobs[1].status, "closed");
    }

    #[test]
    fn loads_jobs_from_bare_or_enveloped_json() {
        let bare = write_file(".json", r#"[{"_id":"j1","status":"active"}]"#);
        let envelope = write_file(
            ".json",
            r#"{"success":true,"jobs":[{"_id":"j1","status":"active"},{"_id":"j2","status":"active"}]}"#,
        );

        assert_eq!(load_jobs(bare.path()).unwrap().len(), 1);
        assert_eq!(load_jobs(envelope.path()).unwrap().len(), 2);
    }

    #[test]
    fn loads_applications_from_csv() {
        let file = write_file(
            ".csv",
            "id,jobId,userId,appliedDate,status\n\
             a1,j1,u1,2026-10-10T08:00:00Z,Pending\n\
             a2,j2,u1,2026-10-12T08:00:00Z,Accepted\n",
        );
        let applications = load_applications(file.path()).unwrap();

        assert_eq!(applications.len(), 2);
        assert_eq!(applications[1].job_id.as_ref().map(JobRef::id), Some("j2"));
    }

    #[test]
    fn wrong_export_is_refused() {
        let applications = write_file(
            ".json",
            r#"{"applications":[{"_id":"a1","jobId":"j1","status":"Pending"}]}"#,
        );
        let misspelled = write_file(".json", r#"{"job":[{"_id":"j1","status":"active"}]}"#);
        let scalar = write_file(".json", r#"{"jobs":3}"#);

        let err = load_jobs(applications.path()).unwrap_err();
        assert!(err.to_string().contains("no \"jobs\" list"));
        assert!(load_jobs(misspelled.path()).is_err());
        assert!(load_jobs(scalar.path()).is_err());
    }

    #[test]
    fn jobs_csv_is_refused_as_applications() {
        let file = write_file(
            ".csv",
            "id,title,company,location,postedDate,category,status\n\
             j1,Backend Engineer,Acme,Remote,2026-09-02T10:00:00Z,Engineering,active\n",
        );
        assert!(load_applications(file.path()).is_err());
    }

    #[test]
    fn bad_record_is_skipped_and_the_rest_kept() {
        let file = write_file(
            ".json",
            r#"[
                {"_id":"a1","appliedDate":"2026-10-10T08:00:00Z","status":"Pending"},
                {"_id":"a2","jobId":17,"status":"Pending"},
                {"_id":"a3","appliedDate":1760000000000,"status":null}
            ]"#,
        );
        let applications = load_applications(file.path()).unwrap();

        assert_eq!(
            applications.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec!["a1", "a3"]
        );
        assert_eq!(applications[1].status, "");
    }

    #[test]
    fn malformed_json_is_reported() {
        let file = write_file(".json", "{not json");
        assert!(load_applications(file.path()).is_err());
    }

    #[tokio::test]
    async fn job_applications_filters_by_job_id() {
        let file = write_file(
            ".json",
            r#"{"applications":[
                {"_id":"a1","jobId":"j1","status":"Pending"},
                {"_id":"a2","jobId":{"_id":"j2","title":"Designer","status":"active"},"status":"Pending"},
                {"_id":"a3","jobId":"j1","status":"Rejected"},
                {"_id":"a4","status":"Pending"}
            ]}"#,
        );
        let source = SnapshotSource::from_paths(None, Some(file.path())).unwrap();

        let for_j1 = source.job_applications("j1").await.unwrap();
        let for_j2 = source.job_applications("j2").await.unwrap();

        assert_eq!(
            for_j1.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec!["a1", "a3"]
        );
        assert_eq!(for_j2.len(), 1);
        assert_eq!(source.user_applications().await.unwrap().len(), 4);
        assert!(source.employer_jobs().await.unwrap().is_empty());
    }
}
