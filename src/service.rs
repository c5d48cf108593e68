use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::aggregate;
use crate::criteria::Criterion;
use crate::error::{IqacError, Result};
use crate::models::{
    ActivityRecord, CreatedRecord, Faculty, FacultyFields, FacultyInput, FacultyStats,
    FacultySummary, LeaderboardEntry, NewActivityRecord, PerformanceCharts, RecordInput,
    StoredRecord, TableCounts,
};
use crate::scoring;
use crate::store::RecordStore;

#[derive(Clone)]
pub struct Service {
    store: Arc<dyn RecordStore>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidFaculty {
    pub full_name: String,
    pub department: String,
    pub email: String,
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// `local@domain.tld`: no whitespace, exactly one `@`, and a dot inside the
/// domain with text on both sides.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(index, c)| c == '.' && index > 0 && index < domain.len() - 1)
}

pub(crate) fn validate_faculty(input: &FacultyInput) -> Result<ValidFaculty> {
    let (Some(full_name), Some(department), Some(email)) = (
        non_blank(input.faculty_name.as_ref()),
        non_blank(input.dept_name.as_ref()),
        non_blank(input.email.as_ref()),
    ) else {
        return Err(IqacError::Validation(
            "Faculty name, department, and email are required fields".to_string(),
        ));
    };

    if !is_valid_email(&email) {
        return Err(IqacError::Validation(
            "Please provide a valid email address".to_string(),
        ));
    }

    let hire_date = match non_blank(input.hire_date.as_ref()) {
        Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
            IqacError::Validation(format!("Hire date must be YYYY-MM-DD, got {raw}"))
        })?),
        None => None,
    };

    Ok(ValidFaculty {
        full_name,
        department,
        email,
        phone: non_blank(input.phone.as_ref()),
        hire_date,
    })
}

fn validate_record(input: &RecordInput) -> Result<(Uuid, Criterion, String)> {
    let (Some(faculty_id), Some(criteria_id), Some(sub_criteria)) = (
        input.faculty_id,
        input.criteria_id,
        non_blank(input.sub_criteria.as_ref()),
    ) else {
        return Err(IqacError::Validation("Missing required fields".to_string()));
    };

    let criterion = Criterion::from_id(criteria_id)
        .ok_or_else(|| IqacError::Validation(format!("Unknown criteria id {criteria_id}")))?;

    Ok((faculty_id, criterion, sub_criteria))
}

pub fn generate_employee_id() -> String {
    format!("EMP{:06}", Utc::now().timestamp_millis().rem_euclid(1_000_000))
}

fn faculty_not_found() -> IqacError {
    IqacError::NotFound("Faculty member not found".to_string())
}

impl Service {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Fast path is a plain lookup; unknown names go through the idempotent
    /// upsert so concurrent creators agree on one row.
    async fn resolve_department(&self, name: &str) -> Result<Uuid> {
        if let Some(id) = self.store.find_department_by_name(name).await? {
            return Ok(id);
        }
        let id = self.store.ensure_department(name).await?;
        tracing::info!(department = name, %id, "created department");
        Ok(id)
    }

    pub async fn list_faculty(&self) -> Result<Vec<Faculty>> {
        self.store.list_faculty().await
    }

    pub async fn get_faculty(&self, id: Uuid) -> Result<Faculty> {
        self.store
            .get_faculty(id)
            .await?
            .ok_or_else(faculty_not_found)
    }

    pub async fn create_faculty(&self, input: &FacultyInput) -> Result<Faculty> {
        let valid = validate_faculty(input)?;

        if self.store.email_exists(&valid.email, None).await? {
            return Err(IqacError::Conflict(
                "Email already exists in the system".to_string(),
            ));
        }

        let department_id = self.resolve_department(&valid.department).await?;
        let fields = FacultyFields {
            full_name: valid.full_name,
            email: valid.email,
            phone: valid.phone,
            hire_date: valid.hire_date,
            department_id,
        };
        let id = self
            .store
            .create_faculty(&generate_employee_id(), &fields)
            .await?;
        tracing::info!(%id, email = %fields.email, "added faculty member");

        self.get_faculty(id).await
    }

    pub async fn update_faculty(&self, id: Uuid, input: &FacultyInput) -> Result<Faculty> {
        let valid = validate_faculty(input)?;

        if self.store.get_faculty(id).await?.is_none() {
            return Err(faculty_not_found());
        }

        if self.store.email_exists(&valid.email, Some(id)).await? {
            return Err(IqacError::Conflict(
                "Email already exists for another faculty member".to_string(),
            ));
        }

        let department_id = self.resolve_department(&valid.department).await?;
        let fields = FacultyFields {
            full_name: valid.full_name,
            email: valid.email,
            phone: valid.phone,
            hire_date: valid.hire_date,
            department_id,
        };
        if self.store.update_faculty(id, &fields).await? == 0 {
            return Err(faculty_not_found());
        }
        tracing::info!(%id, "updated faculty member");

        self.get_faculty(id).await
    }

    pub async fn delete_faculty(&self, id: Uuid) -> Result<Faculty> {
        let faculty = self.get_faculty(id).await?;

        let record_count = self.store.count_records(id).await?;
        if record_count > 0 {
            return Err(IqacError::Conflict(format!(
                "Cannot delete faculty member. {} has {} IQAC record(s). Delete the records first.",
                faculty.full_name, record_count
            )));
        }

        if self.store.delete_faculty(id).await? == 0 {
            return Err(faculty_not_found());
        }
        tracing::info!(%id, name = %faculty.full_name, "deleted faculty member");
        Ok(faculty)
    }

    pub async fn create_record(&self, input: &RecordInput) -> Result<CreatedRecord> {
        let (faculty_id, criterion, sub_criteria) = validate_record(input)?;

        if self.store.get_faculty(faculty_id).await?.is_none() {
            return Err(faculty_not_found());
        }

        let evidence = input.evidence.clone().unwrap_or_default();
        let comments = input.comments.clone().unwrap_or_default();
        let score = i32::from(scoring::score(&evidence, &comments));

        let record = NewActivityRecord {
            faculty_id,
            criteria_id: criterion.id(),
            sub_criteria,
            period: input
                .period
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            score,
            comments,
            evidence,
        };
        let record_id = self.store.create_activity_record(&record).await?;
        tracing::info!(%record_id, %faculty_id, criterion = criterion.code(), score, "added activity record");

        Ok(CreatedRecord {
            record_id,
            calculated_score: score,
            score_out_of_10: scoring::score_out_of_10(score),
        })
    }

    pub async fn delete_record(&self, id: Uuid, faculty_id: Option<Uuid>) -> Result<()> {
        if self.store.delete_activity_record(id, faculty_id).await? == 0 {
            return Err(IqacError::NotFound("Record not found".to_string()));
        }
        tracing::info!(%id, "deleted activity record");
        Ok(())
    }

    pub async fn list_records(&self, faculty_id: Option<Uuid>) -> Result<Vec<ActivityRecord>> {
        let records = self.store.list_activity_records(faculty_id).await?;
        Ok(records.into_iter().map(ActivityRecord::from).collect())
    }

    pub async fn list_stored_records(&self) -> Result<Vec<StoredRecord>> {
        self.store.list_activity_records(None).await
    }

    pub async fn faculty_summary(&self, id: Uuid) -> Result<FacultySummary> {
        let faculty = self.get_faculty(id).await?;
        let records = self.store.list_activity_records(Some(id)).await?;
        Ok(aggregate::faculty_summary(faculty, &records))
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let records = self.store.list_activity_records(None).await?;
        Ok(aggregate::leaderboard(&records, limit))
    }

    pub async fn performance_charts(&self) -> Result<PerformanceCharts> {
        let records = self.store.list_activity_records(None).await?;
        Ok(PerformanceCharts {
            bar_chart: aggregate::department_performance(&records),
            pie_chart: aggregate::criteria_distribution(&records),
        })
    }

    pub async fn faculty_stats(&self) -> Result<FacultyStats> {
        let faculty = self.store.list_faculty().await?;
        let records = self.store.list_activity_records(None).await?;
        Ok(aggregate::faculty_stats(&faculty, &records))
    }

    pub async fn diagnostics(&self) -> Result<TableCounts> {
        self.store.table_counts().await
    }
}
