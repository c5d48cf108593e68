use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::criteria::{criteria_code, criteria_name};
use crate::scoring::score_out_of_10;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Faculty {
    #[serde(rename = "faculty_id")]
    pub id: Uuid,
    pub employee_id: String,
    #[serde(rename = "faculty_name")]
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
    #[serde(rename = "dept_name")]
    pub department: String,
    #[serde(rename = "iqac_record_count")]
    pub record_count: i64,
}

/// Faculty payload as submitted by the admin UI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacultyInput {
    pub faculty_name: Option<String>,
    pub dept_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub hire_date: Option<String>,
}

/// Validated faculty columns, ready for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct FacultyFields {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub department_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordInput {
    pub faculty_id: Option<Uuid>,
    pub criteria_id: Option<i32>,
    pub sub_criteria: Option<String>,
    pub period: Option<String>,
    pub evidence: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityRecord {
    pub faculty_id: Uuid,
    pub criteria_id: i32,
    pub sub_criteria: String,
    pub period: String,
    pub score: i32,
    pub comments: String,
    pub evidence: String,
}

/// An activity record joined with its faculty and department names.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: Uuid,
    pub faculty_id: Uuid,
    pub faculty_name: String,
    pub department: String,
    pub criteria_id: i32,
    pub sub_criteria: String,
    pub period: String,
    pub score: i32,
    pub evaluator_name: String,
    pub comments: String,
    pub evidence: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActivityRecord {
    #[serde(rename = "record_id")]
    pub id: Uuid,
    pub faculty_id: Uuid,
    pub faculty_name: String,
    pub department: String,
    pub criteria_id: i32,
    pub criteria_code: String,
    pub criteria_name: String,
    pub sub_criteria: String,
    pub period: String,
    pub score: i32,
    pub score_out_of_10: i32,
    pub evaluator_name: String,
    pub comments: String,
    pub evidence: String,
    #[serde(rename = "evaluation_date")]
    pub created_at: DateTime<Utc>,
}

impl From<StoredRecord> for ActivityRecord {
    fn from(record: StoredRecord) -> Self {
        ActivityRecord {
            criteria_code: criteria_code(record.criteria_id),
            criteria_name: criteria_name(record.criteria_id),
            score_out_of_10: score_out_of_10(record.score),
            id: record.id,
            faculty_id: record.faculty_id,
            faculty_name: record.faculty_name,
            department: record.department,
            criteria_id: record.criteria_id,
            sub_criteria: record.sub_criteria,
            period: record.period,
            score: record.score,
            evaluator_name: record.evaluator_name,
            comments: record.comments,
            evidence: record.evidence,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreatedRecord {
    pub record_id: Uuid,
    pub calculated_score: i32,
    pub score_out_of_10: i32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeaderboardEntry {
    pub faculty_id: Uuid,
    pub faculty_name: String,
    pub department: String,
    pub total_records: usize,
    pub avg_score: f64,
    pub score_out_of_10: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DepartmentPerformance {
    pub department: String,
    pub faculty_count: usize,
    pub avg_score: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CriteriaShare {
    pub criteria_id: i32,
    pub criteria_name: String,
    pub record_count: usize,
    pub avg_score: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PerformanceCharts {
    pub bar_chart: Vec<DepartmentPerformance>,
    pub pie_chart: Vec<CriteriaShare>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FacultyStats {
    pub total_faculty: usize,
    pub faculty_with_records: usize,
    pub total_records: usize,
    pub avg_score_all: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FacultySummary {
    pub faculty: Faculty,
    pub total_records: usize,
    pub avg_score: Option<f64>,
    pub criteria_covered: usize,
    pub records: Vec<ActivityRecord>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TableCounts {
    pub departments: i64,
    pub faculty: i64,
    pub activity_records: i64,
    pub faculty_with_records: i64,
}
