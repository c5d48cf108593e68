//! In-memory [`RecordStore`] for service and HTTP tests.

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::aggregate::sort_newest_first;
use crate::error::{IqacError, Result};
use crate::models::{Faculty, FacultyFields, NewActivityRecord, StoredRecord, TableCounts};
use crate::store::RecordStore;

struct DepartmentRow {
    id: Uuid,
    name: String,
}

struct FacultyRow {
    id: Uuid,
    employee_id: String,
    full_name: String,
    email: String,
    phone: Option<String>,
    hire_date: Option<NaiveDate>,
    department_id: Uuid,
}

struct RecordRow {
    id: Uuid,
    record: NewActivityRecord,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    departments: Vec<DepartmentRow>,
    faculty: Vec<FacultyRow>,
    records: Vec<RecordRow>,
}

impl Tables {
    fn department_name(&self, id: Uuid) -> String {
        self.departments
            .iter()
            .find(|department| department.id == id)
            .map(|department| department.name.clone())
            .unwrap_or_default()
    }

    fn to_faculty(&self, row: &FacultyRow) -> Faculty {
        Faculty {
            id: row.id,
            employee_id: row.employee_id.clone(),
            full_name: row.full_name.clone(),
            email: row.email.clone(),
            phone: row.phone.clone(),
            hire_date: row.hire_date,
            department: self.department_name(row.department_id),
            record_count: self
                .records
                .iter()
                .filter(|record| record.record.faculty_id == row.id)
                .count() as i64,
        }
    }

    fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> bool {
        self.faculty
            .iter()
            .any(|row| row.email.eq_ignore_ascii_case(email) && Some(row.id) != exclude)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store lock poisoned")
    }

    pub fn department_names(&self) -> Vec<String> {
        self.tables()
            .departments
            .iter()
            .map(|department| department.name.clone())
            .collect()
    }
}

fn duplicate_email() -> IqacError {
    IqacError::Conflict("Email already exists in the system".to_string())
}

#[rocket::async_trait]
impl RecordStore for MemoryStore {
    async fn find_department_by_name(&self, name: &str) -> Result<Option<Uuid>> {
        let needle = name.to_lowercase();
        Ok(self
            .tables()
            .departments
            .iter()
            .find(|department| department.name.to_lowercase() == needle)
            .map(|department| department.id))
    }

    async fn ensure_department(&self, name: &str) -> Result<Uuid> {
        let needle = name.to_lowercase();
        let mut tables = self.tables();
        if let Some(existing) = tables
            .departments
            .iter()
            .find(|department| department.name.to_lowercase() == needle)
        {
            return Ok(existing.id);
        }
        let id = Uuid::new_v4();
        tables.departments.push(DepartmentRow {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    async fn email_exists(&self, email: &str, exclude: Option<Uuid>) -> Result<bool> {
        Ok(self.tables().email_taken(email, exclude))
    }

    async fn create_faculty(&self, employee_id: &str, fields: &FacultyFields) -> Result<Uuid> {
        let mut tables = self.tables();
        if tables.email_taken(&fields.email, None) {
            return Err(duplicate_email());
        }
        let id = Uuid::new_v4();
        tables.faculty.push(FacultyRow {
            id,
            employee_id: employee_id.to_string(),
            full_name: fields.full_name.clone(),
            email: fields.email.clone(),
            phone: fields.phone.clone(),
            hire_date: fields.hire_date,
            department_id: fields.department_id,
        });
        Ok(id)
    }

    async fn update_faculty(&self, id: Uuid, fields: &FacultyFields) -> Result<u64> {
        let mut tables = self.tables();
        if tables.email_taken(&fields.email, Some(id)) {
            return Err(duplicate_email());
        }
        let Some(row) = tables.faculty.iter_mut().find(|row| row.id == id) else {
            return Ok(0);
        };
        row.full_name = fields.full_name.clone();
        row.email = fields.email.clone();
        row.phone = fields.phone.clone();
        row.hire_date = fields.hire_date;
        row.department_id = fields.department_id;
        Ok(1)
    }

    async fn delete_faculty(&self, id: Uuid) -> Result<u64> {
        let mut tables = self.tables();
        if tables.records.iter().any(|record| record.record.faculty_id == id) {
            return Err(IqacError::Conflict(
                "Cannot delete faculty member with existing IQAC records".to_string(),
            ));
        }
        let before = tables.faculty.len();
        tables.faculty.retain(|row| row.id != id);
        Ok((before - tables.faculty.len()) as u64)
    }

    async fn get_faculty(&self, id: Uuid) -> Result<Option<Faculty>> {
        let tables = self.tables();
        Ok(tables
            .faculty
            .iter()
            .find(|row| row.id == id)
            .map(|row| tables.to_faculty(row)))
    }

    async fn list_faculty(&self) -> Result<Vec<Faculty>> {
        let tables = self.tables();
        Ok(tables.faculty.iter().map(|row| tables.to_faculty(row)).collect())
    }

    async fn count_records(&self, faculty_id: Uuid) -> Result<i64> {
        Ok(self
            .tables()
            .records
            .iter()
            .filter(|record| record.record.faculty_id == faculty_id)
            .count() as i64)
    }

    async fn create_activity_record(&self, record: &NewActivityRecord) -> Result<Uuid> {
        let mut tables = self.tables();
        if !tables.faculty.iter().any(|row| row.id == record.faculty_id) {
            return Err(IqacError::NotFound("Faculty member not found".to_string()));
        }
        let id = Uuid::new_v4();
        tables.records.push(RecordRow {
            id,
            record: record.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn delete_activity_record(&self, id: Uuid, faculty_id: Option<Uuid>) -> Result<u64> {
        let mut tables = self.tables();
        let before = tables.records.len();
        tables.records.retain(|row| {
            !(row.id == id && faculty_id.map_or(true, |owner| owner == row.record.faculty_id))
        });
        Ok((before - tables.records.len()) as u64)
    }

    async fn list_activity_records(&self, faculty_id: Option<Uuid>) -> Result<Vec<StoredRecord>> {
        let tables = self.tables();
        let mut records: Vec<StoredRecord> = tables
            .records
            .iter()
            .filter(|row| faculty_id.map_or(true, |owner| owner == row.record.faculty_id))
            .filter_map(|row| {
                let owner = tables
                    .faculty
                    .iter()
                    .find(|faculty| faculty.id == row.record.faculty_id)?;
                Some(StoredRecord {
                    id: row.id,
                    faculty_id: owner.id,
                    faculty_name: owner.full_name.clone(),
                    department: tables.department_name(owner.department_id),
                    criteria_id: row.record.criteria_id,
                    sub_criteria: row.record.sub_criteria.clone(),
                    period: row.record.period.clone(),
                    score: row.record.score,
                    evaluator_name: "Self-Assessment".to_string(),
                    comments: row.record.comments.clone(),
                    evidence: row.record.evidence.clone(),
                    created_at: row.created_at,
                })
            })
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn table_counts(&self) -> Result<TableCounts> {
        let tables = self.tables();
        let mut owners: Vec<Uuid> = tables
            .records
            .iter()
            .map(|record| record.record.faculty_id)
            .collect();
        owners.sort();
        owners.dedup();
        Ok(TableCounts {
            departments: tables.departments.len() as i64,
            faculty: tables.faculty.len() as i64,
            activity_records: tables.records.len() as i64,
            faculty_with_records: owners.len() as i64,
        })
    }
}
