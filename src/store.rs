use uuid::Uuid;

use crate::error::Result;
use crate::models::{Faculty, FacultyFields, NewActivityRecord, StoredRecord, TableCounts};

/// Persistence contract for departments, faculty and activity records.
///
/// Implementations report constraint violations (duplicate email, deleting a
/// faculty member that still owns records) as [`IqacError::Conflict`] so that
/// races past the service-level pre-checks still surface correctly.
///
/// [`IqacError::Conflict`]: crate::error::IqacError::Conflict
#[rocket::async_trait]
pub trait RecordStore: Send + Sync {
    /// Case-insensitive lookup.
    async fn find_department_by_name(&self, name: &str) -> Result<Option<Uuid>>;

    /// Returns the id of the department with this name, creating it if
    /// needed. Idempotent under concurrent callers.
    async fn ensure_department(&self, name: &str) -> Result<Uuid>;

    async fn email_exists(&self, email: &str, exclude: Option<Uuid>) -> Result<bool>;

    async fn create_faculty(&self, employee_id: &str, fields: &FacultyFields) -> Result<Uuid>;

    async fn update_faculty(&self, id: Uuid, fields: &FacultyFields) -> Result<u64>;

    async fn delete_faculty(&self, id: Uuid) -> Result<u64>;

    async fn get_faculty(&self, id: Uuid) -> Result<Option<Faculty>>;

    async fn list_faculty(&self) -> Result<Vec<Faculty>>;

    async fn count_records(&self, faculty_id: Uuid) -> Result<i64>;

    async fn create_activity_record(&self, record: &NewActivityRecord) -> Result<Uuid>;

    async fn delete_activity_record(&self, id: Uuid, faculty_id: Option<Uuid>) -> Result<u64>;

    async fn list_activity_records(&self, faculty_id: Option<Uuid>) -> Result<Vec<StoredRecord>>;

    async fn table_counts(&self) -> Result<TableCounts>;
}
