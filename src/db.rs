use anyhow::Context;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::criteria::Criterion;
use crate::error::{IqacError, Result};
use crate::models::{
    Faculty, FacultyFields, FacultyInput, NewActivityRecord, StoredRecord, TableCounts,
};
use crate::scoring;
use crate::service::{generate_employee_id, validate_faculty, ValidFaculty};
use crate::store::RecordStore;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const FACULTY_SELECT: &str = "SELECT f.id, f.employee_id, f.full_name, f.email, f.phone, \
     f.hire_date, d.name AS department, COUNT(r.id) AS record_count \
     FROM iqac.faculty f \
     JOIN iqac.departments d ON d.id = f.department_id \
     LEFT JOIN iqac.activity_records r ON r.faculty_id = f.id";

fn faculty_from_row(row: &PgRow) -> std::result::Result<Faculty, sqlx::Error> {
    Ok(Faculty {
        id: row.try_get("id")?,
        employee_id: row.try_get("employee_id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        hire_date: row.try_get("hire_date")?,
        department: row.try_get("department")?,
        record_count: row.try_get("record_count")?,
    })
}

fn record_from_row(row: &PgRow) -> std::result::Result<StoredRecord, sqlx::Error> {
    Ok(StoredRecord {
        id: row.try_get("id")?,
        faculty_id: row.try_get("faculty_id")?,
        faculty_name: row.try_get("faculty_name")?,
        department: row.try_get("department")?,
        criteria_id: row.try_get("criteria_id")?,
        sub_criteria: row.try_get("sub_criteria")?,
        period: row.try_get("period")?,
        score: row.try_get("score")?,
        evaluator_name: row.try_get("evaluator_name")?,
        comments: row.try_get("comments")?,
        evidence: row.try_get("evidence")?,
        created_at: row.try_get("created_at")?,
    })
}

fn duplicate_email(err: sqlx::Error) -> IqacError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return IqacError::Conflict("Email already exists in the system".to_string());
        }
    }
    IqacError::Store(err)
}

fn records_still_attached(err: sqlx::Error) -> IqacError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_foreign_key_violation() {
            return IqacError::Conflict(
                "Cannot delete faculty member with existing IQAC records".to_string(),
            );
        }
    }
    IqacError::Store(err)
}

fn faculty_missing(err: sqlx::Error) -> IqacError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_foreign_key_violation() {
            return IqacError::NotFound("Faculty member not found".to_string());
        }
    }
    IqacError::Store(err)
}

#[rocket::async_trait]
impl RecordStore for PgStore {
    async fn find_department_by_name(&self, name: &str) -> Result<Option<Uuid>> {
        let row = sqlx::query("SELECT id FROM iqac.departments WHERE lower(name) = lower($1)")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(|row| row.try_get("id")).transpose()?)
    }

    async fn ensure_department(&self, name: &str) -> Result<Uuid> {
        let row = sqlx::query(
            r#"
            INSERT INTO iqac.departments AS d (id, name)
            VALUES ($1, $2)
            ON CONFLICT ((lower(name))) DO UPDATE SET name = d.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("id")?)
    }

    async fn email_exists(&self, email: &str, exclude: Option<Uuid>) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM iqac.faculty \
             WHERE lower(email) = lower($1) AND ($2::uuid IS NULL OR id <> $2)) AS taken",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("taken")?)
    }

    async fn create_faculty(&self, employee_id: &str, fields: &FacultyFields) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO iqac.faculty
            (id, employee_id, full_name, email, phone, hire_date, department_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(employee_id)
        .bind(&fields.full_name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(fields.hire_date)
        .bind(fields.department_id)
        .execute(&self.pool)
        .await
        .map_err(duplicate_email)?;
        Ok(id)
    }

    async fn update_faculty(&self, id: Uuid, fields: &FacultyFields) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE iqac.faculty
            SET full_name = $2, email = $3, phone = $4, hire_date = $5, department_id = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&fields.full_name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(fields.hire_date)
        .bind(fields.department_id)
        .execute(&self.pool)
        .await
        .map_err(duplicate_email)?;
        Ok(result.rows_affected())
    }

    async fn delete_faculty(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM iqac.faculty WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(records_still_attached)?;
        Ok(result.rows_affected())
    }

    async fn get_faculty(&self, id: Uuid) -> Result<Option<Faculty>> {
        let query = format!("{FACULTY_SELECT} WHERE f.id = $1 GROUP BY f.id, d.name");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(faculty_from_row).transpose()?)
    }

    async fn list_faculty(&self) -> Result<Vec<Faculty>> {
        let query = format!("{FACULTY_SELECT} GROUP BY f.id, d.name ORDER BY f.created_at, f.id");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        let mut faculty = Vec::with_capacity(rows.len());
        for row in &rows {
            faculty.push(faculty_from_row(row)?);
        }
        Ok(faculty)
    }

    async fn count_records(&self, faculty_id: Uuid) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS record_count FROM iqac.activity_records WHERE faculty_id = $1",
        )
        .bind(faculty_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("record_count")?)
    }

    async fn create_activity_record(&self, record: &NewActivityRecord) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO iqac.activity_records
            (id, faculty_id, criteria_id, sub_criteria, period, score, comments, evidence)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(record.faculty_id)
        .bind(record.criteria_id)
        .bind(&record.sub_criteria)
        .bind(&record.period)
        .bind(record.score)
        .bind(&record.comments)
        .bind(&record.evidence)
        .execute(&self.pool)
        .await
        .map_err(faculty_missing)?;
        Ok(id)
    }

    async fn delete_activity_record(&self, id: Uuid, faculty_id: Option<Uuid>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM iqac.activity_records \
             WHERE id = $1 AND ($2::uuid IS NULL OR faculty_id = $2)",
        )
        .bind(id)
        .bind(faculty_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn list_activity_records(&self, faculty_id: Option<Uuid>) -> Result<Vec<StoredRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.faculty_id, f.full_name AS faculty_name, d.name AS department,
                   r.criteria_id, r.sub_criteria, r.period, r.score, r.evaluator_name,
                   r.comments, r.evidence, r.created_at
            FROM iqac.activity_records r
            JOIN iqac.faculty f ON f.id = r.faculty_id
            JOIN iqac.departments d ON d.id = f.department_id
            WHERE ($1::uuid IS NULL OR r.faculty_id = $1)
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .bind(faculty_id)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(record_from_row(row)?);
        }
        Ok(records)
    }

    async fn table_counts(&self) -> Result<TableCounts> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM iqac.departments) AS departments,
                (SELECT COUNT(*) FROM iqac.faculty) AS faculty,
                (SELECT COUNT(*) FROM iqac.activity_records) AS activity_records,
                (SELECT COUNT(DISTINCT faculty_id) FROM iqac.activity_records) AS faculty_with_records
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(TableCounts {
            departments: row.try_get("departments")?,
            faculty: row.try_get("faculty")?,
            activity_records: row.try_get("activity_records")?,
            faculty_with_records: row.try_get("faculty_with_records")?,
        })
    }
}

async fn faculty_id_by_email(pool: &PgPool, email: &str) -> anyhow::Result<Option<Uuid>> {
    let row = sqlx::query("SELECT id FROM iqac.faculty WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| row.get("id")))
}

/// Existing faculty are matched by email and left untouched.
async fn find_or_create_faculty(store: &PgStore, faculty: &ValidFaculty) -> anyhow::Result<Uuid> {
    if let Some(id) = faculty_id_by_email(&store.pool, &faculty.email).await? {
        return Ok(id);
    }

    let department_id = store
        .ensure_department(&faculty.department)
        .await
        .with_context(|| format!("failed to upsert department {}", faculty.department))?;
    let fields = FacultyFields {
        full_name: faculty.full_name.clone(),
        email: faculty.email.clone(),
        phone: faculty.phone.clone(),
        hire_date: faculty.hire_date,
        department_id,
    };
    let id = store
        .create_faculty(&generate_employee_id(), &fields)
        .await
        .with_context(|| format!("failed to add faculty member {}", faculty.email))?;
    tracing::info!(%id, email = %faculty.email, "added faculty member");
    Ok(id)
}

struct KeyedRecord<'a> {
    source_key: &'a str,
    faculty_id: Uuid,
    criteria_id: i32,
    sub_criteria: &'a str,
    period: &'a str,
    evidence: &'a str,
    comments: &'a str,
}

async fn insert_keyed_record(pool: &PgPool, record: KeyedRecord<'_>) -> anyhow::Result<bool> {
    let score = scoring::score(record.evidence, record.comments);
    let result = sqlx::query(
        r#"
        INSERT INTO iqac.activity_records
        (id, faculty_id, criteria_id, sub_criteria, period, score, comments, evidence, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(record.faculty_id)
    .bind(record.criteria_id)
    .bind(record.sub_criteria)
    .bind(record.period)
    .bind(i32::from(score))
    .bind(record.comments)
    .bind(record.evidence)
    .bind(record.source_key)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

fn faculty_input(full_name: &str, email: &str, department: &str) -> FacultyInput {
    FacultyInput {
        faculty_name: Some(full_name.to_string()),
        dept_name: Some(department.to_string()),
        email: Some(email.to_string()),
        phone: None,
        hire_date: None,
    }
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let store = PgStore::new(pool.clone());
    let faculty = vec![
        ("Anita Rao", "anita.rao@college.edu", "Computer Science", Some("2015-07-01")),
        ("Vikram Nair", "vikram.nair@college.edu", "Physics", Some("2018-01-15")),
        ("Meera Iyer", "meera.iyer@college.edu", "Computer Science", None),
    ];

    for (name, email, department, hire_date) in faculty {
        let input = FacultyInput {
            hire_date: hire_date.map(str::to_string),
            ..faculty_input(name, email, department)
        };
        let valid = validate_faculty(&input).context("invalid seed faculty")?;
        find_or_create_faculty(&store, &valid).await?;
    }

    let records = vec![
        (
            "seed-001",
            "anita.rao@college.edu",
            Criterion::Research,
            "3.3.1",
            "Paper published in international journal",
            "",
        ),
        (
            "seed-002",
            "anita.rao@college.edu",
            Criterion::TeachingLearning,
            "2.3.1",
            "Conducted a faculty development workshop",
            "Positive student feedback collected",
        ),
        (
            "seed-003",
            "vikram.nair@college.edu",
            Criterion::Research,
            "3.2.2",
            "Patent filed for low-cost spectrometer",
            "",
        ),
        (
            "seed-004",
            "meera.iyer@college.edu",
            Criterion::StudentSupport,
            "5.1.3",
            "Mentored final-year students",
            "Career guidance sessions",
        ),
    ];

    for (source_key, email, criterion, sub_criteria, evidence, comments) in records {
        let faculty_id = faculty_id_by_email(pool, email)
            .await?
            .with_context(|| format!("seed faculty {email} is missing"))?;

        insert_keyed_record(
            pool,
            KeyedRecord {
                source_key,
                faculty_id,
                criteria_id: criterion.id(),
                sub_criteria,
                period: "2024-S1",
                evidence,
                comments,
            },
        )
        .await?;
    }

    Ok(())
}

#[derive(Debug, Clone, serde::Deserialize)]
struct CsvRow {
    full_name: String,
    email: String,
    department: String,
    criteria_id: i32,
    sub_criteria: String,
    #[serde(default)]
    period: String,
    #[serde(default)]
    evidence: String,
    #[serde(default)]
    comments: String,
    source_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct ImportRow {
    faculty: ValidFaculty,
    criterion: Criterion,
    sub_criteria: String,
    period: String,
    evidence: String,
    comments: String,
    source_key: Option<String>,
}

fn validate_import_row(row: &CsvRow) -> Result<ImportRow> {
    let faculty = validate_faculty(&faculty_input(&row.full_name, &row.email, &row.department))?;

    let criterion = Criterion::from_id(row.criteria_id)
        .ok_or_else(|| IqacError::Validation(format!("Unknown criteria id {}", row.criteria_id)))?;

    let sub_criteria = row.sub_criteria.trim();
    if sub_criteria.is_empty() {
        return Err(IqacError::Validation("Missing required fields".to_string()));
    }

    Ok(ImportRow {
        faculty,
        criterion,
        sub_criteria: sub_criteria.to_string(),
        period: row.period.trim().to_string(),
        evidence: row.evidence.clone(),
        comments: row.comments.clone(),
        source_key: row
            .source_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string),
    })
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let store = PgStore::new(pool.clone());
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("malformed CSV row at line {line}"))?;
        let row = match validate_import_row(&row) {
            Ok(row) => row,
            Err(err) => {
                tracing::warn!(line, error = %err, "skipping invalid row");
                continue;
            }
        };

        let faculty_id = find_or_create_faculty(&store, &row.faculty).await?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let added = insert_keyed_record(
            pool,
            KeyedRecord {
                source_key: &source_key,
                faculty_id,
                criteria_id: row.criterion.id(),
                sub_criteria: &row.sub_criteria,
                period: &row.period,
                evidence: &row.evidence,
                comments: &row.comments,
            },
        )
        .await?;

        if added {
            inserted += 1;
        }
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlx::error::{DatabaseError, ErrorKind};

    fn csv_row(full_name: &str, email: &str, department: &str) -> CsvRow {
        CsvRow {
            full_name: full_name.to_string(),
            email: email.to_string(),
            department: department.to_string(),
            criteria_id: 3,
            sub_criteria: "3.3.1".to_string(),
            period: " 2024-S1 ".to_string(),
            evidence: "Paper published".to_string(),
            comments: String::new(),
            source_key: Some("  ".to_string()),
        }
    }

    #[test]
    fn import_row_is_trimmed_and_validated() {
        let row = validate_import_row(&csv_row(" Anita Rao ", "anita.rao@college.edu", " Physics "))
            .unwrap();

        assert_eq!(row.faculty.full_name, "Anita Rao");
        assert_eq!(row.faculty.department, "Physics");
        assert_eq!(row.criterion, Criterion::Research);
        assert_eq!(row.period, "2024-S1");
        assert_eq!(row.source_key, None);
    }

    #[test]
    fn import_rejects_rows_the_api_would_reject() {
        let blank_everything = csv_row("", "x", "");
        let bad_email = csv_row("Anita Rao", "x", "Physics");
        let blank_department = csv_row("Anita Rao", "anita.rao@college.edu", "  ");
        let blank_sub_criteria = CsvRow {
            sub_criteria: " ".to_string(),
            ..csv_row("Anita Rao", "anita.rao@college.edu", "Physics")
        };
        let unknown_criterion = CsvRow {
            criteria_id: 9,
            ..csv_row("Anita Rao", "anita.rao@college.edu", "Physics")
        };

        for row in [
            blank_everything,
            bad_email,
            blank_department,
            blank_sub_criteria,
            unknown_criterion,
        ] {
            assert!(
                matches!(validate_import_row(&row), Err(IqacError::Validation(_))),
                "accepted {row:?}"
            );
        }
    }

    #[derive(Debug)]
    struct ConstraintError {
        foreign_key: bool,
    }

    impl std::fmt::Display for ConstraintError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("constraint violated")
        }
    }

    impl std::error::Error for ConstraintError {}

    impl DatabaseError for ConstraintError {
        fn message(&self) -> &str {
            "constraint violated"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.foreign_key {
                ErrorKind::ForeignKeyViolation
            } else {
                ErrorKind::UniqueViolation
            }
        }
    }

    fn constraint(foreign_key: bool) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ConstraintError { foreign_key }))
    }

    #[test]
    fn record_insert_for_vanished_faculty_is_not_found() {
        assert!(matches!(faculty_missing(constraint(true)), IqacError::NotFound(_)));
        assert!(matches!(faculty_missing(constraint(false)), IqacError::Store(_)));
        assert!(matches!(
            faculty_missing(sqlx::Error::RowNotFound),
            IqacError::Store(_)
        ));
    }

    #[test]
    fn constraint_violations_become_conflicts() {
        assert!(matches!(duplicate_email(constraint(false)), IqacError::Conflict(_)));
        assert!(matches!(records_still_attached(constraint(true)), IqacError::Conflict(_)));
        assert!(matches!(
            records_still_attached(sqlx::Error::RowNotFound),
            IqacError::Store(_)
        ));
    }
}
