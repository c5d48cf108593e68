//! JSON routes for the admin and self-service UIs.

use std::net::IpAddr;
use std::time::Instant;

use chrono::Utc;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::figment::Figment;
use rocket::http::{Header, Status};
use rocket::request::Request;
use rocket::response::status as rocket_status;
use rocket::response::Response;
use rocket::serde::json::{json, Json, Value};
use rocket::{Build, Rocket, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::LEADERBOARD_SIZE;
use crate::criteria::{all_criteria, CriterionInfo};
use crate::error::IqacError;
use crate::models::{
    ActivityRecord, CreatedRecord, Faculty, FacultyInput, FacultyStats, FacultySummary,
    LeaderboardEntry, PerformanceCharts, RecordInput, TableCounts,
};
use crate::scoring::{self, ScorePreview};
use crate::service::Service;

/// Logs one event per API call; server errors are raised to `warn`.
#[derive(Clone, Copy)]
pub struct AccessLog;

#[rocket::async_trait]
impl Fairing for AccessLog {
    fn info(&self) -> Info {
        Info {
            name: "IQAC access log",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _data: &mut rocket::Data<'_>) {
        request.local_cache(Instant::now);
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let elapsed_ms = request.local_cache(Instant::now).elapsed().as_millis();
        let route = request
            .route()
            .and_then(|route| route.name.as_deref())
            .unwrap_or("unmatched");
        let status = response.status().code;

        if status >= 500 {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri(),
                route,
                status,
                elapsed_ms,
                "api call failed"
            );
        } else {
            tracing::info!(
                method = %request.method(),
                path = %request.uri(),
                route,
                status,
                elapsed_ms,
                "api call"
            );
        }
    }
}

const CORS_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// The admin and self-service UIs are served from other origins.
#[derive(Clone, Copy)]
pub struct OpenCors;

#[rocket::async_trait]
impl Fairing for OpenCors {
    fn info(&self) -> Info {
        Info {
            name: "Open CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new("Access-Control-Allow-Methods", CORS_METHODS));
        response.set_header(Header::new("Access-Control-Allow-Headers", "Content-Type"));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    NotFound,
    BadRequest,
    Conflict,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorKind,
    pub message: String,
}

pub type ApiError = rocket_status::Custom<Json<ApiErrorBody>>;
pub type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(status: Status, kind: ApiErrorKind, message: impl Into<String>) -> ApiError {
    rocket_status::Custom(
        status,
        Json(ApiErrorBody {
            error: kind,
            message: message.into(),
        }),
    )
}

impl From<IqacError> for ApiError {
    fn from(err: IqacError) -> Self {
        match err {
            IqacError::Validation(message) => {
                api_error(Status::BadRequest, ApiErrorKind::BadRequest, message)
            }
            IqacError::Conflict(message) => {
                api_error(Status::Conflict, ApiErrorKind::Conflict, message)
            }
            IqacError::NotFound(message) => {
                api_error(Status::NotFound, ApiErrorKind::NotFound, message)
            }
            IqacError::Store(source) => {
                tracing::error!(error = %source, "record store query failed");
                api_error(
                    Status::InternalServerError,
                    ApiErrorKind::Internal,
                    "Database error",
                )
            }
        }
    }
}

/// Ids that do not parse cannot name an existing row.
fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| api_error(Status::NotFound, ApiErrorKind::NotFound, format!("{what} not found")))
}

#[get("/test")]
fn liveness() -> Value {
    json!({
        "message": "IQAC System API is working!",
        "timestamp": Utc::now().to_rfc3339(),
    })
}

#[get("/criteria")]
fn criteria() -> Json<Vec<CriterionInfo>> {
    Json(all_criteria())
}

#[get("/faculty")]
async fn list_faculty(service: &State<Service>) -> ApiResult<Vec<Faculty>> {
    let faculty = service.list_faculty().await?;
    tracing::debug!(count = faculty.len(), "listed faculty");
    Ok(Json(faculty))
}

#[get("/faculty/stats")]
async fn faculty_stats(service: &State<Service>) -> ApiResult<FacultyStats> {
    Ok(Json(service.faculty_stats().await?))
}

#[get("/faculty/<id>")]
async fn get_faculty(service: &State<Service>, id: &str) -> ApiResult<Faculty> {
    let id = parse_id(id, "Faculty member")?;
    Ok(Json(service.get_faculty(id).await?))
}

#[get("/faculty/<id>/summary")]
async fn faculty_summary(service: &State<Service>, id: &str) -> ApiResult<FacultySummary> {
    let id = parse_id(id, "Faculty member")?;
    Ok(Json(service.faculty_summary(id).await?))
}

#[post("/faculty", data = "<input>")]
async fn create_faculty(
    service: &State<Service>,
    input: Json<FacultyInput>,
) -> Result<rocket_status::Created<Json<Value>>, ApiError> {
    let faculty = service.create_faculty(&input).await?;
    let location = format!("/api/faculty/{}", faculty.id);
    Ok(rocket_status::Created::new(location).body(Json(json!({
        "message": "Faculty member added successfully!",
        "faculty": faculty,
    }))))
}

#[put("/faculty/<id>", data = "<input>")]
async fn update_faculty(
    service: &State<Service>,
    id: &str,
    input: Json<FacultyInput>,
) -> ApiResult<Value> {
    let id = parse_id(id, "Faculty member")?;
    let faculty = service.update_faculty(id, &input).await?;
    Ok(Json(json!({
        "message": "Faculty member updated successfully!",
        "faculty": faculty,
    })))
}

#[delete("/faculty/<id>")]
async fn delete_faculty(service: &State<Service>, id: &str) -> ApiResult<Value> {
    let id = parse_id(id, "Faculty member")?;
    let faculty = service.delete_faculty(id).await?;
    Ok(Json(json!({
        "message": "Faculty member deleted successfully!",
        "deleted_faculty": faculty.full_name,
    })))
}

#[get("/iqac")]
async fn list_records(service: &State<Service>) -> ApiResult<Vec<ActivityRecord>> {
    Ok(Json(service.list_records(None).await?))
}

#[get("/iqac/faculty/<faculty_id>")]
async fn faculty_records(
    service: &State<Service>,
    faculty_id: &str,
) -> ApiResult<Vec<ActivityRecord>> {
    let faculty_id = parse_id(faculty_id, "Faculty member")?;
    Ok(Json(service.list_records(Some(faculty_id)).await?))
}

#[post("/iqac", data = "<input>")]
async fn create_record(
    service: &State<Service>,
    input: Json<RecordInput>,
) -> Result<rocket_status::Created<Json<CreatedRecord>>, ApiError> {
    let created = service.create_record(&input).await?;
    let location = format!("/api/iqac/{}", created.record_id);
    Ok(rocket_status::Created::new(location).body(Json(created)))
}

#[delete("/iqac/<id>?<faculty_id>")]
async fn delete_record(
    service: &State<Service>,
    id: &str,
    faculty_id: Option<&str>,
) -> ApiResult<Value> {
    let id = parse_id(id, "Record")?;
    let faculty_id = match faculty_id.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => Some(parse_id(raw, "Record")?),
        None => None,
    };
    service.delete_record(id, faculty_id).await?;
    Ok(Json(json!({ "message": "Record deleted successfully!" })))
}

#[derive(Debug, Default, Deserialize)]
struct PreviewInput {
    #[serde(default)]
    evidence: String,
    #[serde(default)]
    comments: String,
}

#[post("/score/preview", data = "<input>")]
fn score_preview(input: Json<PreviewInput>) -> Json<ScorePreview> {
    Json(scoring::preview(&input.evidence, &input.comments))
}

#[get("/leaderboard")]
async fn leaderboard(service: &State<Service>) -> ApiResult<Vec<LeaderboardEntry>> {
    Ok(Json(service.leaderboard(LEADERBOARD_SIZE).await?))
}

#[get("/charts/performance")]
async fn performance_charts(service: &State<Service>) -> ApiResult<PerformanceCharts> {
    Ok(Json(service.performance_charts().await?))
}

#[get("/diagnostics")]
async fn diagnostics(service: &State<Service>) -> ApiResult<TableCounts> {
    Ok(Json(service.diagnostics().await?))
}

#[catch(400)]
fn bad_request() -> Json<ApiErrorBody> {
    Json(ApiErrorBody {
        error: ApiErrorKind::BadRequest,
        message: "The request body could not be understood.".to_string(),
    })
}

#[catch(404)]
fn not_found() -> Json<ApiErrorBody> {
    Json(ApiErrorBody {
        error: ApiErrorKind::NotFound,
        message: "The requested resource could not be found.".to_string(),
    })
}

#[catch(422)]
fn unprocessable() -> Json<ApiErrorBody> {
    Json(ApiErrorBody {
        error: ApiErrorKind::BadRequest,
        message: "The request body is not valid JSON for this endpoint.".to_string(),
    })
}

pub fn build(figment: Figment, service: Service) -> Rocket<Build> {
    rocket::custom(figment)
        .manage(service)
        .attach(AccessLog)
        .attach(OpenCors)
        .mount(
            "/api",
            routes![
                liveness,
                criteria,
                list_faculty,
                faculty_stats,
                get_faculty,
                faculty_summary,
                create_faculty,
                update_faculty,
                delete_faculty,
                list_records,
                faculty_records,
                create_record,
                delete_record,
                score_preview,
                leaderboard,
                performance_charts,
                diagnostics,
            ],
        )
        .register("/", catchers![bad_request, not_found, unprocessable])
}

pub async fn serve(service: Service, address: IpAddr, port: u16) -> anyhow::Result<()> {
    let figment = rocket::Config::figment()
        .merge(("address", address))
        .merge(("port", port));

    tracing::info!(%address, port, "starting IQAC API");
    if let Err(error) = build(figment, service).launch().await {
        anyhow::bail!("API server failed: {}", error.kind());
    }
    Ok(())
}
