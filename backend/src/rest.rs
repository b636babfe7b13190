//! REST surface over the domain services.
//!
//! Handlers map the public DTOs in `shared` to domain commands, call the
//! synchronous services, and translate recoverable [`BookingError`]s into
//! structured error payloads. Conflict-shaped failures (taken slot,
//! rejected transition, subscription limit) come back as 409; malformed
//! domain input as 422.
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use shared::{
    AddLineRequest, AppointmentDto, AppointmentLineDto, BarberDto, BookAppointmentRequest,
    BreakRequest, CancelAppointmentRequest, CommissionReportDto, CommissionRowDto,
    DaySheetResponse, ErrorBody, ManualEntryRequest, ServiceDto, SlotDto, SlotStatus,
    SubscriptionWebhookRequest, TimeOffRequest, UpdateRevenuePoolRequest, UpdateScheduleRequest,
};

use crate::domain::availability_service::{DaySheet, SlotState};
use crate::domain::commands::appointments::{
    BookAppointmentCommand, CancelAppointmentCommand, CompleteAppointmentCommand,
    ConfirmAppointmentCommand,
};
use crate::domain::commands::barbers::{AddBreakCommand, AddTimeOffCommand, UpdateScheduleCommand};
use crate::domain::commands::commissions::{
    AddManualEntryCommand, CommissionReportQuery, DeleteManualEntryCommand,
    UpdateManualEntryCommand, UpsertRevenuePoolCommand,
};
use crate::domain::commands::line_items::{AddLineCommand, RemoveLineCommand};
use crate::domain::commands::scheduling::DaySheetQuery;
use crate::domain::commands::subscriptions::{
    ActivateSubscriptionCommand, DeactivateSubscriptionCommand,
};
use crate::domain::models::appointment::{Appointment, ClientRef};
use crate::domain::models::barber::{DaySchedule, TimeOffKind, WeeklySchedule};
use crate::domain::models::commission::BillingMonth;
use crate::domain::{
    AppointmentService, AvailabilityService, BarberService, BookingError, BookingPolicy,
    CommissionService, DayLockRegistry, LineItemService, SubscriptionService,
};
use crate::storage::csv::{CsvConnection, ServiceRepository};
use crate::storage::traits::ServiceStorage;

/// Application state shared across handlers: one instance of every
/// domain service, all built over the same connection and lock registry.
#[derive(Clone)]
pub struct AppState {
    pub availability_service: AvailabilityService,
    pub appointment_service: AppointmentService,
    pub line_item_service: LineItemService,
    pub commission_service: CommissionService,
    pub subscription_service: SubscriptionService,
    pub barber_service: BarberService,
    pub service_repository: ServiceRepository,
}

impl AppState {
    pub fn new(connection: Arc<CsvConnection>, policy: BookingPolicy) -> Self {
        let locks = DayLockRegistry::new();
        let subscription_service = SubscriptionService::new(connection.clone(), policy.clone());
        Self {
            availability_service: AvailabilityService::new(connection.clone(), policy.clone()),
            appointment_service: AppointmentService::new(
                connection.clone(),
                subscription_service.clone(),
                locks.clone(),
                policy.clone(),
            ),
            line_item_service: LineItemService::new(connection.clone(), locks),
            commission_service: CommissionService::new(connection.clone(), policy),
            subscription_service,
            barber_service: BarberService::new(connection.clone()),
            service_repository: ServiceRepository::new((*connection).clone()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/barbers", get(list_barbers))
        .route("/barbers/:barber_id/day-sheet", get(day_sheet))
        .route("/barbers/:barber_id/schedule", put(update_schedule))
        .route("/barbers/:barber_id/breaks", post(add_break))
        .route("/barbers/:barber_id/time-off", post(add_time_off))
        .route(
            "/barbers/:barber_id/time-off/:time_off_id",
            delete(cancel_time_off),
        )
        .route("/services", get(list_services))
        .route("/appointments", post(book_appointment))
        .route("/appointments/:appointment_id", get(get_appointment))
        .route("/appointments/:appointment_id/confirm", post(confirm_appointment))
        .route("/appointments/:appointment_id/cancel", post(cancel_appointment))
        .route("/appointments/:appointment_id/complete", post(complete_appointment))
        .route("/appointments/:appointment_id/lines", post(add_line))
        .route(
            "/appointments/:appointment_id/lines/:line_id",
            delete(remove_line),
        )
        .route("/commissions/:month", get(commission_report))
        .route("/commissions/:month/pool", put(update_revenue_pool))
        .route("/commissions/manual-entries", post(add_manual_entry))
        .route(
            "/commissions/manual-entries/:entry_id",
            put(update_manual_entry),
        )
        .route(
            "/commissions/manual-entries/:entry_id",
            delete(delete_manual_entry),
        )
        .route("/webhooks/subscription", post(subscription_webhook))
        .with_state(state)
}

// --- error and parse helpers ---

fn error_response(err: anyhow::Error) -> Response {
    match err.downcast::<BookingError>() {
        Ok(domain_error) => {
            let status = match &domain_error {
                BookingError::SlotUnavailable { .. }
                | BookingError::InvalidTransition { .. }
                | BookingError::SubscriptionLimitExceeded { .. }
                | BookingError::OriginalLineItemImmutable => StatusCode::CONFLICT,
                BookingError::InvalidRange | BookingError::DistributionInputInvalid { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            };
            let detail = match &domain_error {
                BookingError::SlotUnavailable {
                    reason,
                    conflict: Some(id),
                } => format!("{} (appointment {})", reason, id),
                other => other.to_string(),
            };
            let body = ErrorBody {
                error: domain_error.kind().to_string(),
                detail: Some(detail),
            };
            (status, Json(body)).into_response()
        }
        Err(other) => {
            let message = other.to_string();
            if message.contains("not found") {
                let body = ErrorBody {
                    error: "not_found".to_string(),
                    detail: Some(message),
                };
                return (StatusCode::NOT_FOUND, Json(body)).into_response();
            }
            error!("Unhandled error: {:?}", other);
            let body = ErrorBody {
                error: "internal".to_string(),
                detail: None,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

fn bad_request(detail: impl Into<String>) -> Response {
    let body = ErrorBody {
        error: "invalid_request".to_string(),
        detail: Some(detail.into()),
    };
    (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
}

fn parse_date(value: &str) -> Result<NaiveDate, Response> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| bad_request(format!("Invalid date: {}", value)))
}

fn parse_time(value: &str) -> Result<NaiveTime, Response> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| bad_request(format!("Invalid time: {}", value)))
}

fn parse_month(value: &str) -> Result<BillingMonth, Response> {
    BillingMonth::parse(value).map_err(|_| bad_request(format!("Invalid month: {}", value)))
}

// --- DTO mappers ---

fn day_sheet_response(sheet: DaySheet) -> DaySheetResponse {
    let slots = sheet
        .slots
        .into_iter()
        .map(|entry| {
            let (status, appointment_id, label) = match entry.state {
                SlotState::NonWorking => (SlotStatus::NonWorking, None, None),
                SlotState::Blocked => (SlotStatus::Blocked, None, None),
                SlotState::Break { label } => (SlotStatus::Break, None, Some(label)),
                SlotState::AppointmentStart { appointment_id } => {
                    (SlotStatus::Appointment, Some(appointment_id), None)
                }
                SlotState::Occupied => (SlotStatus::Occupied, None, None),
                SlotState::Available => (SlotStatus::Available, None, None),
            };
            SlotDto {
                time: entry.time.format("%H:%M").to_string(),
                status,
                appointment_id,
                label,
            }
        })
        .collect();
    DaySheetResponse {
        barber_id: sheet.barber_id,
        date: sheet.date.format("%Y-%m-%d").to_string(),
        slots,
    }
}

fn appointment_dto(appointment: Appointment, total_price: f64) -> AppointmentDto {
    let (client_id, guest_name, guest_phone) = match &appointment.client {
        ClientRef::Registered { client_id } => (Some(client_id.clone()), None, None),
        ClientRef::Guest { name, phone } => (None, Some(name.clone()), Some(phone.clone())),
    };
    AppointmentDto {
        id: appointment.id,
        barber_id: appointment.barber_id,
        service_id: appointment.service_id,
        client_id,
        guest_name,
        guest_phone,
        date: appointment.date.format("%Y-%m-%d").to_string(),
        start: appointment.start.format("%H:%M").to_string(),
        end: appointment.end.format("%H:%M").to_string(),
        status: appointment.status.as_str().to_string(),
        via_subscription: appointment.via_subscription,
        walk_in: appointment.walk_in,
        total_price,
    }
}

fn appointment_response(state: &AppState, appointment: Appointment, status: StatusCode) -> Response {
    match state.line_item_service.total_price(&appointment.id) {
        Ok(total) => (status, Json(appointment_dto(appointment, total))).into_response(),
        Err(e) => error_response(e),
    }
}

// --- barbers and day sheets ---

pub async fn list_barbers(State(state): State<AppState>) -> impl IntoResponse {
    match state.barber_service.list_barbers() {
        Ok(barbers) => {
            let dtos: Vec<BarberDto> = barbers
                .into_iter()
                .map(|b| BarberDto {
                    id: b.id,
                    name: b.name,
                    active: b.active,
                })
                .collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize, Debug)]
pub struct DaySheetParams {
    pub date: String,
}

pub async fn day_sheet(
    State(state): State<AppState>,
    Path(barber_id): Path<String>,
    Query(params): Query<DaySheetParams>,
) -> impl IntoResponse {
    info!("GET /barbers/{}/day-sheet - date: {}", barber_id, params.date);
    let date = match parse_date(&params.date) {
        Ok(date) => date,
        Err(response) => return response,
    };
    match state
        .availability_service
        .day_sheet(DaySheetQuery { barber_id, date })
    {
        Ok(sheet) => (StatusCode::OK, Json(day_sheet_response(sheet))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn update_schedule(
    State(state): State<AppState>,
    Path(barber_id): Path<String>,
    Json(request): Json<UpdateScheduleRequest>,
) -> impl IntoResponse {
    let mut days = Vec::with_capacity(request.days.len());
    for day in &request.days {
        let start = match parse_time(&day.start) {
            Ok(t) => t,
            Err(response) => return response,
        };
        let end = match parse_time(&day.end) {
            Ok(t) => t,
            Err(response) => return response,
        };
        days.push(DaySchedule {
            working: day.working,
            start,
            end,
        });
    }
    match state.barber_service.update_schedule(UpdateScheduleCommand {
        barber_id,
        schedule: WeeklySchedule { days },
    }) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn add_break(
    State(state): State<AppState>,
    Path(barber_id): Path<String>,
    Json(request): Json<BreakRequest>,
) -> impl IntoResponse {
    let weekday = match Weekday::try_from(request.weekday) {
        Ok(weekday) => weekday,
        Err(_) => return bad_request(format!("Invalid weekday: {}", request.weekday)),
    };
    let start = match parse_time(&request.start) {
        Ok(t) => t,
        Err(response) => return response,
    };
    let end = match parse_time(&request.end) {
        Ok(t) => t,
        Err(response) => return response,
    };
    match state.barber_service.add_break(AddBreakCommand {
        barber_id,
        break_window: crate::domain::models::barber::BreakWindow {
            weekday,
            start,
            end,
            label: request.label,
        },
    }) {
        Ok(_) => StatusCode::CREATED.into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn add_time_off(
    State(state): State<AppState>,
    Path(barber_id): Path<String>,
    Json(request): Json<TimeOffRequest>,
) -> impl IntoResponse {
    let starts_on = match parse_date(&request.starts_on) {
        Ok(d) => d,
        Err(response) => return response,
    };
    let ends_on = match parse_date(&request.ends_on) {
        Ok(d) => d,
        Err(response) => return response,
    };
    let kind = match TimeOffKind::parse(&request.kind) {
        Ok(kind) => kind,
        Err(_) => return bad_request(format!("Invalid time-off kind: {}", request.kind)),
    };
    match state.barber_service.add_time_off(AddTimeOffCommand {
        barber_id,
        starts_on,
        ends_on,
        kind,
    }) {
        Ok(time_off) => (StatusCode::CREATED, Json(time_off)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn cancel_time_off(
    State(state): State<AppState>,
    Path((barber_id, time_off_id)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.barber_service.cancel_time_off(&barber_id, &time_off_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

// --- service catalog ---

pub async fn list_services(State(state): State<AppState>) -> impl IntoResponse {
    match state.service_repository.list_services() {
        Ok(services) => {
            let dtos: Vec<ServiceDto> = services
                .into_iter()
                .map(|s| ServiceDto {
                    id: s.id,
                    name: s.name,
                    duration_minutes: s.duration_minutes,
                    price: s.price,
                    active: s.active,
                })
                .collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => error_response(e),
    }
}

// --- appointments ---

pub async fn book_appointment(
    State(state): State<AppState>,
    Json(request): Json<BookAppointmentRequest>,
) -> impl IntoResponse {
    info!(
        "POST /appointments - barber: {}, date: {}, start: {}",
        request.barber_id, request.date, request.start
    );
    let client = match (&request.client_id, &request.guest_name, &request.guest_phone) {
        (Some(client_id), None, None) => ClientRef::Registered {
            client_id: client_id.clone(),
        },
        (None, Some(name), Some(phone)) => ClientRef::Guest {
            name: name.clone(),
            phone: phone.clone(),
        },
        _ => return bad_request("Provide either client_id or guest_name plus guest_phone"),
    };
    let date = match parse_date(&request.date) {
        Ok(d) => d,
        Err(response) => return response,
    };
    let start = match parse_time(&request.start) {
        Ok(t) => t,
        Err(response) => return response,
    };
    match state.appointment_service.book(BookAppointmentCommand {
        client,
        barber_id: request.barber_id,
        service_id: request.service_id,
        date,
        start,
        via_subscription: request.via_subscription,
        walk_in: request.walk_in,
        now: None,
    }) {
        Ok(appointment) => appointment_response(&state, appointment, StatusCode::CREATED),
        Err(e) => error_response(e),
    }
}

pub async fn get_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<String>,
) -> impl IntoResponse {
    match state.appointment_service.get(&appointment_id) {
        Ok(Some(appointment)) => appointment_response(&state, appointment, StatusCode::OK),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: "not_found".to_string(),
                detail: Some(format!("Appointment {} not found", appointment_id)),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn confirm_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<String>,
) -> impl IntoResponse {
    match state
        .appointment_service
        .confirm(ConfirmAppointmentCommand { appointment_id })
    {
        Ok(appointment) => appointment_response(&state, appointment, StatusCode::OK),
        Err(e) => error_response(e),
    }
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<String>,
    Json(request): Json<CancelAppointmentRequest>,
) -> impl IntoResponse {
    match state.appointment_service.cancel(CancelAppointmentCommand {
        appointment_id,
        cancelled_by_client: request.cancelled_by_client,
        now: None,
    }) {
        Ok(appointment) => appointment_response(&state, appointment, StatusCode::OK),
        Err(e) => error_response(e),
    }
}

pub async fn complete_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<String>,
) -> impl IntoResponse {
    match state
        .appointment_service
        .complete(CompleteAppointmentCommand { appointment_id })
    {
        Ok(appointment) => appointment_response(&state, appointment, StatusCode::OK),
        Err(e) => error_response(e),
    }
}

// --- line items ---

pub async fn add_line(
    State(state): State<AppState>,
    Path(appointment_id): Path<String>,
    Json(request): Json<AddLineRequest>,
) -> impl IntoResponse {
    match state.line_item_service.add_line(AddLineCommand {
        appointment_id,
        service_id: request.service_id,
    }) {
        Ok(line) => (
            StatusCode::CREATED,
            Json(AppointmentLineDto {
                id: line.id,
                service_id: line.service_id,
                price_at_time: line.price_at_time,
                duration_minutes: line.duration_minutes,
                points: line.points,
                original: line.original,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn remove_line(
    State(state): State<AppState>,
    Path((appointment_id, line_id)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.line_item_service.remove_line(RemoveLineCommand {
        appointment_id,
        line_id,
    }) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

// --- commissions ---

pub async fn commission_report(
    State(state): State<AppState>,
    Path(month): Path<String>,
) -> impl IntoResponse {
    let month = match parse_month(&month) {
        Ok(month) => month,
        Err(response) => return response,
    };
    match state
        .commission_service
        .report(CommissionReportQuery { month })
    {
        Ok(report) => {
            let total_points = report.rows.iter().map(|r| r.points).sum();
            let rows = report
                .rows
                .into_iter()
                .map(|r| CommissionRowDto {
                    barber_id: r.barber_id,
                    barber_name: r.barber_name,
                    points: r.points,
                    completed_count: r.completed_count,
                    total_minutes: r.minutes,
                    automatic_amount: r.share_amount,
                    manual_amount: r.manual_amount,
                    total_amount: r.total_amount,
                })
                .collect();
            let dto = CommissionReportDto {
                month: report.month.to_string(),
                total_revenue: report.total_revenue,
                distributable: report.distributable,
                reserved: report.reserved,
                total_points,
                rows,
            };
            (StatusCode::OK, Json(dto)).into_response()
        }
        Err(e) => error_response(e),
    }
}

pub async fn update_revenue_pool(
    State(state): State<AppState>,
    Path(month): Path<String>,
    Json(request): Json<UpdateRevenuePoolRequest>,
) -> impl IntoResponse {
    let month = match parse_month(&month) {
        Ok(month) => month,
        Err(response) => return response,
    };
    match state.commission_service.upsert_pool(UpsertRevenuePoolCommand {
        month,
        total_revenue: request.total_revenue,
        distribution_percentage: request.distribution_percentage,
    }) {
        Ok(pool) => (StatusCode::OK, Json(pool)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn add_manual_entry(
    State(state): State<AppState>,
    Json(request): Json<ManualEntryRequest>,
) -> impl IntoResponse {
    let date = match parse_date(&request.date) {
        Ok(d) => d,
        Err(response) => return response,
    };
    match state.commission_service.add_manual_entry(AddManualEntryCommand {
        barber_id: request.barber_id,
        date,
        minutes: request.minutes,
        description: request.description,
        amount: request.amount,
    }) {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn update_manual_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
    Json(request): Json<ManualEntryRequest>,
) -> impl IntoResponse {
    let date = match parse_date(&request.date) {
        Ok(d) => d,
        Err(response) => return response,
    };
    match state
        .commission_service
        .update_manual_entry(UpdateManualEntryCommand {
            entry_id,
            date,
            minutes: request.minutes,
            description: request.description,
            amount: request.amount,
        }) {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn delete_manual_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> impl IntoResponse {
    match state
        .commission_service
        .delete_manual_entry(DeleteManualEntryCommand { entry_id })
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

// --- subscription webhook ---

pub async fn subscription_webhook(
    State(state): State<AppState>,
    Json(request): Json<SubscriptionWebhookRequest>,
) -> impl IntoResponse {
    info!(
        "POST /webhooks/subscription - event: {}, client: {}",
        request.event, request.client_id
    );
    match request.event.as_str() {
        "activated" => {
            let (plan_name, cuts_per_period) = match (request.plan_name, request.cuts_per_period) {
                (Some(plan_name), Some(cuts)) => (plan_name, cuts),
                _ => return bad_request("Activation requires plan_name and cuts_per_period"),
            };
            match state
                .subscription_service
                .activate(ActivateSubscriptionCommand {
                    client_id: request.client_id,
                    plan_name,
                    cuts_per_period,
                    preferred_barber_id: request.preferred_barber_id,
                }) {
                Ok(subscription) => (StatusCode::OK, Json(subscription)).into_response(),
                Err(e) => error_response(e),
            }
        }
        "cancelled" | "payment_failed" => {
            match state
                .subscription_service
                .deactivate(DeactivateSubscriptionCommand {
                    client_id: request.client_id,
                }) {
                Ok(subscription) => (StatusCode::OK, Json(subscription)).into_response(),
                Err(e) => error_response(e),
            }
        }
        other => {
            info!("Ignoring unhandled subscription event: {}", other);
            StatusCode::NO_CONTENT.into_response()
        }
    }
}
