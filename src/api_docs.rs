use utoipa::OpenApi;

use crate::entities::allocation::{AllocationState, AllocationStatus, StatusTransition};
use crate::entities::attendance::AttendanceStatus;
use crate::entities::batch::BatchStatus;
use crate::entities::batch_event::EventType;
use crate::entities::mock_interview::InterviewStatus;
use crate::entities::scored_record::RecordKind;
use crate::repositories::{BatchSortField, SortOrder};
use crate::routes::allocations::dto as allocation_dto;
use crate::routes::attendance::dto as attendance_dto;
use crate::routes::batches::dto as batch_dto;
use crate::routes::error::ErrorBody;
use crate::routes::health::route::HealthResponse;
use crate::routes::interviews::dto as interview_dto;
use crate::routes::schedule::dto as schedule_dto;
use crate::routes::scored_records::dto as scored_record_dto;
use crate::routes::{
    allocations, attendance, batches, health, interviews, maintenance, schedule, scored_records,
};
use crate::services::{BackfillReport, ErrorKind};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Training Service API",
        description = "Batch lifecycle, candidate allocation, schedule, attendance and evaluation records"
    ),
    paths(
        health::route::health,
        batches::route::create_batch,
        batches::route::list_batches,
        batches::route::get_batch,
        batches::route::update_batch,
        batches::route::extend_batch,
        batches::route::delete_batch,
        allocations::route::allocate,
        allocations::route::update_allocation,
        allocations::route::remove_allocation,
        allocations::route::list_eligible,
        allocations::route::list_by_batch,
        allocations::route::list_by_candidate,
        schedule::route::create_plan_entry,
        schedule::route::update_plan_entry,
        schedule::route::delete_plan_entry,
        schedule::route::get_full_plan,
        schedule::route::get_weekly_plan,
        schedule::route::create_event,
        schedule::route::get_events,
        schedule::route::delete_event,
        attendance::route::bulk_upsert_attendance,
        attendance::route::get_batch_attendance,
        attendance::route::get_candidate_attendance,
        scored_records::route::create_record,
        scored_records::route::bulk_upsert_records,
        scored_records::route::get_batch_records,
        scored_records::route::delete_records_by_name,
        interviews::route::create_interview,
        interviews::route::get_interview,
        interviews::route::update_interview,
        interviews::route::delete_interview,
        interviews::route::get_batch_interviews,
        interviews::route::get_candidate_interviews,
        maintenance::route::run_completion_backfill,
    ),
    components(schemas(
        ErrorBody,
        ErrorKind,
        HealthResponse,
        BackfillReport,
        BatchStatus,
        BatchSortField,
        SortOrder,
        AllocationStatus,
        AllocationState,
        StatusTransition,
        AttendanceStatus,
        EventType,
        RecordKind,
        InterviewStatus,
        batch_dto::CreateBatchRequest,
        batch_dto::UpdateBatchRequest,
        batch_dto::ExtendBatchRequest,
        batch_dto::BatchResponse,
        batch_dto::BatchExtensionResponse,
        batch_dto::BatchDetailResponse,
        batch_dto::BatchListResponse,
        allocation_dto::AllocateRequest,
        allocation_dto::UpdateAllocationRequest,
        allocation_dto::AllocationResponse,
        allocation_dto::EligibleCandidateResponse,
        schedule_dto::CreatePlanEntryRequest,
        schedule_dto::UpdatePlanEntryRequest,
        schedule_dto::PlanEntryResponse,
        schedule_dto::CreateEventRequest,
        schedule_dto::EventResponse,
        attendance_dto::AttendanceRecordRequest,
        attendance_dto::BulkAttendanceRequest,
        attendance_dto::AttendanceResponse,
        attendance_dto::PeriodSummary,
        attendance_dto::AttendanceEntryResponse,
        scored_record_dto::ScoredRecordRequest,
        scored_record_dto::BulkScoredRecordRequest,
        scored_record_dto::ScoredRecordResponse,
        scored_record_dto::DeleteByNameResponse,
        interview_dto::CreateInterviewRequest,
        interview_dto::UpdateInterviewRequest,
        interview_dto::InterviewResponse,
    )),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Batches", description = "Batch lifecycle and extensions"),
        (name = "Allocations", description = "Candidate allocation to batches"),
        (name = "Schedule", description = "Batch plan and calendar events"),
        (name = "Attendance", description = "Per-period attendance"),
        (name = "Scored records", description = "Assessments and assignments"),
        (name = "Interviews", description = "Mock interviews"),
        (name = "Maintenance", description = "Data repair tasks"),
    )
)]
pub struct ApiDoc;
