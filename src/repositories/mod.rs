pub mod allocation_repository;
pub mod attendance_repository;
pub mod batch_repository;
pub mod candidate_directory;
pub mod interview_repository;
pub mod plan_repository;
pub mod scored_record_repository;

pub use allocation_repository::{AllocationListFilter, AllocationRepository};
pub use attendance_repository::AttendanceRepository;
pub use batch_repository::{BatchFilter, BatchRef, BatchRepository, BatchSortField, SortOrder};
pub use candidate_directory::{CandidateDirectory, CandidateProfile, CandidateRef};
pub use interview_repository::InterviewRepository;
pub use plan_repository::PlanRepository;
pub use scored_record_repository::ScoredRecordRepository;
