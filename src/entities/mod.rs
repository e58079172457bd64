pub mod allocation;
pub mod attendance;
pub mod batch;
pub mod batch_event;
pub mod batch_extension;
pub mod batch_plan;
pub mod candidate;
pub mod counseling_record;
pub mod mock_interview;
pub mod scored_record;
