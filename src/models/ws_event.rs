//! WebSocket event types for real-time batch progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::batch::BatchStatus;
use super::execution::ExecutionStatus;

/// WebSocket event sent to connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
#[serde(rename_all = "snake_case")]
pub enum WsEvent {
    /// A new batch was dispatched.
    BatchCreated(BatchCreatedPayload),
    /// A pair resolved and the batch counters moved.
    BatchProgress(BatchProgressPayload),
    /// A batch reached a terminal status.
    BatchCompleted(BatchCompletedPayload),
    /// An execution received validator scores.
    ExecutionRecorded(ExecutionRecordedPayload),
    /// A report moved through the review workflow.
    ReportReviewUpdated(ReportReviewUpdatedPayload),
}

/// Payload for batch_created event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCreatedPayload {
    pub batch_id: Uuid,
    pub total_tests: i32,
    pub agent_count: i32,
    pub test_case_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Payload for batch_progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProgressPayload {
    pub batch_id: Uuid,
    pub status: BatchStatus,
    pub total_tests: i32,
    pub completed_tests: i32,
    pub successful_tests: i32,
    pub failed_tests: i32,
}

/// Payload for batch_completed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCompletedPayload {
    pub batch_id: Uuid,
    pub status: BatchStatus,
    pub successful_tests: i32,
    pub failed_tests: i32,
    pub completed_at: DateTime<Utc>,
}

/// Payload for execution_recorded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecordedPayload {
    pub execution_id: Uuid,
    pub agent_id: Uuid,
    pub test_case_id: Uuid,
    pub status: ExecutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<Uuid>,
}

/// Payload for report_review_updated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportReviewUpdatedPayload {
    pub report_id: Uuid,
    pub review_state: String,
    pub updated_at: DateTime<Utc>,
}

/// Wrapper that includes timestamp with every event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsEventMessage {
    #[serde(flatten)]
    pub event: WsEvent,
    pub timestamp: DateTime<Utc>,
}

impl WsEventMessage {
    /// Create a new event message with the current timestamp.
    pub fn new(event: WsEvent) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }
}

impl WsEvent {
    /// Create a batch_created event.
    pub fn batch_created(batch_id: Uuid, agent_count: i32, test_case_count: i32) -> Self {
        WsEvent::BatchCreated(BatchCreatedPayload {
            batch_id,
            total_tests: agent_count * test_case_count,
            agent_count,
            test_case_count,
            created_at: Utc::now(),
        })
    }

    /// Create a batch_progress event from current counters.
    pub fn batch_progress(
        batch_id: Uuid,
        status: BatchStatus,
        total: i32,
        completed: i32,
        successful: i32,
        failed: i32,
    ) -> Self {
        WsEvent::BatchProgress(BatchProgressPayload {
            batch_id,
            status,
            total_tests: total,
            completed_tests: completed,
            successful_tests: successful,
            failed_tests: failed,
        })
    }

    /// Create a batch_completed event.
    pub fn batch_completed(
        batch_id: Uuid,
        status: BatchStatus,
        successful: i32,
        failed: i32,
    ) -> Self {
        WsEvent::BatchCompleted(BatchCompletedPayload {
            batch_id,
            status,
            successful_tests: successful,
            failed_tests: failed,
            completed_at: Utc::now(),
        })
    }

    /// Create an execution_recorded event.
    pub fn execution_recorded(
        execution_id: Uuid,
        agent_id: Uuid,
        test_case_id: Uuid,
        status: ExecutionStatus,
        batch_id: Option<Uuid>,
    ) -> Self {
        WsEvent::ExecutionRecorded(ExecutionRecordedPayload {
            execution_id,
            agent_id,
            test_case_id,
            status,
            batch_id,
        })
    }

    /// Create a report_review_updated event.
    pub fn report_review_updated(report_id: Uuid, review_state: &str) -> Self {
        WsEvent::ReportReviewUpdated(ReportReviewUpdatedPayload {
            report_id,
            review_state: review_state.to_string(),
            updated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_created_total_is_cross_product() {
        let event = WsEvent::batch_created(Uuid::now_v7(), 2, 3);
        match event {
            WsEvent::BatchCreated(p) => assert_eq!(p.total_tests, 6),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let msg = WsEventMessage::new(WsEvent::batch_progress(
            Uuid::now_v7(),
            BatchStatus::Running,
            6,
            3,
            2,
            1,
        ));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "batch_progress");
        assert_eq!(json["payload"]["completed_tests"], 3);
        assert!(json["timestamp"].is_string());
    }
}
