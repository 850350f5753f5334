//! Integration tests for the service request aggregate and the execution strategy.
//!
//! These exercise the public domain surface the persistence and application
//! layers build on: identity assignment, record round trips, status changes
//! and retried units of work.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::Utc;
use common::{EntityId, RequestContext};
use domain::{CurrentStatus, DomainError, Entity, ExecutionStrategy, ServiceRequest};

mod service_request_lifecycle {
    use super::*;

    #[test]
    fn request_moves_from_created_to_complete() {
        let mut request = ServiceRequest::new("123", "Turn up the heat!", "Aaron");
        request.assign_id(EntityId::new()).unwrap();

        request.set_last_modified_by("Aaron Jaeger").unwrap();
        request.set_last_modified_date(Utc::now());
        request.set_current_status(CurrentStatus::InProgress).unwrap();
        request.set_current_status(CurrentStatus::Complete).unwrap();

        assert_eq!(request.current_status(), CurrentStatus::Complete);
        assert_eq!(request.created_by(), "Aaron");
        assert_eq!(request.last_modified_by(), Some("Aaron Jaeger"));
    }

    #[test]
    fn rehydrated_request_keeps_identity_and_fields() {
        let mut request = ServiceRequest::new("123", "Turn up the heat!", "Aaron");
        let id = EntityId::new();
        request.assign_id(id).unwrap();
        request.set_description("Now it's too hot!");

        let stored = request.to_record();
        let restored = ServiceRequest::from_record(stored.clone());

        assert_eq!(restored.id(), id);
        assert_eq!(restored.description(), "Now it's too hot!");
        assert_eq!(restored.to_record(), stored);
        assert!(restored == request);
    }

    #[test]
    fn rejected_changes_leave_request_untouched() {
        let mut request = ServiceRequest::new("123", "Turn up the heat!", "Aaron");
        let before = request.to_record();

        assert!(request.set_current_status(45_i32).is_err());
        assert!(request.set_last_modified_by("   ").is_err());
        request.set_building_code("");
        request.set_description(" ");

        assert_eq!(request.to_record(), before);
    }

    #[test]
    fn record_serializes_status_by_name() {
        let request = ServiceRequest::with_status("B1", "Leak", "Aaron", CurrentStatus::Canceled);

        let json = serde_json::to_value(request.to_record()).unwrap();

        assert_eq!(json["current_status"], "Canceled");
        assert_eq!(json["building_code"], "B1");
    }
}

mod execution_strategy {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn unit_of_work_is_replayed_until_it_succeeds() {
        let strategy = ExecutionStrategy::retrying(3, Duration::from_secs(1));
        let attempts = Arc::new(AtomicU32::new(0));
        let ctx = RequestContext::new();

        let result = strategy
            .execute(&ctx, || {
                let attempts = attempts.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(DomainError::Transient("deadlock detected".into()))
                    } else {
                        Ok("saved")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "saved");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn validation_failures_are_not_replayed() {
        let strategy = ExecutionStrategy::retrying(3, Duration::from_secs(1));
        let attempts = Arc::new(AtomicU32::new(0));
        let ctx = RequestContext::new();

        let result: Result<(), DomainError> = strategy
            .execute(&ctx, || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    let mut request = ServiceRequest::new("123", "Heat", "Aaron");
                    request.set_current_status(45_i32)
                }
            })
            .await;

        assert!(matches!(result, Err(DomainError::InvalidArgument { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
