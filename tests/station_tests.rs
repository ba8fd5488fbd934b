//! Integration tests for the submit lifecycle.
//!
//! These drive `Station::submit` against `MockHttpClient` and check the batch,
//! the submission state, the capture feed and the notifications after every
//! kind of outcome.

use std::sync::Arc;

use parking_lot::Mutex;
use qrbatch::batch::CodeValue;
use qrbatch::capture::{CaptureControl, NullCapture};
use qrbatch::error::{QrBatchError, Result};
use qrbatch::http::{HttpResponse, MockHttpClient};
use qrbatch::station::{Station, SubmissionState};
use qrbatch::submit::{Notification, NotificationKind, Notifier, SubmitOutcome};

// =============================================================================
// Helper Functions
// =============================================================================

#[derive(Default)]
struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn seen(&self) -> Vec<Notification> {
        self.seen.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) -> Result<()> {
        self.seen.lock().push(notification.clone());
        Ok(())
    }
}

fn station_with(values: &[&str]) -> Station {
    let station = Station::new();
    station.add_if_absent(values.iter().filter_map(|v| CodeValue::new(*v)));
    station
}

fn response(status: u16, body: &str) -> Result<HttpResponse> {
    Ok(HttpResponse {
        status,
        body: body.to_string(),
    })
}

fn strings(station: &Station) -> Vec<String> {
    station
        .values()
        .into_iter()
        .map(CodeValue::into_inner)
        .collect()
}

// =============================================================================
// Outcomes
// =============================================================================

#[tokio::test]
async fn test_accepted_clears_batch_and_notifies_once() {
    let station = station_with(&["A", "B"]);
    let client = MockHttpClient::new();
    client.add_response(response(200, "ok"));
    let capture = NullCapture::new(true);
    let notifier = RecordingNotifier::default();

    let outcome = station
        .submit("http://h/send", &client, &capture, &notifier)
        .await;

    assert_eq!(
        outcome,
        Some(SubmitOutcome::Accepted {
            status: 200,
            body: "ok".to_string()
        })
    );
    assert_eq!(client.get_calls(), vec!["http://h/send?qr=A%2CB"]);
    assert!(station.is_empty());
    assert_eq!(station.submission_state(), SubmissionState::Idle);
    assert!(!capture.is_active());

    let seen = notifier.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].title, "Submit result");
    assert_eq!(seen[0].message, "Status: 200\n\nok");
    assert_eq!(seen[0].kind, NotificationKind::Success);
}

#[tokio::test]
async fn test_rejected_keeps_batch() {
    let station = station_with(&["A", "B"]);
    let client = MockHttpClient::new();
    client.add_response(response(500, "boom"));
    let notifier = RecordingNotifier::default();

    let outcome = station
        .submit("http://h/send", &client, &NullCapture::default(), &notifier)
        .await;

    assert_eq!(outcome.as_ref().and_then(SubmitOutcome::status), Some(500));
    assert_eq!(strings(&station), vec!["A", "B"]);
    assert_eq!(station.submission_state(), SubmissionState::Idle);

    let seen = notifier.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].message, "Status: 500\n\nboom");
    assert_eq!(seen[0].kind, NotificationKind::Warning);
}

#[tokio::test]
async fn test_transport_failure_keeps_batch() {
    let station = station_with(&["A"]);
    let client = MockHttpClient::new();
    client.add_response(Err(QrBatchError::Timeout(30)));
    let notifier = RecordingNotifier::default();

    let outcome = station
        .submit("http://h/send", &client, &NullCapture::default(), &notifier)
        .await;

    assert!(matches!(
        outcome,
        Some(SubmitOutcome::TransportFailed { .. })
    ));
    assert_eq!(strings(&station), vec!["A"]);
    assert_eq!(station.submission_state(), SubmissionState::Idle);

    let seen = notifier.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].title, "Submit error");
    assert_eq!(seen[0].kind, NotificationKind::Error);
}

#[tokio::test]
async fn test_failed_batch_can_be_resent() {
    let station = station_with(&["A", "B"]);
    let client = MockHttpClient::new();
    client.add_response(response(503, ""));
    client.add_response(response(200, ""));
    let notifier = RecordingNotifier::default();
    let capture = NullCapture::default();

    station
        .submit("http://h", &client, &capture, &notifier)
        .await;
    assert_eq!(station.len(), 2);

    station
        .submit("http://h", &client, &capture, &notifier)
        .await;
    assert!(station.is_empty());

    let calls = client.get_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
    assert_eq!(notifier.seen().len(), 2);
}

#[tokio::test]
async fn test_empty_batch_sends_nothing() {
    let station = Station::new();
    let client = MockHttpClient::new();
    let notifier = RecordingNotifier::default();

    let outcome = station
        .submit("http://h", &client, &NullCapture::default(), &notifier)
        .await;

    assert!(outcome.is_none());
    assert_eq!(client.call_count(), 0);
    assert!(notifier.seen().is_empty());
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_submit_while_in_flight_is_ignored() {
    let station = station_with(&["A"]);
    let client = Arc::new(MockHttpClient::new());
    let release = client.add_response_with_trigger(response(200, "ok"));
    let notifier = Arc::new(RecordingNotifier::default());

    let first = {
        let station = station.clone();
        let client = Arc::clone(&client);
        let notifier = Arc::clone(&notifier);
        tokio::spawn(async move {
            station
                .submit("http://h", client.as_ref(), &NullCapture::default(), notifier.as_ref())
                .await
        })
    };

    while client.in_flight_count() == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(station.submission_state(), SubmissionState::InFlight);

    let second = station
        .submit("http://h", client.as_ref(), &NullCapture::default(), notifier.as_ref())
        .await;
    assert!(second.is_none());
    assert_eq!(client.call_count(), 1);

    release.send(()).unwrap();
    let first = first.await.unwrap();

    assert!(matches!(first, Some(SubmitOutcome::Accepted { .. })));
    assert_eq!(client.call_count(), 1);
    assert_eq!(notifier.seen().len(), 1);
    assert_eq!(station.submission_state(), SubmissionState::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scans_during_flight_are_cleared_with_the_batch() {
    let station = station_with(&["A"]);
    let client = Arc::new(MockHttpClient::new());
    let release = client.add_response_with_trigger(response(200, ""));

    let task = {
        let station = station.clone();
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            station
                .submit("http://h", client.as_ref(), &NullCapture::default(), &RecordingNotifier::default())
                .await
        })
    };

    while client.in_flight_count() == 0 {
        tokio::task::yield_now().await;
    }
    station.add_if_absent(CodeValue::new("late"));
    assert_eq!(station.len(), 2);

    release.send(()).unwrap();
    task.await.unwrap();

    assert_eq!(client.get_calls(), vec!["http://h?qr=A"]);
    assert!(station.is_empty());
}

// =============================================================================
// Capture
// =============================================================================

struct FailingCapture;

impl CaptureControl for FailingCapture {
    fn set_active(&self, _active: bool) -> Result<()> {
        Err(QrBatchError::Capture(std::io::Error::other("no camera")))
    }

    fn is_active(&self) -> bool {
        false
    }
}

#[tokio::test]
async fn test_capture_failure_does_not_block_submit() {
    let station = station_with(&["A"]);
    let client = MockHttpClient::new();
    client.add_response(response(200, ""));

    let outcome = station
        .submit("http://h", &client, &FailingCapture, &RecordingNotifier::default())
        .await;

    assert!(matches!(outcome, Some(SubmitOutcome::Accepted { .. })));
    assert_eq!(client.call_count(), 1);
}
