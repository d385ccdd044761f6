//! Integration tests for booking creation with date-scoped slots

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use chrono::NaiveDate;
use common::Harness;
use pretty_assertions::assert_eq;
use repodesk_admin::mock::{Call, FixedConfirm, MockBackend, Notice, wire_page};
use repodesk_admin::{
    AdminContext, ApiClient, BookingForm, CommitStatus, ResourceListController, SlotRejection,
    SubmitOutcome,
};
use repodesk_core::{Booking, BookingSlot};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

fn slot(time: &str, available: bool) -> BookingSlot {
    BookingSlot {
        time: time.to_string(),
        available,
    }
}

/// 09:00 is free every day, 10:00 only on odd days
fn schedule() -> MockBackend {
    MockBackend::new().on_slots(|date| {
        let odd = date.format("%d").to_string().parse::<u32>().unwrap_or(0) % 2 == 1;
        Ok(vec![slot("09:00", true), slot("10:00", odd)])
    })
}

async fn slots_mock(server: &MockServer, date: &str, values: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/user/booking/slots"))
        .and(query_param("date", date))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"values": values}})))
        .mount(server)
        .await;
}

fn http_context(server: &MockServer, harness: &Harness) -> AdminContext {
    AdminContext::new(
        Arc::new(ApiClient::new(server.uri())),
        harness.notifier.clone(),
        Arc::new(FixedConfirm::new(true)),
    )
}

#[tokio::test]
async fn test_booking_against_http_backend() {
    let server = MockServer::start().await;
    slots_mock(
        &server,
        "2025-06-03",
        json!([{"time": "09:00", "available": true}, {"time": "10:00", "available": true}]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/user/booking/create"))
        .and(body_partial_json(json!({
            "appointment_for": "Quarterly review",
            "meeting_date": "2025-06-03",
            "meeting_time": "10:00",
            "booker_email": "ada@example.com"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": 42}})))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(MockBackend::new(), true);
    let mut form = BookingForm::new(http_context(&server, &harness));
    form.set_field("appointment_for", "Quarterly review").unwrap();
    form.set_field("booker_name", "Ada").unwrap();
    form.set_field("booker_email", "ada@example.com").unwrap();

    let pending = form.set_field("meeting_date", "2025-06-03").unwrap().unwrap();
    assert_eq!(form.settle_slots(pending).await, CommitStatus::Applied);
    form.select_time("10:00").unwrap();

    let outcome = form.submit().await;

    assert_eq!(outcome, SubmitOutcome::Saved(json!({"data": {"id": 42}})));
    assert_eq!(
        harness.notifier.notices(),
        vec![Notice::Success(
            "Appointment booked for 10:00 on 2025-06-03!".to_string()
        )]
    );
}

#[tokio::test]
async fn test_unavailable_slot_never_reaches_backend() {
    let server = MockServer::start().await;
    slots_mock(
        &server,
        "2025-06-04",
        json!([{"time": "09:00", "available": true}, {"time": "10:00", "available": false}]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/user/booking/create"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let harness = Harness::new(MockBackend::new(), true);
    let mut form = BookingForm::new(http_context(&server, &harness));
    let pending = form.set_date(Some(day(4))).unwrap();
    form.settle_slots(pending).await;

    assert_eq!(
        form.select_time("10:00"),
        Err(SlotRejection::Unavailable("10:00".to_string()))
    );
    assert_eq!(form.submit().await, SubmitOutcome::Invalid);
    assert_eq!(
        form.field_error("meeting_time"),
        Some("Please select a time slot.")
    );
    assert!(harness.notifier.notices().is_empty());
}

#[tokio::test]
async fn test_date_change_clears_time_until_new_slots_arrive() {
    let harness = Harness::new(schedule(), true);
    let mut form = BookingForm::new(harness.ctx.clone());
    let pending = form.set_date(Some(day(1))).unwrap();
    form.settle_slots(pending).await;
    form.select_time("10:00").unwrap();
    assert_eq!(form.draft().meeting_time, "10:00");

    let pending = form.set_date(Some(day(2))).unwrap();

    assert_eq!(form.draft().meeting_time, "");
    assert!(form.slots().slots().is_empty());
    assert!(form.slots().is_slots_loading());

    form.settle_slots(pending).await;
    assert_eq!(form.slots().slots(), &[slot("09:00", true), slot("10:00", false)]);
    assert!(form.select_time("10:00").is_err());
    assert!(form.select_time("09:00").is_ok());
}

#[tokio::test]
async fn test_slot_reply_for_abandoned_date_is_ignored() {
    let harness = Harness::new(schedule(), true);
    let mut form = BookingForm::new(harness.ctx.clone());

    let abandoned = form.set_date(Some(day(1))).unwrap();
    let current = form.set_date(Some(day(2))).unwrap();
    let (abandoned, current) = futures::join!(abandoned.run(), current.run());

    assert_eq!(form.commit_slots(current), CommitStatus::Applied);
    assert_eq!(form.commit_slots(abandoned), CommitStatus::Stale);
    assert_eq!(form.slots().date(), Some(day(2)));
    assert_eq!(form.slots().slots()[1], slot("10:00", false));

    let fetched: Vec<_> = harness
        .backend
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::FetchSlots { date } => Some(date),
            _ => None,
        })
        .collect();
    assert_eq!(fetched, vec![day(1), day(2)]);
}

#[tokio::test]
async fn test_slot_failure_offers_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/booking/slots"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let harness = Harness::new(MockBackend::new(), true);
    let mut form = BookingForm::new(http_context(&server, &harness));
    let pending = form.set_date(Some(day(5))).unwrap();

    assert_eq!(form.settle_slots(pending).await, CommitStatus::Failed);
    assert!(form.slots().slots().is_empty());
    assert_eq!(form.select_time("09:00"), Err(SlotRejection::NotLoaded));
    assert_eq!(
        harness.notifier.notices(),
        vec![Notice::Error("Failed to fetch available slots.".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn test_booking_then_refreshing_the_list() {
    let backend = schedule()
        .on_list(|_, query| {
            Ok(wire_page(
                vec![json!({"id": 7, "name": "Demo", "booker_name": "Ada", "startDateTime": "2025-06-03 09:00"})],
                query.page,
                1,
            ))
        })
        .with_list_delay(|_| Duration::from_millis(5));
    let harness = Harness::new(backend, true);
    let mut list = ResourceListController::<Booking>::new(harness.ctx.clone());
    let pending = list.mount();
    list.settle(pending).await;

    let mut form = BookingForm::new(harness.ctx.clone());
    let pending = form.set_date(Some(day(3))).unwrap();
    form.settle_slots(pending).await;
    form.select_time("09:00").unwrap();
    assert!(matches!(form.submit().await, SubmitOutcome::Saved(_)));

    let pending = list.notify_mutated();
    assert_eq!(list.settle(pending).await, CommitStatus::Applied);
    assert_eq!(list.query().epoch, 1);
    assert_eq!(list.items()[0].start_date_time.as_deref(), Some("2025-06-03 09:00"));
    assert!(!form.is_open());
}
