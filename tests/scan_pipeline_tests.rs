//! Recognition events through the debouncer into a shared station.

use std::cell::Cell;
use std::time::Duration;

use qrbatch::batch::CodeValue;
use qrbatch::debounce::{
    Feedback, ManualClock, NoFeedback, RecognitionEvent, ScanDebouncer, ScanSink,
    DEFAULT_DEBOUNCE_WINDOW,
};
use qrbatch::station::Station;

#[derive(Default)]
struct CountingFeedback {
    pulses: Cell<usize>,
}

impl Feedback for CountingFeedback {
    fn pulse(&self) {
        self.pulses.set(self.pulses.get() + 1);
    }
}

fn setup() -> (ScanDebouncer<ManualClock>, ManualClock, Station) {
    let clock = ManualClock::new();
    let debouncer = ScanDebouncer::with_clock(DEFAULT_DEBOUNCE_WINDOW, clock.clone());
    (debouncer, clock, Station::new())
}

fn strings(station: &Station) -> Vec<String> {
    station
        .values()
        .into_iter()
        .map(CodeValue::into_inner)
        .collect()
}

#[test]
fn test_scan_session_accumulates_in_order() {
    let (mut debouncer, clock, mut station) = setup();
    let feedback = CountingFeedback::default();

    debouncer.on_event(&RecognitionEvent::new(["A"]), &mut station, &feedback);
    clock.advance(Duration::from_millis(150));
    debouncer.on_event(&RecognitionEvent::new(["A", "B"]), &mut station, &feedback);
    clock.advance(Duration::from_millis(150));
    debouncer.on_event(&RecognitionEvent::new(["C"]), &mut station, &feedback);

    assert_eq!(strings(&station), vec!["A", "B", "C"]);
    assert_eq!(feedback.pulses.get(), 3);
}

#[test]
fn test_event_inside_window_is_dropped() {
    let (mut debouncer, clock, mut station) = setup();

    debouncer.on_event(&RecognitionEvent::new(["A"]), &mut station, &NoFeedback);
    clock.advance(Duration::from_millis(50));
    let forwarded = debouncer.on_event(&RecognitionEvent::new(["B"]), &mut station, &NoFeedback);

    assert!(forwarded.is_empty());
    assert_eq!(strings(&station), vec!["A"]);

    // The dropped value is picked up on the next frame after the window
    clock.advance(Duration::from_millis(60));
    debouncer.on_event(&RecognitionEvent::new(["B"]), &mut station, &NoFeedback);
    assert_eq!(strings(&station), vec!["A", "B"]);
}

#[test]
fn test_rescanning_known_code_keeps_gate_open() {
    let (mut debouncer, clock, mut station) = setup();
    let feedback = CountingFeedback::default();

    debouncer.on_event(&RecognitionEvent::new(["A"]), &mut station, &feedback);
    clock.advance(DEFAULT_DEBOUNCE_WINDOW);

    for _ in 0..10 {
        debouncer.on_event(&RecognitionEvent::new(["A"]), &mut station, &feedback);
    }
    assert!(debouncer.is_accepting());

    // A new code right after the repeats is not held back
    debouncer.on_event(&RecognitionEvent::new(["B"]), &mut station, &feedback);
    assert_eq!(strings(&station), vec!["A", "B"]);
    assert_eq!(feedback.pulses.get(), 2);
}

#[test]
fn test_values_from_other_writers_are_not_rescanned() {
    let (mut debouncer, _clock, mut station) = setup();
    let other = station.clone();
    other.add_if_absent(CodeValue::new("A"));

    let forwarded = debouncer.on_event(&RecognitionEvent::new(["A"]), &mut station, &NoFeedback);

    assert!(forwarded.is_empty());
    assert_eq!(station.len(), 1);
    assert!(debouncer.is_accepting());
}

#[test]
fn test_cleared_value_can_be_scanned_again() {
    let (mut debouncer, clock, mut station) = setup();

    debouncer.on_event(&RecognitionEvent::new(["A"]), &mut station, &NoFeedback);
    station.clear();
    clock.advance(DEFAULT_DEBOUNCE_WINDOW);
    debouncer.on_event(&RecognitionEvent::new(["A"]), &mut station, &NoFeedback);

    assert_eq!(strings(&station), vec!["A"]);
}

#[test]
fn test_reset_after_restart_skips_pending_window() {
    let (mut debouncer, _clock, mut station) = setup();

    debouncer.on_event(&RecognitionEvent::new(["A"]), &mut station, &NoFeedback);
    assert!(!debouncer.is_accepting());

    debouncer.reset();
    debouncer.on_event(&RecognitionEvent::new(["B"]), &mut station, &NoFeedback);
    assert_eq!(strings(&station), vec!["A", "B"]);
}

/// Station handle where a second writer appends `raced` values between the
/// membership check and the append.
struct ContendedStation {
    station: Station,
    raced: Vec<&'static str>,
}

impl ScanSink for ContendedStation {
    fn contains(&self, value: &str) -> bool {
        self.station.contains(value)
    }

    fn accept(&mut self, values: Vec<CodeValue>) -> Vec<CodeValue> {
        let other = self.station.clone();
        other.add_if_absent(self.raced.iter().filter_map(|v| CodeValue::new(*v)));
        self.station.accept(values)
    }
}

#[test]
fn test_value_added_concurrently_is_not_counted_as_a_scan() {
    let (mut debouncer, _clock, station) = setup();
    let mut sink = ContendedStation {
        station,
        raced: vec!["A"],
    };
    let feedback = CountingFeedback::default();

    let forwarded = debouncer.on_event(&RecognitionEvent::new(["A"]), &mut sink, &feedback);

    assert!(forwarded.is_empty());
    assert_eq!(feedback.pulses.get(), 0);
    assert!(debouncer.is_accepting());
    assert_eq!(strings(&sink.station), vec!["A"]);
}

#[test]
fn test_partially_contended_event_forwards_only_appended() {
    let (mut debouncer, _clock, station) = setup();
    let mut sink = ContendedStation {
        station,
        raced: vec!["B"],
    };
    let feedback = CountingFeedback::default();

    let forwarded = debouncer.on_event(&RecognitionEvent::new(["A", "B", "C"]), &mut sink, &feedback);

    let forwarded: Vec<String> = forwarded.into_iter().map(CodeValue::into_inner).collect();
    assert_eq!(forwarded, vec!["A", "C"]);
    assert_eq!(feedback.pulses.get(), 1);
    assert!(!debouncer.is_accepting());
    assert_eq!(strings(&sink.station), vec!["B", "A", "C"]);
}
