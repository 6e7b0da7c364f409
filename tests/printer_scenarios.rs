//! # Printer Scenarios
//!
//! End-to-end behaviour of the driver against in-memory hardware: paper
//! accounting, queue limits, the job pipeline and handshake timeouts.

use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use termica::TermicaError;
use termica::encoder::layout;
use termica::flow::{Clock, FlowControl, ManualClock, Polarity, SystemClock};
use termica::printer::{HandshakeSettings, PrinterSettings, ThermalPrinter};
use termica::protocol::status;
use termica::protocol::text::{Alignment, TextSize};
use termica::transport::{MemoryLine, MemoryTransport, ModemSignal};
use termica::usage::{FileStore, MemoryStore, UsageLedger};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn printer_with(
    settings: &PrinterSettings,
    transport: &MemoryTransport,
    store: MemoryStore,
) -> (ThermalPrinter, ManualClock) {
    let clock = ManualClock::new();
    let printer = ThermalPrinter::new(
        Box::new(transport.clone()),
        None,
        Box::new(store),
        Arc::new(clock.clone()),
        settings,
    );
    (printer, clock)
}

fn handshake_settings() -> PrinterSettings {
    PrinterSettings {
        handshake: Some(HandshakeSettings {
            line: ModemSignal::Cts,
            polarity: Polarity::ActiveLow,
            timeout_ms: 5000,
        }),
        ..Default::default()
    }
}

// ============================================================================
// USAGE LEDGER
// ============================================================================

#[test]
fn test_usage_is_monotonic() {
    let mut ledger = UsageLedger::in_memory();
    let mut last = ledger.usage_mm();
    for i in 0..200u32 {
        ledger.record(i % 37, i % 3, i % 5);
        let now = ledger.usage_mm();
        assert!(now >= last, "usage went from {} to {}", last, now);
        last = now;
    }
}

#[test]
fn test_usage_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let mut ledger = UsageLedger::new(Box::new(FileStore::open(dir.path()).unwrap()), 30000.0, 4.0);
    ledger.record(42, 3, 2);
    ledger.persist().unwrap();
    let saved = ledger.counters();

    let mut fresh = UsageLedger::new(Box::new(FileStore::open(dir.path()).unwrap()), 30000.0, 4.0);
    assert!(fresh.restore().unwrap());
    assert_eq!(fresh.counters(), saved);
    assert_eq!(fresh.usage_mm(), 20.0);
}

#[test]
fn test_setup_restores_usage() {
    let store = MemoryStore::new();
    let transport = MemoryTransport::with_paper();
    let settings = PrinterSettings::default();

    let (mut first, _) = printer_with(&settings, &transport, store.clone());
    first.print_text("a line").unwrap();
    first.feed(2).unwrap();
    first.encoder_mut().ledger_mut().persist().unwrap();

    let (mut second, _) = printer_with(&settings, &transport, store);
    assert_eq!(second.usage_mm(), 0.0);
    second.setup().unwrap();
    assert_eq!(second.usage_mm(), 12.0);
}

#[test]
fn test_reset_twice() {
    let (mut printer, _) = printer_with(
        &PrinterSettings::default(),
        &MemoryTransport::with_paper(),
        MemoryStore::new(),
    );
    printer.feed(4).unwrap();
    for _ in 0..2 {
        printer.reset_usage().unwrap();
        assert_eq!(printer.usage_mm(), 0.0);
        assert_eq!(printer.encoder().ledger().counters().feeds, 0);
    }
}

#[test]
fn test_paper_sufficiency_gate() {
    let mut ledger = UsageLedger::in_memory();
    ledger.record(0, 7498, 0);
    assert_eq!(ledger.usage_mm(), 29992.0);
    assert!(ledger.can_fit(2));
    assert!(!ledger.can_fit(3));

    // 10 mm left: 3 lines need 12, 2 lines need 8
    ledger.set_roll_length_mm(30002.0).unwrap();
    assert_eq!(ledger.remaining_mm(), 10.0);
    assert!(ledger.can_fit(2));
    assert!(!ledger.can_fit(3));
    assert!(matches!(
        ledger.check_fit(3),
        Err(TermicaError::InsufficientPaper { .. })
    ));
}

// ============================================================================
// LAYOUT
// ============================================================================

#[test]
fn test_two_column_fills_line() {
    let rows = layout::two_column("Coffee", "$3.50", TextSize::Small.columns(), '.');
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].chars().count(), 32);
    assert_eq!(rows[0], format!("Coffee{}$3.50", ".".repeat(32 - 6 - 5)));
}

// ============================================================================
// QUEUE
// ============================================================================

#[test]
fn test_queue_never_exceeds_capacity() {
    let settings = PrinterSettings {
        queue_capacity: 3,
        ..Default::default()
    };
    let (mut printer, _) = printer_with(&settings, &MemoryTransport::with_paper(), MemoryStore::new());

    let mut rejected = 0;
    for i in 0..10 {
        match printer.queue_feed(1, i) {
            Ok(_) => {}
            Err(TermicaError::QueueFull { capacity }) => {
                assert_eq!(capacity, 3);
                rejected += 1;
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
        assert!(printer.queue_len() <= 3);
    }
    assert_eq!(rejected, 7);
    assert_eq!(printer.queue_stats().dropped, 7);
}

#[test]
fn test_single_text_job_end_to_end() {
    let transport = MemoryTransport::with_paper();
    let (mut printer, _) = printer_with(&PrinterSettings::default(), &transport, MemoryStore::new());

    printer
        .queue_text("Hello", TextSize::Small, Alignment::Left, false, 0)
        .unwrap();
    assert_eq!(printer.queue_len(), 1);
    assert_eq!(printer.queue_stats().processed, 0);
    let chars_before = printer.encoder().ledger().counters().characters;

    assert!(printer.process_tick().unwrap());

    assert_eq!(printer.queue_len(), 0);
    assert_eq!(printer.queue_stats().processed, 1);
    assert!(printer.encoder().ledger().counters().characters >= chars_before + 5);
    assert!(transport.sent_contains(b"Hello\n"));
}

#[test]
fn test_jobs_are_spaced_and_ordered() {
    let transport = MemoryTransport::with_paper();
    let (mut printer, clock) =
        printer_with(&PrinterSettings::default(), &transport, MemoryStore::new());

    printer
        .queue_text("first", TextSize::Small, Alignment::Left, false, 0)
        .unwrap();
    printer
        .queue_text("second", TextSize::Small, Alignment::Left, false, 9)
        .unwrap();

    let start = clock.now();
    assert!(printer.flush_and_wait(Duration::from_secs(10)));
    assert!(clock.now() - start >= Duration::from_millis(2000));

    let sent = transport.sent();
    let find = |needle: &[u8]| sent.windows(needle.len()).position(|w| w == needle);
    assert!(find(b"first").unwrap() < find(b"second").unwrap());
}

#[test]
fn test_paper_observer_sees_transitions() {
    let transport = MemoryTransport::with_paper();
    let (mut printer, clock) =
        printer_with(&PrinterSettings::default(), &transport, MemoryStore::new());
    printer.setup().unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    printer.subscribe(Box::new(move |present| sink.lock().unwrap().push(present)));

    for present in [false, false, true] {
        transport.set_paper(present);
        clock.advance(Duration::from_secs(10));
        printer.tick();
    }
    assert_eq!(*seen.lock().unwrap(), vec![false, true]);
}

// ============================================================================
// HARDWARE HANDSHAKE
// ============================================================================

#[test]
fn test_handshake_timeout_does_not_hang() {
    let busy = MemoryLine::new(true);
    let mut gate = FlowControl::new(
        Box::new(MemoryTransport::new()),
        SystemClock::shared(),
        19200,
    )
    .with_handshake(Box::new(busy), Polarity::ActiveLow, Duration::from_secs(5));

    let start = Instant::now();
    assert!(!gate.wait_ready(Duration::from_millis(100)));
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(2), "waited {:?}", elapsed);
    assert_eq!(gate.timeouts(), 1);
}

#[test]
fn test_busy_line_still_sends() {
    let transport = MemoryTransport::new();
    let clock = ManualClock::new();
    let mut gate = FlowControl::new(Box::new(transport.clone()), Arc::new(clock), 19200)
        .with_handshake(
            Box::new(MemoryLine::new(true)),
            Polarity::ActiveLow,
            Duration::from_millis(50),
        );

    gate.send_all(b"ok").unwrap();
    assert_eq!(transport.sent(), b"ok".to_vec());
    assert_eq!(gate.timeouts(), 2);
}

#[test]
fn test_immediate_print_reports_cover_open() {
    let transport = MemoryTransport::with_paper();
    transport.respond_to(status::detailed_status_request(), 0x04);
    let mut printer = ThermalPrinter::new(
        Box::new(transport.clone()),
        Some(Box::new(MemoryLine::new(false))),
        Box::new(MemoryStore::new()),
        Arc::new(ManualClock::new()),
        &handshake_settings(),
    );

    assert!(matches!(
        printer.print_immediate("x", TextSize::Small, Alignment::Left, false),
        Err(TermicaError::CoverOpen)
    ));

    transport.respond_to(status::detailed_status_request(), 0x40);
    assert!(matches!(
        printer.print_immediate("x", TextSize::Small, Alignment::Left, false),
        Err(TermicaError::PrinterOffline)
    ));

    transport.respond_to(status::detailed_status_request(), 0x00);
    printer
        .print_immediate("ready", TextSize::Small, Alignment::Left, false)
        .unwrap();
    assert!(transport.sent_contains(b"ready\n"));
    assert_eq!(printer.encoder().gate().timeouts(), 0);
}

#[test]
fn test_immediate_print_without_status_answer() {
    let transport = MemoryTransport::with_paper();
    let mut printer = ThermalPrinter::new(
        Box::new(transport.clone()),
        Some(Box::new(MemoryLine::new(false))),
        Box::new(MemoryStore::new()),
        Arc::new(ManualClock::new()),
        &handshake_settings(),
    );

    printer
        .print_immediate("hello", TextSize::Small, Alignment::Left, false)
        .unwrap();
    assert!(transport.sent_contains(b"hello\n"));
    assert_eq!(printer.queue_stats().processed, 0);
}

#[test]
fn test_detailed_status_needs_answer_with_handshake() {
    let transport = MemoryTransport::with_paper();
    let mut printer = ThermalPrinter::new(
        Box::new(transport.clone()),
        Some(Box::new(MemoryLine::new(false))),
        Box::new(MemoryStore::new()),
        Arc::new(ManualClock::new()),
        &handshake_settings(),
    );
    assert!(matches!(
        printer.detailed_status(),
        Err(TermicaError::CommunicationError(_))
    ));

    transport.respond_to(status::detailed_status_request(), 0x08);
    let detailed = printer.detailed_status().unwrap();
    assert!(detailed.flags.cutter_error);
    assert!(detailed.flags.online);
    assert!(detailed.handshake_ready);
}
