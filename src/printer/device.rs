//! # Thermal Printer
//!
//! The facade everything outside the crate talks to. It owns the encoder
//! (and through it the gate and the usage ledger), the job queue and the
//! status monitor.
//!
//! ## Driving It
//!
//! ```text
//! setup()  once, after construction
//! tick()   repeatedly: runs at most one queued job, then polls paper status
//! ```
//!
//! Synchronous operations (`print_text`, `feed`, `print_qr_code`, ...) go
//! straight to the encoder and return when the printer is expected to be
//! done. Queued operations (`queue_*`) return immediately with a job id.
//!
//! ## Exclusive Access
//!
//! Every operation takes `&mut self`. A host with several threads must put
//! the printer behind a mutex (the HTTP server does); the busy flag only
//! keeps `print_immediate` from cutting into a queued job that is running.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::PrinterSettings;
use super::monitor::{PaperObserver, StatusMonitor};
use crate::encoder::{self, Encoder, HeatConfig, StyleChange};
use crate::error::TermicaError;
use crate::flow::{FlowControl, SharedClock, SystemClock};
use crate::protocol::barcode::barcode1d::BarcodeType;
use crate::protocol::barcode::qr::QrErrorLevel;
use crate::protocol::status::DeviceFlags;
use crate::protocol::text::{Alignment, Rotation, TextSize};
use crate::queue::{JobKind, JobQueue, PrintJob, QueueStats};
use crate::transport::{ByteTransport, HandshakeLine, SerialTransport};
use crate::usage::{self, FileStore, MemoryStore, UsageLedger, UsageReport, UsageStore};

const POWER_ON_SETTLE: Duration = Duration::from_millis(1000);
const PAPER_WARNING_INTERVAL: Duration = Duration::from_secs(30);
const FLUSH_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Coarse device state derived from what the driver knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Asleep,
    Idle,
    Busy,
    Offline,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub length: usize,
    pub capacity: usize,
    pub inter_job_delay_ms: u64,
    pub auto_process: bool,
    #[serde(flatten)]
    pub stats: QueueStats,
    pub average_job_ms: f64,
}

/// Snapshot of driver state. Built without talking to the printer.
#[derive(Debug, Clone, Serialize)]
pub struct PrinterStatus {
    pub state: DeviceState,
    pub paper_present: bool,
    pub handshake_enabled: bool,
    pub handshake_timeouts: u32,
    pub bytes_sent: u64,
    pub queue: QueueStatus,
    pub usage: UsageReport,
}

/// Live status read from the printer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DetailedStatus {
    pub paper_present: bool,
    #[serde(flatten)]
    pub flags: DeviceFlags,
    pub handshake_ready: bool,
    pub handshake_timeouts: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PerformanceStats {
    pub uptime_minutes: u64,
    pub chars_per_minute: f32,
    pub lines_per_minute: f32,
    pub chars_per_mm: f32,
    pub jobs_processed: u32,
    pub jobs_dropped: u32,
    pub average_job_ms: f64,
}

/// # Thermal Printer Driver
///
/// ## Example
///
/// ```
/// use termica::flow::ManualClock;
/// use termica::printer::{PrinterSettings, ThermalPrinter};
/// use termica::transport::MemoryTransport;
/// use termica::usage::MemoryStore;
/// use std::sync::Arc;
///
/// let transport = MemoryTransport::with_paper();
/// let mut printer = ThermalPrinter::new(
///     Box::new(transport.clone()),
///     None,
///     Box::new(MemoryStore::new()),
///     Arc::new(ManualClock::new()),
///     &PrinterSettings::default(),
/// );
/// printer.setup()?;
/// printer.queue_separator(0)?;
/// assert!(printer.flush_and_wait(std::time::Duration::from_secs(5)));
/// # Ok::<(), termica::error::TermicaError>(())
/// ```
pub struct ThermalPrinter {
    encoder: Encoder,
    queue: JobQueue,
    monitor: StatusMonitor,
    clock: SharedClock,
    auto_process: bool,
    startup_message: bool,
    started_at: Duration,
    last_paper_warning: Option<Duration>,
}

impl ThermalPrinter {
    /// Assemble a printer from its collaborators. The handshake line is used
    /// only when `settings.handshake` is set.
    pub fn new(
        transport: Box<dyn ByteTransport>,
        handshake: Option<Box<dyn HandshakeLine>>,
        store: Box<dyn UsageStore>,
        clock: SharedClock,
        settings: &PrinterSettings,
    ) -> Self {
        let mut gate = FlowControl::new(transport, clock.clone(), settings.baud_rate);
        match (handshake, settings.handshake) {
            (Some(line), Some(hs)) => {
                gate = gate.with_handshake(line, hs.polarity, hs.timeout());
            }
            (None, Some(_)) => warn!("handshake configured but no line given, using software timing"),
            _ => {}
        }

        let ledger = UsageLedger::new(
            store,
            settings.paper_roll_length_mm,
            settings.line_height_mm,
        );
        let started_at = clock.now();

        Self {
            encoder: Encoder::new(gate, ledger, settings.heat),
            queue: JobQueue::new(settings.queue_capacity, settings.inter_job_delay()),
            monitor: StatusMonitor::new(settings.status_interval()),
            clock,
            auto_process: settings.auto_process_queue,
            startup_message: settings.startup_message,
            started_at,
            last_paper_warning: None,
        }
    }

    /// Open the serial device named in `settings`, with the handshake line
    /// and usage directory it configures.
    pub fn open(settings: &PrinterSettings) -> Result<Self, TermicaError> {
        let transport = SerialTransport::open(&settings.device, settings.baud_rate)?;
        let handshake: Option<Box<dyn HandshakeLine>> = match settings.handshake {
            Some(hs) => Some(Box::new(transport.modem_line(hs.line)?)),
            None => None,
        };
        let store: Box<dyn UsageStore> = match &settings.usage_dir {
            Some(dir) => Box::new(FileStore::open(dir)?),
            None => Box::new(MemoryStore::new()),
        };
        Ok(Self::new(
            Box::new(transport),
            handshake,
            store,
            SystemClock::shared(),
            settings,
        ))
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn encoder_mut(&mut self) -> &mut Encoder {
        &mut self.encoder
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Bring the printer to a known state: drain input, wake, apply heat and
    /// defaults, restore usage counters, check paper.
    pub fn setup(&mut self) -> Result<(), TermicaError> {
        info!(
            handshake = self.encoder.gate().handshake_enabled(),
            queue_capacity = self.queue.capacity(),
            inter_job_delay_ms = self.queue.inter_job_delay().as_millis() as u64,
            "setting up printer"
        );
        self.encoder.gate().pause(POWER_ON_SETTLE);
        self.encoder.drain_input()?;
        self.encoder.wake()?;
        let heat = self.encoder.heat();
        self.encoder.set_heat_config_advanced(heat)?;
        self.encoder.set_default()?;

        if let Err(e) = self.encoder.ledger_mut().restore() {
            warn!(error = %e, "could not restore paper usage, starting from zero");
        }

        let paper = self.encoder.has_paper()?;
        self.monitor.prime(paper, self.clock.now());
        if !paper {
            warn!("no paper loaded");
        }

        if self.startup_message {
            self.print_startup_message()?;
        }
        info!("printer ready");
        Ok(())
    }

    fn print_startup_message(&mut self) -> Result<(), TermicaError> {
        info!("printing startup message");
        self.encoder.justify(Alignment::Center)?;
        self.encoder.set_size(TextSize::Medium)?;
        self.encoder.set_bold(true)?;
        self.encoder.print_text("termica")?;
        self.encoder.set_bold(false)?;
        self.encoder.feed(1)?;
        self.encoder.set_size(TextSize::Small)?;
        self.encoder.print_text("Print queue ready")?;
        self.encoder.feed(1)?;
        self.encoder.justify(Alignment::Left)?;
        self.encoder.feed(2)
    }

    /// One scheduler pass: run at most one queued job (when auto-processing
    /// is on), then poll paper status if due.
    pub fn tick(&mut self) {
        if self.auto_process {
            if let Err(e) = self.process_tick() {
                warn!(error = %e, "queue processing failed");
            }
        }
        let now = self.clock.now();
        self.monitor.poll(&mut self.encoder, now);
    }

    fn ensure_awake(&mut self) -> Result<(), TermicaError> {
        if self.encoder.is_asleep() {
            debug!("waking printer");
            self.encoder.wake()?;
        }
        Ok(())
    }

    fn warn_paper_out(&mut self, now: Duration) {
        let due = self
            .last_paper_warning
            .is_none_or(|last| now.saturating_sub(last) >= PAPER_WARNING_INTERVAL);
        if due {
            warn!(queued = self.queue.len(), "cannot process print queue: no paper");
            self.last_paper_warning = Some(now);
        }
    }

    // ========================================================================
    // QUEUE PROCESSING
    // ========================================================================

    /// Run the next queued job if the queue is non-empty, nothing is
    /// running, the inter-job delay has passed and paper is present.
    ///
    /// Returns whether a job ran. A job that fails is logged and dropped.
    pub fn process_tick(&mut self) -> Result<bool, TermicaError> {
        if self.queue.is_empty() || self.queue.is_busy() {
            return Ok(false);
        }
        let now = self.clock.now();
        if !self.queue.delay_elapsed(now) {
            return Ok(false);
        }

        let paper = self.encoder.has_paper()?;
        self.monitor.observe(paper);
        if !paper {
            self.warn_paper_out(now);
            return Ok(false);
        }
        self.ensure_awake()?;

        let Some(job) = self.queue.start() else {
            return Ok(false);
        };
        info!(
            id = %job.id,
            kind = job.kind.name(),
            remaining = self.queue.len(),
            "processing print job"
        );

        let started = self.clock.now();
        if let Err(e) = job.kind.run(&mut self.encoder) {
            warn!(id = %job.id, kind = job.kind.name(), error = %e, "print job failed, dropped");
        }
        let finished = self.clock.now();
        self.queue.finish(finished, finished.saturating_sub(started));
        Ok(true)
    }

    /// Process jobs until the queue is empty or `timeout` passes. Returns
    /// whether the queue drained.
    pub fn flush_and_wait(&mut self, timeout: Duration) -> bool {
        let start = self.clock.now();
        loop {
            if self.queue.is_empty() {
                return true;
            }
            if self.clock.now().saturating_sub(start) >= timeout {
                warn!(remaining = self.queue.len(), "queue flush timed out");
                return false;
            }
            match self.process_tick() {
                Ok(true) => {}
                Ok(false) => self.clock.sleep(FLUSH_POLL_INTERVAL),
                Err(e) => {
                    warn!(error = %e, "queue processing failed during flush");
                    self.clock.sleep(FLUSH_POLL_INTERVAL);
                }
            }
        }
    }

    /// Print text now, bypassing the queue.
    ///
    /// Fails with `PrinterOffline` while a queued job runs and `PaperOut` with
    /// no paper. With a handshake line the detailed status is checked too:
    /// `CoverOpen` / `PrinterOffline` when the printer reports them. A printer
    /// that never answers `GS r 1` is assumed ready.
    pub fn print_immediate(
        &mut self,
        text: &str,
        size: TextSize,
        align: Alignment,
        bold: bool,
    ) -> Result<(), TermicaError> {
        if self.queue.is_busy() {
            warn!("cannot print immediately: printer busy");
            return Err(TermicaError::PrinterOffline);
        }
        self.require_paper()?;
        if self.encoder.gate().handshake_enabled() {
            let flags = match self.encoder.detailed_status() {
                Ok(flags) => flags,
                Err(TermicaError::CommunicationError(reason)) => {
                    debug!(%reason, "no detailed status, assuming ready");
                    DeviceFlags::ASSUMED
                }
                Err(e) => return Err(e),
            };
            if flags.cover_open {
                return Err(TermicaError::CoverOpen);
            }
            if !flags.online {
                return Err(TermicaError::PrinterOffline);
            }
        }

        if !self.queue.begin_exclusive() {
            return Err(TermicaError::PrinterOffline);
        }
        info!(chars = text.chars().count(), "immediate print");
        let job = JobKind::Text {
            text: text.to_string(),
            size,
            align,
            bold,
        };
        let result = self.ensure_awake().and_then(|()| job.run(&mut self.encoder));
        self.queue.end_exclusive(self.clock.now());
        result
    }

    // ========================================================================
    // SYNCHRONOUS SURFACE
    // ========================================================================

    fn require_paper(&mut self) -> Result<(), TermicaError> {
        let paper = self.encoder.has_paper()?;
        self.monitor.observe(paper);
        if paper {
            Ok(())
        } else {
            warn!("no paper");
            Err(TermicaError::PaperOut)
        }
    }

    /// Print text after checking paper is present and the roll has room.
    pub fn print_text(&mut self, text: &str) -> Result<(), TermicaError> {
        if text.is_empty() {
            return Ok(());
        }
        self.require_paper()?;
        let lines = usage::estimate_lines(text);
        self.encoder.ledger().check_fit(lines).inspect_err(|_| {
            warn!(lines, "cannot print: insufficient paper");
        })?;
        self.ensure_awake()?;
        self.encoder.print_text(text)
    }

    pub fn print_two_column(
        &mut self,
        left: &str,
        right: &str,
        fill_dots: bool,
        size: TextSize,
    ) -> Result<(), TermicaError> {
        self.ensure_awake()?;
        self.encoder.print_two_column(left, right, fill_dots, size)
    }

    pub fn print_table_row(
        &mut self,
        col1: &str,
        col2: &str,
        col3: Option<&str>,
        header: bool,
    ) -> Result<(), TermicaError> {
        self.ensure_awake()?;
        JobKind::TableRow {
            col1: col1.to_string(),
            col2: col2.to_string(),
            col3: col3.map(str::to_string),
            header,
        }
        .run(&mut self.encoder)
    }

    pub fn print_barcode(&mut self, kind: BarcodeType, data: &str) -> Result<(), TermicaError> {
        self.ensure_awake()?;
        self.encoder.print_barcode(kind, data)
    }

    pub fn print_qr_code(
        &mut self,
        data: &str,
        module_size: u8,
        level: QrErrorLevel,
    ) -> Result<(), TermicaError> {
        self.ensure_awake()?;
        self.encoder.print_qr_code(data, module_size, level)
    }

    pub fn print_rotated_text(&mut self, text: &str, rotation: Rotation) -> Result<(), TermicaError> {
        self.ensure_awake()?;
        self.encoder.print_rotated_text(text, rotation)
    }

    /// Print a raster image after the same paper checks as [`Self::print_text`].
    pub fn print_bitmap(&mut self, width: u16, height: u16, data: &[u8]) -> Result<(), TermicaError> {
        encoder::validate_bitmap(width, height, data)?;
        self.require_paper()?;
        self.encoder
            .ledger()
            .check_fit(encoder::bitmap_lines(height))?;
        self.ensure_awake()?;
        self.encoder.print_bitmap(width, height, data)
    }

    /// Upside-down, double-strike, character spacing and tab stops.
    pub fn set_style(&mut self, style: &StyleChange) -> Result<(), TermicaError> {
        self.ensure_awake()?;
        self.encoder.apply_style(style)
    }

    pub fn beep(&mut self) -> Result<(), TermicaError> {
        self.ensure_awake()?;
        self.encoder.beep()
    }

    pub fn print_separator(&mut self) -> Result<(), TermicaError> {
        self.ensure_awake()?;
        self.encoder.print_separator()
    }

    pub fn feed(&mut self, lines: u8) -> Result<(), TermicaError> {
        self.ensure_awake()?;
        self.encoder.feed(lines)
    }

    pub fn wake(&mut self) -> Result<(), TermicaError> {
        self.encoder.wake()
    }

    pub fn sleep(&mut self) -> Result<(), TermicaError> {
        self.encoder.sleep()
    }

    /// Print a short greeting and feed.
    pub fn test_print(&mut self) -> Result<(), TermicaError> {
        self.ensure_awake()?;
        self.encoder.test()
    }

    /// Print the firmware's own test page.
    pub fn test_page(&mut self) -> Result<(), TermicaError> {
        self.ensure_awake()?;
        self.encoder.test_page()
    }

    pub fn set_heat_config(&mut self, heat: HeatConfig) -> Result<(), TermicaError> {
        self.encoder.set_heat_config_advanced(heat)
    }

    pub fn recover_from_error(&mut self) -> Result<(), TermicaError> {
        self.encoder.recover()
    }

    /// Query paper presence now, updating the monitor.
    pub fn has_paper(&mut self) -> Result<bool, TermicaError> {
        let paper = self.encoder.has_paper()?;
        self.monitor.observe(paper);
        Ok(paper)
    }

    pub fn detailed_status(&mut self) -> Result<DetailedStatus, TermicaError> {
        let paper_present = self.has_paper()?;
        let flags = self.encoder.detailed_status()?;
        let gate = self.encoder.gate_mut();
        Ok(DetailedStatus {
            paper_present,
            flags,
            handshake_ready: gate.is_ready(),
            handshake_timeouts: gate.timeouts(),
        })
    }

    // ========================================================================
    // USAGE
    // ========================================================================

    pub fn reset_usage(&mut self) -> Result<(), TermicaError> {
        self.encoder.ledger_mut().reset()
    }

    pub fn set_roll_length(&mut self, mm: f32) -> Result<(), TermicaError> {
        self.encoder.ledger_mut().set_roll_length_mm(mm)
    }

    pub fn set_line_height_calibration(&mut self, mm_per_line: f32) -> Result<(), TermicaError> {
        self.encoder.ledger_mut().set_mm_per_line(mm_per_line)
    }

    pub fn usage_mm(&self) -> f32 {
        self.encoder.ledger().usage_mm()
    }

    pub fn usage_percent(&self) -> f32 {
        self.encoder.ledger().usage_percent()
    }

    pub fn usage(&self) -> UsageReport {
        self.encoder.ledger().report()
    }

    pub fn predict_usage_mm(&self, text: &str, size: TextSize) -> f32 {
        self.encoder.ledger().predict_usage_mm(text, size)
    }

    // ========================================================================
    // QUEUE
    // ========================================================================

    /// Validate and queue a job. Returns its id.
    pub fn enqueue(&mut self, kind: JobKind, priority: u8) -> Result<Uuid, TermicaError> {
        kind.validate()?;
        let job = PrintJob::new(kind, priority);
        let id = job.id;
        self.queue.enqueue(job)?;
        Ok(id)
    }

    pub fn queue_text(
        &mut self,
        text: &str,
        size: TextSize,
        align: Alignment,
        bold: bool,
        priority: u8,
    ) -> Result<Uuid, TermicaError> {
        self.enqueue(
            JobKind::Text {
                text: text.to_string(),
                size,
                align,
                bold,
            },
            priority,
        )
    }

    pub fn queue_two_column(
        &mut self,
        left: &str,
        right: &str,
        fill_dots: bool,
        size: TextSize,
        priority: u8,
    ) -> Result<Uuid, TermicaError> {
        self.enqueue(
            JobKind::TwoColumn {
                left: left.to_string(),
                right: right.to_string(),
                fill_dots,
                size,
            },
            priority,
        )
    }

    pub fn queue_barcode(
        &mut self,
        barcode_type: BarcodeType,
        data: &str,
        priority: u8,
    ) -> Result<Uuid, TermicaError> {
        self.enqueue(
            JobKind::Barcode {
                barcode_type,
                data: data.to_string(),
            },
            priority,
        )
    }

    pub fn queue_qr_code(
        &mut self,
        data: &str,
        size: u8,
        error_correction: QrErrorLevel,
        priority: u8,
    ) -> Result<Uuid, TermicaError> {
        self.enqueue(
            JobKind::QrCode {
                data: data.to_string(),
                size,
                error_correction,
            },
            priority,
        )
    }

    pub fn queue_feed(&mut self, lines: u8, priority: u8) -> Result<Uuid, TermicaError> {
        self.enqueue(JobKind::Feed { lines }, priority)
    }

    pub fn queue_separator(&mut self, priority: u8) -> Result<Uuid, TermicaError> {
        self.enqueue(JobKind::Separator, priority)
    }

    pub fn queue_table_row(
        &mut self,
        col1: &str,
        col2: &str,
        col3: Option<&str>,
        header: bool,
        priority: u8,
    ) -> Result<Uuid, TermicaError> {
        self.enqueue(
            JobKind::TableRow {
                col1: col1.to_string(),
                col2: col2.to_string(),
                col3: col3.map(str::to_string),
                header,
            },
            priority,
        )
    }

    pub fn queue_rotated_text(
        &mut self,
        text: &str,
        rotation: Rotation,
        priority: u8,
    ) -> Result<Uuid, TermicaError> {
        self.enqueue(
            JobKind::RotatedText {
                text: text.to_string(),
                rotation,
            },
            priority,
        )
    }

    pub fn queue_bitmap(
        &mut self,
        width: u16,
        height: u16,
        data: Vec<u8>,
        priority: u8,
    ) -> Result<Uuid, TermicaError> {
        self.enqueue(
            JobKind::Bitmap {
                width,
                height,
                data,
            },
            priority,
        )
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_jobs(&self) -> Vec<PrintJob> {
        self.queue.jobs().cloned().collect()
    }

    pub fn clear_queue(&mut self) -> usize {
        self.queue.clear()
    }

    pub fn set_queue_capacity(&mut self, capacity: usize) {
        self.queue.set_capacity(capacity);
    }

    pub fn set_inter_job_delay(&mut self, delay: Duration) {
        self.queue.set_inter_job_delay(delay);
    }

    pub fn set_auto_process(&mut self, enabled: bool) {
        self.auto_process = enabled;
        info!(enabled, "automatic queue processing");
    }

    pub fn auto_process(&self) -> bool {
        self.auto_process
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    // ========================================================================
    // STATUS
    // ========================================================================

    /// Register a callback for paper status changes.
    pub fn subscribe(&mut self, observer: PaperObserver) {
        self.monitor.subscribe(observer);
    }

    pub fn paper_present(&self) -> bool {
        self.monitor.paper_present()
    }

    pub fn state(&self) -> DeviceState {
        if self.queue.is_busy() {
            DeviceState::Busy
        } else if self.encoder.is_asleep() {
            DeviceState::Asleep
        } else if !self.monitor.paper_present() {
            DeviceState::Offline
        } else {
            DeviceState::Idle
        }
    }

    pub fn status(&self) -> PrinterStatus {
        let stats = self.queue.stats();
        let gate = self.encoder.gate();
        PrinterStatus {
            state: self.state(),
            paper_present: self.monitor.paper_present(),
            handshake_enabled: gate.handshake_enabled(),
            handshake_timeouts: gate.timeouts(),
            bytes_sent: gate.bytes_sent(),
            queue: QueueStatus {
                length: self.queue.len(),
                capacity: self.queue.capacity(),
                inter_job_delay_ms: self.queue.inter_job_delay().as_millis() as u64,
                auto_process: self.auto_process,
                stats,
                average_job_ms: stats.average_job_ms(),
            },
            usage: self.encoder.ledger().report(),
        }
    }

    pub fn performance_stats(&self) -> PerformanceStats {
        let uptime_minutes = self.clock.now().saturating_sub(self.started_at).as_secs() / 60;
        let counters = self.encoder.ledger().counters();
        let per_minute = |n: u32| {
            if uptime_minutes > 0 {
                n as f32 / uptime_minutes as f32
            } else {
                0.0
            }
        };
        let usage_mm = self.encoder.ledger().usage_mm();
        let stats = self.queue.stats();
        PerformanceStats {
            uptime_minutes,
            chars_per_minute: per_minute(counters.characters),
            lines_per_minute: per_minute(counters.lines),
            chars_per_mm: if usage_mm > 0.0 {
                counters.characters as f32 / usage_mm
            } else {
                0.0
            },
            jobs_processed: stats.processed,
            jobs_dropped: stats.dropped,
            average_job_ms: stats.average_job_ms(),
        }
    }

    pub fn log_performance_stats(&self) {
        let stats = self.performance_stats();
        info!(
            uptime_minutes = stats.uptime_minutes,
            chars_per_minute = stats.chars_per_minute,
            lines_per_minute = stats.lines_per_minute,
            chars_per_mm = stats.chars_per_mm,
            jobs_processed = stats.jobs_processed,
            jobs_dropped = stats.jobs_dropped,
            average_job_ms = stats.average_job_ms,
            "performance stats"
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
