//! Print job records and their dispatch onto the encoder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::encoder::{self, Encoder};
use crate::error::TermicaError;
use crate::protocol::barcode::barcode1d::BarcodeType;
use crate::protocol::barcode::qr::{self, QrErrorLevel};
use crate::protocol::text::{Alignment, Rotation, TextSize};

/// Default QR module size in dots.
pub const DEFAULT_QR_SIZE: u8 = 6;

fn default_qr_size() -> u8 {
    DEFAULT_QR_SIZE
}

/// What a job prints. Serialised with a `kind` tag so the HTTP API can take
/// jobs as plain JSON:
///
/// ```json
/// {"kind": "two_column", "left": "Coffee", "right": "$3.50", "fill_dots": true}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobKind {
    Text {
        text: String,
        #[serde(default)]
        size: TextSize,
        #[serde(default)]
        align: Alignment,
        #[serde(default)]
        bold: bool,
    },
    TwoColumn {
        left: String,
        right: String,
        #[serde(default)]
        fill_dots: bool,
        #[serde(default)]
        size: TextSize,
    },
    Barcode {
        #[serde(default)]
        barcode_type: BarcodeType,
        data: String,
    },
    QrCode {
        data: String,
        #[serde(default = "default_qr_size")]
        size: u8,
        #[serde(default)]
        error_correction: QrErrorLevel,
    },
    Feed {
        lines: u8,
    },
    Separator,
    TableRow {
        col1: String,
        col2: String,
        #[serde(default)]
        col3: Option<String>,
        #[serde(default)]
        header: bool,
    },
    RotatedText {
        text: String,
        #[serde(default)]
        rotation: Rotation,
    },
    /// Raster image; `data` holds `height` rows of `ceil(width / 8)` bytes.
    Bitmap {
        width: u16,
        height: u16,
        data: Vec<u8>,
    },
}

impl JobKind {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::TwoColumn { .. } => "two_column",
            Self::Barcode { .. } => "barcode",
            Self::QrCode { .. } => "qr_code",
            Self::Feed { .. } => "feed",
            Self::Separator => "separator",
            Self::TableRow { .. } => "table_row",
            Self::RotatedText { .. } => "rotated_text",
            Self::Bitmap { .. } => "bitmap",
        }
    }

    /// Reject payloads the printer can't take before they reach the queue.
    pub fn validate(&self) -> Result<(), TermicaError> {
        match self {
            Self::Barcode { data, .. } if data.is_empty() || data.contains('\0') => Err(
                TermicaError::InvalidPayload("barcode data must be non-empty without NUL".into()),
            ),
            Self::QrCode { data, .. } if data.is_empty() || data.len() > qr::MAX_DATA_LEN => {
                Err(TermicaError::InvalidPayload(format!(
                    "QR data must be 1..={} bytes, got {}",
                    qr::MAX_DATA_LEN,
                    data.len()
                )))
            }
            Self::Bitmap {
                width,
                height,
                data,
            } => encoder::validate_bitmap(*width, *height, data),
            _ => Ok(()),
        }
    }

    /// Execute on the encoder. Text jobs restore bold and alignment
    /// afterwards; header table rows are printed bold.
    pub fn run(&self, encoder: &mut Encoder) -> Result<(), TermicaError> {
        match self {
            Self::Text {
                text,
                size,
                align,
                bold,
            } => {
                encoder.set_size(*size)?;
                encoder.justify(*align)?;
                encoder.set_bold(*bold)?;
                encoder.print_text(text)?;
                encoder.set_bold(false)?;
                encoder.justify(Alignment::Left)
            }
            Self::TwoColumn {
                left,
                right,
                fill_dots,
                size,
            } => encoder.print_two_column(left, right, *fill_dots, *size),
            Self::Barcode { barcode_type, data } => encoder.print_barcode(*barcode_type, data),
            Self::QrCode {
                data,
                size,
                error_correction,
            } => encoder.print_qr_code(data, *size, *error_correction),
            Self::Feed { lines } => encoder.feed(*lines),
            Self::Separator => encoder.print_separator(),
            Self::TableRow {
                col1,
                col2,
                col3,
                header,
            } => {
                if *header {
                    encoder.set_bold(true)?;
                }
                encoder.print_table_row(col1, col2, col3.as_deref())?;
                if *header {
                    encoder.set_bold(false)?;
                }
                Ok(())
            }
            Self::RotatedText { text, rotation } => encoder.print_rotated_text(text, *rotation),
            Self::Bitmap {
                width,
                height,
                data,
            } => encoder.print_bitmap(*width, *height, data),
        }
    }
}

/// A queued unit of work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintJob {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: JobKind,
    /// Advisory only; the queue is strictly FIFO.
    pub priority: u8,
    pub enqueued_at: DateTime<Utc>,
}

impl PrintJob {
    pub fn new(kind: JobKind, priority: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            priority,
            enqueued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::HeatConfig;
    use crate::flow::{FlowControl, ManualClock};
    use crate::transport::MemoryTransport;
    use crate::usage::UsageLedger;
    use std::sync::Arc;

    fn encoder() -> (Encoder, MemoryTransport) {
        let transport = MemoryTransport::new();
        let gate = FlowControl::new(
            Box::new(transport.clone()),
            Arc::new(ManualClock::new()),
            19200,
        );
        (
            Encoder::new(gate, UsageLedger::in_memory(), HeatConfig::default()),
            transport,
        )
    }

    #[test]
    fn test_job_json_defaults() {
        let kind: JobKind = serde_json::from_str(r#"{"kind":"text","text":"Hi"}"#).unwrap();
        assert_eq!(
            kind,
            JobKind::Text {
                text: "Hi".into(),
                size: TextSize::Small,
                align: Alignment::Left,
                bold: false,
            }
        );

        let kind: JobKind = serde_json::from_str(r#"{"kind":"qr_code","data":"x"}"#).unwrap();
        assert!(matches!(kind, JobKind::QrCode { size: 6, .. }));

        let kind: JobKind = serde_json::from_str(r#"{"kind":"separator"}"#).unwrap();
        assert_eq!(kind.name(), "separator");
    }

    #[test]
    fn test_text_job_restores_formatting() {
        let (mut enc, transport) = encoder();
        JobKind::Text {
            text: "Hi".into(),
            size: TextSize::Medium,
            align: Alignment::Center,
            bold: true,
        }
        .run(&mut enc)
        .unwrap();
        assert_eq!(
            transport.sent(),
            vec![
                0x1B, b'!', 0x10, 0x1B, b'a', 1, 0x1B, b'E', 1, b'H', b'i', b'\n', 0x1B, b'E', 0,
                0x1B, b'a', 0,
            ]
        );
    }

    #[test]
    fn test_header_row_is_bold() {
        let (mut enc, transport) = encoder();
        JobKind::TableRow {
            col1: "A".into(),
            col2: "B".into(),
            col3: Some("C".into()),
            header: true,
        }
        .run(&mut enc)
        .unwrap();
        let sent = transport.sent();
        assert!(sent.starts_with(&[0x1B, b'E', 1]));
        assert!(sent.ends_with(&[b'\n', 0x1B, b'E', 0]));
    }

    #[test]
    fn test_validate_payloads() {
        let empty = JobKind::Barcode {
            barcode_type: BarcodeType::Code128,
            data: String::new(),
        };
        assert!(empty.validate().is_err());

        let huge = JobKind::QrCode {
            data: "x".repeat(qr::MAX_DATA_LEN + 1),
            size: 6,
            error_correction: QrErrorLevel::L,
        };
        assert!(huge.validate().is_err());
        assert!(JobKind::Separator.validate().is_ok());

        let short = JobKind::Bitmap {
            width: 16,
            height: 2,
            data: vec![0xFF; 3],
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_bitmap_job_from_json() {
        let kind: JobKind =
            serde_json::from_str(r#"{"kind":"bitmap","width":8,"height":2,"data":[255,129]}"#)
                .unwrap();
        assert!(kind.validate().is_ok());

        let (mut enc, transport) = encoder();
        kind.run(&mut enc).unwrap();
        assert_eq!(
            transport.sent(),
            vec![0x1D, b'v', b'0', 0, 1, 0, 2, 0, 0xFF, 0x81]
        );
        assert_eq!(enc.ledger().counters().lines, 1);
    }

    #[test]
    fn test_print_job_serialises_flat() {
        let job = PrintJob::new(JobKind::Feed { lines: 2 }, 1);
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["kind"], "feed");
        assert_eq!(value["lines"], 2);
        assert_eq!(value["priority"], 1);
    }
}
