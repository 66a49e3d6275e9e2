//! Ingestion pipeline - channel handoff between source readers and the
//! single buffer-writer task.
//!
//! Per-source readers push raw lines into an mpsc channel; one writer
//! task parses, classifies on the full line, then appends. Error-observed
//! notifications go out on an unbounded channel so ingestion never blocks
//! on a slow listener.

use crate::buffer::{SharedBuffer, DEFAULT_CAPACITY};
use causelog_core::classify::ErrorClassifier;
use causelog_core::parser::LineParser;
use causelog_core::LogRecord;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// One raw line paired with its source identity, as delivered by a
/// stream provider.
#[derive(Debug, Clone)]
pub struct SourceLine {
    pub line: String,
    pub source_identity: String,
}

/// Fired when an appended record classifies as an error. The only
/// cross-component signal in the ingestion path.
#[derive(Debug, Clone)]
pub struct ErrorObserved {
    pub record: LogRecord,
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct IngestPipeline {
    pub buffer_capacity: usize,
    pub line_channel_capacity: usize,
}

impl Default for IngestPipeline {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_CAPACITY,
            line_channel_capacity: 1024,
        }
    }
}

impl IngestPipeline {
    /// Spawn the writer task and hand back the pipeline handle.
    pub fn spawn(self) -> IngestHandle {
        let (line_tx, mut line_rx) = mpsc::channel::<SourceLine>(self.line_channel_capacity);
        let (error_tx, error_rx) = mpsc::unbounded_channel::<ErrorObserved>();

        let buffer = SharedBuffer::new(self.buffer_capacity);
        let writer_buffer = buffer.clone();

        let writer = tokio::spawn(async move {
            let parser = LineParser::new();
            let classifier = ErrorClassifier::new();

            while let Some(SourceLine {
                line,
                source_identity,
            }) = line_rx.recv().await
            {
                if line.trim().is_empty() {
                    continue;
                }

                let record = parser.parse(&line, &source_identity);
                // classify before the buffer truncates for storage
                let is_error = classifier.is_error(&record);

                debug!(
                    id = record.id,
                    service = %record.service,
                    level = ?record.level,
                    "record appended"
                );
                writer_buffer.append(record.clone());

                if is_error {
                    info!(
                        id = record.id,
                        service = %record.service,
                        "error observed"
                    );
                    // fire-and-forget; a dropped listener must not stall ingestion
                    let _ = error_tx.send(ErrorObserved { record });
                }
            }
        });

        IngestHandle {
            line_tx,
            buffer,
            error_rx: Some(error_rx),
            writer,
        }
    }
}

/// Handle to a running pipeline: senders for source readers, the shared
/// buffer for readers, and the error-event receiver (taken once).
pub struct IngestHandle {
    line_tx: mpsc::Sender<SourceLine>,
    buffer: SharedBuffer,
    error_rx: Option<mpsc::UnboundedReceiver<ErrorObserved>>,
    writer: JoinHandle<()>,
}

impl IngestHandle {
    /// Sender for a source reader. Cloneable; each source gets its own.
    pub fn sender(&self) -> mpsc::Sender<SourceLine> {
        self.line_tx.clone()
    }

    pub fn buffer(&self) -> SharedBuffer {
        self.buffer.clone()
    }

    /// Take the error-observed receiver. Only one listener gets it.
    pub fn take_error_events(&mut self) -> Option<mpsc::UnboundedReceiver<ErrorObserved>> {
        self.error_rx.take()
    }

    /// Close the line channel and wait for the writer to drain. Sender
    /// clones handed out via [`sender`](Self::sender) keep the channel
    /// open; every one of them must be dropped before this returns.
    pub async fn shutdown(self) {
        drop(self.line_tx);
        let _ = self.writer.await;
    }
}

/// Pump every line of an async reader into the pipeline as one source
/// stream. Returns when the reader is exhausted or the pipeline is gone.
pub async fn pump_lines<R>(reader: R, source_identity: String, tx: mpsc::Sender<SourceLine>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx
            .send(SourceLine {
                line,
                source_identity: source_identity.clone(),
            })
            .await
            .is_err()
        {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causelog_core::LogLevel;

    #[tokio::test]
    async fn test_pipeline_appends_and_notifies() {
        let mut handle = IngestPipeline::default().spawn();
        let mut events = handle.take_error_events().unwrap();
        let tx = handle.sender();

        tx.send(SourceLine {
            line: "[DB-SERVICE] 2026-02-10T14:30:45Z ERROR: Connection pool exhausted".into(),
            source_identity: "db-service-1".into(),
        })
        .await
        .unwrap();
        tx.send(SourceLine {
            line: "[DB-SERVICE] 2026-02-10T14:30:46Z INFO: pool stats".into(),
            source_identity: "db-service-1".into(),
        })
        .await
        .unwrap();

        let observed = events.recv().await.unwrap();
        assert_eq!(observed.record.service, "DB-SERVICE");
        assert_eq!(observed.record.level, LogLevel::Error);

        drop(tx);
        let buffer = handle.buffer();
        handle.shutdown().await;
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.errors_only().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_lines_are_filtered() {
        let handle = IngestPipeline::default().spawn();
        let tx = handle.sender();

        tx.send(SourceLine {
            line: "   ".into(),
            source_identity: "svc".into(),
        })
        .await
        .unwrap();
        tx.send(SourceLine {
            line: "real line".into(),
            source_identity: "svc".into(),
        })
        .await
        .unwrap();

        drop(tx);
        let buffer = handle.buffer();
        handle.shutdown().await;
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test]
    async fn test_ingestion_survives_dropped_listener() {
        // no one ever takes the error receiver; appends must still land
        let handle = IngestPipeline::default().spawn();
        let tx = handle.sender();

        for i in 0..10 {
            tx.send(SourceLine {
                line: format!("[A] 2026-02-10T00:00:{:02}Z ERROR: boom {}", i, i),
                source_identity: "a".into(),
            })
            .await
            .unwrap();
        }

        drop(tx);
        let buffer = handle.buffer();
        handle.shutdown().await;
        assert_eq!(buffer.len(), 10);
    }

    #[tokio::test]
    async fn test_shutdown_completes_once_senders_drop() {
        let handle = IngestPipeline::default().spawn();
        let tx = handle.sender();

        tx.send(SourceLine {
            line: "[A] 2026-02-10T00:00:00Z INFO: tail line".into(),
            source_identity: "a".into(),
        })
        .await
        .unwrap();
        drop(tx);

        let buffer = handle.buffer();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle.shutdown())
            .await
            .expect("shutdown must return once every sender clone is dropped");
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test]
    async fn test_pump_lines_from_reader() {
        let mut handle = IngestPipeline::default().spawn();
        let tx = handle.sender();
        let _events = handle.take_error_events();

        let data = b"[A] 2026-02-10T00:00:00Z INFO: one\n[A] 2026-02-10T00:00:01Z INFO: two\n";
        pump_lines(&data[..], "reader-source".into(), tx).await;

        let buffer = handle.buffer();
        handle.shutdown().await;
        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].message, "one");
    }
}
