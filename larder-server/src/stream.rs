//! Streaming PDF responses.
//!
//! The document is rendered on the blocking pool into a [`ChannelWriter`],
//! whose bounded channel feeds the response body. A full channel blocks the
//! renderer until the client catches up.

use std::io::{self, Write};

use axum::{
    body::{Body, Bytes},
    http::header,
    response::Response,
};
use futures::{Stream, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error};

use larder_document::{PdfSink, RecipeDocument, RenderError};

use crate::error::ApiError;

const CHUNK_SIZE: usize = 8 * 1024;
const CHANNEL_DEPTH: usize = 4;

/// `io::Write` adapter that forwards bytes to an async receiver in chunks.
///
/// Must be used from a blocking context.
pub struct ChannelWriter {
    tx: mpsc::Sender<Bytes>,
    buf: Vec<u8>,
}

impl ChannelWriter {
    pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self {
            tx,
            buf: Vec::with_capacity(CHUNK_SIZE),
        }
    }

    /// Send any buffered bytes and close the channel, ending the body.
    pub fn close(mut self) -> io::Result<()> {
        self.send_buffered()
    }

    fn send_buffered(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = Bytes::from(std::mem::replace(&mut self.buf, Vec::with_capacity(CHUNK_SIZE)));
        self.tx
            .blocking_send(chunk)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response body was dropped"))
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        if self.buf.len() >= CHUNK_SIZE {
            self.send_buffered()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}

/// Render `document` as a PDF attachment named `filename`.
///
/// A failure before the first byte is produced becomes an error response.
/// Once bytes are flowing the headers are gone, so a later failure ends the
/// body with an error and the connection is aborted.
pub async fn pdf_response(document: RecipeDocument, filename: &str) -> Result<Response, ApiError> {
    let (tx, mut rx) = mpsc::channel::<Bytes>(CHANNEL_DEPTH);
    let task = tokio::task::spawn_blocking(move || -> Result<(), RenderError> {
        let writer = document.emit(PdfSink::new(ChannelWriter::new(tx)))?;
        writer.close()?;
        Ok(())
    });

    let Some(first) = rx.recv().await else {
        let err = match task.await {
            Ok(Err(e)) => e,
            Ok(Ok(())) => RenderError::Aborted("renderer produced no output".to_string()),
            Err(e) => RenderError::Aborted(e.to_string()),
        };
        return Err(ApiError::Render(err));
    };

    let body = body_stream(first, rx, task, filename.to_string());

    Response::builder()
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", filename),
        )
        .body(Body::from_stream(body))
        .map_err(|e| ApiError::Render(RenderError::Aborted(e.to_string())))
}

/// Body chunks followed by the render outcome. A failed render yields a
/// trailing `Err` instead of a clean end of stream.
fn body_stream(
    first: Bytes,
    rx: mpsc::Receiver<Bytes>,
    task: JoinHandle<Result<(), RenderError>>,
    filename: String,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    let rest = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    });
    let outcome = futures::stream::once(async move {
        match task.await {
            Ok(Ok(())) => {
                debug!("Finished streaming {}", filename);
                None
            }
            Ok(Err(e)) => {
                error!("Streaming {} failed after headers were sent: {}", filename, e);
                Some(Err(io::Error::other(e)))
            }
            Err(e) => {
                error!("Render task for {} panicked: {}", filename, e);
                Some(Err(io::Error::other(e)))
            }
        }
    })
    .filter_map(futures::future::ready);

    futures::stream::once(async move { first })
        .chain(rest)
        .map(Ok::<_, io::Error>)
        .chain(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_writes_are_held_until_flush() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut writer = ChannelWriter::new(tx);

        writer.write_all(b"%PDF-1.5\n").unwrap();
        assert!(rx.try_recv().is_err());

        writer.close().unwrap();
        assert_eq!(rx.blocking_recv().unwrap(), Bytes::from_static(b"%PDF-1.5\n"));
        assert!(rx.blocking_recv().is_none());
    }

    #[test]
    fn large_writes_are_sent_in_chunks() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut writer = ChannelWriter::new(tx);

        writer.write_all(&vec![b'x'; CHUNK_SIZE + 10]).unwrap();
        let first = rx.blocking_recv().unwrap();
        assert_eq!(first.len(), CHUNK_SIZE + 10);

        writer.write_all(b"tail").unwrap();
        writer.close().unwrap();
        assert_eq!(rx.blocking_recv().unwrap(), Bytes::from_static(b"tail"));
        assert!(rx.blocking_recv().is_none());
    }

    #[test]
    fn dropped_receiver_is_broken_pipe() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut writer = ChannelWriter::new(tx);

        let err = writer.write_all(&vec![0u8; CHUNK_SIZE]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn late_render_failure_ends_body_with_error() {
        let (tx, mut rx) = mpsc::channel(CHANNEL_DEPTH);
        let task = tokio::task::spawn_blocking(move || -> Result<(), RenderError> {
            let mut writer = ChannelWriter::new(tx);
            writer.write_all(b"%PDF-1.5\n")?;
            writer.flush()?;
            Err(RenderError::Aborted("page tree failed".to_string()))
        });

        let first = rx.recv().await.unwrap();
        let items: Vec<io::Result<Bytes>> =
            body_stream(first, rx, task, "recipe.pdf".to_string()).collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), &Bytes::from_static(b"%PDF-1.5\n"));
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn finished_render_ends_body_cleanly() {
        let (tx, mut rx) = mpsc::channel(CHANNEL_DEPTH);
        let task = tokio::task::spawn_blocking(move || -> Result<(), RenderError> {
            let mut writer = ChannelWriter::new(tx);
            writer.write_all(b"%PDF-1.5\n")?;
            writer.flush()?;
            writer.write_all(b"%%EOF")?;
            writer.close()?;
            Ok(())
        });

        let first = rx.recv().await.unwrap();
        let items: Vec<io::Result<Bytes>> =
            body_stream(first, rx, task, "recipe.pdf".to_string()).collect().await;

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.is_ok()));
    }
}
