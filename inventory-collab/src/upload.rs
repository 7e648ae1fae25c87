//! Upload intake: buffer an out-of-band image payload, then stage it.
//!
//! A payload is only turned into an [`ImageBlob`] once it has been
//! received completely, so a failed transfer never stages partial bytes.

use std::io;

use futures_util::{Stream, StreamExt};
use inventory_core::{FieldValue, ImageBlob, InventoryRecord, RecordField};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::CollabConfig;
use crate::draft::SharedDraft;

const READ_CHUNK: usize = 8 * 1024;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Upload failed before any data arrived: {0}")]
    Io(#[from] io::Error),

    #[error("Upload interrupted after {received} bytes")]
    Interrupted {
        received: usize,
        #[source]
        source: io::Error,
    },
}

impl UploadError {
    fn at(received: usize, source: io::Error) -> Self {
        if received == 0 {
            UploadError::Io(source)
        } else {
            UploadError::Interrupted { received, source }
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadIntake {
    chunk_hint: usize,
}

impl UploadIntake {
    pub fn new(config: &CollabConfig) -> Self {
        Self {
            chunk_hint: config.upload_chunk_hint,
        }
    }

    /// Buffer every chunk of `chunks` into one blob.
    pub async fn receive<S, B>(&self, mut chunks: S) -> Result<ImageBlob, UploadError>
    where
        S: Stream<Item = Result<B, io::Error>> + Unpin,
        B: AsRef<[u8]>,
    {
        let mut buffer = Vec::with_capacity(self.chunk_hint);
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| UploadError::at(buffer.len(), e))?;
            buffer.extend_from_slice(chunk.as_ref());
            log::trace!("Upload chunk of {} bytes ({} total)", chunk.as_ref().len(), buffer.len());
        }
        log::debug!("Upload complete: {} bytes", buffer.len());
        Ok(ImageBlob::new(buffer))
    }

    /// Buffer an `AsyncRead` until EOF.
    pub async fn receive_reader<R>(&self, mut reader: R) -> Result<ImageBlob, UploadError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buffer = Vec::with_capacity(self.chunk_hint);
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let read = reader
                .read(&mut chunk)
                .await
                .map_err(|e| UploadError::at(buffer.len(), e))?;
            if read == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..read]);
            log::trace!("Upload read {read} bytes ({} total)", buffer.len());
        }
        log::debug!("Upload complete: {} bytes", buffer.len());
        Ok(ImageBlob::new(buffer))
    }
}

impl Default for UploadIntake {
    fn default() -> Self {
        Self::new(&CollabConfig::default())
    }
}

/// Something an uploaded image can be staged onto.
pub trait StageTarget {
    fn stage_image(&mut self, blob: ImageBlob);
}

impl StageTarget for InventoryRecord {
    fn stage_image(&mut self, blob: ImageBlob) {
        self.image = Some(blob);
    }
}

/// Instantiates a blank record when nothing is being edited yet.
impl StageTarget for Option<InventoryRecord> {
    fn stage_image(&mut self, blob: ImageBlob) {
        self.get_or_insert_with(InventoryRecord::new).stage_image(blob);
    }
}

impl StageTarget for SharedDraft {
    fn stage_image(&mut self, blob: ImageBlob) {
        if let Err(err) = self.apply(RecordField::Image, FieldValue::Image(Some(blob))) {
            log::warn!("Staging image onto shared draft failed: {err}");
        }
    }
}

/// Stage `blob`, replacing any previously staged image.
pub fn stage(blob: ImageBlob, target: &mut impl StageTarget) {
    log::debug!("Staging image of {} bytes", blob.len());
    target.stage_image(blob);
}
