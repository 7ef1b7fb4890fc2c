//! Running a decode off the calling thread.
//!
//! Results come back as a [`DecodeMessage`], a serializable completion message tagged
//! with a `status` of `success` or `failure`. There is no cancellation: dropping the
//! task discards the result once the decode finishes.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{decode, GeometryBuffer, PlyError};

/// Completion message for a background decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DecodeMessage {
    Success { parsed: GeometryBuffer },
    Failure { error: String },
}

impl DecodeMessage {
    pub fn is_success(&self) -> bool {
        matches!(self, DecodeMessage::Success { .. })
    }

    pub fn into_result(self) -> Result<GeometryBuffer, PlyError> {
        match self {
            DecodeMessage::Success { parsed } => Ok(parsed),
            DecodeMessage::Failure { error } => Err(PlyError::Failed(error)),
        }
    }
}

impl From<Result<GeometryBuffer, PlyError>> for DecodeMessage {
    fn from(result: Result<GeometryBuffer, PlyError>) -> Self {
        match result {
            Ok(parsed) => DecodeMessage::Success { parsed },
            Err(e) => e.into(),
        }
    }
}

fn run(bytes: &[u8]) -> DecodeMessage {
    info!("Begin worker ply parsing");
    let result = decode(bytes);
    match &result {
        Ok(_) => info!("Completed worker ply parsing"),
        Err(e) => error!("Worker ply parsing failed: {e}"),
    }
    result.into()
}

/// Handle to a decode running on its own thread.
pub struct DecodeTask {
    receiver: Receiver<DecodeMessage>,
}

impl DecodeTask {
    /// Block until the decode reports back.
    pub fn wait(self) -> DecodeMessage {
        self.receiver
            .recv()
            .unwrap_or_else(|_| PlyError::WorkerGone.into())
    }

    /// The completion message, if the decode has finished.
    pub fn try_message(&self) -> Option<DecodeMessage> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(PlyError::WorkerGone.into()),
        }
    }
}

impl From<PlyError> for DecodeMessage {
    fn from(e: PlyError) -> Self {
        DecodeMessage::Failure {
            error: e.to_string(),
        }
    }
}

/// Decode `bytes` on a dedicated thread.
pub fn spawn_decode(bytes: Vec<u8>) -> Result<DecodeTask, PlyError> {
    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("ply-decode".to_string())
        .spawn(move || {
            // The receiver may be gone if the caller lost interest.
            let _ = sender.send(run(&bytes));
        })?;
    Ok(DecodeTask { receiver })
}

/// Decode `bytes` on tokio's blocking pool.
#[cfg(feature = "tokio")]
pub async fn decode_async(bytes: Vec<u8>) -> DecodeMessage {
    match tokio::task::spawn_blocking(move || run(&bytes)).await {
        Ok(message) => message,
        Err(_) => PlyError::WorkerGone.into(),
    }
}
