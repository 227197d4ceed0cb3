use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

/// One continuously running input stream, read in fixed-size frames.
#[async_trait]
pub trait AudioSource: Send {
    async fn read_frame(&mut self) -> Result<Vec<i16>>;
}

/// Regroups capture chunks of arbitrary length into frames of `frame_size`
/// samples.
pub struct FrameReader {
    rx: broadcast::Receiver<Vec<i16>>,
    frame_size: usize,
    pending: Vec<i16>,
}

impl FrameReader {
    pub fn new(rx: broadcast::Receiver<Vec<i16>>, frame_size: usize) -> Self {
        let frame_size = frame_size.max(1);
        Self {
            rx,
            frame_size,
            pending: Vec::with_capacity(frame_size * 2),
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }
}

#[async_trait]
impl AudioSource for FrameReader {
    async fn read_frame(&mut self) -> Result<Vec<i16>> {
        while self.pending.len() < self.frame_size {
            match self.rx.recv().await {
                Ok(chunk) => self.pending.extend_from_slice(&chunk),
                // Overruns are dropped audio, not a failure.
                Err(RecvError::Lagged(n)) => {
                    warn!("Audio buffer overrun, dropped {} chunks", n);
                }
                Err(RecvError::Closed) => {
                    return Err(anyhow::anyhow!("Audio stream closed"));
                }
            }
        }

        let rest = self.pending.split_off(self.frame_size);
        Ok(std::mem::replace(&mut self.pending, rest))
    }
}
