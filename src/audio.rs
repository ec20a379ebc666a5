//! Playback of synthesized chimes.
//!
//! The rodio output stream can't leave the thread that opened it, so one
//! background thread owns it and takes finished buffers over a bounded channel.

use std::{
    sync::mpsc::{self, Receiver, SyncSender, TrySendError},
    thread,
};

use log::{debug, error, info, warn};
use rodio::{buffer::SamplesBuffer, OutputStream, Sink};
use thiserror::Error;

use crate::{
    chime::{ChimeError, ToneRequest},
    communication::{Message, MessageType},
    synth::SAMPLE_RATE,
};

/// Chimes that can wait for the playback thread before new ones are turned away.
pub const QUEUE_DEPTH: usize = 4;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("couldn't open the default audio output")]
    Stream(#[from] rodio::StreamError),
    #[error("couldn't create an audio sink")]
    Sink(#[from] rodio::PlayError),
    #[error("the playback queue is full")]
    Busy,
    #[error("the playback thread has stopped")]
    Disconnected,
}

/// Handle to the playback thread. Dropping it ends the thread once the queue drains.
#[derive(Debug)]
pub struct Player {
    sender: SyncSender<Message>,
    next_id: u64,
}

impl Player {
    #[must_use]
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::sync_channel(QUEUE_DEPTH);
        if let Err(e) = thread::Builder::new()
            .name("chime-playback".to_string())
            .spawn(move || run(&receiver))
        {
            // the receiver is gone with the closure, so every send reports Disconnected
            error!("couldn't start the playback thread: {e}");
        }
        Self { sender, next_id: 0 }
    }

    /// Queues `samples` without blocking and returns the id used for them in the log.
    ///
    /// # Errors
    /// [`PlaybackError::Busy`] if the queue is full, [`PlaybackError::Disconnected`]
    /// if the playback thread is gone
    pub fn play(&mut self, samples: Vec<i16>, sample_rate: u32) -> Result<u64, PlaybackError> {
        let id = self.next_id + 1;
        self.sender
            .try_send(Message::new(MessageType::Play { samples, sample_rate }, id))
            .map_err(|e| match e {
                TrySendError::Full(_) => PlaybackError::Busy,
                TrySendError::Disconnected(_) => PlaybackError::Disconnected,
            })?;
        self.next_id = id;
        Ok(id)
    }

    /// Renders `request` at [`SAMPLE_RATE`] and queues it.
    ///
    /// # Errors
    /// if the request can't be synthesized or queued
    pub fn chime(&mut self, request: &ToneRequest) -> Result<u64, ChimeError> {
        let samples = request.render(SAMPLE_RATE)?;
        Ok(self.play(samples, SAMPLE_RATE)?)
    }

    pub fn stop(&self) {
        if self.sender.try_send(Message::new(MessageType::Stop, 0)).is_err() {
            warn!("couldn't ask the playback thread to stop");
        }
    }
}

fn run(receiver: &Receiver<Message>) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(output) => output,
        Err(e) => {
            error!("{}", PlaybackError::from(e));
            for message in receiver {
                warn!("dropping chime {}, no audio output", message.chime_id);
            }
            return;
        }
    };
    let mut current: Option<Sink> = None;
    for message in receiver {
        match message.kind {
            MessageType::Play {
                samples,
                sample_rate,
            } => {
                if let Some(sink) = current.take() {
                    sink.stop();
                }
                match Sink::try_new(&handle) {
                    Ok(sink) => {
                        sink.append(SamplesBuffer::new(1, sample_rate, samples));
                        info!("chime {} playing", message.chime_id);
                        current = Some(sink);
                    }
                    Err(e) => error!("chime {}: {}", message.chime_id, PlaybackError::from(e)),
                }
            }
            MessageType::Stop => {
                if let Some(sink) = current.take() {
                    sink.stop();
                    info!("chime stopped");
                }
            }
        }
    }
    debug!("playback thread exiting");
}

/// Plays `samples` on the calling thread and returns once they have finished.
///
/// # Errors
/// if there is no usable audio output
pub fn play_blocking(samples: Vec<i16>, sample_rate: u32) -> Result<(), PlaybackError> {
    let (_stream, handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&handle)?;
    sink.append(SamplesBuffer::new(1, sample_rate, samples));
    sink.sleep_until_end();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_queue_is_busy() {
        let (sender, receiver) = mpsc::sync_channel(QUEUE_DEPTH);
        let mut player = Player { sender, next_id: 0 };
        for expected in 1..=QUEUE_DEPTH as u64 {
            assert_eq!(player.play(vec![0; 4], 8000).unwrap(), expected);
        }
        assert!(matches!(player.play(vec![0; 4], 8000), Err(PlaybackError::Busy)));
        assert!(matches!(player.play(vec![0; 4], 8000), Err(PlaybackError::Busy)));

        let first = receiver.recv().unwrap();
        assert_eq!(first.chime_id, 1);
        assert!(matches!(first.kind, MessageType::Play { sample_rate: 8000, .. }));
        // turned away chimes don't use up ids
        let next = QUEUE_DEPTH as u64 + 1;
        assert_eq!(player.play(vec![0; 4], 8000).unwrap(), next);
        drop(receiver);
        assert!(matches!(
            player.play(vec![0; 4], 8000),
            Err(PlaybackError::Disconnected)
        ));
    }

    #[test]
    fn bad_request_never_reaches_the_queue() {
        let (sender, receiver) = mpsc::sync_channel(QUEUE_DEPTH);
        let mut player = Player { sender, next_id: 0 };
        let request = ToneRequest {
            waveform: crate::synth::Waveform::Sine,
            min_hz: 500.0,
            max_hz: 400.0,
            duration_secs: 1.0,
        };
        assert!(matches!(player.chime(&request), Err(ChimeError::Synth(_))));
        assert!(receiver.try_recv().is_err());
    }
}
