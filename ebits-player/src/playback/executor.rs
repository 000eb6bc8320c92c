//! Instruction executor
//!
//! Pulls PCM chunks from the audio source one at a time and replays the whole
//! validated script against each chunk. Seek, speed and volume are held per
//! chunk; depending on [`ContinuityMode`] they either restart from defaults on
//! every chunk or carry over from the previous one. History and status always
//! span the run.
//!
//! Status transitions:
//!
//! ```text
//!  HALTED --PLAY--> PLAYING --PAUSE--> PAUSED
//!     ^                |  \
//!     |             sink fails
//!   HALT (ends run)    v
//!                    ERROR (ends current chunk only)
//! ```

use super::observer::PlaybackObserver;
use super::state::{Modifiers, PlaybackState};
use crate::audio::{dsp, wav, AudioFormat, AudioSource, PcmChunk, PlaybackSink};
use crate::error::Result;
use crate::script::{Instruction, Opcode, Operand, Script};
use chrono::Utc;
use ebits_common::config::ContinuityMode;
use ebits_common::events::{EbitsEvent, PlaybackStatus, StateSnapshot};
use ebits_common::human_time::format_millis;
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub status: PlaybackStatus,
    pub halted: bool,
    pub chunks_processed: usize,
    /// Buffers the sink accepted
    pub dispatches: usize,
    pub sink_failures: usize,
    pub history: Vec<&'static str>,
}

/// How the replay of one chunk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkOutcome {
    Completed,
    SinkFailed,
    Halted,
}

/// Working data for the chunk being replayed
struct ChunkContext {
    index: usize,
    format: AudioFormat,
    /// PCM as seen by the next PLAY (after any REPEAT)
    pcm: Vec<u8>,
}

/// Interprets a validated script against an audio source
pub struct Executor {
    sink: Arc<dyn PlaybackSink>,
    observer: Arc<dyn PlaybackObserver>,
    continuity: ContinuityMode,
    state: PlaybackState,
    run_id: Uuid,
    dispatches: usize,
    sink_failures: usize,
    snapshot_tx: watch::Sender<StateSnapshot>,
}

impl Executor {
    pub fn new(
        sink: Arc<dyn PlaybackSink>,
        observer: Arc<dyn PlaybackObserver>,
        continuity: ContinuityMode,
    ) -> Self {
        let state = PlaybackState::new();
        let (snapshot_tx, _) = watch::channel(state.snapshot());
        Self {
            sink,
            observer,
            continuity,
            state,
            run_id: Uuid::new_v4(),
            dispatches: 0,
            sink_failures: 0,
            snapshot_tx,
        }
    }

    /// Current state (read-only)
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Id of the current or most recent run
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Read-only view of the state, refreshed after every instruction
    pub fn watch(&self) -> watch::Receiver<StateSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Execute `script` against every chunk of `source`.
    ///
    /// Stops early on HALT. Sink failures end only the current chunk; any
    /// other error aborts the run.
    pub async fn run(&mut self, script: Script, source: AudioSource) -> Result<RunSummary> {
        self.reset_run();

        info!(
            "Run {} started: {} instruction(s), {} file(s), {}",
            self.run_id,
            script.len(),
            source.files().len(),
            source.format()
        );
        self.emit(EbitsEvent::RunStarted {
            run_id: self.run_id,
            instruction_count: script.len(),
            file_count: source.files().len(),
            timestamp: Utc::now(),
        });

        let mut chunks_processed = 0;

        if script.is_empty() {
            warn!("Script has no instructions, nothing to play");
        } else {
            let chunks = source.chunks();
            futures::pin_mut!(chunks);

            while let Some(chunk) = chunks.next().await {
                let chunk = chunk?;
                chunks_processed += 1;

                if self.replay_chunk(&script, chunk).await? == ChunkOutcome::Halted {
                    break;
                }
            }
        }

        let summary = RunSummary {
            run_id: self.run_id,
            status: self.state.status,
            halted: self.state.halted,
            chunks_processed,
            dispatches: self.dispatches,
            sink_failures: self.sink_failures,
            history: self.state.history.clone(),
        };

        info!(
            "Run {} finished: status {}, {} chunk(s), {} dispatch(es), {} sink failure(s)",
            summary.run_id,
            summary.status,
            summary.chunks_processed,
            summary.dispatches,
            summary.sink_failures
        );
        self.emit(EbitsEvent::RunFinished {
            run_id: self.run_id,
            status: summary.status,
            chunks_processed,
            dispatches: summary.dispatches,
            halted: summary.halted,
            timestamp: Utc::now(),
        });

        Ok(summary)
    }

    fn reset_run(&mut self) {
        self.state = PlaybackState::new();
        self.run_id = Uuid::new_v4();
        self.dispatches = 0;
        self.sink_failures = 0;
        self.publish();
    }

    async fn replay_chunk(&mut self, script: &Script, chunk: PcmChunk) -> Result<ChunkOutcome> {
        if self.continuity == ContinuityMode::Reset {
            self.state.modifiers = Modifiers::default();
        }

        debug!(
            "Chunk {} (file {}): {} bytes, {:.3}s",
            chunk.index,
            chunk.file_index,
            chunk.pcm.len(),
            chunk.duration_seconds()
        );
        self.emit(EbitsEvent::ChunkStarted {
            run_id: self.run_id,
            chunk_index: chunk.index,
            file_index: chunk.file_index,
            bytes: chunk.pcm.len(),
            timestamp: Utc::now(),
        });

        let mut ctx = ChunkContext {
            index: chunk.index,
            format: chunk.format,
            pcm: chunk.pcm,
        };

        for instruction in script.instructions() {
            let outcome = self.dispatch(instruction, &mut ctx).await?;

            self.emit(EbitsEvent::InstructionExecuted {
                run_id: self.run_id,
                chunk_index: ctx.index,
                line: instruction.line,
                mnemonic: instruction.opcode.mnemonic().to_string(),
                snapshot: self.state.snapshot(),
                timestamp: Utc::now(),
            });
            self.publish();

            if let Some(outcome) = outcome {
                return Ok(outcome);
            }
        }

        Ok(ChunkOutcome::Completed)
    }

    /// Apply one instruction; `Some` ends the chunk
    async fn dispatch(
        &mut self,
        instruction: &Instruction,
        ctx: &mut ChunkContext,
    ) -> Result<Option<ChunkOutcome>> {
        let opcode = instruction.opcode;
        self.state.record(opcode.mnemonic(), instruction.line);
        debug!("Line {}: {}", instruction.line, opcode);

        match (opcode, instruction.operand) {
            (Opcode::Play, _) => return self.play(instruction.line, ctx).await,
            (Opcode::Pause, _) => self.set_status(PlaybackStatus::Paused),
            (Opcode::Halt, _) => {
                self.state.halted = true;
                self.set_status(PlaybackStatus::Halted);
                return Ok(Some(ChunkOutcome::Halted));
            }
            (Opcode::Delay, Operand::Delay(duration)) => {
                debug!("Delaying {}", format_millis(duration.as_millis() as u64));
                tokio::time::sleep(duration).await;
            }
            (Opcode::Forward, Operand::Seconds(seconds)) => self.state.modifiers.forward(seconds),
            (Opcode::Backward, Operand::Seconds(seconds)) => self.state.modifiers.backward(seconds),
            (Opcode::VolumeUp, _) => self.state.modifiers.volume_up(),
            (Opcode::VolumeDown, _) => self.state.modifiers.volume_down(),
            // The operand is validated but the step is fixed
            (Opcode::SpeedUp, _) => self.state.modifiers.speed_up(),
            (Opcode::SpeedDown, _) => self.state.modifiers.speed_down(),
            (Opcode::Repeat, Operand::Count(times)) => {
                self.state.repeat_count = times;
                if times > 1 {
                    ctx.pcm = dsp::repeat(&ctx.pcm, times);
                }
            }
            (Opcode::Jump, Operand::Jump(target)) => self.state.modifiers.jump(target),
            (opcode, operand) => {
                warn!("Line {}: {} ignored with operand {:?}", instruction.line, opcode, operand);
            }
        }

        Ok(None)
    }

    async fn play(&mut self, line: usize, ctx: &ChunkContext) -> Result<Option<ChunkOutcome>> {
        self.set_status(PlaybackStatus::Playing);

        let modifiers = self.state.modifiers;
        let format = ctx.format;
        let bits = format.bits_per_sample;

        let mut pcm = if modifiers.seek_seconds > 0.0 {
            dsp::seek(&ctx.pcm, bits, format.channels, format.sample_rate, modifiers.seek_seconds)?
        } else {
            ctx.pcm.clone()
        };
        if modifiers.speed != 1.0 {
            pcm = dsp::change_speed(&pcm, bits, modifiers.speed)?;
        }
        if modifiers.volume != 1.0 {
            pcm = dsp::set_volume(&pcm, bits, modifiers.volume)?;
        }

        let sample_rate = (format.sample_rate as f64 * modifiers.speed).round() as u32;
        let buffer = wav::encode(&pcm, AudioFormat { sample_rate, ..format })?;
        let bytes = buffer.len();

        match self.sink.play(buffer).await {
            Ok(()) => {
                self.dispatches += 1;
                debug!("Dispatched {} bytes at {} Hz to {}", bytes, sample_rate, self.sink.name());
                self.emit(EbitsEvent::BufferDispatched {
                    run_id: self.run_id,
                    chunk_index: ctx.index,
                    bytes,
                    sample_rate,
                    timestamp: Utc::now(),
                });
                Ok(None)
            }
            Err(e) if e.is_recoverable() => {
                self.sink_failures += 1;
                warn!(
                    "Line {}: {} sink failed on chunk {}: {}; skipping rest of chunk",
                    line,
                    self.sink.name(),
                    ctx.index,
                    e
                );
                self.set_status(PlaybackStatus::Error);
                self.emit(EbitsEvent::SinkFailed {
                    run_id: self.run_id,
                    chunk_index: ctx.index,
                    line,
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });
                Ok(Some(ChunkOutcome::SinkFailed))
            }
            Err(e) => Err(e),
        }
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if let Some(old_status) = self.state.set_status(status) {
            debug!("Status {} -> {}", old_status, status);
            self.emit(EbitsEvent::StatusChanged {
                run_id: self.run_id,
                old_status,
                new_status: status,
                timestamp: Utc::now(),
            });
        }
    }

    fn emit(&self, event: EbitsEvent) {
        self.observer.on_event(&event);
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.state.snapshot());
    }
}
