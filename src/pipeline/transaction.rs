use std::mem;
use std::time::{Duration, Instant};

use crate::clipboard::SystemClipboard;
use crate::config::TimingsConfig;
use crate::error::PipelineError;
use crate::input::InputInjector;
use crate::render::TextRenderer;

/// Transaction timer durations, converted out of configuration
#[derive(Debug, Clone)]
pub struct Timings {
    pub copy_fast: Duration,
    pub copy_fallback: Duration,
    pub read_tiers: Vec<Duration>,
    pub write_tiers: Vec<Duration>,
    pub poll_interval: Duration,
    pub settle: Duration,
    pub send_delay: Duration,
}

impl Timings {
    /// Build from configuration; empty tier lists fall back to the defaults
    /// so every phase has at least one window
    pub fn from_config(timings: &TimingsConfig, send_delay_ms: u64) -> Timings {
        let defaults = TimingsConfig::default();
        let read_ms = if timings.read_tier_ms.is_empty() {
            log::warn!("readTierMs is empty, using defaults");
            &defaults.read_tier_ms
        } else {
            &timings.read_tier_ms
        };
        let write_ms = if timings.write_tier_ms.is_empty() {
            log::warn!("writeTierMs is empty, using defaults");
            &defaults.write_tier_ms
        } else {
            &timings.write_tier_ms
        };

        Timings {
            copy_fast: Duration::from_millis(timings.copy_fast_ms),
            copy_fallback: Duration::from_millis(timings.copy_fallback_ms),
            read_tiers: read_ms.iter().copied().map(Duration::from_millis).collect(),
            write_tiers: write_ms
                .iter()
                .copied()
                .map(Duration::from_millis)
                .collect(),
            poll_interval: Duration::from_millis(timings.poll_interval_ms),
            settle: Duration::from_millis(timings.settle_ms),
            send_delay: Duration::from_millis(send_delay_ms),
        }
    }

    fn copy_total_ms(&self) -> u64 {
        (self.copy_fast + self.copy_fallback).as_millis() as u64
    }

    fn write_total_ms(&self) -> u64 {
        self.write_tiers.iter().map(|d| d.as_millis() as u64).sum()
    }
}

/// Publicly observable phase of the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Copying,
    Reading,
    Rendering,
    Writing,
    Pasting,
    AwaitingSubmit,
    Releasing,
}

/// Terminal result of one transaction, reported exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Delivered,
    Failed(PipelineError),
}

/// Internal phase, carrying the data each step needs.
///
/// Deadlines are absolute instants fixed when the phase is entered; the
/// escalating tiers are therefore sequential windows, not cumulative ones.
enum Phase {
    Idle,
    Copying {
        /// Sequence snapshot taken before the copy chord went out
        seq0: u64,
        deadline: Instant,
        next_poll: Instant,
        fallback_injected: bool,
    },
    Reading {
        tier: usize,
        tier_deadline: Instant,
        next_poll: Instant,
        attempts: u32,
    },
    Rendering {
        text: String,
    },
    Writing {
        bmp: Vec<u8>,
        tier: usize,
        tier_deadline: Instant,
        next_poll: Instant,
    },
    Pasting,
    AwaitingSubmit {
        submit_at: Instant,
    },
    Releasing {
        reopen_at: Instant,
        outcome: Outcome,
    },
}

/// The copy -> read -> render -> write -> paste -> submit state machine.
///
/// All waiting is expressed as deadlines checked against the `now` handed to
/// `tick`, so the machine never sleeps and tests drive it with synthetic
/// instants. At most one phase transition fires per tick.
///
/// The clipboard is only read after the observed sequence number has moved
/// past the snapshot taken at trigger time; text sitting on the clipboard
/// from before the trigger can never leak into a transaction.
pub struct ClipboardTransaction {
    phase: Phase,
    timings: Timings,
    max_width: u32,
    clipboard: Box<dyn SystemClipboard>,
    input: Box<dyn InputInjector>,
    renderer: TextRenderer,
}

impl ClipboardTransaction {
    pub fn new(
        clipboard: Box<dyn SystemClipboard>,
        input: Box<dyn InputInjector>,
        renderer: TextRenderer,
        timings: Timings,
        max_width: u32,
    ) -> ClipboardTransaction {
        ClipboardTransaction {
            phase: Phase::Idle,
            timings,
            max_width,
            clipboard,
            input,
            renderer,
        }
    }

    pub fn state(&self) -> PipelineState {
        match self.phase {
            Phase::Idle => PipelineState::Idle,
            Phase::Copying { .. } => PipelineState::Copying,
            Phase::Reading { .. } => PipelineState::Reading,
            Phase::Rendering { .. } => PipelineState::Rendering,
            Phase::Writing { .. } => PipelineState::Writing,
            Phase::Pasting => PipelineState::Pasting,
            Phase::AwaitingSubmit { .. } => PipelineState::AwaitingSubmit,
            Phase::Releasing { .. } => PipelineState::Releasing,
        }
    }

    /// Swap in new settings; takes effect from the next transaction
    pub fn reconfigure(&mut self, timings: Timings, renderer: TextRenderer, max_width: u32) {
        self.timings = timings;
        self.renderer = renderer;
        self.max_width = max_width;
    }

    /// Start a transaction: snapshot the sequence number, inject the copy
    /// chord, and enter the copying phase. Returns false when not idle.
    pub fn trigger(&mut self, now: Instant) -> bool {
        if !matches!(self.phase, Phase::Idle) {
            return false;
        }

        let seq0 = self.clipboard.sequence();
        if let Err(e) = self.input.send_copy() {
            // The copy window will expire into the fallback, then time out
            log::warn!("Copy injection failed: {}", e);
        }
        log::debug!("Transaction started at clipboard sequence {}", seq0);
        self.phase = Phase::Copying {
            seq0,
            deadline: now + self.timings.copy_fast,
            next_poll: now + self.timings.poll_interval,
            fallback_injected: false,
        };
        true
    }

    /// Advance the machine. Returns the outcome on the tick that closes the
    /// transaction; the caller releases its gate exactly when this is Some.
    pub fn tick(&mut self, now: Instant) -> Option<Outcome> {
        let phase = mem::replace(&mut self.phase, Phase::Idle);
        let (next, outcome) = self.step(phase, now);
        self.phase = next;
        outcome
    }

    fn step(&mut self, phase: Phase, now: Instant) -> (Phase, Option<Outcome>) {
        match phase {
            Phase::Idle => (Phase::Idle, None),

            Phase::Copying {
                seq0,
                deadline,
                next_poll,
                fallback_injected,
            } => {
                if now < next_poll && now < deadline {
                    return (
                        Phase::Copying {
                            seq0,
                            deadline,
                            next_poll,
                            fallback_injected,
                        },
                        None,
                    );
                }
                // Fence first: a copy that landed beats an expired window
                if self.clipboard.sequence() != seq0 {
                    log::debug!("Clipboard sequence moved, reading");
                    return (
                        Phase::Reading {
                            tier: 0,
                            tier_deadline: now + self.timings.read_tiers[0],
                            next_poll: now,
                            attempts: 0,
                        },
                        None,
                    );
                }
                if now >= deadline {
                    if fallback_injected {
                        return self.fail(
                            PipelineError::CopyTimeout(self.timings.copy_total_ms()),
                            now,
                        );
                    }
                    log::debug!("Copy window expired, trying select-all fallback");
                    if let Err(e) = self.input.send_select_all() {
                        log::warn!("Select-all injection failed: {}", e);
                    }
                    if let Err(e) = self.input.send_copy() {
                        log::warn!("Copy injection failed: {}", e);
                    }
                    return (
                        Phase::Copying {
                            seq0,
                            deadline: now + self.timings.copy_fallback,
                            next_poll: now + self.timings.poll_interval,
                            fallback_injected: true,
                        },
                        None,
                    );
                }
                (
                    Phase::Copying {
                        seq0,
                        deadline,
                        next_poll: now + self.timings.poll_interval,
                        fallback_injected,
                    },
                    None,
                )
            }

            Phase::Reading {
                tier,
                tier_deadline,
                next_poll,
                attempts,
            } => {
                if now < next_poll && now < tier_deadline {
                    return (
                        Phase::Reading {
                            tier,
                            tier_deadline,
                            next_poll,
                            attempts,
                        },
                        None,
                    );
                }
                let attempts = attempts + 1;
                match self.clipboard.read_text() {
                    Ok(Some(text)) if !text.trim().is_empty() => {
                        log::debug!(
                            "Read {} chars from clipboard on attempt {}",
                            text.chars().count(),
                            attempts
                        );
                        return (Phase::Rendering { text }, None);
                    }
                    Ok(Some(_)) => log::debug!("Clipboard text is whitespace-only, retrying"),
                    Ok(None) => log::debug!("Clipboard holds no text format yet"),
                    Err(e) => log::debug!("Clipboard read attempt {} failed: {}", attempts, e),
                }
                if now >= tier_deadline {
                    let next_tier = tier + 1;
                    if next_tier >= self.timings.read_tiers.len() {
                        return self.fail(PipelineError::ReadEmpty(attempts), now);
                    }
                    log::debug!("Read tier {} exhausted, escalating", tier);
                    return (
                        Phase::Reading {
                            tier: next_tier,
                            tier_deadline: now + self.timings.read_tiers[next_tier],
                            next_poll: now + self.timings.poll_interval,
                            attempts,
                        },
                        None,
                    );
                }
                (
                    Phase::Reading {
                        tier,
                        tier_deadline,
                        next_poll: now + self.timings.poll_interval,
                        attempts,
                    },
                    None,
                )
            }

            Phase::Rendering { text } => {
                let rendered = self.renderer.render(&text, self.max_width);
                log::info!(
                    "Rendered {} chars into a {}x{} image",
                    text.chars().count(),
                    rendered.width,
                    rendered.height
                );
                match rendered.to_bmp_bytes() {
                    Ok(bmp) => (
                        Phase::Writing {
                            bmp,
                            tier: 0,
                            tier_deadline: now + self.timings.write_tiers[0],
                            next_poll: now,
                        },
                        None,
                    ),
                    Err(e) => self.fail(PipelineError::RenderFailure(e.to_string()), now),
                }
            }

            Phase::Writing {
                bmp,
                tier,
                tier_deadline,
                next_poll,
            } => {
                if now < next_poll && now < tier_deadline {
                    return (
                        Phase::Writing {
                            bmp,
                            tier,
                            tier_deadline,
                            next_poll,
                        },
                        None,
                    );
                }
                match self.clipboard.write_image(&bmp) {
                    Ok(()) => {
                        log::debug!("Image written to clipboard ({} bytes)", bmp.len());
                        return (Phase::Pasting, None);
                    }
                    Err(e) => log::debug!("Clipboard write attempt failed: {}", e),
                }
                if now >= tier_deadline {
                    let next_tier = tier + 1;
                    if next_tier >= self.timings.write_tiers.len() {
                        return self.fail(
                            PipelineError::WriteContention(self.timings.write_total_ms()),
                            now,
                        );
                    }
                    log::debug!("Write tier {} exhausted, escalating", tier);
                    return (
                        Phase::Writing {
                            bmp,
                            tier: next_tier,
                            tier_deadline: now + self.timings.write_tiers[next_tier],
                            next_poll: now + self.timings.poll_interval,
                        },
                        None,
                    );
                }
                (
                    Phase::Writing {
                        bmp,
                        tier,
                        tier_deadline,
                        next_poll: now + self.timings.poll_interval,
                    },
                    None,
                )
            }

            Phase::Pasting => {
                if let Err(e) = self.input.send_paste() {
                    log::warn!("Paste injection failed: {}", e);
                }
                (
                    Phase::AwaitingSubmit {
                        submit_at: now + self.timings.send_delay,
                    },
                    None,
                )
            }

            Phase::AwaitingSubmit { submit_at } => {
                if now < submit_at {
                    return (Phase::AwaitingSubmit { submit_at }, None);
                }
                if let Err(e) = self.input.send_submit() {
                    log::warn!("Submit injection failed: {}", e);
                }
                log::debug!("Submitted, settling for {:?}", self.timings.settle);
                (
                    Phase::Releasing {
                        reopen_at: now + self.timings.settle,
                        outcome: Outcome::Delivered,
                    },
                    None,
                )
            }

            Phase::Releasing { reopen_at, outcome } => {
                if now < reopen_at {
                    return (Phase::Releasing { reopen_at, outcome }, None);
                }
                match &outcome {
                    Outcome::Delivered => log::info!("Transaction delivered"),
                    Outcome::Failed(e) => log::debug!("Transaction closed after failure: {}", e),
                }
                (Phase::Idle, Some(outcome))
            }
        }
    }

    /// Abort the transaction. The warning carries the user-facing message
    /// to the notice channel; the machine closes without settling.
    fn fail(&self, err: PipelineError, now: Instant) -> (Phase, Option<Outcome>) {
        log::warn!("{}", err);
        (
            Phase::Releasing {
                reopen_at: now,
                outcome: Outcome::Failed(err),
            },
            None,
        )
    }
}
