// src/worker.rs

use std::{
    panic::{self, AssertUnwindSafe},
    thread::{self, JoinHandle},
};

use crossbeam::channel::{unbounded, Receiver, SendError, Sender};
use strum_macros::Display;

use crate::{
    orchestrator::{BatchReport, Outcome, TweakOrchestrator},
    tweaks::Tweak,
};

/// What to do with a single tweak.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum TweakAction {
    /// Back up, run, persist as enabled.
    Enable,
    /// Restore from the stored backup.
    Disable,
    Toggle,
    /// Run the script without backup or persistence.
    ApplyOnce,
}

#[derive(Clone, Debug)]
pub enum WorkerMessage {
    Execute { tweak: Tweak, action: TweakAction },
    ApplyBatch { tweaks: Vec<Tweak> },
    Shutdown,
}

#[derive(Clone, Debug)]
pub enum WorkerEvent {
    Started {
        id: String,
        action: TweakAction,
    },
    /// A single-tweak operation finished. `tweak` carries the updated flags.
    Completed {
        tweak: Tweak,
        outcome: Outcome,
        message: String,
    },
    BatchProgress {
        index: usize,
        total: usize,
        id: String,
        outcome: Outcome,
    },
    BatchFinished {
        tweaks: Vec<Tweak>,
        report: BatchReport,
    },
}

/// Owns the orchestrator on a background thread and runs one message at a
/// time, in submission order.
pub struct TweakWorker {
    sender: Sender<WorkerMessage>,
    receiver: Receiver<WorkerEvent>,
    handle: Option<JoinHandle<()>>,
}

impl TweakWorker {
    pub fn start(orchestrator: TweakOrchestrator) -> Self {
        let (task_sender, task_receiver) = unbounded::<WorkerMessage>();
        let (event_sender, event_receiver) = unbounded::<WorkerEvent>();

        let handle = thread::spawn(move || {
            let mut orchestrator = orchestrator;

            // Keep a panicking operation from silently killing the worker.
            let thread_result = panic::catch_unwind(AssertUnwindSafe(|| {
                while let Ok(message) = task_receiver.recv() {
                    match message {
                        WorkerMessage::Execute { tweak, action } => {
                            run_single(&mut orchestrator, &event_sender, tweak, action);
                        }
                        WorkerMessage::ApplyBatch { tweaks } => {
                            run_batch(&orchestrator, &event_sender, tweaks);
                        }
                        WorkerMessage::Shutdown => {
                            tracing::info!("TweakWorker received shutdown signal.");
                            break;
                        }
                    }
                }
            }));

            if let Err(e) = thread_result {
                tracing::error!("Worker thread panicked: {:?}", e);
            }

            tracing::info!("TweakWorker thread terminating.");
        });

        Self {
            sender: task_sender,
            receiver: event_receiver,
            handle: Some(handle),
        }
    }

    pub fn submit(&self, message: WorkerMessage) -> Result<(), SendError<WorkerMessage>> {
        self.sender.send(message)
    }

    /// Blocks for the next event. `None` once the worker has stopped.
    pub fn recv_event(&self) -> Option<WorkerEvent> {
        self.receiver.recv().ok()
    }

    /// Asks the worker to stop after the queued messages and waits for it.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.sender.send(WorkerMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Failed to join worker thread.");
            }
        }
    }
}

impl Drop for TweakWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn send(events: &Sender<WorkerEvent>, event: WorkerEvent) {
    if let Err(e) = events.send(event) {
        tracing::error!("Failed to send worker event: {:?}", e);
    }
}

fn run_single(
    orchestrator: &mut TweakOrchestrator,
    events: &Sender<WorkerEvent>,
    mut tweak: Tweak,
    action: TweakAction,
) {
    tracing::info!("{} -> Starting {}.", tweak.id, action);
    send(
        events,
        WorkerEvent::Started {
            id: tweak.id.clone(),
            action,
        },
    );

    let outcome = match action {
        TweakAction::Enable => orchestrator.execute_with_backup(&mut tweak),
        TweakAction::Disable => orchestrator.revert(&mut tweak),
        TweakAction::Toggle => orchestrator.toggle(&mut tweak),
        TweakAction::ApplyOnce => orchestrator.execute_only(&mut tweak),
    };

    let message = outcome.message(&tweak.title);
    if outcome.is_success() {
        tracing::info!("{} -> {}", tweak.id, message);
    } else {
        tracing::warn!("{} -> {}", tweak.id, message);
    }

    send(
        events,
        WorkerEvent::Completed {
            tweak,
            outcome,
            message,
        },
    );
}

fn run_batch(orchestrator: &TweakOrchestrator, events: &Sender<WorkerEvent>, mut tweaks: Vec<Tweak>) {
    let total = tweaks.len();
    tracing::info!("Starting batch of {} tweak(s).", total);

    let report = orchestrator.apply_batch_with(&mut tweaks, |index, tweak, outcome| {
        send(
            events,
            WorkerEvent::BatchProgress {
                index,
                total,
                id: tweak.id.clone(),
                outcome,
            },
        );
    });

    send(events, WorkerEvent::BatchFinished { tweaks, report });
}
