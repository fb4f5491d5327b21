// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Buffered interrupt channel
//!
//! A signal delivered before anyone waits is kept until the next wait.

use tokio::sync::mpsc;

/// Create a connected handle/receiver pair.
pub fn interrupt_channel() -> (InterruptHandle, Interrupt) {
    let (tx, rx) = mpsc::channel(1);
    (InterruptHandle { tx }, Interrupt { rx })
}

/// Sending side, cheap to clone into signal handlers.
#[derive(Clone, Debug)]
pub struct InterruptHandle {
    tx: mpsc::Sender<()>,
}

impl InterruptHandle {
    /// Request an interrupt. Repeated requests before the next wait collapse
    /// into one.
    pub fn trigger(&self) {
        if let Err(mpsc::error::TrySendError::Closed(())) = self.tx.try_send(()) {
            tracing::debug!("interrupt receiver gone");
        }
    }
}

#[derive(Debug)]
pub struct Interrupt {
    rx: mpsc::Receiver<()>,
}

impl Interrupt {
    /// Resolve once an interrupt is requested. Never resolves if every
    /// handle has been dropped.
    pub async fn wait(&mut self) {
        if self.rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    /// Consume a pending interrupt without waiting.
    pub fn take_pending(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }
}

#[cfg(test)]
#[path = "interrupt_tests.rs"]
mod tests;
