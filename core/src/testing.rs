//! In-memory OS double for unit tests.
//!
//! `FakeSystem` implements both capability traits over a scripted process
//! table and records every call, so tests can assert on the exact sequence
//! of OS interactions.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{PortNumber, ProcessRecord, Protocol};
use crate::error::{ResolutionError, SignalError};
use crate::ports::{ProcessControlPort, SignalKind, SocketOwnerPort};

/// One recorded interaction with the fake OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListOwners(u16, Option<Protocol>),
    Signal(u32, SignalKind),
    IsAlive(u32),
}

/// How a scripted process reacts to signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    ExitsOnGraceful,
    ExitsOnForceful,
    IgnoresSignals,
    DeniesSignals,
    /// Dead before termination starts.
    Exited,
    /// Passes the liveness check but is gone by the time the signal lands.
    VanishesBeforeSignal,
}

#[derive(Debug)]
struct FakeProcess {
    behavior: Behavior,
    alive: bool,
}

#[derive(Debug, Default)]
struct State {
    sockets: Vec<ProcessRecord>,
    processes: HashMap<u32, FakeProcess>,
    calls: Vec<Call>,
    resolution_error: Option<ResolutionError>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeSystem {
    state: Arc<Mutex<State>>,
}

impl FakeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a socket; its owner exits on the graceful signal unless
    /// scripted otherwise with [`FakeSystem::with_process`].
    pub fn with_socket(self, pid: u32, port: u16, protocol: Protocol, owner: &str) -> Self {
        let port = PortNumber::new(port).expect("test port is valid");
        {
            let mut state = self.state.lock();
            state
                .sockets
                .push(ProcessRecord::new(pid, port, protocol, owner));
            state.processes.entry(pid).or_insert(FakeProcess {
                behavior: Behavior::ExitsOnGraceful,
                alive: true,
            });
        }
        self
    }

    pub fn with_process(self, pid: u32, behavior: Behavior) -> Self {
        self.state.lock().processes.insert(
            pid,
            FakeProcess {
                behavior,
                alive: behavior != Behavior::Exited,
            },
        );
        self
    }

    /// Make every socket query fail.
    pub fn failing_with(self, error: ResolutionError) -> Self {
        self.state.lock().resolution_error = Some(error);
        self
    }

    /// Simulate a process exiting on its own.
    pub fn exit(&self, pid: u32) {
        if let Some(process) = self.state.lock().processes.get_mut(&pid) {
            process.alive = false;
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Only the signal calls, in order.
    pub fn signals(&self) -> Vec<(u32, SignalKind)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Signal(pid, kind) => Some((pid, kind)),
                _ => None,
            })
            .collect()
    }
}

impl SocketOwnerPort for FakeSystem {
    // Returns every registered socket regardless of port, so callers'
    // own port checks are exercised.
    async fn list_owners(
        &self,
        port: PortNumber,
        protocol: Option<Protocol>,
    ) -> Result<Vec<ProcessRecord>, ResolutionError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ListOwners(port.get(), protocol));
        match &state.resolution_error {
            Some(error) => Err(error.clone()),
            None => Ok(state.sockets.clone()),
        }
    }
}

impl ProcessControlPort for FakeSystem {
    fn send_signal(&self, pid: u32, kind: SignalKind) -> Result<(), SignalError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Signal(pid, kind));

        let Some(process) = state.processes.get_mut(&pid) else {
            return Err(SignalError::NoSuchProcess(pid));
        };
        if !process.alive {
            return Err(SignalError::NoSuchProcess(pid));
        }

        match (process.behavior, kind) {
            (Behavior::DeniesSignals, _) => return Err(SignalError::PermissionDenied(pid)),
            (Behavior::VanishesBeforeSignal, _) => {
                process.alive = false;
                return Err(SignalError::NoSuchProcess(pid));
            }
            (Behavior::ExitsOnGraceful, _) | (Behavior::ExitsOnForceful, SignalKind::Forceful) => {
                process.alive = false;
            }
            _ => {}
        }
        Ok(())
    }

    fn is_alive(&self, pid: u32) -> bool {
        let mut state = self.state.lock();
        state.calls.push(Call::IsAlive(pid));
        state.processes.get(&pid).map_or(false, |p| p.alive)
    }
}
