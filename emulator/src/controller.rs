//! Threaded execution driver wrapped around a [`Machine`].
//!
//! The controller owns the machine behind a mutex and runs it from a
//! worker thread, publishing a fresh [`Snapshot`] after every
//! successful step. Callers poll the latest snapshot; they never touch
//! the machine mid-run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::assembler::Assembled;
use crate::constants as C;
use crate::programs;
use crate::runtime::{disassemble, ListedCell, Machine, MachineState, Opcode, StepError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// A step or run was requested while a worker is still executing.
    #[error("the machine is already running")]
    Busy,

    #[error(transparent)]
    Step(#[from] StepError),
}

/// Whether a worker thread is currently driving the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    Halted,
    Running,
}

/// One cell of the disassembled instruction area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub address: C::Word,
    pub raw: C::Word,
    pub cell: ListedCell,
    /// The program counter points here.
    pub current: bool,
}

/// A machine state paired with the listing of its instruction area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub state: MachineState,
    pub listing: Vec<ListingEntry>,
}

impl Snapshot {
    /// Captures the machine state and disassembles the instruction
    /// area, up to the first HLT or the start of the stack region,
    /// whichever comes first.
    fn capture(machine: &Machine) -> Self {
        let state = machine.snapshot();
        let mut listing = Vec::new();

        let area = &state.memory[..C::STACK_START as usize];
        for (address, cell) in disassemble(area).into_iter().enumerate() {
            let address = address as C::Word;
            let halt = cell == ListedCell::Op(Opcode::Hlt);
            listing.push(ListingEntry {
                address,
                raw: area[address as usize],
                cell,
                current: address == state.registers.pc,
            });
            if halt {
                break;
            }
        }

        Self { state, listing }
    }
}

struct Worker {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Drives a [`Machine`] manually or from a worker thread.
pub struct Controller {
    machine: Arc<Mutex<Machine>>,
    latest: Arc<Mutex<Snapshot>>,
    fault: Arc<Mutex<Option<StepError>>>,
    worker: Option<Worker>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    #[must_use]
    pub fn new() -> Self {
        let machine = Machine::default();
        let latest = Snapshot::capture(&machine);
        Self {
            machine: Arc::new(Mutex::new(machine)),
            latest: Arc::new(Mutex::new(latest)),
            fault: Arc::new(Mutex::new(None)),
            worker: None,
        }
    }

    /// Loads an assembled program, stopping any running worker first.
    pub fn load(&mut self, program: &Assembled) {
        self.pause();
        let mut machine = lock(&self.machine);
        machine.load(&program.instructions, &program.arrays);
        *lock(&self.latest) = Snapshot::capture(&machine);
        *lock(&self.fault) = None;
    }

    /// Loads the built-in array-maximum program.
    pub fn load_default(&mut self) {
        self.load(&programs::array_max());
    }

    /// Whether a worker thread is live. Reaps a finished one.
    pub fn state(&mut self) -> ExecState {
        self.reap();
        if self.worker.is_some() {
            ExecState::Running
        } else {
            ExecState::Halted
        }
    }

    /// Drops the worker record once its thread has exited.
    fn reap(&mut self) {
        if self
            .worker
            .as_ref()
            .is_some_and(|worker| worker.handle.is_finished())
        {
            self.worker = None;
        }
    }

    /// Executes a single instruction on the caller's thread.
    ///
    /// # Errors
    ///
    /// [`ControllerError::Busy`] while a worker runs; otherwise any
    /// [`StepError`] the machine reports.
    pub fn step(&mut self) -> Result<(), ControllerError> {
        if self.state() == ExecState::Running {
            return Err(ControllerError::Busy);
        }

        let mut machine = lock(&self.machine);
        machine.step()?;
        *lock(&self.latest) = Snapshot::capture(&machine);
        Ok(())
    }

    /// Starts a worker thread stepping the machine until it halts,
    /// faults or is paused, sleeping `delay` between steps.
    ///
    /// # Errors
    ///
    /// [`ControllerError::Busy`] if a worker is already live.
    pub fn run(&mut self, delay: Duration) -> Result<(), ControllerError> {
        if self.state() == ExecState::Running {
            return Err(ControllerError::Busy);
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let machine = Arc::clone(&self.machine);
        let latest = Arc::clone(&self.latest);
        let fault = Arc::clone(&self.fault);
        let cancel_flag = Arc::clone(&cancel);

        debug!(?delay, "Starting worker");
        let handle = thread::spawn(move || loop {
            if cancel_flag.load(Ordering::Relaxed) {
                break;
            }
            if !delay.is_zero() {
                thread::sleep(delay);
            }

            let mut machine = lock(&machine);
            match machine.step() {
                Ok(()) => *lock(&latest) = Snapshot::capture(&machine),
                Err(StepError::Halted) => break,
                Err(error) => {
                    warn!(%error, "Execution fault");
                    *lock(&fault) = Some(error);
                    break;
                }
            }
        });

        self.worker = Some(Worker { cancel, handle });
        Ok(())
    }

    /// Stops the worker thread, if any, and waits for it to exit. The
    /// machine keeps its state and can be stepped or resumed.
    pub fn pause(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.cancel.store(true, Ordering::Relaxed);
            let _ = worker.handle.join();
        }
    }

    /// Blocks until the worker thread exits on its own.
    pub fn wait(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.handle.join();
        }
    }

    /// The snapshot published after the most recent step.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        lock(&self.latest).clone()
    }

    /// The fault that stopped the last run, if any. HLT is a normal
    /// stop, not a fault.
    #[must_use]
    pub fn last_error(&self) -> Option<StepError> {
        lock(&self.fault).clone()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.pause();
    }
}

/// Locks a mutex, continuing through poison: the machine state is
/// plain data and stays consistent even if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::assemble;

    #[test]
    fn step_publishes_snapshot_test() {
        let mut controller = Controller::new();
        controller.load(&assemble("PUSH 7\nOUT\nHLT").unwrap());

        controller.step().unwrap();
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state.registers.pc, 2);
        assert_eq!(snapshot.state.stack, vec![7]);

        controller.step().unwrap();
        assert_eq!(controller.snapshot().state.output, vec!["7".to_string()]);
    }

    #[test]
    fn listing_stops_at_first_halt_test() {
        let mut controller = Controller::new();
        controller.load(&assemble("PUSH 1\nOUT\nHLT").unwrap());

        let listing = controller.snapshot().listing;
        assert_eq!(listing.len(), 4);
        assert_eq!(listing[0].cell, ListedCell::Op(Opcode::Push));
        assert_eq!(listing[1].cell, ListedCell::Literal(1));
        assert_eq!(listing[3].cell, ListedCell::Op(Opcode::Hlt));
        assert!(listing[0].current);
        assert!(!listing[1].current);
    }

    #[test]
    fn run_to_completion_test() {
        let mut controller = Controller::new();
        controller.load(
            &assemble(indoc! {"
                PUSH 10
                PUSH 20
                ADD
                OUT
                HLT
            "})
            .unwrap(),
        );

        controller.run(Duration::ZERO).unwrap();
        controller.wait();

        assert_eq!(controller.state(), ExecState::Halted);
        assert_eq!(controller.last_error(), None);
        assert_eq!(
            controller.snapshot().state.output,
            vec!["30".to_string()]
        );
    }

    #[test]
    fn run_while_running_is_busy_test() {
        let mut controller = Controller::new();
        // An infinite loop keeps the worker alive
        controller.load(&assemble("loop:\nPUSH 0\nDROP\nJMP loop").unwrap());

        controller.run(Duration::from_millis(1)).unwrap();
        assert_eq!(controller.run(Duration::ZERO), Err(ControllerError::Busy));
        assert_eq!(controller.step(), Err(ControllerError::Busy));

        controller.pause();
        assert_eq!(controller.state(), ExecState::Halted);
    }

    #[test]
    fn pause_is_idempotent_test() {
        let mut controller = Controller::new();
        controller.pause();
        controller.pause();
        assert_eq!(controller.state(), ExecState::Halted);
    }

    #[test]
    fn default_program_prints_maximum_test() {
        let mut controller = Controller::new();
        controller.load_default();

        controller.run(Duration::ZERO).unwrap();
        controller.wait();

        assert_eq!(controller.last_error(), None);
        assert_eq!(
            controller.snapshot().state.output,
            vec!["111".to_string()]
        );
    }

    #[test]
    fn fault_is_reported_test() {
        let mut controller = Controller::new();
        // Address 0 holds 0, which decodes to no opcode
        controller.load(&Assembled::default());

        controller.run(Duration::ZERO).unwrap();
        controller.wait();

        assert_eq!(
            controller.last_error(),
            Some(StepError::InvalidOpcode {
                address: 0,
                code: 0
            })
        );
    }
}
