//! simstep - pause, resume and single-step a background simulation loop
//!
//! A worker thread runs the simulation and calls [`Stepper::step_point`] at
//! every place where it is fine to be suspended, tagging each place with a
//! caller-defined [`Grain`] (per cycle, per trial, ...). Controller threads,
//! typically a UI, drive the [`Stepper`]: run freely, step `n` points of a
//! given grain, pause, resume or stop. The worker never checkpoints its
//! state; it simply blocks inside `step_point` while paused.
//!
//! ```rust,no_run
//! use std::thread;
//! use simstep::{Config, Grain, Stepper};
//!
//! #[derive(Debug, Clone, PartialEq, Grain)]
//! enum Tick { Cycle, Trial }
//!
//! let stepper = Stepper::new(Tick::Cycle, Config::default().with_name("net"));
//! let worker = {
//!     let stepper = stepper.clone();
//!     thread::spawn(move || {
//!         'trials: loop {
//!             for _cycle in 0..100 {
//!                 // ... one cycle of the simulation ...
//!                 if stepper.step_point(&Tick::Cycle) { break 'trials; }
//!             }
//!             if stepper.step_point(&Tick::Trial) { break 'trials; }
//!         }
//!     })
//! };
//!
//! stepper.start_stepping(Tick::Trial, 1); // run one trial, then pause
//! // ... later
//! stepper.stop();
//! worker.join().unwrap();
//! ```
//!
//! See `demos/stepping.rs` for a complete controller/worker pairing.

mod callbacks;
mod config;
mod error;
mod gate;
mod grain;
mod run_state;
mod snapshot;
mod stepper;
mod watch;

mod internal;

pub use config::Config;
pub use error::Error;
pub use grain::Grain;
pub use run_state::RunState;
pub use snapshot::StepperSnapshot;
pub use stepper::Stepper;
pub use watch::StateWatcher;

#[cfg(feature = "macros")]
pub use simstep_macros::Grain;

pub type Result<T = ()> = std::result::Result<T, Error>;
