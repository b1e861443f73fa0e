//! Probabilistic cellular automaton of a cancer/immune cell population on an
//! N x N grid, with Monte Carlo estimators of the cancer-cell count distribution.

pub mod counting;
pub mod display;
pub mod error;
pub mod estimator;
pub mod grid;
pub mod model;
pub mod proliferation;
pub mod random;
pub mod simulation;

pub use automata_common::{ModelVariant, Params};
pub use counting::{type_count, TypeCounts};
pub use error::{AutomatonError, Result};
pub use estimator::{pdf, pdf_rolling, Pmf, RollingSchedule};
pub use grid::{local_density, CellState, Direction, Grid};
pub use model::{step, StepStats};
pub use random::{stream_for_run, RandomStream};
pub use simulation::{init_state, iterate, iterate_endcount, AutomatonSimulation};
