//! Online monitoring of *Linear Temporal Logic* (LTL) formulae
//! under the four-valued semantics of *Runtime Verification LTL* (RV-LTL).[^1]
//!
//! A trace is revealed one step at a time,
//! and after every step the [`Monitor`] reports the best verdict the observed prefix allows,
//! distinguishing verdicts that are settled ([`B4::True`], [`B4::False`])
//! from those that hold only if the trace were to end now
//! ([`B4::PresumablyTrue`], [`B4::PresumablyFalse`]).
//!
//! ```
//! use rvltl_core::{B4, FormulaBuilder, Ltl};
//!
//! let mut builder = FormulaBuilder::new();
//! let request = builder.new_named_atom("request");
//! let response = builder.new_named_atom("response");
//! // always (request implies eventually response)
//! let formula = builder
//!     .build(Ltl::always(Ltl::implies(request, Ltl::eventually(response))))
//!     .expect("atoms belong to the builder");
//!
//! let mut monitor = formula.monitor();
//! monitor.update([(request, false), (response, false)]).expect("complete step");
//! assert_eq!(monitor.evaluate(), B4::PresumablyTrue);
//! monitor.update([(request, true), (response, false)]).expect("complete step");
//! assert_eq!(monitor.evaluate(), B4::PresumablyFalse);
//! monitor.update([(request, false), (response, true)]).expect("complete step");
//! assert_eq!(monitor.evaluate(), B4::PresumablyTrue);
//! ```
//!
//! [^1]: Bauer, A., Leucker, M., & Schallhart, C. (2010). *Comparing LTL semantics for runtime verification*.
//! Journal of Logic and Computation, 20(3).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod b4;
mod formula;
mod monitor;
mod simulation;

pub use b4::{B4, ParseB4Error};
pub use formula::{Atom, Formula, FormulaBuilder, FormulaError, Ltl};
pub use monitor::{Key, MissingAtoms, Monitor};
pub use simulation::{RunOutcome, Simulation, SimulationError, Tally};
