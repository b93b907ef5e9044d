//! First-order ordinary differential equation solver.
//!
//! The ODE layer sits on top of the equation isolator. An input equation
//! mentioning `diff(y, x)` is first rearranged into the normal form
//! `dy/dx = f(x, y)`, then `f` is classified by shape (direct, autonomous,
//! separable, common-factor, linear or Bernoulli) and reduced to
//! quadratures. An integration constant is attached and, when an initial
//! condition is supplied, resolved numerically.

pub mod classify;
pub mod constant;
pub mod error;
pub mod solve;
pub mod term;
pub mod verify;

pub use classify::ImplicitSolution;
pub use constant::{absorb_constant, fresh_symbol};
pub use error::OdeError;
pub use solve::dsolve;
pub use term::{find_derivative, DerivativeTerm};
