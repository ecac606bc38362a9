//! Pure derivations over the latest game snapshot.
//!
//! Nothing in here mutates a [`Game`](crate::domain::Game); every function
//! classifies the snapshot it is handed. The only carried state is the single
//! reset bit inside [`TrapEdgeDetector`] and the timer inside [`TrapCue`].

pub mod legals;
pub mod scoreboard;
pub mod seating;
pub mod trap;

pub use legals::*;
pub use scoreboard::*;
pub use seating::*;
pub use trap::*;
