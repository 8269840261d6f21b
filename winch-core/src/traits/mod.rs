//! Hardware abstraction traits
//!
//! These traits define the interface between the motion logic and the
//! board-specific pieces that drive pins and keep time.

pub mod clock;
pub mod drive;
pub mod edge;

pub use clock::Clock;
pub use drive::{Direction, DirectionOutput, SpeedOutput};
pub use edge::EdgeGate;
