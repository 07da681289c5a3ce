pub use descriptor::Descriptor;
pub use primitives::*;

mod descriptor;
mod primitives;
mod symbol;

pub use symbol::Symbol;

pub type AmqpSequence = List;
pub type AmqpValue = Value;
