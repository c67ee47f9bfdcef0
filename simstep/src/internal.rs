mod control_state;
mod signal;

pub(crate) use control_state::ControlState;
pub(crate) use signal::Signal;
