use tokio::sync::watch::error::RecvError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown run state: '{0}'")]
    UnknownRunState(String),

    #[error("All stepper handles have been dropped: {0}")]
    StepperDropped(#[from] RecvError),
}
