use x11rb::errors::{ConnectError, ConnectionError, ReplyError};

/// Fatal conditions. Everything else the manager runs into is skipped.
#[derive(Debug, thiserror::Error)]
pub enum WmError {
    #[error("cannot open display: {0}")]
    Connect(#[from] ConnectError),
    #[error("X11 connection lost: {0}")]
    Connection(#[from] ConnectionError),
    #[error("X11 request failed: {0}")]
    Reply(#[from] ReplyError),
    #[error("another window manager is already running")]
    AnotherWmRunning,
}
