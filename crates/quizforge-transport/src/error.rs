//! Error types for the transport layer.

/// Errors produced while carrying quiz traffic.
///
/// Each variant names the operation that failed; the quiz layers above
/// decide what a failure means for the player (usually that their
/// connection is gone and their seat should be released). A clean close
/// is not an error — `recv` reports it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Pushing an event to the client failed mid-write.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading the client's next intent failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding the listener or upgrading an incoming connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io(msg: &str) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::BrokenPipe, msg)
    }

    #[test]
    fn test_messages_name_the_operation() {
        assert!(TransportError::SendFailed(io("pipe"))
            .to_string()
            .starts_with("send failed"));
        assert!(TransportError::ReceiveFailed(io("reset"))
            .to_string()
            .starts_with("receive failed"));
        assert!(TransportError::AcceptFailed(io("in use"))
            .to_string()
            .starts_with("accept failed"));
    }

    #[test]
    fn test_source_is_preserved() {
        use std::error::Error as _;
        let err = TransportError::SendFailed(io("pipe"));
        assert!(err.source().is_some());
    }
}
