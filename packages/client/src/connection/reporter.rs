//! Classification and forwarding of connection failures.
//!
//! The reporter decides *what kind* of failure happened and how severe it
//! is. It never changes connection state; the state machine acts on the
//! severity.

use std::{sync::Arc, time::Duration};

use super::{config::ConfigError, dispatcher::NotificationDispatcher};
use crate::domain::{
    ConnectionError, ConnectionEvent, ConnectionId, ErrorKind, Severity, Status, TransportError,
};

pub struct ErrorReporter {
    connection: ConnectionId,
    dispatcher: Arc<NotificationDispatcher>,
}

impl ErrorReporter {
    pub fn new(connection: ConnectionId, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self {
            connection,
            dispatcher,
        }
    }

    /// Severity of `kind` raised while the connection is in `status`.
    pub fn classify(kind: ErrorKind, status: Status) -> Severity {
        if kind.is_local() || status == Status::Disconnecting {
            Severity::Recoverable
        } else {
            Severity::Fatal
        }
    }

    /// Error kind of a transport failure.
    pub fn kind_of(error: &TransportError) -> ErrorKind {
        match error {
            TransportError::Resolve { .. } => ErrorKind::HostResolution,
            TransportError::Tls(_) => ErrorKind::TransportSecurity,
            TransportError::AuthenticationRejected(_) => ErrorKind::Authentication,
            TransportError::Handshake(_) | TransportError::Malformed(_) => ErrorKind::Protocol,
            TransportError::Connect { .. } | TransportError::Io(_) | TransportError::Closed => {
                ErrorKind::Io
            }
        }
    }

    /// Build a classified error.
    pub fn error(
        &self,
        kind: ErrorKind,
        message: impl Into<String>,
        cause: Option<String>,
        status: Status,
    ) -> ConnectionError {
        ConnectionError::new(
            kind,
            message,
            cause,
            self.connection,
            Self::classify(kind, status),
        )
    }

    pub fn from_transport(&self, error: &TransportError, status: Status) -> ConnectionError {
        let kind = Self::kind_of(error);
        let message = match kind {
            ErrorKind::HostResolution => "could not resolve the server address",
            ErrorKind::TransportSecurity => "could not establish a secure channel",
            ErrorKind::Authentication => "the server rejected the credentials",
            ErrorKind::Protocol => "the server sent unexpected data",
            _ => "the connection to the server failed",
        };
        self.error(kind, message, Some(error.to_string()), status)
    }

    pub fn from_config(&self, error: &ConfigError, status: Status) -> ConnectionError {
        self.error(
            ErrorKind::Configuration,
            "invalid connection configuration",
            Some(error.to_string()),
            status,
        )
    }

    pub fn timeout(&self, operation: &str, after: Duration, status: Status) -> ConnectionError {
        self.error(
            ErrorKind::Timeout,
            format!("{} did not complete within {:?}", operation, after),
            None,
            status,
        )
    }

    pub fn invalid_state(&self, operation: &str, status: Status) -> ConnectionError {
        self.error(
            ErrorKind::InvalidState,
            format!("cannot {} while {}", operation, status),
            None,
            status,
        )
    }

    /// Log the error and forward it to observers.
    pub fn report(&self, error: &ConnectionError) {
        match error.severity() {
            Severity::Fatal => tracing::error!(
                connection = %self.connection,
                kind = ?error.kind(),
                cause = error.cause().unwrap_or("-"),
                "{}",
                error
            ),
            Severity::Recoverable => tracing::warn!(
                connection = %self.connection,
                kind = ?error.kind(),
                cause = error.cause().unwrap_or("-"),
                "{}",
                error
            ),
        }
        self.dispatcher
            .dispatch(ConnectionEvent::Error(error.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionIdFactory, ConnectionObserver};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Errors(Mutex<Vec<ConnectionError>>);

    impl ConnectionObserver for Errors {
        fn on_error(&self, error: &ConnectionError) {
            self.0.lock().unwrap().push(error.clone());
        }
    }

    fn reporter() -> (ErrorReporter, Arc<NotificationDispatcher>) {
        let id = ConnectionIdFactory::generate();
        let dispatcher = Arc::new(NotificationDispatcher::new(id));
        (ErrorReporter::new(id, dispatcher.clone()), dispatcher)
    }

    #[test]
    fn test_local_errors_are_recoverable() {
        // テスト項目: InvalidState と DuplicateRoom はどの状態でも回復可能
        for status in [
            Status::Disconnected,
            Status::Connecting,
            Status::Connected,
            Status::Disconnecting,
        ] {
            assert_eq!(
                ErrorReporter::classify(ErrorKind::InvalidState, status),
                Severity::Recoverable
            );
            assert_eq!(
                ErrorReporter::classify(ErrorKind::DuplicateRoom, status),
                Severity::Recoverable
            );
        }
    }

    #[test]
    fn test_session_errors_are_fatal_while_connected() {
        // テスト項目: 接続中の I/O・プロトコル・タイムアウトエラーは致命的
        for kind in [ErrorKind::Io, ErrorKind::Protocol, ErrorKind::Timeout] {
            assert_eq!(
                ErrorReporter::classify(kind, Status::Connected),
                Severity::Fatal
            );
        }
    }

    #[test]
    fn test_handshake_errors_are_fatal_while_connecting() {
        // テスト項目: 接続処理中の設定・名前解決・TLS・認証エラーは致命的
        for kind in [
            ErrorKind::Configuration,
            ErrorKind::HostResolution,
            ErrorKind::TransportSecurity,
            ErrorKind::Authentication,
            ErrorKind::Cancelled,
        ] {
            assert_eq!(
                ErrorReporter::classify(kind, Status::Connecting),
                Severity::Fatal
            );
        }
    }

    #[test]
    fn test_errors_during_teardown_are_recoverable() {
        // テスト項目: 切断処理中のタイムアウトは回復可能（切断処理は続行される）
        assert_eq!(
            ErrorReporter::classify(ErrorKind::Timeout, Status::Disconnecting),
            Severity::Recoverable
        );
    }

    #[test]
    fn test_transport_error_mapping() {
        // テスト項目: トランスポートエラーが正しい種別に分類される
        let cases = [
            (
                TransportError::Resolve {
                    host: "nowhere.invalid".to_string(),
                    reason: "no such host".to_string(),
                },
                ErrorKind::HostResolution,
            ),
            (
                TransportError::Tls("bad certificate".to_string()),
                ErrorKind::TransportSecurity,
            ),
            (
                TransportError::AuthenticationRejected("nope".to_string()),
                ErrorKind::Authentication,
            ),
            (
                TransportError::Handshake("HTTP 404".to_string()),
                ErrorKind::Protocol,
            ),
            (
                TransportError::Malformed("not json".to_string()),
                ErrorKind::Protocol,
            ),
            (
                TransportError::Connect {
                    addr: "127.0.0.1:1".to_string(),
                    reason: "refused".to_string(),
                },
                ErrorKind::Io,
            ),
            (TransportError::Io("reset".to_string()), ErrorKind::Io),
            (TransportError::Closed, ErrorKind::Io),
        ];

        for (error, expected) in cases {
            assert_eq!(ErrorReporter::kind_of(&error), expected, "{error}");
        }
    }

    #[test]
    fn test_from_transport_keeps_cause() {
        // テスト項目: 元のエラーが cause として保持される
        let (reporter, _) = reporter();
        let error = reporter.from_transport(
            &TransportError::AuthenticationRejected("bad password".to_string()),
            Status::Connecting,
        );

        assert_eq!(error.kind(), ErrorKind::Authentication);
        assert_eq!(
            error.cause(),
            Some("authentication rejected: bad password")
        );
        assert!(error.is_fatal());
    }

    #[test]
    fn test_report_forwards_to_observers() {
        // テスト項目: report はオブザーバーに Error イベントを届ける
        // given (前提条件):
        let (reporter, dispatcher) = reporter();
        let errors = Arc::new(Errors::default());
        dispatcher.register(errors.clone());

        // when (操作):
        let error = reporter.invalid_state("join", Status::Disconnected);
        reporter.report(&error);

        // then (期待する結果):
        let seen = errors.0.lock().unwrap().clone();
        assert_eq!(seen, vec![error]);
        assert_eq!(seen[0].message(), "cannot join while disconnected");
        assert!(!seen[0].is_fatal());
    }
}
