//! Command-line arguments.

use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::{
    connection::ConnectionConfig,
    domain::{Credentials, Nickname, RoomName, ServerAddress, TransportSecurity, ValueObjectError},
};

#[derive(Debug, Parser)]
#[command(name = "parley")]
#[command(version, about = "Terminal chat client for Parley servers")]
#[command(long_about = "Parley connects to a chat server over WebSocket and lets you join and \
leave rooms from an interactive prompt.\n\n\
Prompt commands:\n\
  /connect          Connect (or reconnect) to the server\n\
  /disconnect       Leave the server gracefully\n\
  /join <room>      Join a room\n\
  /part <room>      Leave a room\n\
  /rooms            List joined rooms\n\
  /status           Show the connection status\n\
  /help             Show this list\n\
  /quit             Disconnect and exit")]
pub struct Args {
    /// Server host name or address
    #[arg(short, long, default_value = "127.0.0.1")]
    pub server: String,

    /// Server port (defaults to 6667, or 6697 with --tls)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Nickname to authenticate with
    #[arg(short, long)]
    pub nick: String,

    /// Password to authenticate with
    #[arg(long, env = "PARLEY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Connect over TLS (wss://)
    #[arg(long)]
    pub tls: bool,

    /// Bound on resolution, TLS and authentication
    #[arg(long, value_name = "SECS", default_value_t = 15)]
    pub handshake_timeout_secs: u64,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Room to join once connected (repeatable)
    #[arg(short, long = "join", value_name = "ROOM")]
    pub join: Vec<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArgsError {
    #[error("invalid --server: {0}")]
    Server(ValueObjectError),

    #[error("invalid --nick: {0}")]
    Nickname(ValueObjectError),

    #[error("invalid --join {room}: {source}")]
    Room {
        room: String,
        source: ValueObjectError,
    },
}

impl Args {
    pub fn to_config(&self) -> Result<ConnectionConfig, ArgsError> {
        let server = ServerAddress::new(self.server.clone()).map_err(ArgsError::Server)?;
        let nickname = Nickname::new(self.nick.clone()).map_err(ArgsError::Nickname)?;
        let credentials = match &self.password {
            Some(password) => Credentials::new(nickname).with_password(password.clone()),
            None => Credentials::new(nickname),
        };
        let security = if self.tls {
            TransportSecurity::Tls
        } else {
            TransportSecurity::Plain
        };

        let mut config = ConnectionConfig::new(server, credentials)
            .with_security(security)
            .with_handshake_timeout(Duration::from_secs(self.handshake_timeout_secs));
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        Ok(config)
    }

    /// Rooms from `--join`, validated.
    pub fn rooms(&self) -> Result<Vec<RoomName>, ArgsError> {
        self.join
            .iter()
            .map(|room| {
                RoomName::new(room.clone()).map_err(|source| ArgsError::Room {
                    room: room.clone(),
                    source,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("parley").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        // テスト項目: 最小限の引数でデフォルト設定になる
        // given (前提条件):
        let args = parse(&["--nick", "alice"]);

        // when (操作):
        let config = args.to_config().unwrap();

        // then (期待する結果):
        assert_eq!(config.server.as_str(), "127.0.0.1");
        assert_eq!(config.port, 6667);
        assert_eq!(config.security, TransportSecurity::Plain);
        assert_eq!(config.handshake_timeout, Duration::from_secs(15));
        assert_eq!(config.credentials.password, None);
        assert!(args.rooms().unwrap().is_empty());
    }

    #[test]
    fn test_tls_uses_tls_port_unless_overridden() {
        // テスト項目: --tls は 6697 を使い、--port が優先される
        let tls = parse(&["--nick", "alice", "--tls"]).to_config().unwrap();
        let custom = parse(&["--nick", "alice", "--tls", "--port", "8443"])
            .to_config()
            .unwrap();

        assert_eq!(tls.security, TransportSecurity::Tls);
        assert_eq!(tls.port, 6697);
        assert_eq!(custom.port, 8443);
    }

    #[test]
    fn test_repeatable_join() {
        // テスト項目: --join は複数指定できる
        let args = parse(&["--nick", "alice", "-j", "#rust", "--join", "#lounge"]);

        let rooms: Vec<String> = args
            .rooms()
            .unwrap()
            .into_iter()
            .map(RoomName::into_string)
            .collect();

        assert_eq!(rooms, vec!["#rust".to_string(), "#lounge".to_string()]);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        // テスト項目: 不正なニックネーム・部屋名はエラーになる
        let bad_nick = parse(&["--nick", "9lives"]).to_config();
        let bad_room = parse(&["--nick", "alice", "--join", "a,b"]).rooms();

        assert!(matches!(bad_nick, Err(ArgsError::Nickname(_))));
        assert!(matches!(bad_room, Err(ArgsError::Room { .. })));
    }

    #[test]
    fn test_nick_is_required() {
        // テスト項目: --nick は必須
        let result = Args::try_parse_from(["parley"]);
        assert!(result.is_err());
    }
}
