//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length of a room name in bytes.
pub const ROOM_NAME_MAX_LEN: usize = 200;

/// Maximum length of a nickname in bytes.
pub const NICKNAME_MAX_LEN: usize = 32;

/// Path of the chat endpoint on the server.
pub const ENDPOINT_PATH: &str = "/chat";

/// Connection identifier value object.
///
/// Identifies one logical session; rooms refer back to their connection
/// through it without owning the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Uuid::parse_str(&value)
            .map(Self)
            .map_err(|_| ValueObjectError::ConnectionIdInvalidFormat(value))
    }
}

/// Room name value object.
///
/// Room names are case-insensitive per chat protocol convention: `#Lounge`
/// and `#lounge` name the same room. The original spelling is kept for
/// display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomName(String);

impl RoomName {
    /// Create a new RoomName.
    ///
    /// # Arguments
    ///
    /// * `name` - The room name (e.g. `#lounge`)
    ///
    /// # Returns
    ///
    /// A Result containing the RoomName or an error if validation fails
    pub fn new(name: String) -> Result<Self, ValueObjectError> {
        if name.is_empty() {
            return Err(ValueObjectError::RoomNameEmpty);
        }
        let len = name.len();
        if len > ROOM_NAME_MAX_LEN {
            return Err(ValueObjectError::RoomNameTooLong {
                max: ROOM_NAME_MAX_LEN,
                actual: len,
            });
        }
        if let Some(c) = name
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || *c == ',')
        {
            return Err(ValueObjectError::RoomNameInvalidCharacter(c));
        }
        Ok(Self(name))
    }

    /// Get the inner string value as originally spelled.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased key used for case-insensitive comparison.
    pub fn key(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// Case-insensitive equality against another name.
    pub fn matches(&self, other: &RoomName) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl PartialEq for RoomName {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl Eq for RoomName {}

impl Hash for RoomName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RoomName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RoomName {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl From<RoomName> for String {
    fn from(value: RoomName) -> Self {
        value.0
    }
}

/// Server address value object (host name or IP literal, without port).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerAddress(String);

impl ServerAddress {
    /// Create a new ServerAddress.
    pub fn new(host: String) -> Result<Self, ValueObjectError> {
        if host.is_empty() {
            return Err(ValueObjectError::ServerAddressEmpty);
        }
        if host.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValueObjectError::ServerAddressInvalid(host));
        }
        Ok(Self(host))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ServerAddress {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Nickname value object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nickname(String);

impl Nickname {
    /// Create a new Nickname.
    ///
    /// Nicknames are 1 to 32 bytes, contain no whitespace, and must not start
    /// with a channel prefix (`#`, `&`), a colon, or a digit.
    pub fn new(nickname: String) -> Result<Self, ValueObjectError> {
        if nickname.is_empty() {
            return Err(ValueObjectError::NicknameEmpty);
        }
        let len = nickname.len();
        if len > NICKNAME_MAX_LEN {
            return Err(ValueObjectError::NicknameTooLong {
                max: NICKNAME_MAX_LEN,
                actual: len,
            });
        }
        let starts_badly = nickname
            .chars()
            .next()
            .is_some_and(|c| matches!(c, '#' | '&' | ':') || c.is_ascii_digit());
        if starts_badly || nickname.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValueObjectError::NicknameInvalid(nickname));
        }
        Ok(Self(nickname))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Nickname {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Credentials presented during the handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub nickname: Nickname,
    pub password: Option<String>,
}

impl Credentials {
    /// Create credentials without a password.
    pub fn new(nickname: Nickname) -> Self {
        Self {
            nickname,
            password: None,
        }
    }

    /// Attach a password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

// The password never shows up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("nickname", &self.nickname)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Transport-security mode of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportSecurity {
    #[default]
    Plain,
    Tls,
}

impl TransportSecurity {
    /// Conventional port for this mode.
    pub fn default_port(&self) -> u16 {
        match self {
            TransportSecurity::Plain => 6667,
            TransportSecurity::Tls => 6697,
        }
    }

    /// WebSocket URL scheme for this mode.
    pub fn scheme(&self) -> &'static str {
        match self {
            TransportSecurity::Plain => "ws",
            TransportSecurity::Tls => "wss",
        }
    }
}

/// Where a transport connects: host, port and security mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub server: ServerAddress,
    pub port: u16,
    pub security: TransportSecurity,
}

impl Endpoint {
    pub fn new(server: ServerAddress, port: u16, security: TransportSecurity) -> Self {
        Self {
            server,
            port,
            security,
        }
    }

    /// `host:port`, with IPv6 literals bracketed.
    pub fn authority(&self) -> String {
        let host = self.server.as_str();
        if host.contains(':') {
            format!("[{}]:{}", host, self.port)
        } else {
            format!("{}:{}", host, self.port)
        }
    }

    /// WebSocket URL of the chat endpoint.
    pub fn url(&self) -> String {
        format!(
            "{}://{}{}",
            self.security.scheme(),
            self.authority(),
            ENDPOINT_PATH
        )
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a new Timestamp.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Current time.
    pub fn now() -> Self {
        Self(parley_shared::time::now_millis())
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_room_name_new_success() {
        // テスト項目: 有効なルーム名を作成できる
        // given (前提条件):
        let name = "#lounge".to_string();

        // when (操作):
        let result = RoomName::new(name);

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(result.unwrap().as_str(), "#lounge");
    }

    #[test]
    fn test_room_name_new_empty_fails() {
        // テスト項目: 空のルーム名は作成できない
        let result = RoomName::new("".to_string());

        assert_eq!(result.unwrap_err(), ValueObjectError::RoomNameEmpty);
    }

    #[test]
    fn test_room_name_new_too_long_fails() {
        // テスト項目: 201 バイト以上のルーム名は作成できない
        // given (前提条件):
        let name = format!("#{}", "a".repeat(200));

        // when (操作):
        let result = RoomName::new(name);

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ValueObjectError::RoomNameTooLong {
                max: 200,
                actual: 201
            }
        );
    }

    #[test]
    fn test_room_name_rejects_whitespace_and_comma() {
        // テスト項目: 空白やカンマを含むルーム名は作成できない
        assert_eq!(
            RoomName::new("#my room".to_string()).unwrap_err(),
            ValueObjectError::RoomNameInvalidCharacter(' ')
        );
        assert_eq!(
            RoomName::new("#a,#b".to_string()).unwrap_err(),
            ValueObjectError::RoomNameInvalidCharacter(',')
        );
    }

    #[test]
    fn test_room_name_is_case_insensitive() {
        // テスト項目: 大文字小文字だけが異なるルーム名は等価で、同じハッシュを持つ
        // given (前提条件):
        let upper = RoomName::new("#Lounge".to_string()).unwrap();
        let lower = RoomName::new("#lounge".to_string()).unwrap();

        // then (期待する結果):
        assert_eq!(upper, lower);
        assert_eq!(upper.key(), "#lounge");
        // 表示用には元の綴りが保持される
        assert_eq!(upper.as_str(), "#Lounge");

        let mut set = HashSet::new();
        set.insert(upper);
        assert!(!set.insert(lower));
    }

    #[test]
    fn test_nickname_validation() {
        // テスト項目: ニックネームのバリデーション
        assert!(Nickname::new("alice".to_string()).is_ok());
        assert_eq!(
            Nickname::new("".to_string()).unwrap_err(),
            ValueObjectError::NicknameEmpty
        );
        assert_eq!(
            Nickname::new("a".repeat(33)).unwrap_err(),
            ValueObjectError::NicknameTooLong {
                max: 32,
                actual: 33
            }
        );
        assert!(matches!(
            Nickname::new("#alice".to_string()),
            Err(ValueObjectError::NicknameInvalid(_))
        ));
        assert!(matches!(
            Nickname::new("9lives".to_string()),
            Err(ValueObjectError::NicknameInvalid(_))
        ));
        assert!(matches!(
            Nickname::new("al ice".to_string()),
            Err(ValueObjectError::NicknameInvalid(_))
        ));
    }

    #[test]
    fn test_server_address_validation() {
        // テスト項目: サーバーアドレスのバリデーション
        assert!(ServerAddress::new("irc.example.org".to_string()).is_ok());
        assert_eq!(
            ServerAddress::new("".to_string()).unwrap_err(),
            ValueObjectError::ServerAddressEmpty
        );
        assert!(matches!(
            ServerAddress::new("bad host".to_string()),
            Err(ValueObjectError::ServerAddressInvalid(_))
        ));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        // テスト項目: Debug 出力にパスワードが含まれない
        // given (前提条件):
        let credentials =
            Credentials::new(Nickname::new("alice".to_string()).unwrap()).with_password("hunter2");

        // when (操作):
        let rendered = format!("{:?}", credentials);

        // then (期待する結果):
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_transport_security_defaults() {
        // テスト項目: セキュリティモードごとの既定ポートとスキーム
        assert_eq!(TransportSecurity::Plain.default_port(), 6667);
        assert_eq!(TransportSecurity::Tls.default_port(), 6697);
        assert_eq!(TransportSecurity::Plain.scheme(), "ws");
        assert_eq!(TransportSecurity::Tls.scheme(), "wss");
    }

    #[test]
    fn test_connection_id_try_from_invalid() {
        // テスト項目: UUID 形式でない文字列から ConnectionId は作成できない
        let result = ConnectionId::try_from("not-a-uuid".to_string());

        assert_eq!(
            result.unwrap_err(),
            ValueObjectError::ConnectionIdInvalidFormat("not-a-uuid".to_string())
        );
    }

    #[test]
    fn test_timestamp_ordering() {
        // テスト項目: タイムスタンプは順序付けできる
        let ts1 = Timestamp::new(1000);
        let ts2 = Timestamp::new(2000);

        assert!(ts1 < ts2);
        assert_eq!(ts1.value(), 1000);
    }

    #[test]
    fn test_endpoint_url_brackets_ipv6() {
        // テスト項目: IPv6 リテラルは角括弧で囲まれた URL になる
        // given (前提条件):
        let endpoint = Endpoint::new(
            ServerAddress::new("::1".to_string()).unwrap(),
            6697,
            TransportSecurity::Tls,
        );

        // when (操作):
        let url = endpoint.url();

        // then (期待する結果):
        assert_eq!(url, "wss://[::1]:6697/chat");
        assert_eq!(endpoint.authority(), "[::1]:6697");
    }
}
