//! Domain factories for creating domain entities and value objects.

use super::ConnectionId;

/// Factory for generating ConnectionId instances.
///
/// Keeps id generation apart from the parsing/validation in ConnectionId.
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// Generate a new ConnectionId with a random UUID v4.
    pub fn generate() -> ConnectionId {
        ConnectionId::from_uuid(uuid::Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_factory_generate() {
        // テスト項目: ConnectionIdFactory::generate() で UUID v4 形式の ID を生成できる
        // when (操作):
        let id = ConnectionIdFactory::generate();

        // then (期待する結果):
        assert_eq!(id.to_string().len(), 36);
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_connection_id_factory_generate_uniqueness() {
        // テスト項目: ConnectionIdFactory::generate() は毎回異なる ID を生成する
        let id1 = ConnectionIdFactory::generate();
        let id2 = ConnectionIdFactory::generate();

        assert_ne!(id1, id2);
    }

    #[test]
    fn test_connection_id_round_trips_through_string() {
        // テスト項目: 文字列表現から同じ ConnectionId を復元できる
        let id = ConnectionIdFactory::generate();

        let parsed = ConnectionId::try_from(id.to_string()).unwrap();

        assert_eq!(parsed, id);
    }
}
