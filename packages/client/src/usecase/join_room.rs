//! UseCase: 登録済みの接続で部屋に参加する

use std::sync::Arc;

use crate::{
    connection::ConnectionRepository,
    domain::{ConnectionId, RoomName},
};

use super::error::UseCaseError;

/// 部屋参加のユースケース
pub struct JoinRoomUseCase {
    repository: Arc<dyn ConnectionRepository>,
}

impl JoinRoomUseCase {
    pub fn new(repository: Arc<dyn ConnectionRepository>) -> Self {
        Self { repository }
    }

    /// 参加要求を送る。部屋は、サーバーの確認後にロスターへ現れる
    pub async fn execute(&self, id: ConnectionId, room: RoomName) -> Result<(), UseCaseError> {
        let connection = self.repository.get(id).await?;
        connection.join(room).await?;
        Ok(())
    }
}
