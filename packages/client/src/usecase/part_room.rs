//! UseCase: 登録済みの接続で部屋から退出する

use std::sync::Arc;

use crate::{
    connection::ConnectionRepository,
    domain::{ConnectionId, RoomName},
};

use super::error::UseCaseError;

/// 部屋退出のユースケース
pub struct PartRoomUseCase {
    repository: Arc<dyn ConnectionRepository>,
}

impl PartRoomUseCase {
    pub fn new(repository: Arc<dyn ConnectionRepository>) -> Self {
        Self { repository }
    }

    /// 退出要求を送る。参加していない部屋なら何もしない
    pub async fn execute(&self, id: ConnectionId, room: RoomName) -> Result<(), UseCaseError> {
        let connection = self.repository.get(id).await?;
        connection.part(room).await?;
        Ok(())
    }
}
