//! UseCase: 接続を閉じてレジストリから外す
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - CloseConnectionUseCase::execute() メソッド
//! - disconnect() → Disconnected を待つ → レジストリから削除
//!
//! ### なぜこのテストが必要か
//! - 切断が終わる前にレジストリから消えないことを保証
//! - 切断が終わらない場合に待ち続けないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：接続中の接続を閉じる、未接続の接続を閉じる
//! - 異常系：未登録の ID、切断のタイムアウト

use std::{sync::Arc, time::Duration};

use crate::{connection::ConnectionRepository, domain::ConnectionId};

use super::error::UseCaseError;

/// Default bound on waiting for `Disconnected`.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// 接続を閉じるユースケース
pub struct CloseConnectionUseCase {
    repository: Arc<dyn ConnectionRepository>,
    timeout: Duration,
}

impl CloseConnectionUseCase {
    pub fn new(repository: Arc<dyn ConnectionRepository>) -> Self {
        Self {
            repository,
            timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 接続を閉じる
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Disconnected になり、レジストリから削除された
    /// * `Err(UseCaseError)` - 未登録、タイムアウト、または削除の失敗
    pub async fn execute(&self, id: ConnectionId) -> Result<(), UseCaseError> {
        // 1. 接続を取得
        let connection = self.repository.get(id).await?;

        // 2. 切断を要求し、ワーカーが Disconnected に落ち着くのを待つ
        let settled = tokio::time::timeout(self.timeout, connection.disconnect_and_wait()).await;
        if settled.is_err() {
            tracing::warn!(connection = %id, timeout = ?self.timeout, "Connection did not disconnect in time");
            return Err(UseCaseError::CloseTimedOut {
                id,
                after: self.timeout,
            });
        }

        // 3. レジストリから削除（Disconnected 以外は StillActive で拒否される）
        self.repository.remove(id).await?;
        tracing::info!(connection = %id, "Connection closed");

        Ok(())
    }
}
