//! UseCase: 接続を開く
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - OpenConnectionUseCase::execute() メソッド
//! - 設定の検証 → 接続の生成 → レジストリ登録 → connect() の順序
//!
//! ### なぜこのテストが必要か
//! - 不正な設定は I/O の前に弾かれることを保証
//! - 登録に失敗した接続は接続を開始しないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録されてハンドシェイクが始まる
//! - 異常系：設定エラー、レジストリの登録失敗

use std::sync::Arc;

use crate::{
    connection::{ChatConnection, ConnectionConfig, ConnectionRepository},
    domain::{ConnectionId, ConnectionObserver, Connector},
};

use super::error::UseCaseError;

/// 接続を開くユースケース
pub struct OpenConnectionUseCase {
    repository: Arc<dyn ConnectionRepository>,
    connector: Arc<dyn Connector>,
    /// 新しい接続に connect() より前に登録する observer
    observers: Vec<Arc<dyn ConnectionObserver>>,
}

impl OpenConnectionUseCase {
    pub fn new(repository: Arc<dyn ConnectionRepository>, connector: Arc<dyn Connector>) -> Self {
        Self {
            repository,
            connector,
            observers: Vec::new(),
        }
    }

    /// Observe every connection this use case opens, from its first event.
    pub fn with_observer(mut self, observer: Arc<dyn ConnectionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// 接続を生成・登録し、接続を開始する
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionId)` - 登録した接続の ID。ハンドシェイクの結果はイベントで届く
    /// * `Err(UseCaseError)` - 設定エラー、または登録失敗
    pub async fn execute(&self, config: ConnectionConfig) -> Result<ConnectionId, UseCaseError> {
        // 1. I/O の前に設定を検証
        config.validate()?;

        // 2. 接続を生成して observer を登録
        let connection = ChatConnection::spawn(config, Arc::clone(&self.connector));
        for observer in &self.observers {
            connection.register_observer(Arc::clone(observer));
        }

        // 3. レジストリに登録
        let id = connection.id();
        self.repository.add(connection.clone()).await?;

        // 4. 接続開始（結果はイベントで通知される）
        connection.connect();
        tracing::info!(connection = %id, server = %connection.config().server, "Connection opened");

        Ok(id)
    }
}
