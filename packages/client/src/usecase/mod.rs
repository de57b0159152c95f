//! UseCase 層
//!
//! 接続レジストリ（ConnectionRepository）を介したアプリケーション操作。
//! UI 層から呼び出され、Domain 層と connection コアを操作します。

pub mod close_connection;
pub mod error;
pub mod join_room;
pub mod open_connection;
pub mod part_room;

pub use close_connection::{CloseConnectionUseCase, DEFAULT_CLOSE_TIMEOUT};
pub use error::UseCaseError;
pub use join_room::JoinRoomUseCase;
pub use open_connection::OpenConnectionUseCase;
pub use part_room::PartRoomUseCase;
