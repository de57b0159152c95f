//! Client main loop: one connection driven from the prompt.

use std::sync::Arc;

use rustyline::error::ReadlineError;
use thiserror::Error;
use tokio::task::JoinHandle;

use super::{
    cli::{Args, ArgsError},
    printer::{EventPrinter, format_rooms},
    repl::{self, ReplCommand},
};
use crate::{
    connection::{ChatConnection, ConnectionRepository},
    domain::{RoomName, Status},
    infrastructure::{repository::InMemoryConnectionRepository, transport::WebSocketConnector},
    usecase::{
        CloseConnectionUseCase, JoinRoomUseCase, OpenConnectionUseCase, PartRoomUseCase,
        UseCaseError,
    },
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Args(#[from] ArgsError),

    #[error(transparent)]
    UseCase(#[from] UseCaseError),

    #[error("failed to start the prompt: {0}")]
    Prompt(#[from] ReadlineError),
}

/// Open the connection described by `args` and serve the prompt until
/// `/quit`, EOF or Ctrl-C.
pub async fn run(args: Args) -> Result<(), ClientError> {
    let config = args.to_config()?;
    let rooms = args.rooms()?;

    let repository: Arc<dyn ConnectionRepository> = Arc::new(InMemoryConnectionRepository::new());
    let open = OpenConnectionUseCase::new(
        Arc::clone(&repository),
        Arc::new(WebSocketConnector::new()),
    )
    .with_observer(Arc::new(EventPrinter::new()));
    let join = JoinRoomUseCase::new(Arc::clone(&repository));
    let part = PartRoomUseCase::new(Arc::clone(&repository));
    let close = CloseConnectionUseCase::new(Arc::clone(&repository));

    let id = open.execute(config).await?;
    let connection = repository.get(id).await.map_err(UseCaseError::from)?;
    let auto_join = spawn_auto_join(connection.clone(), rooms);

    let mut lines = repl::spawn_prompt("> ")?;
    println!("Type /help for commands.");

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else { break };
                match repl::parse_command(&line) {
                    Ok(Some(ReplCommand::Quit)) => break,
                    Ok(Some(command)) => handle(command, &connection, &join, &part).await,
                    Ok(None) => {}
                    Err(e) => println!("{}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    auto_join.abort();
    if let Err(e) = close.execute(id).await {
        tracing::warn!(connection = %id, "Could not close the connection cleanly: {}", e);
    }
    Ok(())
}

async fn handle(
    command: ReplCommand,
    connection: &ChatConnection,
    join: &JoinRoomUseCase,
    part: &PartRoomUseCase,
) {
    let id = connection.id();
    match command {
        ReplCommand::Connect => {
            let status = connection.connect();
            if status != Status::Disconnected {
                println!("already {}", status);
            }
        }
        ReplCommand::Disconnect => {
            if connection.disconnect() == Status::Disconnected {
                println!("not connected");
            }
        }
        ReplCommand::Join(room) => report(join.execute(id, room).await),
        ReplCommand::Part(room) => report(part.execute(id, room).await),
        ReplCommand::Rooms => println!("{}", format_rooms(&connection.joined_rooms())),
        ReplCommand::Status => {
            let config = connection.config();
            println!(
                "{} ({}) as {}",
                connection.current_status(),
                config.endpoint_url(),
                config.credentials.nickname
            );
        }
        ReplCommand::Help => println!("{}", repl::HELP),
        ReplCommand::Quit => {}
    }
}

fn report(result: Result<(), UseCaseError>) {
    match result {
        Ok(()) => {}
        // Already printed from the Error event.
        Err(UseCaseError::Connection(_)) => {}
        Err(e) => println!("! {}", e),
    }
}

/// Join `rooms` every time the connection reaches `Connected`.
fn spawn_auto_join(connection: ChatConnection, rooms: Vec<RoomName>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if rooms.is_empty() {
            return;
        }
        let mut status = connection.subscribe_status();
        loop {
            if *status.borrow_and_update() == Status::Connected {
                for room in &rooms {
                    if let Err(e) = connection.join(room.clone()).await {
                        tracing::warn!(connection = %connection.id(), %room, "Auto-join failed: {}", e);
                    }
                }
            }
            if status.changed().await.is_err() {
                break;
            }
        }
    })
}
