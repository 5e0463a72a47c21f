use core::error;
use std::sync::Arc;

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::{broadcast, mpsc},
};
use tracing::{debug, info, warn};

use crate::{
    command::{self, Command, HELP},
    config::ClientConfig,
    controller::{execute, Activation, Completion, Dispatch, SessionController},
    remote::{GameApi, HttpGameClient},
    store::{MemoryStore, SessionStore, SqliteStore},
    view,
};

type Result<T> = std::result::Result<T, Box<dyn error::Error>>;

const RESUME_PROMPT: &str = "Continue your previous game? [Y/n]";

/// Open the durable store, or keep the session in memory if that fails.
pub fn open_store(config: &ClientConfig) -> Box<dyn SessionStore> {
    match SqliteStore::open(&config.db_path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(
                "Could not open session store {}: {}. Progress will not survive a restart.",
                config.db_path, e
            );
            Box::new(MemoryStore::new())
        }
    }
}

// Run the request off the loop task and post the outcome back to it
fn spawn_dispatch<A>(
    api: Arc<A>,
    dispatch: Dispatch,
    completion_sender: mpsc::Sender<(Dispatch, Completion)>,
) where
    A: GameApi + 'static,
{
    tokio::spawn(async move {
        let completion = execute(api.as_ref(), dispatch.request()).await;
        if completion_sender.send((dispatch, completion)).await.is_err() {
            debug!("Client loop is gone, dropping completion");
        }
    });
}

/// Interactive session: reads commands from stdin and prints the board to stdout until the
/// operator quits, stdin closes, or a shutdown signal arrives.
pub async fn run(config: ClientConfig, shutdown_receiver: broadcast::Receiver<()>) -> Result<()> {
    run_with_input(config, BufReader::new(tokio::io::stdin()), shutdown_receiver).await
}

/// Same as [`run`], reading commands from `input`.
pub async fn run_with_input<R>(
    config: ClientConfig,
    input: R,
    mut shutdown_receiver: broadcast::Receiver<()>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let api = Arc::new(HttpGameClient::new(&config.api_base, config.request_timeout)?);
    info!("Using engine at {}", api.base_url());
    let mut controller = SessionController::load(open_store(&config));

    let (completion_sender, mut completion_receiver) = mpsc::channel::<(Dispatch, Completion)>(100);
    let mut lines = input.lines();

    let mut awaiting_resume = false;
    match controller.activate() {
        Activation::PromptResume(id) => {
            debug!("Asking whether to resume {}", id);
            println!("{}", RESUME_PROMPT);
            awaiting_resume = true;
        }
        Activation::Dispatch(dispatch) => {
            spawn_dispatch(api.clone(), dispatch, completion_sender.clone());
            println!("{}", view::render(&controller));
        }
        Activation::AlreadyActive => {}
    }

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("Input closed");
                        break;
                    }
                    Err(e) => {
                        warn!("Could not read input line: {}", e);
                        println!("Could not read that line, please type it again.");
                        continue;
                    }
                };
                if awaiting_resume {
                    awaiting_resume = false;
                    let keep = command::parse_confirmation(&line);
                    if let Some(dispatch) = controller.resolve_resume(keep) {
                        spawn_dispatch(api.clone(), dispatch, completion_sender.clone());
                    }
                    println!("{}", view::render(&controller));
                    continue;
                }
                let command = match command::parse(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                let mut dispatches = vec![];
                match command {
                    Command::Click(cells) => {
                        dispatches.extend(cells.into_iter().filter_map(|cell| controller.click(cell)));
                    }
                    Command::New => dispatches.push(controller.new_game()),
                    Command::Reset => dispatches.extend(controller.reset()),
                    Command::Name(name) => {
                        if !controller.set_player_name(&name) {
                            println!("Your name is locked until the next new game or reset.");
                        }
                    }
                    Command::Show => {}
                    Command::Help => {
                        println!("{}", HELP);
                        continue;
                    }
                    Command::Quit => break,
                }
                for dispatch in dispatches {
                    spawn_dispatch(api.clone(), dispatch, completion_sender.clone());
                }
                println!("{}", view::render(&controller));
            }
            completion = completion_receiver.recv() => {
                let Some((dispatch, completion)) = completion else {
                    break;
                };
                if let Some(next) = controller.complete(dispatch, completion) {
                    spawn_dispatch(api.clone(), next, completion_sender.clone());
                }
                println!("{}", view::render(&controller));
            }
            _ = shutdown_receiver.recv() => {
                break;
            }
        }
    }
    info!("Exiting checkers client");
    Ok(())
}
