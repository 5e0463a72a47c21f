use common::model::{
    game::{Board, Coord, Ply, Winner},
    messages::{BoardResponse, MoveResponse, SessionId, StartResponse},
};
use tracing::{debug, info, warn};

use crate::{
    history::{self, MoveHistory},
    remote::{ApiError, GameApi},
    store::{PersistedSession, SessionStore},
};

pub const DEFAULT_PLAYER_NAME: &str = "Human";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    // Nothing loaded, nothing asked yet
    Uninitialized,
    // A stored session exists, waiting for the operator to pick continue or new
    AwaitingResumeChoice,
    Resuming,
    Starting,
    // Board loaded. A game with a winner is still Active, it just ignores clicks
    Active,
}

/// Two-phase cell selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    AwaitingOrigin,
    AwaitingDestination(Coord),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Start,
    FetchBoard(SessionId),
    Move { session_id: SessionId, ply: Ply },
    Reset(SessionId),
}

impl Request {
    // The session this request is bound to, if any
    fn session_id(&self) -> Option<&SessionId> {
        match self {
            Request::Start => None,
            Request::FetchBoard(id) | Request::Reset(id) => Some(id),
            Request::Move { session_id, .. } => Some(session_id),
        }
    }
}

/// A remote request tagged with the controller generation it was issued in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    generation: u64,
    request: Request,
}

impl Dispatch {
    pub fn request(&self) -> &Request {
        &self.request
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Started(StartResponse),
    Board(BoardResponse),
    Moved(MoveResponse),
    Reset,
}

pub type Completion = Result<Reply, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Ask the operator whether to continue this session, then call `resolve_resume`.
    PromptResume(SessionId),
    Dispatch(Dispatch),
    AlreadyActive,
}

/// Run one request against the engine.
pub async fn execute<A: GameApi + ?Sized>(api: &A, request: &Request) -> Completion {
    match request {
        Request::Start => api.start_session().await.map(Reply::Started),
        Request::FetchBoard(id) => api.fetch_board(id).await.map(Reply::Board),
        Request::Move { session_id, ply } => {
            api.submit_move(session_id, *ply).await.map(Reply::Moved)
        }
        Request::Reset(id) => api.reset_session(id).await.map(|_| Reply::Reset),
    }
}

/// Owns the in-memory game session and keeps the store in step with it.
///
/// Operator actions return the remote request they need, if any. The caller runs it (see
/// [`execute`]) and hands the outcome back to [`SessionController::complete`], which may ask
/// for a follow-up request. Outcomes of requests issued before the latest successful New or
/// Reset are dropped. A New or Reset that fails leaves in-flight requests valid.
pub struct SessionController<S: SessionStore> {
    store: S,
    // What the store currently holds
    mirrored: PersistedSession,
    phase: Phase,
    session_id: Option<SessionId>,
    board: Option<Board>,
    winner: Winner,
    selection: Selection,
    last_move: Option<Coord>,
    history: MoveHistory,
    player_name: String,
    started: bool,
    message: String,
    loading: bool,
    generation: u64,
}

impl<S: SessionStore> SessionController<S> {
    /// Restore whatever the store remembers. This is the only time the store is read.
    pub fn load(store: S) -> Self {
        let persisted = PersistedSession::load(&store);
        debug!("Loaded persisted session: {:?}", persisted);
        SessionController {
            phase: Phase::Uninitialized,
            session_id: persisted.session_id.clone(),
            board: None,
            winner: Winner::None,
            selection: Selection::AwaitingOrigin,
            last_move: persisted.last_move,
            history: persisted.history.clone(),
            player_name: persisted
                .player_name
                .clone()
                .unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_owned()),
            started: persisted.started,
            message: String::new(),
            loading: false,
            generation: 0,
            mirrored: persisted,
            store,
        }
    }

    pub fn activate(&mut self) -> Activation {
        if self.phase != Phase::Uninitialized {
            return Activation::AlreadyActive;
        }
        let activation = match self.session_id.clone() {
            Some(id) => {
                info!("Found stored session {}", id);
                self.phase = Phase::AwaitingResumeChoice;
                Activation::PromptResume(id)
            }
            None => Activation::Dispatch(self.begin_start()),
        };
        self.mirror();
        activation
    }

    /// Continue the stored session (`keep`) or replace it with a new one.
    pub fn resolve_resume(&mut self, keep: bool) -> Option<Dispatch> {
        if self.phase != Phase::AwaitingResumeChoice {
            return None;
        }
        let dispatch = match (keep, self.session_id.clone()) {
            (true, Some(id)) => {
                self.phase = Phase::Resuming;
                self.loading = true;
                self.dispatch(Request::FetchBoard(id))
            }
            _ => self.begin_start(),
        };
        self.mirror();
        Some(dispatch)
    }

    /// Handle a click on `cell`. The second click of a pair produces a move request.
    pub fn click(&mut self, cell: Coord) -> Option<Dispatch> {
        if self.phase != Phase::Active || self.board.is_none() || self.loading {
            debug!("Ignoring click on {} while {:?}", cell, self.phase);
            return None;
        }
        if self.winner.is_over() {
            debug!("Ignoring click on {}, game is over", cell);
            return None;
        }
        match self.selection {
            Selection::AwaitingOrigin => {
                self.selection = Selection::AwaitingDestination(cell);
                None
            }
            Selection::AwaitingDestination(origin) => {
                // Cleared before the request goes out, whatever the engine says
                self.selection = Selection::AwaitingOrigin;
                let session_id = self.session_id.clone()?;
                Some(self.dispatch(Request::Move {
                    session_id,
                    ply: Ply::new(origin, cell),
                }))
            }
        }
    }

    pub fn new_game(&mut self) -> Dispatch {
        let dispatch = self.begin_start();
        self.mirror();
        dispatch
    }

    pub fn reset(&mut self) -> Option<Dispatch> {
        let Some(id) = self.session_id.clone() else {
            self.message = "No game ID found. Start a new game.".to_owned();
            return None;
        };
        if self.phase != Phase::Active {
            debug!("Ignoring reset while {:?}", self.phase);
            return None;
        }
        self.selection = Selection::AwaitingOrigin;
        Some(self.dispatch(Request::Reset(id)))
    }

    /// Rename the human player. Refused once the first move has been made.
    pub fn set_player_name(&mut self, name: &str) -> bool {
        if self.started {
            return false;
        }
        self.player_name = name.trim().to_owned();
        self.mirror();
        true
    }

    /// Apply the outcome of `dispatch`. Returns the next request to run, if any.
    pub fn complete(&mut self, dispatch: Dispatch, completion: Completion) -> Option<Dispatch> {
        if self.is_stale(&dispatch) {
            debug!("Discarding stale reply to {:?}", dispatch.request);
            return None;
        }
        let next = match (dispatch.request, completion) {
            (Request::Start, Ok(Reply::Started(response))) => {
                self.generation += 1;
                self.on_started(response);
                None
            }
            (Request::Start, Err(e)) => {
                warn!("Failed to start a new game: {}", e);
                self.message = "Failed to start a new game.".to_owned();
                self.loading = false;
                self.phase = if self.board.is_some() {
                    Phase::Active
                } else {
                    Phase::Uninitialized
                };
                None
            }
            (Request::FetchBoard(_), Ok(Reply::Board(response))) => {
                self.on_board(response);
                None
            }
            (Request::FetchBoard(id), Err(e)) => {
                warn!("Board fetch for {} failed: {}", id, e);
                if self.phase == Phase::Resuming {
                    let dispatch = self.begin_start();
                    self.message = "Previous game could not be loaded. Starting a new one.".to_owned();
                    Some(dispatch)
                } else {
                    self.message = "Failed to fetch board.".to_owned();
                    self.loading = false;
                    None
                }
            }
            (Request::Move { ply, .. }, Ok(Reply::Moved(response))) => {
                self.on_moved(ply, response);
                None
            }
            (Request::Move { ply, .. }, Err(e)) => {
                warn!("Move {} was not delivered: {}", ply, e);
                self.message = format!("Move could not be delivered: {}", e);
                None
            }
            (Request::Reset(id), Ok(Reply::Reset)) => {
                self.generation += 1;
                self.history.clear();
                self.last_move = None;
                self.player_name = DEFAULT_PLAYER_NAME.to_owned();
                self.started = false;
                self.message = "Game reset.".to_owned();
                self.loading = true;
                Some(self.dispatch(Request::FetchBoard(id)))
            }
            (Request::Reset(id), Err(e)) => {
                warn!("Reset of {} failed: {}", id, e);
                self.message = "Reset failed.".to_owned();
                None
            }
            (request, reply) => {
                warn!("Reply {:?} does not answer {:?}", reply, request);
                None
            }
        };
        self.mirror();
        next
    }

    /// Run `dispatch` and every follow-up it triggers, one at a time.
    pub async fn drive<A: GameApi + ?Sized>(&mut self, api: &A, dispatch: Dispatch) {
        let mut next = Some(dispatch);
        while let Some(dispatch) = next {
            let completion = execute(api, dispatch.request()).await;
            next = self.complete(dispatch, completion);
        }
    }

    fn begin_start(&mut self) -> Dispatch {
        self.phase = Phase::Starting;
        self.loading = true;
        self.selection = Selection::AwaitingOrigin;
        self.dispatch(Request::Start)
    }

    fn dispatch(&self, request: Request) -> Dispatch {
        Dispatch {
            generation: self.generation,
            request,
        }
    }

    fn is_stale(&self, dispatch: &Dispatch) -> bool {
        if dispatch.generation != self.generation {
            return true;
        }
        match dispatch.request.session_id() {
            Some(id) => self.session_id.as_ref() != Some(id),
            None => false,
        }
    }

    fn on_started(&mut self, response: StartResponse) {
        info!("Started game {}", response.game_id);
        self.session_id = Some(response.game_id);
        self.board = Some(response.board);
        self.winner = response.winner;
        self.selection = Selection::AwaitingOrigin;
        self.history.clear();
        self.last_move = None;
        self.started = false;
        self.phase = Phase::Active;
        self.loading = false;
        self.message = "New game created.".to_owned();
    }

    fn on_board(&mut self, response: BoardResponse) {
        if self.phase == Phase::Resuming {
            self.message = "Resumed previous game.".to_owned();
        }
        self.board = Some(response.board);
        self.winner = response.winner;
        self.selection = Selection::AwaitingOrigin;
        self.phase = Phase::Active;
        self.loading = false;
    }

    fn on_moved(&mut self, ply: Ply, response: MoveResponse) {
        if let Some(reconstruction) = history::reconstruct(&response, ply, &self.player_name) {
            self.history.prepend(reconstruction.records);
            self.last_move = Some(reconstruction.last_move);
            self.started = true;
        } else {
            debug!("Move {} rejected: {}", ply, response.message);
        }
        self.board = Some(response.board);
        self.winner = response.winner;
        self.message = response.message;
        if self.winner.is_over() {
            info!("Game over: {:?}", self.winner);
        }
    }

    // Write-on-change: push the fields that differ from what the store holds
    fn mirror(&mut self) {
        let current = PersistedSession {
            session_id: self.session_id.clone(),
            history: self.history.clone(),
            last_move: self.last_move,
            player_name: Some(self.player_name.clone()),
            started: self.started,
        };
        current.write_changes(&mut self.store, &self.mirrored);
        self.mirrored = current;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn winner(&self) -> Winner {
        self.winner
    }

    pub fn is_game_over(&self) -> bool {
        self.winner.is_over()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn last_move(&self) -> Option<Coord> {
        self.last_move
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
