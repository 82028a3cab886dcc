use anyhow::{Context, Result};

use clap::{Parser, Subcommand};

use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::task;

use switcher::api::ApiClient;
use switcher::game::{Color, Coord};
use switcher::game_manager::ws_client::{ConnState, WsClient, WsEvent};
use switcher::game_manager::{GameManager, GameManagerToUI, UiCommand};
use switcher::lobby::GameList;
use switcher::name::validate_name;
use switcher::storage::SessionStore;
use switcher::{FigureCard, GameInfo, MovementCard, PlayerCredentials};

/// Terminal client for El Switcher: registers a player against the server
/// and follows the lobby or plays a game from the command line.
#[derive(Parser)]
struct Args {
    /// REST endpoint base.
    #[clap(long, default_value = "http://127.0.0.1:8000")]
    server: String,

    /// WebSocket endpoint base.
    #[clap(long, default_value = "ws://127.0.0.1:8000/ws")]
    ws: String,

    /// Player name to register with (not needed when resuming a session).
    #[clap(long)]
    name: Option<String>,

    /// Bearer token from an earlier registration; together with --player-id
    /// this resumes that session instead of registering a new player.
    #[clap(long)]
    token: Option<String>,

    /// Player id from an earlier registration.
    #[clap(long)]
    player_id: Option<i64>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow the lobby game list.
    List,
    /// Create a game and play in it.
    Create {
        game_name: String,
        #[clap(default_value_t = 2)]
        players: u8,
    },
    /// Join an existing game by id.
    Join { game_id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut api = ApiClient::new(&args.server);
    let creds = match (&args.token, args.player_id) {
        (Some(token), Some(id)) => {
            api.set_token(token);
            println!("resuming session as player {id}");
            PlayerCredentials {
                id,
                name: String::new(),
                token: token.clone(),
                game_id: None,
            }
        }
        _ => {
            let name = args
                .name
                .as_deref()
                .context("--name is required unless both --token and --player-id are given")?;
            validate_name(name).context("player name")?;
            let creds = api.create_player(name).await.context("creating player")?;
            println!("registered as {} (player {})", creds.name, creds.id);
            creds
        }
    };

    let mut store = SessionStore::new();
    store.set_auth_token(&creds.token);
    store.set_player_id(creds.id);

    match args.command {
        Command::List => watch_lobby(&args.ws).await,
        Command::Create { game_name, players } => {
            validate_name(&game_name).context("game name")?;
            let game = api
                .create_game(&game_name, players)
                .await
                .context("creating game")?;
            println!("created game {} ({})", game.name, game.id);
            run_game(&args.ws, api, store, game.id, creds.id).await
        }
        Command::Join { game_id } => {
            let resp = api.join_game(game_id).await.context("joining game")?;
            if let Some(line) = resp.message {
                println!("{line}");
            }
            run_game(&args.ws, api, store, game_id, creds.id).await
        }
    }
}

async fn watch_lobby(ws_base: &str) -> Result<()> {
    let url = url::Url::parse(&format!("{ws_base}/games")).context("lobby url")?;

    let (ws_tx, mut ws_rx) = mpsc::channel::<WsEvent>(16);
    let lobby_task = tokio::spawn(async move {
        let mut client = WsClient::new(url, ws_tx);
        client.run().await
    });

    let mut list = GameList::new();
    while let Some(ev) = ws_rx.recv().await {
        match ev {
            WsEvent::State(state) => print_conn_state(&state),
            WsEvent::Message(msg) => {
                list.apply(&msg.event);
                print_game_list(list.games());
            }
        }
    }

    lobby_task.await??;
    Ok(())
}

async fn run_game(
    ws_base: &str,
    api: ApiClient,
    store: SessionStore,
    game_id: i64,
    player_id: i64,
) -> Result<()> {
    let url = url::Url::parse(&format!("{ws_base}/games/{game_id}")).context("game url")?;

    let (ws_tx, ws_rx) = mpsc::channel::<WsEvent>(16);
    let (ui_cmd_tx, ui_cmd_rx) = mpsc::channel::<UiCommand>(16);
    let (to_ui_tx, to_ui_rx) = mpsc::channel::<GameManagerToUI>(64);

    let mut set = task::JoinSet::new();

    set.spawn(async move {
        let mut client = WsClient::new(url, ws_tx);
        client.run().await
    });

    set.spawn(async move {
        let mut gm = GameManager::new(game_id, player_id, api, store, ws_rx, ui_cmd_rx, to_ui_tx);
        gm.run().await
    });

    set.spawn(async move { ui_loop(player_id, ui_cmd_tx, to_ui_rx).await });

    // The tasks normally run until the game ends; report whichever finishes
    // or errors first.
    while let Some(v) = set.join_next().await {
        match v {
            Err(err) => println!("task panicked: {err:?}"),
            Ok(Err(err)) => println!("task failed: {err:?}"),
            Ok(Ok(())) => return Ok(()),
        }
    }

    Ok(())
}

/// Prints manager output and feeds stdin lines back as commands. Returns
/// when the game is won, the user quits, or the manager goes away.
async fn ui_loop(
    player_id: i64,
    to_gm: mpsc::Sender<UiCommand>,
    mut from_gm: mpsc::Receiver<GameManagerToUI>,
) -> Result<()> {
    println!("commands: start, skip, undo, clear, click R C, mov N, fig N, block P N, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut game: Option<GameInfo> = None;

    loop {
        tokio::select! {
            msg = from_gm.recv() => {
                let Some(msg) = msg else {
                    return Ok(());
                };
                if let GameManagerToUI::GameUpdated(g) = &msg {
                    game = Some((**g).clone());
                }
                print_ui_msg(&msg);
                if matches!(msg, GameManagerToUI::GameWon { .. }) {
                    return Ok(());
                }
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    // Stdin closed; keep following the game read-only.
                    break;
                };
                match parse_command(&line, player_id, game.as_ref()) {
                    Ok(Some(cmd)) => {
                        let quitting = matches!(cmd, UiCommand::QuitGame);
                        to_gm.send(cmd).await?;
                        if quitting {
                            return Ok(());
                        }
                    }
                    Ok(None) => {}
                    Err(reason) => println!("* {reason}"),
                }
            }
        }
    }

    while let Some(msg) = from_gm.recv().await {
        print_ui_msg(&msg);
        if matches!(msg, GameManagerToUI::GameWon { .. }) {
            return Ok(());
        }
    }
    Ok(())
}

/// Parses one input line. `Ok(None)` means a blank line; `Err` carries the
/// line to show the user.
fn parse_command(
    line: &str,
    player_id: i64,
    game: Option<&GameInfo>,
) -> Result<Option<UiCommand>, String> {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        return Ok(None);
    };

    let cmd = match word {
        "start" => UiCommand::StartGame,
        "skip" => UiCommand::FinishTurn,
        "undo" => UiCommand::CancelMovement,
        "clear" => UiCommand::ClearFocus,
        "quit" => UiCommand::QuitGame,
        "click" => {
            let row = arg_num(parts.next(), "click needs a row and a column")?;
            let col = arg_num(parts.next(), "click needs a row and a column")?;
            UiCommand::TileClick(Coord::new(row, col))
        }
        "mov" => {
            let index = arg_num(parts.next(), "mov needs a card index")?;
            UiCommand::FocusMovementCard(hand_movement(game, player_id, index)?)
        }
        "fig" => {
            let index = arg_num(parts.next(), "fig needs a card index")?;
            UiCommand::FocusFigureCard {
                card: hand_figure(game, player_id, index)?,
                owner: player_id,
            }
        }
        "block" => {
            let owner = arg_num(parts.next(), "block needs a player id and a card index")?;
            let index = arg_num(parts.next(), "block needs a player id and a card index")?;
            UiCommand::FocusFigureCard {
                card: hand_figure(game, owner, index)?,
                owner,
            }
        }
        _ => return Err(format!("unknown command {word:?}")),
    };

    Ok(Some(cmd))
}

fn arg_num<T: std::str::FromStr>(arg: Option<&str>, usage: &str) -> Result<T, String> {
    arg.and_then(|a| a.parse().ok())
        .ok_or_else(|| usage.to_string())
}

fn hand_movement(
    game: Option<&GameInfo>,
    player_id: i64,
    index: usize,
) -> Result<MovementCard, String> {
    let cards: Vec<&MovementCard> = player(game, player_id)?
        .movement_cards
        .iter()
        .filter(|c| c.in_hand)
        .collect();
    cards
        .get(index)
        .map(|c| (*c).clone())
        .ok_or_else(|| format!("no movement card {index} in hand"))
}

fn hand_figure(
    game: Option<&GameInfo>,
    player_id: i64,
    index: usize,
) -> Result<FigureCard, String> {
    player(game, player_id)?
        .figure_cards
        .get(index)
        .cloned()
        .ok_or_else(|| format!("player {player_id} has no figure card {index}"))
}

fn player<'a>(
    game: Option<&'a GameInfo>,
    player_id: i64,
) -> Result<&'a switcher::PlayerInGame, String> {
    game.and_then(|g| g.players.iter().find(|p| p.id == player_id))
        .ok_or_else(|| format!("player {player_id} is not in the game yet"))
}

fn print_conn_state(state: &ConnState) {
    match state {
        ConnState::Connecting => println!("connecting..."),
        ConnState::Connected => println!("connected"),
        ConnState::Disconnected(reason) => println!("disconnected: {reason}"),
    }
}

fn print_game_list(games: &[GameInfo]) {
    if games.is_empty() {
        println!("no games available right now");
        return;
    }
    for game in games {
        println!(
            "  [{}] {} ({}/{})",
            game.id,
            game.name,
            game.players.len(),
            game.player_amount,
        );
    }
}

fn print_ui_msg(msg: &GameManagerToUI) {
    match msg {
        GameManagerToUI::Conn(state) => print_conn_state(state),
        GameManagerToUI::Message(line) => println!("* {line}"),
        GameManagerToUI::GameUpdated(game) => {
            let turn = game
                .current_player()
                .map(|p| p.name.as_str())
                .unwrap_or("?");
            println!("game {:?}, turn: {}", game.status, turn);
        }
        GameManagerToUI::BoardUpdated(board) => {
            for row in board.snapshot() {
                let line: String = row.iter().map(color_char).collect();
                println!("  {line}");
            }
        }
        GameManagerToUI::FigureHighlights(tiles) => {
            println!("figures on board cover {} tiles", tiles.len());
        }
        GameManagerToUI::PartialMoveHighlights(tiles) => {
            println!("partial moves touch {} tiles", tiles.len());
        }
        GameManagerToUI::PossibleMoves(moves) => {
            let coords: Vec<String> = moves
                .iter()
                .map(|c| format!("({},{})", c.row, c.col))
                .collect();
            println!("possible moves: {}", coords.join(" "));
        }
        GameManagerToUI::GameWon { player_id } => {
            println!("player {player_id} won the game");
        }
    }
}

fn color_char(color: &Color) -> char {
    match color {
        Color::Red => 'R',
        Color::Blue => 'B',
        Color::Yellow => 'Y',
        Color::Green => 'G',
        Color::None => '.',
    }
}
