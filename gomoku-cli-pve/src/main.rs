use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use gomoku_agent::{
    agent::Agent, agent_provider::AgentProvider, agents::hybrid::HybridAgentProvider,
};
use gomoku_core::{
    board::BOARD_SIZE,
    game::{Game, GameResult, PlaceStoneError, PlaceStoneResult, Player},
};
use std::io::Write;
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "gomoku.toml";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Figment::new()
        .merge(Toml::file(CONFIG_PATH))
        .merge(Env::prefixed("GOMOKU_").split("__"));
    let human: Player = config.extract_inner("human").unwrap_or(Player::Black);

    let mut agent = match HybridAgentProvider.create_agent(&config) {
        Ok(agent) => agent,
        Err(err) => {
            eprintln!("failed to create agent: {}", err);
            std::process::exit(1);
        }
    };
    agent.new_game();

    println!(
        "you play {} ({}), the engine plays at {} level",
        human.name(),
        human.symbol(),
        agent.difficulty()
    );

    let mut game = Game::new(BOARD_SIZE);

    while game.game_result().is_none() {
        println!("===========================");
        println!("{}", game);

        if game.turn() == human {
            place_stone(&mut game);
            continue;
        }

        let decision = match agent.next_move(&game).await {
            Ok(decision) => decision,
            Err(err) => {
                eprintln!("engine failed to move: {}", err);
                std::process::exit(1);
            }
        };

        println!();
        println!(
            "engine plays {} {}: {}",
            game.board()
                .position_to_notation(decision.position)
                .unwrap_or_default(),
            decision.position,
            decision.rationale
        );

        if let Err(err) = game.place_stone(decision.position) {
            eprintln!("engine produced an illegal move: {}", err);
            std::process::exit(1);
        }
    }

    println!("===========================");
    println!("{}", game);
    println!(
        "game result: {}",
        match game.game_result() {
            Some(GameResult::Win(winner)) if winner == human => "you win".to_owned(),
            Some(GameResult::Win(winner)) => format!("{} wins", winner.name()),
            Some(GameResult::Draw) | None => "draw".to_owned(),
        }
    );
}

fn read_position(game: &Game) -> Option<gomoku_core::board::Position> {
    println!();
    print!(
        "enter position to place stone for {} ({}): ",
        game.turn().name(),
        game.turn().symbol()
    );
    std::io::stdout().flush().ok()?;

    let mut input = String::new();
    if std::io::stdin().read_line(&mut input).ok()? == 0 {
        println!();
        std::process::exit(0);
    }

    game.board().parse_position(&input)
}

fn place_stone(game: &mut Game) -> PlaceStoneResult {
    loop {
        let Some(position) = read_position(game) else {
            println!("invalid position");
            continue;
        };

        match game.place_stone(position) {
            Ok(result) => {
                return result;
            }
            Err(err) => match err {
                PlaceStoneError::InvalidPosition {
                    position,
                    board_size,
                } => {
                    println!("invalid position: {} (board size: {})", position, board_size);
                }
                PlaceStoneError::StoneAlreadyPlaced { position, .. } => {
                    println!(
                        "stone already placed at: {}",
                        game.board()
                            .position_to_notation(position)
                            .unwrap_or_else(|| position.to_string())
                    );
                }
                PlaceStoneError::GameFinished => {
                    println!("the game is already finished");
                }
            },
        }
    }
}
