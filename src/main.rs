use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use gomoku_agent::{
    agent::Agent, agent_provider::AgentProvider, agents::hybrid::HybridAgentProvider,
    difficulty::Difficulty,
};
use gomoku_core::{
    board::BOARD_SIZE,
    game::{Game, GameResult, Player},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, error::Error};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "gomoku.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SelfPlayOptions {
    games: usize,
    black: Difficulty,
    white: Difficulty,
    print_boards: bool,
}

impl Default for SelfPlayOptions {
    fn default() -> Self {
        Self {
            games: 1,
            black: Difficulty::Master,
            white: Difficulty::College,
            print_boards: false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Figment::new()
        .merge(Toml::file(CONFIG_PATH))
        .merge(Env::prefixed("GOMOKU_").split("__"));
    let options: SelfPlayOptions = Figment::from(Serialized::defaults(SelfPlayOptions::default()))
        .merge(config.focus("selfplay"))
        .extract()
        .unwrap_or_default();

    let mut black = HybridAgentProvider.create_agent(&config)?;
    let mut white = HybridAgentProvider.create_agent(&config)?;
    black.set_difficulty(options.black);
    white.set_difficulty(options.white);

    let mut results = BTreeMap::<String, usize>::new();

    for index in 0..options.games {
        black.new_game();
        white.new_game();

        let result = play(black.as_mut(), white.as_mut(), options.print_boards).await?;
        let label = match result {
            GameResult::Win(Player::Black) => format!("black ({}) wins", options.black),
            GameResult::Win(Player::White) => format!("white ({}) wins", options.white),
            GameResult::Draw => "draw".to_owned(),
        };

        info!(game = index + 1, result = %label, "game finished");
        *results.entry(label).or_default() += 1;
    }

    println!("results after {} game(s):", options.games);
    for (label, count) in results {
        println!("  {}: {}", label, count);
    }

    Ok(())
}

async fn play<'a>(
    black: &'a mut dyn Agent,
    white: &'a mut dyn Agent,
    print_boards: bool,
) -> Result<GameResult, Box<dyn Error + Send + Sync>> {
    let mut game = Game::new(BOARD_SIZE);

    loop {
        if let Some(result) = game.game_result() {
            if print_boards {
                println!("{}", game);
            }
            return Ok(result);
        }

        let agent = match game.turn() {
            Player::Black => &mut *black,
            Player::White => &mut *white,
        };

        let decision = agent.next_move(&game).await?;
        info!(
            ply = game.turn_count() + 1,
            player = game.turn().name(),
            position = %decision.position,
            source = decision.source.name(),
            confidence = decision.confidence,
            "move played"
        );

        if let Err(err) = game.place_stone(decision.position) {
            warn!(error = %err, "agent produced an illegal move");
            return Err(err.into());
        }

        if print_boards {
            println!("{}", game);
        }
    }
}
