use crate::commands::Context;
use anyhow::{anyhow, Result};
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use duelpot_core::{Amount, Ledger};
use duelpot_lottery::{GameConfig, GameSnapshot, LotteryGame};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum GameCommands {
    /// Create a new game
    New {
        /// Operator account name
        operator: String,
        /// Stake per player, in units
        stake: u64,
    },
    /// Join a game
    Join {
        /// Account name to join with
        account: String,
        /// Game ID to join
        game_id: String,
        /// Deposit in units (defaults to the game stake)
        #[arg(long)]
        deposit: Option<u64>,
    },
    /// List the players of a game in join order
    Players {
        /// Game ID
        game_id: String,
    },
    /// Draw a winner and pay out the pot
    Draw {
        /// Operator account name
        operator: String,
        /// Game ID
        game_id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show game status
    Status {
        /// Game ID
        game_id: String,
    },
    /// List all games
    List,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GameStorage {
    games: HashMap<String, GameSnapshot>,
}

fn load_games(path: &Path) -> GameStorage {
    if path.exists() {
        if let Ok(content) = std::fs::read_to_string(path) {
            if let Ok(storage) = serde_json::from_str(&content) {
                return storage;
            }
        }
    }
    GameStorage::default()
}

fn save_games(path: &Path, storage: &GameStorage) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(storage)?;
    std::fs::write(path, content)?;
    Ok(())
}

fn load_game(ctx: &Context, storage: &GameStorage, game_id: &str) -> Result<LotteryGame> {
    let game_id = Uuid::parse_str(game_id)?;
    let snapshot = storage
        .games
        .get(&game_id.to_string())
        .cloned()
        .ok_or_else(|| anyhow!("Game not found: {}", game_id))?;

    Ok(LotteryGame::restore(snapshot, ctx.ledger())?)
}

fn store_game(path: &Path, storage: &mut GameStorage, game: &LotteryGame) -> Result<()> {
    storage
        .games
        .insert(game.id().to_string(), game.snapshot());
    save_games(path, storage)
}

pub async fn handle_game_command(cmd: GameCommands, ctx: &Context) -> Result<()> {
    match cmd {
        GameCommands::New { operator, stake } => {
            let operator = ctx.manager.load_account(&operator).await?;
            let config = GameConfig::new(Amount::from_units(stake), operator.id);
            let game = duelpot_lottery::create_game(config, ctx.ledger()).await?;

            let mut storage = load_games(&ctx.games_path);
            store_game(&ctx.games_path, &mut storage, &game)?;

            println!("Created new game!");
            println!("Game ID: {}", game.id());
            println!("Stake: {}", game.stake());
            println!("Operator: {}", operator.name);
            println!();
            println!("Players can join with:");
            println!("duelpot game join <account> {}", game.id());
        }

        GameCommands::Join {
            account,
            game_id,
            deposit,
        } => {
            let account = ctx.manager.load_account(&account).await?;

            let mut storage = load_games(&ctx.games_path);
            let mut game = load_game(ctx, &storage, &game_id)?;

            let deposit = deposit
                .map(Amount::from_units)
                .unwrap_or_else(|| game.stake());
            game.join(account.id, deposit).await?;

            store_game(&ctx.games_path, &mut storage, &game)?;

            println!(
                "'{}' joined game {} ({}/{})",
                account.name,
                game.id(),
                game.players().len(),
                duelpot_lottery::MAX_PLAYERS
            );

            if game.players().len() == duelpot_lottery::MAX_PLAYERS {
                println!("Game is ready. The operator can now draw:");
                println!("duelpot game draw <operator> {}", game.id());
            } else {
                println!("Waiting for one more player...");
            }
        }

        GameCommands::Players { game_id } => {
            let storage = load_games(&ctx.games_path);
            let game = load_game(ctx, &storage, &game_id)?;

            if game.players().is_empty() {
                println!("No players have joined game {} yet.", game.id());
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Slot", "Account", "ID"]);

            for (slot, player) in game.players().iter().enumerate() {
                table.add_row(vec![
                    (slot + 1).to_string(),
                    ctx.account_label(*player).await,
                    player.to_string(),
                ]);
            }

            println!("{}", table);
        }

        GameCommands::Draw {
            operator,
            game_id,
            yes,
        } => {
            let operator = ctx.manager.load_account(&operator).await?;

            let mut storage = load_games(&ctx.games_path);
            let mut game = load_game(ctx, &storage, &game_id)?;

            if !yes {
                let confirm = Confirm::new()
                    .with_prompt(format!(
                        "Draw a winner for game {} and pay out {}?",
                        game.id(),
                        game.pot()
                    ))
                    .default(false)
                    .interact()?;

                if !confirm {
                    println!("Draw cancelled.");
                    return Ok(());
                }
            }

            let outcome = game.draw(operator.id).await?;
            store_game(&ctx.games_path, &mut storage, &game)?;

            println!("------ ROUND {} COMPLETE ------", outcome.round);
            println!("Winner: {}", ctx.account_label(outcome.winner).await);
            println!("Payout: {}", outcome.payout);
            println!("Transaction ID: {}", outcome.txid);
            println!("Draw seed: {}", outcome.seed);
            println!();
            println!("The game is open for the next round.");
        }

        GameCommands::Status { game_id } => {
            let storage = load_games(&ctx.games_path);
            let game = load_game(ctx, &storage, &game_id)?;
            let escrow_balance = ctx.ledger().balance(game.escrow()).await?;

            println!("Game Status: {}", game.id());
            println!("  State: {:?}", game.state());
            println!("  Stake: {}", game.stake());
            println!("  Pot: {}", game.pot());
            println!(
                "  Players: {}/{}",
                game.players().len(),
                duelpot_lottery::MAX_PLAYERS
            );
            println!("  Rounds completed: {}", game.rounds_completed());
            println!("  Operator: {}", ctx.account_label(game.operator()).await);
            println!("  Escrow balance: {}", escrow_balance);

            if !game.players().is_empty() {
                println!();
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(vec!["Slot", "Account", "Balance"]);

                for (slot, player) in game.players().iter().enumerate() {
                    let balance = ctx.ledger().balance(*player).await?;
                    table.add_row(vec![
                        (slot + 1).to_string(),
                        ctx.account_label(*player).await,
                        balance.to_string(),
                    ]);
                }

                println!("{}", table);
            }
        }

        GameCommands::List => {
            let storage = load_games(&ctx.games_path);

            if storage.games.is_empty() {
                println!("No games found.");
                println!("Create a new game with: duelpot game new <operator> <stake>");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Game ID", "State", "Players", "Stake", "Pot", "Rounds"]);

            for (game_id, snapshot) in &storage.games {
                let game = LotteryGame::restore(snapshot.clone(), ctx.ledger())?;
                table.add_row(vec![
                    game_id.clone(),
                    format!("{:?}", game.state()),
                    format!(
                        "{}/{}",
                        game.players().len(),
                        duelpot_lottery::MAX_PLAYERS
                    ),
                    game.stake().to_string(),
                    game.pot().to_string(),
                    game.rounds_completed().to_string(),
                ]);
            }

            println!("{}", table);
        }
    }

    Ok(())
}
