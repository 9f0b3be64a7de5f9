use crate::commands::Context;
use anyhow::Result;
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use duelpot_core::{Amount, Ledger};

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account name
        name: String,
    },
    /// List all accounts
    List,
    /// Show account balance
    Balance {
        /// Account name
        name: String,
    },
    /// Credit units to an account
    Fund {
        /// Account name
        name: String,
        /// Amount in units
        amount: u64,
    },
    /// Show account ledger history
    History {
        /// Account name
        name: String,
    },
    /// Delete an account
    Delete {
        /// Account name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn handle_account_command(cmd: AccountCommands, ctx: &Context) -> Result<()> {
    match cmd {
        AccountCommands::Create { name } => {
            let account = ctx.manager.create_account(&name).await?;

            println!("Account created successfully!");
            println!("  Name: {}", account.name);
            println!("  ID: {}", account.id);
        }

        AccountCommands::List => {
            let accounts = ctx.manager.list_accounts().await?;

            if accounts.is_empty() {
                println!("No accounts found.");
                println!("Create a new account with: duelpot account create <name>");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Name", "ID", "Balance", "Created"]);

            for account in accounts {
                let balance = ctx.ledger().balance(account.id).await?;
                table.add_row(vec![
                    account.name,
                    account.id.to_string(),
                    balance.to_string(),
                    account.created_at.format("%Y-%m-%d %H:%M").to_string(),
                ]);
            }

            println!("{}", table);
        }

        AccountCommands::Balance { name } => {
            let account = ctx.manager.load_account(&name).await?;
            let balance = ctx.ledger().balance(account.id).await?;

            println!("Balance for account '{}': {}", account.name, balance);
        }

        AccountCommands::Fund { name, amount } => {
            let account = ctx.manager.load_account(&name).await?;
            let amount = Amount::from_units(amount);

            let txid = ctx.ledger().issue(account.id, amount).await?;

            println!("Credited {} to account '{}'", amount, account.name);
            println!("Transaction ID: {}", txid);
        }

        AccountCommands::History { name } => {
            let account = ctx.manager.load_account(&name).await?;
            let entries = ctx.ledger().history(account.id).await?;

            if entries.is_empty() {
                println!("No ledger activity for account '{}'.", account.name);
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Transaction", "Amount", "Kind", "Counterparty", "Time"]);

            for entry in entries {
                let counterparty = match entry.counterparty {
                    Some(id) => ctx.account_label(id).await,
                    None => "-".to_string(),
                };

                table.add_row(vec![
                    entry.txid[..16].to_string(),
                    format!("{:+} units", entry.amount),
                    format!("{:?}", entry.kind),
                    counterparty,
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                ]);
            }

            println!("Ledger history for account '{}':", account.name);
            println!("{}", table);
        }

        AccountCommands::Delete { name, force } => {
            if !force {
                let confirm = Confirm::new()
                    .with_prompt(format!(
                        "Are you sure you want to delete account '{}'? This action cannot be undone.",
                        name
                    ))
                    .default(false)
                    .interact()?;

                if !confirm {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
            }

            ctx.manager.delete_account(&name).await?;
            println!("Account '{}' deleted successfully.", name);
        }
    }

    Ok(())
}
