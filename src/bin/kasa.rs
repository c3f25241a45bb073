use std::{
    error::Error,
    process::exit,
    sync::{Arc, Mutex},
};

use clap::{ArgGroup, Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use kasa::{
    access::create_access,
    account::create_account,
    balance::{BalanceQuery, get_project_balance},
    config::ServiceConfig,
    currency::Currency,
    database_id::{AccountId, TransactionId},
    datetime::parse_date_time,
    project::create_project,
    stores::{ProjectStore, SQLiteStore, sqlite::initialize},
    transaction::{
        TransactionData, TransactionQuery, create_grouped_transactions, create_single_transaction,
        delete_transaction, get_transactions,
    },
};

/// Manage Kasa projects, accesses, accounts and transactions from the command line.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// File path to the application SQLite database.
    #[arg(long, global = true, default_value = "database.db")]
    db_path: String,

    /// Allow transactions to be dated after the current time.
    #[arg(long, global = true)]
    allow_future_transactions: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a project and print it.
    CreateProject {
        /// The display name of the project.
        #[arg(long)]
        name: String,
        /// A custom URL slug, derived from the name if not given.
        #[arg(long)]
        slug: Option<String>,
    },

    /// Issue an access to a project and print its UID and PIN.
    ///
    /// The PIN is only shown once.
    CreateAccess {
        /// The slug of the project.
        #[arg(long)]
        project: String,
        /// Who the access is for.
        #[arg(long)]
        name: String,
        /// Allow viewing the project but not changing it.
        #[arg(long)]
        read_only: bool,
    },

    /// Add an account to a project and print it.
    CreateAccount {
        /// The slug of the project.
        #[arg(long)]
        project: String,
        /// The name of the account, unique within the project.
        #[arg(long)]
        name: String,
        /// One of USD, EUR or PLN.
        #[arg(long)]
        currency: String,
    },

    /// Record a single transaction, or a group of transactions with --group.
    #[command(group(ArgGroup::new("mode").required(true).args(["account", "group"])))]
    CreateTransaction {
        /// The ID of the account of a single transaction.
        #[arg(long, requires_all = ["value", "name", "transaction_type"])]
        account: Option<String>,
        /// The amount of a single transaction.
        #[arg(long)]
        value: Option<f64>,
        /// The name of a single transaction.
        #[arg(long)]
        name: Option<String>,
        /// "debit" or "top-up".
        #[arg(long = "type")]
        transaction_type: Option<String>,
        /// When a single transaction happened, in UTC. Defaults to now.
        #[arg(long)]
        date: Option<String>,
        /// Only allow accounts of this project in a grouped transaction.
        #[arg(long, requires = "group")]
        project: Option<String>,
        /// One transaction of a group as 'account_id:value:name:type[:date]'.
        /// Repeat for each transaction.
        #[arg(long)]
        group: Vec<String>,
    },

    /// Print the balances of a project as JSON.
    GetBalance {
        /// The slug of the project.
        #[arg(long)]
        project: String,
        /// Only include this account.
        #[arg(long)]
        account: Option<String>,
        /// Only count transactions dated in this year.
        #[arg(long)]
        year: Option<i32>,
        /// Only count transactions dated in this month, 0 for the whole year.
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=12))]
        month: Option<u8>,
    },

    /// Print the transactions of a project or an account as JSON, newest first.
    #[command(group(ArgGroup::new("scope").required(true).args(["project", "account"])))]
    GetTransactions {
        /// The slug of the project.
        #[arg(long)]
        project: Option<String>,
        /// The ID of the account.
        #[arg(long)]
        account: Option<String>,
        /// Only include transactions dated at or after this time, in UTC.
        #[arg(long)]
        start: Option<String>,
        /// Only include transactions dated at or before this time, in UTC.
        #[arg(long)]
        end: Option<String>,
        /// Leave out transactions dated in the future.
        #[arg(long)]
        exclude_future: bool,
    },

    /// Permanently delete a transaction.
    DeleteTransaction {
        /// The ID of the transaction.
        #[arg(long)]
        id: String,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .try_init()
        .map_err(|error| -> Box<dyn Error> { error })?;

    let cli = Cli::parse();

    if let Err(error) = run(cli) {
        print_error(error);
        exit(1);
    }

    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let connection = Connection::open(&cli.db_path)?;
    initialize(&connection)?;
    let store = SQLiteStore::new(Arc::new(Mutex::new(connection)));

    let config = ServiceConfig {
        reject_future_transaction_dates: !cli.allow_future_transactions,
        ..Default::default()
    };

    match cli.command {
        Command::CreateProject { name, slug } => {
            let project = create_project(&name, slug.as_deref(), &store, &config)?;
            print_json(&project)?;
        }
        Command::CreateAccess {
            project,
            name,
            read_only,
        } => {
            let created = create_access(&project, &name, read_only, &store, &store, &config)?;
            println!("Access created for {}", created.access.name);
            println!("UID: {}", created.access.uid);
            println!("PIN: {}", created.pin);
            println!("Read-only: {}", created.access.readonly);
            println!("Store the PIN now, it cannot be shown again.");
        }
        Command::CreateAccount {
            project,
            name,
            currency,
        } => {
            let currency: Currency = currency.parse()?;
            let project = store.get_by_slug(&project)?;
            let account = create_account(project.id, &name, currency, &store)?;
            print_json(&account)?;
        }
        Command::CreateTransaction {
            account,
            value,
            name,
            transaction_type,
            date,
            project,
            group,
        } => match account {
            Some(account) => {
                let data = TransactionData {
                    account_id: account.parse()?,
                    value: value.ok_or("--value is required")?,
                    name: name.ok_or("--name is required")?,
                    transaction_type: transaction_type.ok_or("--type is required")?.parse()?,
                    transaction_date: date.as_deref().map(parse_date_time).transpose()?,
                };
                let transaction = create_single_transaction(data, &store, &store, &config)?;
                print_json(&transaction)?;
            }
            None => {
                let project_id = match project {
                    Some(slug) => Some(store.get_by_slug(&slug)?.id),
                    None => None,
                };
                let batch = group
                    .iter()
                    .map(|entry| parse_group(entry))
                    .collect::<Result<Vec<_>, _>>()?;
                let transactions =
                    create_grouped_transactions(project_id, batch, &store, &store, &config)?;
                print_json(&transactions)?;
            }
        },
        Command::GetBalance {
            project,
            account,
            year,
            month,
        } => {
            let project = store.get_by_slug(&project)?;
            let query = BalanceQuery {
                project_id: project.id,
                account_id: account.as_deref().map(str::parse::<AccountId>).transpose()?,
                year,
                month,
            };
            let summary = get_project_balance(&query, &store, &store, &store)?;
            print_json(&summary)?;
        }
        Command::GetTransactions {
            project,
            account,
            start,
            end,
            exclude_future,
        } => {
            let project_id = match project {
                Some(slug) => Some(store.get_by_slug(&slug)?.id),
                None => None,
            };
            let query = TransactionQuery {
                project_id,
                account_id: account.as_deref().map(str::parse::<AccountId>).transpose()?,
                start_date: start.as_deref().map(parse_date_time).transpose()?,
                end_date: end.as_deref().map(parse_date_time).transpose()?,
                exclude_future_transactions: exclude_future,
            };
            let transactions = get_transactions(&query, &store, &store, &store)?;
            print_json(&transactions)?;
        }
        Command::DeleteTransaction { id } => {
            let id: TransactionId = id.parse()?;
            delete_transaction(id, &store)?;
            println!("Transaction {id} deleted");
        }
    }

    Ok(())
}

/// Parse one `--group` entry of the form 'account_id:value:name:type[:date]'.
///
/// The date may itself contain colons, e.g. "2024-03-01 09:30:15".
fn parse_group(entry: &str) -> Result<TransactionData, Box<dyn Error>> {
    let parts: Vec<&str> = entry.splitn(5, ':').collect();

    let [account_id, value, name, transaction_type, rest @ ..] = parts.as_slice() else {
        return Err(format!(
            "invalid group \"{entry}\", expected 'account_id:value:name:type[:date]'"
        )
        .into());
    };

    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid value \"{value}\" in group \"{entry}\""))?;

    Ok(TransactionData {
        account_id: account_id.trim().parse()?,
        value,
        name: name.to_string(),
        transaction_type: transaction_type.parse()?,
        transaction_date: rest.first().map(|date| parse_date_time(date)).transpose()?,
    })
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
