use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use libnetworth::{Assets, JsonFileStore, Ledger, Record, RecordId, SheetImport};
use tracing::info;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

mod logging;

#[derive(Parser, Debug)]
#[command(name = "networth", version, about = "Track net worth across accounts over time")]
struct Cli {
    /// JSON file holding the records. Account keys go next to it in
    /// `<stem>.keys.json`.
    #[arg(long, env = "NETWORTH_STORE", default_value = "networth.json", global = true)]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every record and the known account keys.
    Show,
    /// Add a new record.
    Add(RecordArgs),
    /// Replace the record with the given id.
    Update {
        id: String,
        #[command(flatten)]
        fields: RecordArgs,
    },
    /// Delete the record with the given id.
    Delete { id: String },
    /// Register an account key.
    AddKey { key: String },
    /// Delete an account key and its balances from every record.
    DeleteKey {
        key: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Append records from a comma or tab separated sheet.
    Import { file: PathBuf },
}

#[derive(Args, Debug)]
struct RecordArgs {
    #[arg(long, value_parser = parse_date)]
    date: NaiveDate,
    /// Account balance as KEY=VALUE, repeatable.
    #[arg(long = "asset", value_parser = parse_asset)]
    assets: Vec<(String, f64)>,
    #[arg(long, default_value_t = 0f64)]
    income: f64,
    #[arg(long, default_value_t = 0f64)]
    mpf: f64,
    #[arg(long)]
    note: Option<String>,
}

impl RecordArgs {
    fn into_record(self, id: Option<RecordId>) -> Record {
        let assets: Assets = self.assets.into_iter().collect();
        let mut record = match id {
            Some(id) => Record::with_id(id, self.date, assets),
            None => Record::new(self.date, assets),
        };
        record.set_income(self.income);
        record.set_mpf(self.mpf);
        record.set_note(self.note);
        record
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date `{}': {}", s, e))
}

fn parse_asset(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty account key in `{}'", s));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid balance in `{}': {}", s, e))?;
    Ok((key.to_string(), value))
}

fn prompt(message: &str) -> bool {
    print!("{} [y/N] ", message);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn show(ledger: &Ledger<JsonFileStore>) {
    let keys: Vec<&str> = ledger.keys().iter().collect();

    let mut header = vec!["id", "date"];
    header.extend(keys.iter().copied());
    header.extend(["total", "gain", "income", "mpf", "note"]);
    println!("{}", header.join("\t"));

    for record in ledger.records() {
        let mut row = vec![record.id().to_string(), record.date().to_string()];
        row.extend(keys.iter().map(|k| {
            record
                .asset(k)
                .map(|v| format!("{:.2}", v))
                .unwrap_or_default()
        }));
        row.push(format!("{:.2}", record.total()));
        row.push(format!("{:.2}", record.gain()));
        row.push(format!("{:.2}", record.income()));
        row.push(format!("{:.2}", record.mpf()));
        row.push(record.note().unwrap_or_default().to_string());
        println!("{}", row.join("\t"));
    }

    if let Some(total) = ledger.latest_total() {
        println!("latest net worth: {:.2}", total);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut ledger = Ledger::load(JsonFileStore::new(&cli.store))?;

    match cli.command {
        Command::Show => show(&ledger),
        Command::Add(fields) => {
            let record = fields.into_record(None);
            println!("{}", record.id());
            ledger.add_record(record);
        }
        Command::Update { id, fields } => {
            let id = RecordId::new(id);
            if ledger.get(&id).is_none() {
                return Err(anyhow!(format!("no record with id `{}'", id)));
            }
            ledger.update_record(fields.into_record(Some(id)));
        }
        Command::Delete { id } => {
            let id = RecordId::new(id);
            if !ledger.delete_record(&id) {
                return Err(anyhow!(format!("no record with id `{}'", id)));
            }
        }
        Command::AddKey { key } => {
            if !ledger.add_key(key.clone()) {
                info!(key = %key, "key already registered");
            }
        }
        Command::DeleteKey { key, yes } => {
            let deleted = if yes {
                ledger.delete_key_with(key, &mut |_: &str| true)
            } else {
                ledger.delete_key_with(key, &mut prompt)
            };
            if !deleted {
                println!("cancelled");
            }
        }
        Command::Import { file } => {
            let count = ledger.import_from(&SheetImport::from_path(&file)?)?;
            println!("imported {} records", count);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    logging::init_logging();
    run(Cli::parse())
}
