use crate::catalog::{Gender, Prize, Task};
use crate::constants::DEFAULT_STORE_PATH;
use crate::request::RedemptionRequest;
use crate::transaction::StarTransaction;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use csv::Writer;
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "starledger", version, about = "Earn stars for chores, spend them on prizes")]
pub struct Cli {
    /// Store file holding all household data
    #[arg(long, env = "STARLEDGER_STORE", default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,

    /// Log debug detail to stderr
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the current star balance
    Balance,
    /// List star transactions, newest first
    History {
        /// Only the last N days
        #[arg(long)]
        days: Option<u32>,
        /// Write to a csv file instead of stdout
        #[arg(long)]
        csv: Option<String>,
    },
    /// Record a finished task
    Complete {
        task_id: String,
        /// Timer ran out before the task was done
        #[arg(long)]
        late: bool,
    },
    /// Parent: grant extra stars
    Bonus {
        amount: i64,
        reason: String,
        #[arg(long)]
        pin: String,
    },
    /// Parent: take stars away
    Penalty {
        amount: i64,
        reason: String,
        #[arg(long)]
        pin: String,
    },
    /// Spend stars on a prize, pending parent approval
    Redeem { prize_id: String },
    /// Parent: approve a pending redemption
    Approve {
        request_id: String,
        #[arg(long)]
        pin: String,
    },
    /// Parent: reject a pending redemption & refund its stars
    Reject {
        request_id: String,
        #[arg(long)]
        pin: String,
    },
    /// List redemption requests
    Requests {
        #[arg(long, conflicts_with = "decided")]
        pending: bool,
        #[arg(long)]
        decided: bool,
        #[arg(long)]
        csv: Option<String>,
    },
    /// List tasks
    Tasks,
    /// Parent: add a task
    AddTask {
        name: String,
        #[arg(long)]
        minutes: u32,
        #[arg(long)]
        stars: i64,
        #[arg(long)]
        pin: String,
    },
    /// Parent: remove a task
    RemoveTask {
        task_id: String,
        #[arg(long)]
        pin: String,
    },
    /// List prizes
    Prizes,
    /// Parent: add a prize
    AddPrize {
        name: String,
        #[arg(long)]
        cost: i64,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        pin: String,
    },
    /// Parent: remove a prize
    RemovePrize {
        prize_id: String,
        #[arg(long)]
        pin: String,
    },
    /// Show the profile, or update the given fields
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_enum)]
        gender: Option<Gender>,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Parent: change the parent PIN
    SetPin {
        new_pin: String,
        #[arg(long)]
        pin: String,
    },
    /// Choose the app access password on first run
    SetupPassword { password: String, confirm: String },
    /// Check the app access password
    Unlock { password: String },
    /// Write a backup of all data
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Parent: restore a backup
    Import {
        file: PathBuf,
        #[arg(long)]
        pin: String,
    },
    /// Check the stored balance against the history total
    Audit,
}

/// Where listings are written
pub enum OutputMethod {
    /// Output to csv file
    Csv(String),
    /// Output to the given console writer
    StdOutput,
}

impl OutputMethod {
    pub fn from_arg(csv: &Option<String>) -> Self {
        match csv {
            Some(path) => OutputMethod::Csv(path.clone()),
            None => OutputMethod::StdOutput,
        }
    }
}

fn format_millis(millis: i64) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => millis.to_string(),
    }
}

fn write_rows<W: Write>(
    wtr: &mut Writer<W>,
    header: &[&str],
    rows: Vec<Vec<String>>,
) -> Result<(), Box<dyn Error>> {
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn output_rows<W: Write>(
    header: &[&str],
    rows: Vec<Vec<String>>,
    output: &OutputMethod,
    console: &mut W,
) -> Result<(), Box<dyn Error>> {
    match output {
        OutputMethod::Csv(file_path) => {
            write_rows(&mut Writer::from_path(file_path)?, header, rows)
        }
        OutputMethod::StdOutput => write_rows(&mut Writer::from_writer(console), header, rows),
    }
}

pub fn output_history<W: Write>(
    txns: &[StarTransaction],
    output: &OutputMethod,
    console: &mut W,
) -> Result<(), Box<dyn Error>> {
    let rows = txns
        .iter()
        .map(|txn| {
            vec![
                txn.id.clone(),
                format_millis(txn.timestamp),
                format!("{:+}", txn.amount),
                txn.kind.as_str().to_string(),
                txn.reason.clone(),
            ]
        })
        .collect();
    output_rows(&["id", "time", "amount", "type", "reason"], rows, output, console)
}

pub fn output_requests<W: Write>(
    requests: &[RedemptionRequest],
    output: &OutputMethod,
    console: &mut W,
) -> Result<(), Box<dyn Error>> {
    let rows = requests
        .iter()
        .map(|req| {
            vec![
                req.id.clone(),
                req.prize_id.clone(),
                format!(
                    "{} {}",
                    req.prize_icon.as_deref().unwrap_or_default(),
                    req.prize_name
                )
                .trim()
                .to_string(),
                format!("{}", req.prize_cost),
                req.status.as_str().to_string(),
                format_millis(req.timestamp),
            ]
        })
        .collect();
    output_rows(
        &["id", "prize_id", "prize", "cost", "status", "created"],
        rows,
        output,
        console,
    )
}

pub fn output_tasks<W: Write>(tasks: &[Task], console: &mut W) -> Result<(), Box<dyn Error>> {
    let rows = tasks
        .iter()
        .map(|task| {
            vec![
                task.id.clone(),
                format!("{} {}", task.icon, task.name),
                format!("{}", task.duration_minutes),
                format!("{}", task.reward_stars),
            ]
        })
        .collect();
    output_rows(
        &["id", "task", "minutes", "stars"],
        rows,
        &OutputMethod::StdOutput,
        console,
    )
}

pub fn output_prizes<W: Write>(prizes: &[Prize], console: &mut W) -> Result<(), Box<dyn Error>> {
    let rows = prizes
        .iter()
        .map(|prize| {
            vec![
                prize.id.clone(),
                format!("{} {}", prize.icon.as_deref().unwrap_or_default(), prize.name)
                    .trim()
                    .to_string(),
                format!("{}", prize.cost),
            ]
        })
        .collect();
    output_rows(&["id", "prize", "cost"], rows, &OutputMethod::StdOutput, console)
}

#[cfg(test)]
mod tests {
    use super::{output_history, output_prizes, output_requests, Cli, Command, OutputMethod};
    use crate::catalog::{default_prizes, Prize};
    use crate::request::{RedemptionRequest, RequestStatus};
    use crate::test::utils::_get_test_output_file;
    use crate::transaction::StarTransaction;
    use clap::Parser;
    use csv::ReaderBuilder;

    #[test]
    fn tst_parse_cli() {
        let cli = Cli::try_parse_from([
            "starledger", "--store", "x.json", "reject", "r1", "--pin", "8888",
        ])
        .unwrap();
        assert_eq!(cli.store.to_str(), Some("x.json"));
        match cli.command {
            Command::Reject { request_id, pin } => {
                assert_eq!(request_id, "r1");
                assert_eq!(pin, "8888");
            }
            other => panic!("Parsed wrong command {:?}", other),
        }

        let res = Cli::try_parse_from(["starledger", "requests", "--pending", "--decided"]);
        assert!(res.is_err(), "Pending & decided filters conflict");

        let res = Cli::try_parse_from(["starledger", "approve", "r1"]);
        assert!(res.is_err(), "Parent commands need a PIN");
    }

    #[test]
    fn tst_output_history_csv() {
        let txns = vec![StarTransaction::new(-10, "Redeemed: Ice Cream", 1_700_000_000_000)];
        let f = _get_test_output_file("history", "cli_io");
        let mut console = Vec::new();
        let res = output_history(&txns, &OutputMethod::Csv(f.clone()), &mut console);
        assert!(res.is_ok());
        assert!(console.is_empty(), "Csv output should not touch the console");

        let mut rdr = ReaderBuilder::new().delimiter(b',').from_path(f.as_str()).unwrap();
        if let Some(result) = rdr.records().next() {
            let record = result.unwrap();
            assert_eq!(&record[0], txns[0].id.as_str());
            assert_eq!(&record[2], "-10");
            assert_eq!(&record[3], "spent");
            assert_eq!(&record[4], "Redeemed: Ice Cream");
        } else {
            panic!("File should be readable")
        }
    }

    #[test]
    fn tst_output_requests_console() {
        let prize = Prize {
            id: "7".to_string(),
            name: "Zoo, Saturday".to_string(),
            cost: 40,
            icon: None,
            image_url: None,
        };
        let mut req = RedemptionRequest::pending_for(&prize, 0);
        req.status = RequestStatus::Approved;
        let mut console = Vec::new();
        output_requests(&[req.clone()], &OutputMethod::StdOutput, &mut console).unwrap();

        let text = String::from_utf8(console).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id,prize_id,prize,cost,status,created"));
        let row = lines.next().unwrap();
        assert!(row.starts_with(&format!("{},7,\"🎁 Zoo, Saturday\",40,approved,", req.id)));
    }

    #[test]
    fn tst_output_prizes() {
        let mut console = Vec::new();
        output_prizes(&default_prizes(), &mut console).unwrap();
        let text = String::from_utf8(console).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("1,🍦 Ice Cream,10"));
    }
}
