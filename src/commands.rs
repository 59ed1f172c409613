use crate::access::Access;
use crate::backup::{backup_file_name, export, import};
use crate::catalog::Catalog;
use crate::cli_io::{
    output_history, output_prizes, output_requests, output_tasks, Command, OutputMethod,
};
use crate::constants::MILLIS_PER_DAY;
use crate::ledger::{now_millis, Ledger};
use crate::redemption::Redemptions;
use crate::storage::KeyValueStore;
use anyhow::{anyhow, Context};
use std::fs;
use std::io::Write;

fn require_parent<S: KeyValueStore + ?Sized>(store: &mut S, pin: &str) -> anyhow::Result<()> {
    Access::new(store).verify_parent_pin(pin)?;
    Ok(())
}

/// Runs one command against the store, writing human output to `console`
pub fn execute<S: KeyValueStore + ?Sized, W: Write>(
    command: &Command,
    store: &mut S,
    console: &mut W,
) -> anyhow::Result<()> {
    match command {
        Command::Balance => {
            let ledger = Ledger::new(store);
            writeln!(console, "{} stars (level {})", ledger.balance()?, ledger.level()?)?;
        }
        Command::History { days, csv } => {
            let since = days.map(|d| now_millis() - i64::from(d) * MILLIS_PER_DAY);
            let ledger = Ledger::new(store);
            let txns = ledger.history(since)?;
            output_history(&txns, &OutputMethod::from_arg(csv), console)
                .map_err(|e| anyhow!("writing history failed: {}", e))?;
            if days.is_some() {
                writeln!(console, "net change: {:+}", ledger.net_change(since)?)?;
            }
        }
        Command::Complete { task_id, late } => {
            let task = Catalog::new(store).task(task_id)?;
            match Ledger::new(store).complete_task(&task, !late)? {
                Some(txn) => writeln!(console, "+{} stars for {}", txn.amount, task.name)?,
                None => writeln!(console, "no stars for {} this time", task.name)?,
            }
        }
        Command::Bonus {
            amount,
            reason,
            pin,
        } => {
            require_parent(store, pin)?;
            let txn = Ledger::new(store).grant_bonus(*amount, reason)?;
            writeln!(console, "added {} stars: {}", txn.amount, txn.reason)?;
        }
        Command::Penalty {
            amount,
            reason,
            pin,
        } => {
            require_parent(store, pin)?;
            let txn = Ledger::new(store).deduct_penalty(*amount, reason)?;
            writeln!(console, "deducted {} stars: {}", -txn.amount, txn.reason)?;
        }
        Command::Redeem { prize_id } => {
            let prize = Catalog::new(store).prize(prize_id)?;
            let request = Redemptions::new(store).create_request(&prize)?;
            writeln!(
                console,
                "requested {} for {} stars, waiting for a parent ({})",
                request.prize_name, request.prize_cost, request.id
            )?;
        }
        Command::Approve { request_id, pin } | Command::Reject { request_id, pin } => {
            require_parent(store, pin)?;
            let approved = matches!(command, Command::Approve { .. });
            let request = Redemptions::new(store).decide_request(request_id, approved)?;
            writeln!(console, "{} {}", request.prize_name, request.status)?;
        }
        Command::Requests {
            pending,
            decided,
            csv,
        } => {
            let desk = Redemptions::new(store);
            let requests = if *pending {
                desk.list_pending()?
            } else if *decided {
                desk.list_decided()?
            } else {
                desk.requests()?
            };
            output_requests(&requests, &OutputMethod::from_arg(csv), console)
                .map_err(|e| anyhow!("writing requests failed: {}", e))?;
        }
        Command::Tasks => {
            let tasks = Catalog::new(store).tasks()?;
            output_tasks(&tasks, console).map_err(|e| anyhow!("writing tasks failed: {}", e))?;
        }
        Command::AddTask {
            name,
            minutes,
            stars,
            pin,
        } => {
            require_parent(store, pin)?;
            let task = Catalog::new(store).add_task(name, *minutes, *stars)?;
            writeln!(console, "added task {} ({})", task.name, task.id)?;
        }
        Command::RemoveTask { task_id, pin } => {
            require_parent(store, pin)?;
            let task = Catalog::new(store).remove_task(task_id)?;
            writeln!(console, "removed task {}", task.name)?;
        }
        Command::Prizes => {
            let prizes = Catalog::new(store).prizes()?;
            output_prizes(&prizes, console)
                .map_err(|e| anyhow!("writing prizes failed: {}", e))?;
        }
        Command::AddPrize {
            name,
            cost,
            icon,
            pin,
        } => {
            require_parent(store, pin)?;
            let prize = Catalog::new(store).add_prize(name, *cost, icon.as_deref())?;
            writeln!(console, "added prize {} ({})", prize.name, prize.id)?;
        }
        Command::RemovePrize { prize_id, pin } => {
            require_parent(store, pin)?;
            let prize = Catalog::new(store).remove_prize(prize_id)?;
            writeln!(console, "removed prize {}", prize.name)?;
        }
        Command::Profile {
            name,
            gender,
            avatar,
        } => {
            let mut catalog = Catalog::new(store);
            let mut profile = catalog.profile()?;
            if name.is_some() || gender.is_some() || avatar.is_some() {
                if let Some(name) = name {
                    profile.name = name.clone();
                }
                if let Some(gender) = gender {
                    profile.gender = *gender;
                }
                if let Some(avatar) = avatar {
                    profile.avatar = avatar.clone();
                }
                catalog.save_profile(&profile)?;
            }
            writeln!(
                console,
                "{} {} ({:?})",
                profile.avatar, profile.name, profile.gender
            )?;
        }
        Command::SetPin { new_pin, pin } => {
            require_parent(store, pin)?;
            Access::new(store).set_parent_pin(new_pin)?;
            writeln!(console, "PIN updated")?;
        }
        Command::SetupPassword { password, confirm } => {
            Access::new(store).setup_password(password, confirm)?;
            writeln!(console, "access password saved")?;
        }
        Command::Unlock { password } => {
            Access::new(store).unlock(password)?;
            writeln!(console, "unlocked")?;
        }
        Command::Export { out } => {
            let path = out.clone().unwrap_or_else(|| {
                backup_file_name(chrono::Local::now().date_naive()).into()
            });
            fs::write(&path, export(&*store)?)
                .with_context(|| format!("writing backup to {}", path.display()))?;
            writeln!(console, "backup written to {}", path.display())?;
        }
        Command::Import { file, pin } => {
            require_parent(store, pin)?;
            let text = fs::read_to_string(file)
                .with_context(|| format!("reading backup {}", file.display()))?;
            let restored = import(store, &text)?;
            writeln!(console, "restored {} entries", restored)?;
        }
        Command::Audit => {
            let audit = Ledger::new(store).audit()?;
            if !audit.is_consistent() {
                return Err(anyhow!(
                    "balance {} does not match history total {} over {} transactions",
                    audit.balance,
                    audit.history_total,
                    audit.transactions
                ));
            }
            writeln!(
                console,
                "ok: balance {} matches {} transactions",
                audit.balance, audit.transactions
            )?;
        }
    }
    Ok(())
}
