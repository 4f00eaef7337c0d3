use std::sync::Arc;

use colored::Colorize;

use crate::{
    core::{
        services::{DueDateInfo, DueStatus},
        time::FixedClock,
        BillSession, CacheState,
    },
    ledger::{next_unpaid, payment_ledger, Bill, PeriodUnit, PeriodWalker},
    storage::BillStore,
    utils::build_info,
};

use super::{
    parse_date,
    registry::{CommandEntry, CommandRegistry},
    CliContext, CliError, CliResult,
};

const DEFAULT_SCHEDULE_COUNT: usize = 6;

pub fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::default();
    registry.register(CommandEntry::with_context(
        "due",
        "List every bill with its next due date",
        "due",
        cmd_due,
    ));
    registry.register(CommandEntry::with_context(
        "schedule",
        "Show upcoming occurrences of a bill",
        "schedule <bill> [count]",
        cmd_schedule,
    ));
    registry.register(CommandEntry::with_context(
        "ledger",
        "Match recorded payments to billing periods",
        "ledger <bill>",
        cmd_ledger,
    ));
    registry.register(CommandEntry::with_context(
        "add",
        "Add a recurring bill",
        "add <name> <amount> <start> <period> [end]",
        cmd_add,
    ));
    registry.register(CommandEntry::with_context(
        "pay",
        "Record a payment against a bill",
        "pay <bill> <amount> [date]",
        cmd_pay,
    ));
    registry.register(CommandEntry::standalone(
        "version",
        "Print build information",
        "version",
        cmd_version,
    ));
    registry.register(CommandEntry::standalone("help", "Show this help", "help", cmd_help));
    registry
}

pub fn print_help(registry: &CommandRegistry) {
    println!("{}", "bill_ledger_cli".bold());
    println!("Global options: --today YYYY-MM-DD, --file PATH");
    for entry in registry.list() {
        println!("  {:<44} {}", entry.usage, entry.description);
    }
}

fn cmd_help(_args: &[String]) -> CliResult {
    print_help(&registry());
    Ok(())
}

fn cmd_version(_args: &[String]) -> CliResult {
    println!("{}", build_info::current().summary());
    Ok(())
}

fn cmd_due(context: &CliContext, _args: &[String]) -> CliResult {
    let session = BillSession::open(
        Arc::clone(&context.store),
        context.projector(),
        Arc::new(FixedClock::new(context.today)),
    );
    let snapshot = session.cache().state();
    let entries = match &*snapshot {
        CacheState::Loaded(entries) => Arc::clone(entries),
        CacheState::Error(message) => {
            return Err(CliError::Usage(format!("could not load bills: {message}")))
        }
        CacheState::Loading => return Err(CliError::Usage("bills are still loading".into())),
    };

    let mut bills = context.store.fetch_all()?;
    bills.sort_by_key(|bill| {
        let due = entries.get(&bill.id).and_then(DueDateInfo::due_date);
        (due.is_none(), due, bill.name.to_ascii_lowercase())
    });

    if bills.is_empty() {
        println!("No bills recorded.");
    }
    for bill in &bills {
        let line = match entries.get(&bill.id) {
            Some(info) => format_due_line(bill, info, context),
            None => format!(
                "{:<10}  {:<24} {:>10.2}  {}",
                "?",
                bill.name,
                bill.amount,
                "could not project".red()
            ),
        };
        println!("{line}");
    }
    session.close();
    Ok(())
}

fn format_due_line(bill: &Bill, info: &DueDateInfo, context: &CliContext) -> String {
    let date = info
        .due_date()
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into());
    let status = match info.status(context.today, context.config.due_soon_days) {
        DueStatus::DueSoon => "due soon".yellow().bold(),
        DueStatus::Upcoming => "upcoming".green(),
        DueStatus::Expired => "expired".dimmed(),
    };
    format!(
        "{:<10}  {:<24} {:>10.2}  {}",
        date, bill.name, bill.amount, status
    )
}

fn cmd_schedule(context: &CliContext, args: &[String]) -> CliResult {
    let needle = args
        .first()
        .ok_or_else(|| registry().usage_error("schedule"))?;
    let count = match args.get(1) {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| CliError::Usage(format!("`{raw}` is not a count")))?,
        None => DEFAULT_SCHEDULE_COUNT,
    };
    let bill = context.find_bill(needle)?;
    let walker = PeriodWalker::new(
        bill.start_date,
        bill.end_date,
        &bill.period,
        context.config.calendar(),
    )?;

    println!("{} ({})", bill.name.bold(), bill.period);
    let upcoming: Vec<_> = walker
        .filter(|date| *date >= context.today)
        .take(count)
        .collect();
    if upcoming.is_empty() {
        println!("  no remaining occurrences");
    }
    for date in upcoming {
        println!("  {}", date.format("%Y-%m-%d"));
    }
    Ok(())
}

fn cmd_ledger(context: &CliContext, args: &[String]) -> CliResult {
    let needle = args
        .first()
        .ok_or_else(|| registry().usage_error("ledger"))?;
    let bill = context.find_bill(needle)?;
    let calendar = context.config.calendar();
    let entries = payment_ledger(&bill, calendar)?;

    println!("{} ({})", bill.name.bold(), bill.period);
    for entry in &entries {
        let period = entry
            .period_due
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unscheduled".into());
        let timing = if entry.on_time {
            "on time".green()
        } else {
            "late".red()
        };
        println!(
            "  {}  paid {}  {:>10.2}  {}",
            period,
            entry.payment.paid_on.format("%Y-%m-%d"),
            entry.payment.amount,
            timing
        );
    }
    match next_unpaid(&bill, calendar)? {
        Some(date) => println!("Next unpaid: {}", date.format("%Y-%m-%d")),
        None => println!("All periods paid."),
    }
    Ok(())
}

fn cmd_add(context: &CliContext, args: &[String]) -> CliResult {
    let [name, amount, start, period, rest @ ..] = args else {
        return Err(registry().usage_error("add"));
    };
    let amount: f64 = amount
        .parse()
        .map_err(|_| CliError::Usage(format!("`{amount}` is not an amount")))?;
    let start = parse_date(start)?;
    let period = PeriodUnit::from_label(period)
        .ok_or_else(|| CliError::Usage(format!("unknown period `{period}`")))?;
    let mut bill = Bill::new(name.clone(), amount, start, period);
    if let Some(end) = rest.first() {
        bill = bill.with_end_date(parse_date(end)?);
    }
    let id = context.store.insert(bill)?;
    println!("Added {name} ({id})");
    Ok(())
}

fn cmd_pay(context: &CliContext, args: &[String]) -> CliResult {
    let [needle, amount, rest @ ..] = args else {
        return Err(registry().usage_error("pay"));
    };
    let amount: f64 = amount
        .parse()
        .map_err(|_| CliError::Usage(format!("`{amount}` is not an amount")))?;
    let paid_on = match rest.first() {
        Some(raw) => parse_date(raw)?,
        None => context.today,
    };
    let mut bill = context.find_bill(needle)?;
    bill.record_payment(paid_on, amount);
    let name = bill.name.clone();
    context.store.update(bill)?;
    println!("Recorded {amount:.2} for {name} on {}", paid_on.format("%Y-%m-%d"));
    Ok(())
}
