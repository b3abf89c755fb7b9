use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use skolmat::adapters::processors::ProcessorRegistry;
use skolmat::domain::ports::{Clock, SystemClock};
use skolmat::utils::error::{ErrorSeverity, MenuError};
use skolmat::utils::{logger, validation::Validate};
use skolmat::{CliArgs, DayHistory, LocalStorage, Menu, SkolmatConfig};
use std::sync::Arc;
use tokio::task::JoinSet;

fn exit_code(e: &MenuError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: &MenuError) -> ! {
    tracing::error!(
        "{} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e));
}

fn history_file(source_name: &str) -> String {
    let slug: String = source_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}.json", slug)
}

async fn update_history(
    dir: &str,
    source_name: &str,
    menu: &Menu,
    date: NaiveDate,
) -> skolmat::Result<DayHistory> {
    let storage = LocalStorage::new(dir);
    let path = history_file(source_name);

    let mut history = DayHistory::load(&storage, &path).await?;
    if menu.menu_data().contains_day(date) {
        history.record_menu(menu, date);
    }
    history.prune(SystemClock.today());
    if history.save(&storage, &path).await? {
        tracing::debug!("History for '{}' updated", source_name);
    }
    Ok(history)
}

fn print_source(
    name: &str,
    menu: &Menu,
    date: NaiveDate,
    args: &CliArgs,
    available: bool,
    history: Option<&DayHistory>,
) {
    println!("== {} ({}) ==", name, menu.provider_name());

    let summary = if available {
        menu.get_readable_day_summary(date, !args.unfiltered)
    } else {
        String::new()
    };

    if !summary.is_empty() {
        println!("{}: {}", date, summary);
        println!("{}", menu.get_readable_day_menu(date));
    } else if let Some(record) = history.and_then(|h| h.get(date)) {
        // provider no longer serves this day; fall back to what was recorded
        println!("{} (from history): {}", date, record.summary);
        println!("{}", record.menu);
    } else if available {
        println!("No menu for {}.", date);
    } else {
        println!("No menu available right now.");
    }

    if available && args.keywords {
        let keywords = menu.get_summary_filter_keywords(Some(date));
        println!("meals:  {}", keywords.meals.join(", "));
        println!("labels: {}", keywords.labels.join(", "));
        println!("{}", keywords.info);
    }

    if args.history {
        if let Some(history) = history {
            for (day, record) in history.past_days(SystemClock.today()) {
                println!("  {}: {}", day, record.summary);
            }
        }
    }
    println!();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::debug!("CLI args: {:?}", args);

    let config = SkolmatConfig::from_file(&args.config).unwrap_or_else(|e| fail(&e));
    if let Err(e) = config.validate() {
        fail(&e);
    }

    let client = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()
        .context("building HTTP client")?;

    let registry = ProcessorRegistry::builtin();
    let mut menus = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        let menu = source
            .create_menu(config.menu_valid_hours(), &registry)
            .unwrap_or_else(|e| fail(&e));
        menus.push((source.name.clone(), Arc::new(menu)));
    }

    let mut tasks = JoinSet::new();
    for (idx, (name, menu)) in menus.iter().enumerate() {
        let client = client.clone();
        let menu = Arc::clone(menu);
        let force = args.force;
        let name = name.clone();
        tasks.spawn(async move {
            let available = menu.get_menu(&client, force).await.is_some();
            if !available {
                tracing::warn!("[{}] No trustworthy menu data", name);
            }
            (idx, available)
        });
    }

    let mut available = vec![false; menus.len()];
    while let Some(joined) = tasks.join_next().await {
        let (idx, ok) = joined.context("menu fetch task panicked")?;
        available[idx] = ok;
    }

    let date = args.date.unwrap_or_else(|| SystemClock.today());
    for ((name, menu), ok) in menus.iter().zip(&available) {
        let history = match config.history_dir() {
            Some(dir) => match update_history(dir, name, menu, date).await {
                Ok(history) => Some(history),
                Err(e) => {
                    tracing::error!("[{}] Could not update history: {}", name, e);
                    None
                }
            },
            None => None,
        };
        print_source(name, menu, date, &args, *ok, history.as_ref());
    }

    if available.iter().all(|ok| !ok) {
        std::process::exit(2);
    }
    Ok(())
}
