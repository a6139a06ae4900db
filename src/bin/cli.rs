use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use prettytable::{Cell, Row, Table};
use std::path::{Path, PathBuf};

use moodtune::user_models::UserStore;
use moodtune::user_storage::{load, save};
use moodtune::wishlist;

#[derive(Parser)]
#[command(name = "moodtune-admin")]
#[command(about = "Inspect and edit the MoodTune users file", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "users.json", help = "Path to the users file")]
    file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List registered users")]
    Users,

    #[command(about = "Show a user's detection history")]
    History {
        #[arg(short, long, help = "Username")]
        username: String,
    },

    #[command(about = "Show a user's wishlist")]
    Wishlist {
        #[arg(short, long, help = "Username")]
        username: String,
    },

    #[command(about = "Set a wishlist link (stop the server first, it keeps its own copy)")]
    SetLink {
        #[arg(short, long, help = "Username")]
        username: String,

        #[arg(short, long, help = "Emotion label, e.g. happy")]
        emotion: String,

        #[arg(short, long, help = "Platform, e.g. youtube or spotify")]
        platform: String,

        #[arg(short, long, help = "http(s) link to open for this emotion")]
        link: String,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_command(&cli.file, cli.command) {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_command(file: &Path, command: Commands) -> Result<()> {
    let mut users = load(file);

    match command {
        Commands::Users => list_users(&users),
        Commands::History { username } => show_history(&users, &username)?,
        Commands::Wishlist { username } => show_wishlist(&users, &username)?,
        Commands::SetLink {
            username,
            emotion,
            platform,
            link,
        } => {
            let Some(record) = users.get_mut(&username) else {
                bail!("No such user: {}", username);
            };
            if !wishlist::add_link(record, &emotion, &platform, &link) {
                bail!("Emotion and platform must be non-empty and the link an http(s) URL");
            }
            save(file, &users)?;
            println!("✅ {} / {} -> {}", emotion, platform, link);
        }
    }

    Ok(())
}

fn list_users(users: &UserStore) {
    if users.is_empty() {
        println!("📭 No users registered.");
        return;
    }

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Username"),
        Cell::new("Emotions"),
        Cell::new("Detections"),
    ]));

    for (username, record) in users {
        let emotions: Vec<&str> = record.wishlist.keys().map(String::as_str).collect();
        table.add_row(Row::new(vec![
            Cell::new(username),
            Cell::new(&emotions.join(", ")),
            Cell::new(&record.history.len().to_string()),
        ]));
    }

    table.printstd();
}

fn show_history(users: &UserStore, username: &str) -> Result<()> {
    let Some(record) = users.get(username) else {
        bail!("No such user: {}", username);
    };

    if record.history.is_empty() {
        println!("📭 No detections for {}.", username);
        return Ok(());
    }

    println!("\n📋 History for {} ({})\n", username, record.history.len());

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Time"),
        Cell::new("Emotion"),
        Cell::new("Platform"),
        Cell::new("Link"),
    ]));

    for entry in &record.history {
        let link = if entry.link.is_empty() { "-" } else { entry.link.as_str() };
        table.add_row(Row::new(vec![
            Cell::new(&entry.timestamp),
            Cell::new(&entry.emotion),
            Cell::new(&entry.platform),
            Cell::new(link),
        ]));
    }

    table.printstd();
    println!();
    Ok(())
}

fn show_wishlist(users: &UserStore, username: &str) -> Result<()> {
    let Some(record) = users.get(username) else {
        bail!("No such user: {}", username);
    };

    if record.wishlist.is_empty() {
        println!("📭 {} has no wishlist links.", username);
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Emotion"),
        Cell::new("Platform"),
        Cell::new("Link"),
    ]));

    for (emotion, links) in &record.wishlist {
        for (platform, link) in links {
            table.add_row(Row::new(vec![
                Cell::new(emotion),
                Cell::new(platform),
                Cell::new(link),
            ]));
        }
    }

    table.printstd();
    Ok(())
}
