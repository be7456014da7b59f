use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand, ValueEnum};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, RegisterMemberCmd};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "roomledger_admin")]
#[command(about = "Operator utilities for roomledger (schema, rooms, members, balance audits)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./roomledger.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply or inspect schema migrations.
    Migrate {
        #[arg(value_enum, default_value_t = MigrateAction::Up)]
        action: MigrateAction,
    },
    Room(Room),
    Member(Member),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MigrateAction {
    Up,
    /// Roll back the last migration.
    Down,
    Status,
    /// Drop every table and re-apply all migrations.
    Fresh,
}

#[derive(Args, Debug)]
struct Room {
    #[command(subcommand)]
    command: RoomCommand,
}

#[derive(Subcommand, Debug)]
enum RoomCommand {
    Create(RoomCreateArgs),
    List,
    /// Compare the stored balance with the categorized records.
    Audit(RoomAuditArgs),
}

#[derive(Args, Debug)]
struct RoomCreateArgs {
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct RoomAuditArgs {
    #[arg(long)]
    room_id: i32,
    /// Overwrite the stored balance with the recomputed one.
    #[arg(long)]
    rebuild: bool,
}

#[derive(Args, Debug)]
struct Member {
    #[command(subcommand)]
    command: MemberCommand,
}

#[derive(Subcommand, Debug)]
enum MemberCommand {
    Add(MemberAddArgs),
    List(MemberListArgs),
}

#[derive(Args, Debug)]
struct MemberAddArgs {
    #[arg(long)]
    room_id: i32,
    #[arg(long)]
    full_name: String,
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct MemberListArgs {
    #[arg(long)]
    room_id: i32,
}

/// Leaves raw mode even when reading the password fails.
struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> CliResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn notice(out: &mut impl Write, message: &str) -> CliResult<()> {
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(message),
        Print("\r\n")
    )?;
    Ok(())
}

/// Reads one line from the terminal echoing `*` for each character.
fn read_masked(prompt: &str) -> CliResult<String> {
    let _raw = RawModeGuard::enter()?;
    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;

    let mut secret = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                return Ok(secret);
            }
            KeyCode::Char('c') if ctrl => {
                execute!(out, Print("\r\n"))?;
                return Err("interrupted".into());
            }
            KeyCode::Backspace if secret.pop().is_some() => {
                execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
            }
            KeyCode::Char(ch) if !ctrl => {
                secret.push(ch);
                execute!(out, Print("*"))?;
            }
            _ => {}
        }
        out.flush()?;
    }
}

/// Asks for a password and its confirmation, returning both as typed.
fn prompt_new_password() -> CliResult<(String, String)> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let password = read_masked("Password: ")?;
        if password.is_empty() {
            notice(&mut out, "Password must not be empty.")?;
            continue;
        }
        let confirm = read_masked("Confirm password: ")?;
        if password == confirm {
            return Ok((password, confirm));
        }
        notice(&mut out, "Passwords do not match. Try again.")?;
    }

    Err("too many attempts".into())
}

async fn migrate(db: &DatabaseConnection, action: MigrateAction) -> CliResult<()> {
    match action {
        MigrateAction::Up => migration::Migrator::up(db, None).await?,
        MigrateAction::Down => migration::Migrator::down(db, Some(1)).await?,
        MigrateAction::Status => migration::Migrator::status(db).await?,
        MigrateAction::Fresh => migration::Migrator::fresh(db).await?,
    }
    Ok(())
}

async fn engine_for(db: DatabaseConnection) -> CliResult<Engine> {
    migration::Migrator::up(&db, None).await?;
    Ok(Engine::builder().database(db).build().await?)
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let db = Database::connect(&cli.database_url).await?;

    match cli.command {
        Command::Migrate { action } => {
            migrate(&db, action).await?;
            println!("migrate {action:?}: done");
        }
        Command::Room(Room {
            command: RoomCommand::Create(args),
        }) => {
            let engine = engine_for(db).await?;
            let room = engine.create_room(&args.name).await?;
            println!("created room {}: {}", room.id, room.name);
        }
        Command::Room(Room {
            command: RoomCommand::List,
        }) => {
            let engine = engine_for(db).await?;
            for listing in engine.list_rooms().await? {
                println!(
                    "{:>5}  {:<24} {} member(s)  {}",
                    listing.room.id,
                    listing.room.name,
                    listing.user_count,
                    listing.status.as_str()
                );
            }
        }
        Command::Room(Room {
            command: RoomCommand::Audit(args),
        }) => {
            let engine = engine_for(db).await?;
            let audit = if args.rebuild {
                engine.rebuild_room_balance(args.room_id).await?
            } else {
                engine.audit_room_balance(args.room_id).await?
            };
            let stored = audit
                .stored
                .map_or_else(|| "none".to_string(), |total| total.to_string());
            println!(
                "room {}: stored {stored}, recomputed {}, drift {}",
                audit.room_id, audit.recomputed, audit.drift
            );
            if args.rebuild {
                println!("stored balance set to {}", audit.recomputed);
            } else if !audit.drift.is_zero() {
                std::process::exit(2);
            }
        }
        Command::Member(Member {
            command: MemberCommand::Add(args),
        }) => {
            let engine = engine_for(db).await?;
            let (password, confirm_password) = prompt_new_password()?;
            let member = engine
                .register_member(RegisterMemberCmd {
                    full_name: args.full_name,
                    email: args.email,
                    password,
                    confirm_password,
                    room_id: args.room_id,
                })
                .await?;
            println!(
                "registered member {} <{}> in room {}",
                member.id, member.email, member.room_id
            );
        }
        Command::Member(Member {
            command: MemberCommand::List(args),
        }) => {
            let engine = engine_for(db).await?;
            for member in engine.room_members(args.room_id).await? {
                println!("{:>5}  {:<24} {}", member.id, member.full_name, member.email);
            }
        }
    }

    Ok(())
}
