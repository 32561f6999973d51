//! Administration binary for the stress tracker.
//!
//! Usage:
//!   cargo run --bin stress-admin tables                      # Row counts per table
//!   cargo run --bin stress-admin export-stress <file.csv>    # Export all stress logs
//!   cargo run --bin stress-admin export-anxiety <file.csv>   # Export all test results
//!   cargo run --bin stress-admin backup <file.db>            # Snapshot the database
//!   cargo run --bin stress-admin restore <file.db>           # Replace contents from a snapshot
//!   cargo run --bin stress-admin user-list                   # All users, including disabled
//!   cargo run --bin stress-admin user-add <name> <password> [admin]
//!   cargo run --bin stress-admin user-disable <name>
//!   cargo run --bin stress-admin user-enable <name>
//!   cargo run --bin stress-admin user-passwd <name> <password>

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use stress_tracker::auth::{self, AuthService};
use stress_tracker::config::Config;
use stress_tracker::db::Database;
use stress_tracker::export;
use stress_tracker::models::{Role, User, UserPatch};
use stress_tracker::repository::{
    AnxietyResultFilter, AnxietyResultRepository, Repository, StressLogFilter, StressLogRepository,
    UserFilter, UserRepository,
};
use stress_tracker::seed;

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stress_tracker=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("help");

    let config = Config::from_env()?;
    config.ensure_data_dir()?;
    let db = Database::new(&config.database_path)?;
    seed::seed_defaults(&db)?;

    match command {
        "tables" => tables(&db),
        "export-stress" => export_stress(&db, &csv_path(&args)?),
        "export-anxiety" => export_anxiety(&db, &csv_path(&args)?),
        "backup" => {
            let path = file_arg(&args, "backup <file.db>")?;
            db.backup(&path)?;
            println!("Backup written to {}", path.display());
            Ok(())
        }
        "restore" => {
            let path = file_arg(&args, "restore <file.db>")?;
            db.restore(&path)?;
            println!("Database restored from {}", path.display());
            Ok(())
        }
        "user-list" => user_list(&db),
        "user-add" => user_add(&db, &args),
        "user-disable" => set_active(&db, &args, false),
        "user-enable" => set_active(&db, &args, true),
        "user-passwd" => user_passwd(&db, &args),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("Commands:");
    println!("  tables");
    println!("  export-stress <file.csv>");
    println!("  export-anxiety <file.csv>");
    println!("  backup <file.db>");
    println!("  restore <file.db>");
    println!("  user-list");
    println!("  user-add <name> <password> [admin]");
    println!("  user-disable <name>");
    println!("  user-enable <name>");
    println!("  user-passwd <name> <password>");
}

fn csv_path(args: &[String]) -> Result<PathBuf> {
    file_arg(args, "<command> <file.csv>")
}

fn file_arg(args: &[String], usage: &str) -> Result<PathBuf> {
    args.get(1)
        .map(PathBuf::from)
        .with_context(|| format!("Usage: stress-admin {}", usage))
}

fn tables(db: &Database) -> Result<()> {
    for (table, count) in db.table_counts()? {
        println!("{:<20} {}", table, count);
    }
    Ok(())
}

fn export_stress(db: &Database, path: &Path) -> Result<()> {
    let repo = StressLogRepository::new(db.clone());
    let csv = export::stress_logs_csv(&repo, &StressLogFilter::default())?;
    export::write_csv(path, &csv)?;
    println!("Stress logs exported to {}", path.display());
    Ok(())
}

fn export_anxiety(db: &Database, path: &Path) -> Result<()> {
    let repo = AnxietyResultRepository::new(db.clone());
    let csv = export::anxiety_results_csv(&repo, &AnxietyResultFilter::default())?;
    export::write_csv(path, &csv)?;
    println!("Anxiety results exported to {}", path.display());
    Ok(())
}

fn user_list(db: &Database) -> Result<()> {
    let users = UserRepository::new(db.clone()).list(&UserFilter {
        include_inactive: true,
        role: None,
    })?;
    for user in users {
        println!(
            "{:<6} {:<20} {:<6} {}",
            user.id,
            user.username,
            user.role.as_str(),
            if user.is_active { "active" } else { "disabled" }
        );
    }
    Ok(())
}

fn user_add(db: &Database, args: &[String]) -> Result<()> {
    let (Some(username), Some(password)) = (args.get(1), args.get(2)) else {
        bail!("Usage: stress-admin user-add <name> <password> [admin]");
    };
    let role = match args.get(3).map(String::as_str) {
        Some("admin") => Role::Admin,
        Some(other) => bail!("unknown role '{}', expected 'admin' or nothing", other),
        None => Role::User,
    };

    let auth = AuthService::new(UserRepository::new(db.clone()));
    let user = auth.register(username, password, None, role)?;
    println!("Created {} user '{}' (id {})", user.role.as_str(), user.username, user.id);
    Ok(())
}

fn set_active(db: &Database, args: &[String], active: bool) -> Result<()> {
    let Some(username) = args.get(1) else {
        bail!("Usage: stress-admin user-{} <name>", if active { "enable" } else { "disable" });
    };

    let repo = UserRepository::new(db.clone());
    let user = require_user(&repo, username)?;
    repo.update(
        user.id,
        &UserPatch {
            is_active: Some(active),
            ..Default::default()
        },
    )?;
    info!(username, active, "User active flag changed");
    println!("User '{}' is now {}", username, if active { "active" } else { "disabled" });
    Ok(())
}

fn user_passwd(db: &Database, args: &[String]) -> Result<()> {
    let (Some(username), Some(password)) = (args.get(1), args.get(2)) else {
        bail!("Usage: stress-admin user-passwd <name> <password>");
    };

    let repo = UserRepository::new(db.clone());
    let user = require_user(&repo, username)?;
    repo.update(
        user.id,
        &UserPatch {
            password_hash: Some(auth::hash_password(password)?),
            ..Default::default()
        },
    )?;
    println!("Password updated for '{}'", username);
    Ok(())
}

fn require_user(repo: &UserRepository, username: &str) -> Result<User> {
    repo.find_by_username(username)?
        .with_context(|| format!("no user named '{}'", username))
}
