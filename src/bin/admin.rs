use anyhow::{bail, Context, Result};
use chrono::Duration;
use clap::{Parser, Subcommand};

use tasknest::auth::{AuthService, NewAccount, PasswordHasher, TokenService};
use tasknest::database::notes::{NewNote, NoteStore};
use tasknest::database::todos::{NewTodo, TodoStore};
use tasknest::database::users::UserDirectory;
use tasknest::{config, database};

#[derive(Parser)]
#[command(name = "admin")]
#[command(about = "Operator tooling for the tasknest database")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List registered accounts")]
    CheckUsers,

    #[command(about = "Create the test login if it does not exist")]
    CreateTestUser,

    #[command(about = "Seed demo accounts with sample todos and notes")]
    Seed,

    #[command(about = "Copy the SQLite database file into backups/")]
    Backup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::config();

    match cli.command {
        Commands::CheckUsers => check_users().await,
        Commands::CreateTestUser => create_test_user().await,
        Commands::Seed => seed().await,
        Commands::Backup => backup(&config.database.url),
    }
}

async fn open_directory() -> Result<UserDirectory> {
    let config = config::config();
    let pool = database::connect(&config.database).await?;
    database::migrate(&pool).await?;
    Ok(UserDirectory::new(pool))
}

async fn open_auth() -> Result<(AuthService, sqlx::SqlitePool)> {
    let config = config::config();
    let pool = database::connect(&config.database).await?;
    database::migrate(&pool).await?;
    let auth = AuthService::new(
        pool.clone(),
        PasswordHasher::new(config.security.bcrypt_cost),
        TokenService::new(
            &config.security.jwt_secret,
            Duration::minutes(config.security.token_ttl_minutes),
        ),
    );
    Ok((auth, pool))
}

async fn check_users() -> Result<()> {
    let directory = open_directory().await?;
    let users = directory.list().await?;

    if users.is_empty() {
        println!("No accounts registered yet.");
        println!("Run `admin create-test-user` or register through the API.");
        return Ok(());
    }

    println!("Found {} account(s):\n", users.len());
    println!("{:<6} {:<20} {:<30} {:<20} CREATED", "ID", "USERNAME", "EMAIL", "NAME");
    println!("{}", "-".repeat(96));
    for user in users {
        println!(
            "{:<6} {:<20} {:<30} {:<20} {}",
            user.id,
            user.username,
            user.email,
            user.name,
            user.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

async fn create_test_user() -> Result<()> {
    let (auth, pool) = open_auth().await?;
    let directory = UserDirectory::new(pool);

    if let Some(existing) = directory.find_by_email("test@example.com").await? {
        println!("Test user already exists:");
        println!("  email    : {}", existing.email);
        println!("  username : {}", existing.username);
        println!("  password : test123");
        return Ok(());
    }

    auth.register(NewAccount {
        username: "testuser".to_string(),
        email: "test@example.com".to_string(),
        name: "Test User".to_string(),
        password: "test123".to_string(),
    })
    .await
    .context("creating test user")?;

    println!("✅ Test user created");
    println!("  email    : test@example.com");
    println!("  password : test123");

    Ok(())
}

async fn seed() -> Result<()> {
    let (auth, pool) = open_auth().await?;
    let directory = UserDirectory::new(pool.clone());

    let existing = directory.list().await?;
    if !existing.is_empty() {
        println!(
            "Database already has {} account(s), skipping seed.",
            existing.len()
        );
        return Ok(());
    }

    let demo = [
        ("admin", "admin@example.com", "Administrator", "admin123"),
        ("demo", "demo@example.com", "Demo User", "demo123"),
    ];

    for (username, email, name, password) in demo {
        let (user, _) = auth
            .register(NewAccount {
                username: username.to_string(),
                email: email.to_string(),
                name: name.to_string(),
                password: password.to_string(),
            })
            .await
            .with_context(|| format!("seeding {username}"))?;
        println!("✓ Created account: {username} / {password}");

        let todos = TodoStore::new(pool.clone());
        todos
            .create(
                user.id,
                NewTodo {
                    text: "Try out tasknest".to_string(),
                    completed: false,
                    due_date: None,
                    category: Some("Personal".to_string()),
                    priority: Default::default(),
                    description: None,
                },
            )
            .await?;

        let notes = NoteStore::new(pool.clone());
        notes
            .create(
                user.id,
                NewNote {
                    title: "Welcome".to_string(),
                    content: Some("Notes support categories and colors.".to_string()),
                    category: None,
                    color: None,
                },
            )
            .await?;
    }

    println!("\n✅ Seeding completed!");
    Ok(())
}

fn backup(database_url: &str) -> Result<()> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);

    if path.contains(":memory:") {
        bail!("cannot back up an in-memory database");
    }
    if !std::path::Path::new(path).exists() {
        bail!("database file not found: {path}");
    }

    std::fs::create_dir_all("backups").context("creating backups/")?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let destination = format!("backups/tasknest_backup_{timestamp}.db");
    std::fs::copy(path, &destination).context("copying database file")?;

    let size = std::fs::metadata(&destination)?.len();
    println!("✅ Database backed up to {destination} ({size} bytes)");

    Ok(())
}
