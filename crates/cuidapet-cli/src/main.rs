//! CuidaPet CLI - Account administration
//!
//! Usage:
//!   cuidapet init-db
//!   cuidapet create-user <username> --role <role>
//!   cuidapet list-users
//!   cuidapet verify-token <token>
//!   cuidapet hash-password <plaintext>

use anyhow::Context;
use clap::{Parser, Subcommand};
use cuidapet_api::auth::{CredentialHasher, TokenService, UserDirectory};
use cuidapet_core::{open_store, AppConfig, PgStore};

#[derive(Parser)]
#[command(name = "cuidapet")]
#[command(about = "CuidaPet account administration")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the account tables in PostgreSQL
    InitDb,
    /// Create a user account (e.g. the first programador)
    CreateUser {
        /// Login name
        username: String,
        /// programador, empleado or cliente
        #[arg(long)]
        role: String,
        /// Plaintext password
        #[arg(long, env = "CUIDAPET_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List every user
    ListUsers,
    /// Verify a session token and print its claims
    VerifyToken {
        /// Raw token, with or without the "Bearer " prefix
        token: String,
    },
    /// Print an Argon2id digest for a password
    HashPassword {
        /// Password to hash
        plaintext: String,
    },
}

async fn directory(config: &AppConfig) -> anyhow::Result<UserDirectory> {
    let store = open_store(&config.database)
        .await
        .context("failed to open account store")?;
    let hasher = CredentialHasher::new(&config.auth.password)?;
    Ok(UserDirectory::new(store, hasher))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cuidapet=info,warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    match cli.command {
        Commands::InitDb => {
            let store = PgStore::new(
                &config.database.postgres_url,
                config.database.postgres_pool_size,
            )
            .await
            .context("failed to connect to PostgreSQL")?;
            store.ensure_schema().await?;
            println!("Schema ready");
        }
        Commands::CreateUser {
            username,
            role,
            password,
        } => {
            let directory = directory(&config).await?;
            let id = directory.create(&username, &password, &role).await?;
            tracing::info!(user_id = %id, %username, %role, "User created");
            println!("Created user {username} with id {id}");
        }
        Commands::ListUsers => {
            let directory = directory(&config).await?;
            for user in directory.list_all().await? {
                println!("{}\t{}\t{}", user.id, user.username, user.role);
            }
        }
        Commands::VerifyToken { token } => {
            let claims = TokenService::new(&config.auth).decode_claims(&token)?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
        Commands::HashPassword { plaintext } => {
            let hasher = CredentialHasher::new(&config.auth.password)?;
            println!("{}", hasher.hash(&plaintext)?);
        }
    }

    Ok(())
}
