use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use user_service_sdk::{NewUser, UserClient};

#[derive(Parser)]
#[command(name = "user-cli")]
#[command(about = "Command-line client for the user service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000", env = "USER_SERVICE_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service health
    Health,
    /// Create a user
    Create(UserFields),
    /// Fetch a user by id
    Get { id: i64 },
    /// Replace every field of a user
    Update {
        id: i64,
        #[command(flatten)]
        fields: UserFields,
    },
    /// Delete a user by id
    Delete { id: i64 },
}

#[derive(Args)]
struct UserFields {
    #[arg(long)]
    username: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
}

impl From<UserFields> for NewUser {
    fn from(f: UserFields) -> Self {
        Self {
            username: f.username,
            first_name: f.first_name,
            last_name: f.last_name,
            email: f.email,
            phone: f.phone,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = UserClient::new(&cli.url);

    match cli.command {
        Commands::Health => {
            let status = client.health().await?;
            print_json(&serde_json::json!({ "status": status }))?;
        }
        Commands::Create(fields) => {
            let user = client.create_user(&fields.into()).await?;
            print_json(&user)?;
        }
        Commands::Get { id } => {
            let user = client.get_user(id).await?;
            print_json(&user)?;
        }
        Commands::Update { id, fields } => {
            let user = client.update_user(id, &fields.into()).await?;
            print_json(&user)?;
        }
        Commands::Delete { id } => {
            client.delete_user(id).await?;
            println!("deleted user {}", id);
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
