use clap::Parser;
use sessionframe::api::{ChangePassword, LoginParams, ProfileUpdate, RegisterParams, UserProfile};
use sessionframe::cli::{Args, Command, init_logging, validate_base_url};
use sessionframe::session::Session;
use sessionframe::{ClientConfig, create_session};
use tracing::error;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(base_url) = validate_base_url(&args.base_url) else {
        std::process::exit(1);
    };

    let config = ClientConfig {
        base_url,
        credentials_path: args.credentials.into(),
    };
    let session = create_session(&config);

    if let Err(e) = run(&session, args.command).await {
        error!(error = %e, "Command failed");
        std::process::exit(1);
    }
}

async fn run(session: &Session, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Login {
            email,
            password,
            remember,
        } => {
            let user = session
                .login(LoginParams { email, password }, remember)
                .await?;
            print_user(&user)
        }
        Command::Register { email, password } => {
            let user = session.register(RegisterParams { email, password }).await?;
            print_user(&user)
        }
        Command::Whoami => {
            session.restore().await;
            match session.snapshot().user {
                Some(user) => print_user(&user),
                None => Err("Not logged in".into()),
            }
        }
        Command::UpdateProfile {
            first_name,
            last_name,
            phone_number,
            avatar,
        } => {
            let update = ProfileUpdate {
                first_name,
                last_name,
                phone_number,
                avatar,
            };
            let user = session.update_profile(update).await?;
            print_user(&user)
        }
        Command::ChangePassword {
            current_password,
            new_password,
        } => {
            session
                .change_password(ChangePassword {
                    current_password,
                    new_password,
                })
                .await?;
            println!("Password changed");
            Ok(())
        }
        Command::Logout => {
            session.logout().await;
            println!("Logged out");
            Ok(())
        }
    }
}

fn print_user(user: &UserProfile) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(user)?);
    Ok(())
}
