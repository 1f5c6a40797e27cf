use bcrypt::{hash, DEFAULT_COST};
use helpdesk_backend::config::AppConfig;
use helpdesk_backend::db::create_pool;
use helpdesk_backend::models::auth::{NewUser, ROLE_ADMIN};
use helpdesk_backend::store::{PgStore, UserStore};
use std::io::{self, Write};

fn prompt(label: &str) -> io::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Helpdesk - Create Admin");
    println!("==========================================");

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config).await?;
    let store = PgStore::new(pool);

    let username = prompt("Username")?;
    if username.is_empty() {
        eprintln!("Username cannot be empty");
        return Ok(());
    }

    if store.find_user_by_username(&username).await?.is_some() {
        eprintln!("User '{}' already exists", username);
        return Ok(());
    }

    let mut full_name = prompt("Full name")?;
    if full_name.is_empty() {
        full_name = username.clone();
    }

    print!("Password: ");
    io::stdout().flush()?;
    let password = rpassword::read_password()?;

    if password.len() < 6 {
        eprintln!("Password must be at least 6 characters long");
        return Ok(());
    }

    print!("Password (again): ");
    io::stdout().flush()?;
    if password != rpassword::read_password()? {
        eprintln!("Passwords don't match");
        return Ok(());
    }

    let password_hash = hash(&password, DEFAULT_COST)?;

    match store
        .insert_user(&NewUser {
            username: username.clone(),
            full_name,
            password_hash,
            role: ROLE_ADMIN.to_string(),
        })
        .await
    {
        Ok(id) => {
            println!();
            println!("Admin created successfully!");
            println!("   ID: {}", id);
            println!("   Username: {}", username);
            println!("   Role: {}", ROLE_ADMIN);
            println!();
            println!("Log in through POST /api/auth/login with these credentials.");
        }
        Err(e) => {
            eprintln!("Failed to create admin: {}", e);
        }
    }

    store.pool().close().await;
    Ok(())
}
