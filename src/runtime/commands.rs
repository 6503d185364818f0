//! 非服务器子命令：重置密码、生成配置

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::config::AppConfig;
use crate::repository::{SeaOrmSessionStore, UserRepository};
use crate::services::AuthService;
use crate::storage;

use super::startup::load_config;

const DEFAULT_SAMPLE_PATH: &str = "config.example.toml";

/// 从不同来源获取密码
fn get_password(password: Option<String>, stdin: bool) -> Result<String> {
    if stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    } else if let Some(pwd) = password {
        Ok(pwd)
    } else {
        prompt_password_with_confirm()
    }
}

/// 交互式输入密码（带确认）
fn prompt_password_with_confirm() -> Result<String> {
    if !io::stdin().is_terminal() {
        bail!("No password provided. Use --password or --stdin flag, or run interactively.");
    }

    print!("Enter new password: ");
    io::stdout().flush()?;
    let password = rpassword::read_password().context("Failed to read password")?;

    print!("Confirm password: ");
    io::stdout().flush()?;
    let confirm = rpassword::read_password().context("Failed to read password")?;

    if password != confirm {
        bail!("Passwords do not match");
    }
    Ok(password)
}

/// 运行 reset-password 命令
pub async fn reset_password(
    config_path: Option<&str>,
    username: &str,
    password: Option<String>,
    stdin: bool,
) -> Result<()> {
    let username = username.trim();
    if username.is_empty() {
        bail!("Username must not be empty");
    }

    let new_password = get_password(password, stdin)?;
    if new_password.is_empty() {
        bail!("Password must not be empty");
    }

    let config = load_config(config_path)?;
    let db = storage::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    let auth = AuthService::new(
        UserRepository::new(db.clone()),
        std::sync::Arc::new(SeaOrmSessionStore::new(db.clone())),
        config.session.ttl_days,
        config.admin.password_hash_cost,
    );
    let created = auth
        .reset_password(username, &new_password)
        .await
        .context("Failed to update password")?;

    if created {
        println!("{} Admin user '{}' created", "✓".green().bold(), username);
    } else {
        println!(
            "{} Password for '{}' reset successfully",
            "✓".green().bold(),
            username
        );
    }

    db.close().await.ok();
    Ok(())
}

/// 运行 config generate 命令
pub fn generate_config(output_path: Option<&str>) -> Result<()> {
    let path = output_path.unwrap_or(DEFAULT_SAMPLE_PATH);
    AppConfig::default()
        .save_to_file(path)
        .with_context(|| format!("Failed to write {}", path))?;
    println!("{} Sample configuration written to {}", "✓".green().bold(), path);
    Ok(())
}
