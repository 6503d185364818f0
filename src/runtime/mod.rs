//! 应用生命周期
//!
//! - `startup`: 配置、日志、数据库、初始化数据
//! - `server`: HTTP 服务器
//! - `shutdown`: 优雅关闭
//! - `commands`: 非服务器子命令

pub mod commands;
pub mod server;
pub mod shutdown;
pub mod startup;

use anyhow::Result;

use crate::cli::{Cli, Commands, ConfigCommands};

/// 按命令行分发到对应的运行模式
pub async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => server::run_server(config_path).await,
        Commands::ResetPassword {
            username,
            password,
            stdin,
        } => commands::reset_password(config_path, &username, password, stdin).await,
        Commands::Config {
            action: ConfigCommands::Generate { output_path },
        } => commands::generate_config(output_path.as_deref()),
    }
}
