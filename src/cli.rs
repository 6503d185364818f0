//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// LinkHub - a self-hosted link-in-bio page with an admin dashboard
#[derive(Parser, Debug)]
#[command(name = "linkhub")]
#[command(version)]
#[command(about = "A self-hosted link-in-bio page", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Set the password of an admin user, creating the user if missing
    ResetPassword {
        /// Admin username
        #[arg(long)]
        username: String,

        /// New password (if not provided, will prompt interactively)
        #[arg(long, conflicts_with = "stdin")]
        password: Option<String>,

        /// Read password from stdin (for scripting)
        #[arg(long)]
        stdin: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_serve() {
        let cli = Cli::try_parse_from(["linkhub"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_reset_password_args() {
        let cli = Cli::try_parse_from([
            "linkhub",
            "-c",
            "prod.toml",
            "reset-password",
            "--username",
            "admin",
            "--stdin",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some("prod.toml"));
        match cli.command {
            Some(Commands::ResetPassword {
                username,
                password,
                stdin,
            }) => {
                assert_eq!(username, "admin");
                assert!(password.is_none());
                assert!(stdin);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_password_and_stdin_conflict() {
        assert!(
            Cli::try_parse_from([
                "linkhub",
                "reset-password",
                "--username",
                "admin",
                "--password",
                "x",
                "--stdin",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_config_generate() {
        let cli = Cli::try_parse_from(["linkhub", "config", "generate", "out.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigCommands::Generate { output_path: Some(ref p) }
            }) if p == "out.toml"
        ));
    }
}
