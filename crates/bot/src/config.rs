//! Process configuration from flags and environment.

use std::path::PathBuf;

use clap::Parser;
use hifz_storage::json_storage::DEFAULT_PROGRESS_FILE;

/// Guild where slash commands are registered unless overridden.
pub const DEFAULT_GUILD_ID: u64 = 816700950323527680;

/// Bot configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "hifz-bot")]
#[command(version)]
#[command(about = "Discord bot that tracks Qur'an memorization progress", long_about = None)]
pub struct Config {
    /// Discord bot token
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Guild where the slash commands are registered
    #[arg(long, env = "HIFZ_GUILD_ID", default_value_t = DEFAULT_GUILD_ID)]
    pub guild_id: u64,

    /// Progress file path
    #[arg(long, env = "HIFZ_PROGRESS_FILE", default_value = DEFAULT_PROGRESS_FILE)]
    pub progress_file: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "HIFZ_LOG", default_value = "info")]
    pub log_level: String,

    /// Attempts per progress file write
    #[arg(long, env = "HIFZ_WRITE_ATTEMPTS", default_value_t = 3)]
    pub write_attempts: u32,
}

impl Config {
    /// Validate flag/environment-derived values.
    pub fn validate(&self) -> Result<(), String> {
        if self.token.trim().is_empty() {
            return Err("DISCORD_TOKEN cannot be empty".to_string());
        }
        if self.guild_id == 0 {
            return Err("HIFZ_GUILD_ID must be a non-zero guild ID".to_string());
        }
        if self.write_attempts == 0 {
            return Err("HIFZ_WRITE_ATTEMPTS must be at least 1".to_string());
        }
        if self.progress_file.as_os_str().is_empty() {
            return Err("HIFZ_PROGRESS_FILE cannot be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["hifz-bot", "--token", "abc"]).unwrap();
        assert_eq!(config.token, "abc");
        assert_eq!(config.guild_id, DEFAULT_GUILD_ID);
        assert_eq!(config.progress_file, PathBuf::from("progress.json"));
        assert_eq!(config.write_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from([
            "hifz-bot",
            "--token",
            "abc",
            "--guild-id",
            "42",
            "--progress-file",
            "/var/lib/hifz/progress.json",
        ])
        .unwrap();
        assert_eq!(config.guild_id, 42);
        assert_eq!(config.progress_file, PathBuf::from("/var/lib/hifz/progress.json"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::try_parse_from(["hifz-bot", "--token", "abc"]).unwrap();
        config.guild_id = 0;
        assert!(config.validate().is_err());

        config.guild_id = 1;
        config.token = "  ".to_string();
        assert!(config.validate().is_err());

        config.token = "abc".to_string();
        config.write_attempts = 0;
        assert!(config.validate().is_err());
    }
}
