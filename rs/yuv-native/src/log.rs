use serde_with::{DisplayFromStr, serde_as};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Logging configuration.
#[serde_as]
#[derive(Clone, Debug, clap::Args, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Log {
	/// The default log level, used unless overridden by `RUST_LOG` directives.
	#[arg(id = "log-level", long = "log-level", default_value = "info", env = "YUV_LOG_LEVEL")]
	#[serde_as(as = "DisplayFromStr")]
	pub level: tracing::Level,
}

impl Default for Log {
	fn default() -> Self {
		Self {
			level: tracing::Level::INFO,
		}
	}
}

impl Log {
	/// Install a global subscriber writing to stderr.
	pub fn init(&self) {
		let filter = EnvFilter::builder()
			.with_default_directive(LevelFilter::from_level(self.level).into())
			.from_env_lossy();

		// Fails if a subscriber was already installed, which is fine.
		let _ = tracing_subscriber::fmt()
			.with_env_filter(filter)
			.with_writer(std::io::stderr)
			.try_init();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_toml_level() {
		let log: Log = toml::from_str(r#"level = "debug""#).unwrap();
		assert_eq!(log.level, tracing::Level::DEBUG);

		let log: Log = toml::from_str("").unwrap();
		assert_eq!(log.level, tracing::Level::INFO);

		assert!(toml::from_str::<Log>(r#"verbose = true"#).is_err());
	}
}
