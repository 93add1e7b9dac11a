use std::time::Duration;

use yuv_lite::PlayerConfig;

/// Playback configuration, converted into a [PlayerConfig].
#[derive(Clone, Debug, clap::Parser, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PlayerArgs {
	/// How often to advance to the next frame while playing.
	#[arg(
		id = "tick",
		long = "tick",
		default_value = "32ms",
		value_parser = humantime::parse_duration,
		env = "YUV_PLAYER_TICK"
	)]
	#[serde(with = "humantime_serde")]
	pub tick: Duration,

	/// Start playing once the server reports its frame count.
	#[arg(id = "autoplay", long = "autoplay", env = "YUV_PLAYER_AUTOPLAY")]
	pub autoplay: bool,
}

impl Default for PlayerArgs {
	fn default() -> Self {
		let config = PlayerConfig::default();
		Self {
			tick: config.tick,
			autoplay: config.autoplay,
		}
	}
}

impl From<PlayerArgs> for PlayerConfig {
	fn from(args: PlayerArgs) -> Self {
		Self {
			tick: args.tick,
			autoplay: args.autoplay,
		}
	}
}
