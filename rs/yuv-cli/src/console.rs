use std::str::FromStr;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use yuv_lite::PlayerHandle;

/// A line typed on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
	PlayPause,
	Stop,
	Seek(u64),
	Quit,
}

impl FromStr for Input {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"p" | "play" | "pause" => Ok(Self::PlayPause),
			"s" | "stop" => Ok(Self::Stop),
			"q" | "quit" => Ok(Self::Quit),
			other => other
				.parse()
				.map(Self::Seek)
				.with_context(|| format!("unknown input: {other}")),
		}
	}
}

/// Forward stdin to the player and log its status, until `q` or the player exits.
pub async fn run(mut handle: PlayerHandle) -> anyhow::Result<()> {
	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	let mut stdin = true;
	let mut playing = false;

	loop {
		tokio::select! {
			res = lines.next_line(), if stdin => match res.context("failed to read stdin")? {
				Some(line) if line.trim().is_empty() => {}
				Some(line) => match line.parse() {
					Ok(Input::Quit) => return Ok(()),
					Ok(Input::PlayPause) => { handle.play_pause(); }
					Ok(Input::Stop) => { handle.stop(); }
					Ok(Input::Seek(index)) => { handle.seek(index); }
					Err(err) => tracing::warn!(%err, "expected p, s, q or a frame number"),
				},
				// Keep playing without a console.
				None => stdin = false,
			},
			status = handle.changed() => {
				let Some(status) = status else { return Ok(()) };

				if status.playing != playing {
					playing = status.playing;
					tracing::info!(index = status.index, total = status.total, playing, "status");
				} else {
					tracing::debug!(index = status.index, total = status.total, "status");
				}
			},
		}
	}
}
