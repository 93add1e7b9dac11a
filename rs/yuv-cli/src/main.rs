mod console;
mod play;
mod serve;

use play::*;
use serve::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use yuv_lite::Chroma;

#[derive(Parser, Clone)]
#[command(name = "yuv", about = "View raw YUV video served over WebSocket")]
pub struct Cli {
	#[command(flatten)]
	log: yuv_native::Log,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Clone)]
pub enum Command {
	/// Connect to a frame server and play its video.
	///
	/// Type `p` to play or pause, `s` to stop, a number to seek and `q` to quit.
	Play {
		#[command(flatten)]
		client: yuv_native::ClientConfig,

		#[command(flatten)]
		player: yuv_native::PlayerArgs,

		#[command(flatten)]
		target: TargetConfig,

		/// Write every rendered frame to this PNG file.
		#[arg(long)]
		snapshot: Option<PathBuf>,

		/// Don't render on the GPU; frames are still decoded and written to the snapshot.
		#[arg(long)]
		no_gpu: bool,
	},

	/// Serve the frames of a raw planar video file.
	Serve {
		#[command(flatten)]
		config: yuv_native::ServerConfig,

		/// The raw video file, ex. produced by `ffmpeg -i input.mp4 -f rawvideo -pix_fmt yuv422p video.yuv`.
		#[arg(long)]
		input: PathBuf,

		/// The width of each frame in pixels.
		#[arg(long)]
		width: u32,

		/// The height of each frame in pixels.
		#[arg(long)]
		height: u32,

		/// The chroma layout of the file: `422` or `420`.
		#[arg(long, default_value = "422")]
		chroma: Chroma,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	cli.log.init();

	match cli.command {
		Command::Play {
			client,
			player,
			target,
			snapshot,
			no_gpu,
		} => {
			let output = Output::new(client.chroma, (!no_gpu).then_some(target), snapshot).await?;
			play(client, player.into(), output).await
		}
		Command::Serve {
			config,
			input,
			width,
			height,
			chroma,
		} => serve(config, input, width, height, chroma).await,
	}
}
