use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::{Clock, Controller, Effect, Frame, Outbound, RenderError, Renderer, Result, Status, Transition, Transport};

/// Configuration for a [Player].
#[derive(Debug, Clone)]
pub struct PlayerConfig {
	/// The period of the playback clock; one frame is requested per tick.
	pub tick: Duration,

	/// Start playing as soon as the server reports a non-zero frame count.
	pub autoplay: bool,
}

impl Default for PlayerConfig {
	fn default() -> Self {
		Self {
			tick: Duration::from_millis(32),
			autoplay: false,
		}
	}
}

/// A request from the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
	PlayPause,
	Stop,
	Seek(u64),
}

/// Controls a running [Player] and observes its [Status].
#[derive(Clone)]
pub struct PlayerHandle {
	commands: mpsc::UnboundedSender<Command>,
	status: watch::Receiver<Status>,
}

impl PlayerHandle {
	/// Returns false if the player is no longer running.
	pub fn send(&self, command: Command) -> bool {
		self.commands.send(command).is_ok()
	}

	pub fn play_pause(&self) -> bool {
		self.send(Command::PlayPause)
	}

	pub fn stop(&self) -> bool {
		self.send(Command::Stop)
	}

	pub fn seek(&self, index: u64) -> bool {
		self.send(Command::Seek(index))
	}

	/// The most recent status.
	pub fn status(&self) -> Status {
		*self.status.borrow()
	}

	/// Wait until the status changes, returning `None` if the player exited.
	pub async fn changed(&mut self) -> Option<Status> {
		self.status.changed().await.ok()?;
		Some(*self.status.borrow_and_update())
	}

	/// Wait until the status matches the predicate, returning `None` if the player exited first.
	pub async fn wait_for(&mut self, mut f: impl FnMut(&Status) -> bool) -> Option<Status> {
		self.status.wait_for(|status| f(status)).await.ok().map(|status| *status)
	}
}

/// The event loop driving playback.
///
/// A single task owns the [Controller], the [Transport], the [Renderer] and the clock.
/// Inbound messages, host commands and clock ticks are processed one at a time, so GPU calls are never concurrent.
pub struct Player<T: Transport, R: Renderer> {
	controller: Controller,
	transport: T,
	renderer: R,
	config: PlayerConfig,

	// Only set while playing.
	clock: Option<Interval>,

	commands: mpsc::UnboundedReceiver<Command>,
	status: watch::Sender<Status>,
}

impl<T: Transport, R: Renderer> Player<T, R> {
	pub fn new(transport: T, renderer: R, config: PlayerConfig) -> (Self, PlayerHandle) {
		let controller = Controller::new();
		let (commands_tx, commands_rx) = mpsc::unbounded_channel();
		let (status_tx, status_rx) = watch::channel(controller.status());

		let player = Self {
			controller,
			transport,
			renderer,
			config,
			clock: None,
			commands: commands_rx,
			status: status_tx,
		};

		let handle = PlayerHandle {
			commands: commands_tx,
			status: status_rx,
		};

		(player, handle)
	}

	/// Run until the connection closes (`Ok`) or fails (`Err`).
	pub async fn run(mut self) -> Result<()> {
		loop {
			tokio::select! {
				res = self.transport.recv() => match res? {
					Some(msg) => self.inbound(msg).await?,
					None => {
						tracing::info!("connection closed");
						return Ok(());
					}
				},
				Some(command) = self.commands.recv() => {
					let transition = self.command(command);
					self.apply(transition).await?;
				},
				Some(_) = tick(&mut self.clock) => {
					let transition = self.controller.tick();
					self.apply(transition).await?;
				},
			}

			let status = self.controller.status();
			self.status.send_if_modified(|current| {
				let modified = *current != status;
				*current = status;
				modified
			});
		}
	}

	async fn inbound(&mut self, msg: crate::Inbound) -> Result<()> {
		let transition = self.controller.handle(msg);
		self.apply(transition).await?;

		if self.config.autoplay && self.controller.total() > 0 {
			self.config.autoplay = false;
			tracing::info!(total = self.controller.total(), "autoplay");

			let transition = self.controller.play_pause();
			self.apply(transition).await?;
		}

		Ok(())
	}

	fn command(&mut self, command: Command) -> Transition {
		tracing::debug!(?command, "command");

		match command {
			Command::PlayPause => self.controller.play_pause(),
			Command::Stop => self.controller.stop(),
			Command::Seek(index) => self.controller.seek(index),
		}
	}

	async fn apply(&mut self, transition: Transition) -> Result<()> {
		for effect in transition {
			match effect {
				Effect::Request(index) => {
					tracing::trace!(index, "requesting frame");
					self.transport.send(Outbound::RequestFrame { frame: index }).await?;
				}
				Effect::Clock(Clock::Start) => {
					let period = self.config.tick;
					let mut clock = tokio::time::interval_at(Instant::now() + period, period);
					clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
					self.clock = Some(clock);
				}
				Effect::Clock(Clock::Stop) => self.clock = None,
				Effect::Render(frame) => self.render(&frame),
			}
		}

		Ok(())
	}

	fn render(&mut self, frame: &Frame) {
		match self.renderer.render(frame) {
			Ok(()) => tracing::trace!(index = frame.index, "rendered frame"),
			Err(RenderError::Decode(err)) => {
				tracing::warn!(%err, index = frame.index, width = frame.width, height = frame.height, "dropping frame")
			}
			Err(err) => tracing::warn!(%err, index = frame.index, "failed to render frame"),
		}
	}
}

// Resolves on the next tick, or immediately with `None` when the clock is stopped (disabling the branch).
async fn tick(clock: &mut Option<Interval>) -> Option<Instant> {
	Some(clock.as_mut()?.tick().await)
}
