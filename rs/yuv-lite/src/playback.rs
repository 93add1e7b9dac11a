//! The playback state machine.
//!
//! The [Controller] never performs I/O. Each operation mutates the playback state and returns a [Transition]
//! describing the side effects, which the [crate::Player] applies: sending frame requests, starting or stopping
//! the clock, and rendering frames.

use crate::{Frame, Inbound, Metadata};

/// The current transport state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
	/// Not playing, positioned at frame 0.
	#[default]
	Stopped,

	/// Not playing, positioned at the last requested frame.
	Paused,

	/// The clock is running and advances the frame index on every tick.
	Playing,
}

/// A snapshot of the playback state, used for progress display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status {
	pub index: u64,
	pub total: u64,
	pub playing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
	Start,
	Stop,
}

/// A side effect requested by the [Controller].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
	/// Ask the server for the frame at this index.
	Request(u64),

	/// Start or cancel the periodic tick.
	Clock(Clock),

	/// Display a frame.
	Render(Frame),
}

/// An ordered list of effects produced by a single operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "transitions must be applied"]
pub struct Transition(Vec<Effect>);

impl Transition {
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn effects(&self) -> &[Effect] {
		&self.0
	}

	/// The frame indexes requested by this transition.
	pub fn requests(&self) -> impl Iterator<Item = u64> + '_ {
		self.0.iter().filter_map(|effect| match effect {
			Effect::Request(index) => Some(*index),
			_ => None,
		})
	}

	fn push(&mut self, effect: impl Into<Option<Effect>>) {
		if let Some(effect) = effect.into() {
			self.0.push(effect);
		}
	}
}

impl IntoIterator for Transition {
	type Item = Effect;
	type IntoIter = std::vec::IntoIter<Effect>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

/// Owns the playback state and the frame count reported by the server.
#[derive(Debug, Default)]
pub struct Controller {
	index: u64,
	total: u64,
	mode: Mode,

	// The last index we asked for, so we never ask twice in a row.
	requested: Option<u64>,
}

impl Controller {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn mode(&self) -> Mode {
		self.mode
	}

	pub fn index(&self) -> u64 {
		self.index
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	pub fn is_playing(&self) -> bool {
		self.mode == Mode::Playing
	}

	pub fn status(&self) -> Status {
		Status {
			index: self.index,
			total: self.total,
			playing: self.is_playing(),
		}
	}

	/// Toggle between playing and paused.
	///
	/// Starting playback at or past the end rewinds to frame 0 first.
	/// Nothing happens until the server has reported a non-zero frame count.
	pub fn play_pause(&mut self) -> Transition {
		let mut transition = Transition::default();

		if self.mode == Mode::Playing {
			self.mode = Mode::Paused;
			transition.push(Effect::Clock(Clock::Stop));
			return transition;
		}

		if self.total == 0 {
			tracing::debug!("no frames available, ignoring play");
			return transition;
		}

		if self.index >= self.total {
			self.index = 0;
		}

		self.mode = Mode::Playing;
		transition.push(self.request());
		transition.push(Effect::Clock(Clock::Start));
		transition
	}

	/// Stop playback and rewind to frame 0.
	pub fn stop(&mut self) -> Transition {
		let mut transition = Transition::default();

		if self.mode == Mode::Playing {
			transition.push(Effect::Clock(Clock::Stop));
		}

		self.mode = Mode::Stopped;
		self.index = 0;
		transition.push(self.request());
		transition
	}

	/// Jump to the given frame, even if it's past the end.
	///
	/// Stopped always means frame 0, so seeking elsewhere while stopped pauses instead.
	pub fn seek(&mut self, index: u64) -> Transition {
		let mut transition = Transition::default();
		self.index = index;

		if self.mode == Mode::Stopped && index != 0 {
			self.mode = Mode::Paused;
		}

		transition.push(self.request());
		transition
	}

	/// Advance the clock by one frame, pausing at the end of the sequence.
	pub fn tick(&mut self) -> Transition {
		let mut transition = Transition::default();

		if self.mode != Mode::Playing {
			// A tick that raced with pause/stop.
			return transition;
		}

		if self.index < self.total {
			self.index += 1;
			transition.push(self.request());
		}

		if self.index >= self.total {
			tracing::debug!(index = self.index, total = self.total, "reached the end");
			// Hold the index; the next play will rewind.
			self.mode = Mode::Paused;
			transition.push(Effect::Clock(Clock::Stop));
		}

		transition
	}

	/// Process a message from the server.
	pub fn handle(&mut self, msg: Inbound) -> Transition {
		let mut transition = Transition::default();

		match msg {
			Inbound::Frame(frame) => transition.push(Effect::Render(frame)),
			Inbound::Metadata(metadata) => self.metadata(metadata),
		}

		transition
	}

	fn metadata(&mut self, metadata: Metadata) {
		tracing::debug!(total = metadata.frame_count, "received metadata");
		self.total = metadata.frame_count;
	}

	fn request(&mut self) -> Option<Effect> {
		if self.requested == Some(self.index) {
			return None;
		}

		self.requested = Some(self.index);
		Some(Effect::Request(self.index))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bytes::Bytes;

	fn metadata(frame_count: u64) -> Inbound {
		Inbound::Metadata(Metadata { frame_count })
	}

	fn controller(total: u64) -> Controller {
		let mut controller = Controller::new();
		assert!(controller.handle(metadata(total)).is_empty());
		controller
	}

	#[test]
	fn test_initial_state() {
		let controller = Controller::new();
		assert_eq!(controller.mode(), Mode::Stopped);
		assert_eq!(controller.status(), Status::default());
	}

	#[test]
	fn test_play_without_frames() {
		let mut controller = Controller::new();
		assert!(controller.play_pause().is_empty());
		assert_eq!(controller.mode(), Mode::Stopped);
	}

	#[test]
	fn test_play_pause() {
		let mut controller = controller(10);

		let transition = controller.play_pause();
		assert_eq!(
			transition.effects(),
			&[Effect::Request(0), Effect::Clock(Clock::Start)]
		);
		assert_eq!(controller.mode(), Mode::Playing);

		assert_eq!(controller.tick().effects(), &[Effect::Request(1)]);
		assert_eq!(controller.tick().effects(), &[Effect::Request(2)]);

		let transition = controller.play_pause();
		assert_eq!(transition.effects(), &[Effect::Clock(Clock::Stop)]);
		assert_eq!(controller.mode(), Mode::Paused);
		assert_eq!(controller.index(), 2);

		// Resuming doesn't request the same frame again.
		assert_eq!(controller.play_pause().effects(), &[Effect::Clock(Clock::Start)]);
		assert_eq!(controller.index(), 2);
	}

	#[test]
	fn test_play_to_end() {
		let mut controller = controller(10);
		let _ = controller.play_pause();

		for i in 1..=10 {
			let transition = controller.tick();
			assert_eq!(transition.requests().collect::<Vec<_>>(), vec![i]);
		}

		assert_eq!(
			controller.status(),
			Status {
				index: 10,
				total: 10,
				playing: false
			}
		);
		assert_eq!(controller.mode(), Mode::Paused);

		// No auto-reset, and further ticks are ignored.
		assert!(controller.tick().is_empty());
		assert_eq!(controller.index(), 10);
	}

	#[test]
	fn test_play_at_end_rewinds() {
		let mut controller = controller(10);

		assert_eq!(controller.seek(10).effects(), &[Effect::Request(10)]);
		assert_eq!(controller.index(), 10);

		let transition = controller.play_pause();
		assert_eq!(controller.index(), 0);
		assert!(controller.is_playing());
		assert_eq!(transition.requests().collect::<Vec<_>>(), vec![0]);
	}

	#[test]
	fn test_stop() {
		// From stopped
		let mut controller = controller(5);
		let _ = controller.stop();
		assert_eq!(controller.status(), Status { index: 0, total: 5, playing: false });

		// From playing
		let _ = controller.play_pause();
		let _ = controller.tick();
		let transition = controller.stop();
		assert_eq!(
			transition.effects(),
			&[Effect::Clock(Clock::Stop), Effect::Request(0)]
		);
		assert_eq!(controller.status(), Status { index: 0, total: 5, playing: false });
		assert_eq!(controller.mode(), Mode::Stopped);

		// From paused
		let _ = controller.seek(3);
		let _ = controller.play_pause();
		let _ = controller.play_pause();
		assert_eq!(controller.mode(), Mode::Paused);
		let _ = controller.stop();
		assert_eq!(controller.status(), Status { index: 0, total: 5, playing: false });

		// From the end
		let _ = controller.play_pause();
		for _ in 0..5 {
			let _ = controller.tick();
		}
		assert_eq!(controller.index(), 5);
		let _ = controller.stop();
		assert_eq!(controller.status(), Status { index: 0, total: 5, playing: false });
	}

	#[test]
	fn test_seek_while_stopped_pauses() {
		let mut controller = controller(10);

		let _ = controller.seek(5);
		assert_eq!(controller.mode(), Mode::Paused);
		assert_eq!(controller.status(), Status { index: 5, total: 10, playing: false });

		let _ = controller.stop();
		assert_eq!(controller.mode(), Mode::Stopped);

		// Frame 0 is where stopped already is.
		let _ = controller.seek(0);
		assert_eq!(controller.mode(), Mode::Stopped);

		// Seeking while playing keeps playing.
		let _ = controller.play_pause();
		let _ = controller.seek(7);
		assert_eq!(controller.mode(), Mode::Playing);
	}

	#[test]
	fn test_one_request_per_change() {
		let mut controller = controller(100);
		let mut requests = Vec::new();

		requests.extend(controller.seek(5).requests());
		requests.extend(controller.seek(5).requests());
		requests.extend(controller.seek(6).requests());
		requests.extend(controller.play_pause().requests());
		requests.extend(controller.tick().requests());
		requests.extend(controller.tick().requests());
		requests.extend(controller.seek(20).requests());
		requests.extend(controller.tick().requests());
		requests.extend(controller.stop().requests());
		requests.extend(controller.stop().requests());

		assert_eq!(requests, vec![5, 6, 7, 8, 20, 21, 0]);
	}

	#[test]
	fn test_metadata_mid_playback() {
		let mut controller = controller(10);
		let _ = controller.play_pause();
		let _ = controller.tick();
		let _ = controller.tick();

		let transition = controller.handle(metadata(50));
		assert!(transition.is_empty());
		assert_eq!(controller.status(), Status { index: 2, total: 50, playing: true });
	}

	#[test]
	fn test_metadata_shrinks_below_index() {
		let mut controller = controller(10);
		let _ = controller.seek(8);
		let _ = controller.play_pause();

		let _ = controller.handle(metadata(4));
		assert!(controller.is_playing());

		// The next tick notices we're past the end and pauses without requesting.
		let transition = controller.tick();
		assert_eq!(transition.effects(), &[Effect::Clock(Clock::Stop)]);
		assert_eq!(controller.index(), 8);
		assert_eq!(controller.mode(), Mode::Paused);
	}

	#[test]
	fn test_frame_is_rendered() {
		let mut controller = controller(3);
		let frame = Frame {
			data: Bytes::from_static(&[0; 6]),
			width: 2,
			height: 2,
			index: 1,
		};

		let transition = controller.handle(Inbound::Frame(frame.clone()));
		assert_eq!(transition.effects(), &[Effect::Render(frame)]);
		assert_eq!(controller.status(), Status { index: 0, total: 3, playing: false });
	}
}
