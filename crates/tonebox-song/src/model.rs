#![forbid(unsafe_code)]

//! Song data model.
//!
//! A song is a grid of channels by bars. Every channel owns the same number
//! of patterns, instruments and bars; the counts live on [`Song`] and the
//! resize methods here keep every channel in step with them.

pub const DEFAULT_PITCH_CHANNELS: u32 = 3;
pub const DEFAULT_NOISE_CHANNELS: u32 = 1;
pub const DEFAULT_PATTERNS_PER_CHANNEL: u32 = 8;
pub const DEFAULT_INSTRUMENTS_PER_CHANNEL: u32 = 1;
pub const DEFAULT_BAR_COUNT: u32 = 16;

pub const PITCH_OCTAVE: u8 = 2;
pub const NOISE_OCTAVE: u8 = 0;
pub const DEFAULT_VOLUME: u8 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Pitch,
    Noise,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    Chip,
    Fm,
    Noise,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instrument {
    pub kind: InstrumentKind,
    pub volume: u8,
}

impl Instrument {
    /// The instrument a fresh channel of `kind` starts with.
    pub fn for_channel(kind: ChannelKind) -> Self {
        let kind = match kind {
            ChannelKind::Pitch => InstrumentKind::Chip,
            ChannelKind::Noise => InstrumentKind::Noise,
        };
        Self {
            kind,
            volume: DEFAULT_VOLUME,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Note {
    pub start: u32,
    pub end: u32,
    pub pitch: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pattern {
    /// Index into the owning channel's instruments.
    pub instrument: u32,
    pub notes: Vec<Note>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    pub kind: ChannelKind,
    pub octave: u8,
    pub patterns: Vec<Pattern>,
    pub instruments: Vec<Instrument>,
    /// `0` is an empty bar, `n` plays pattern `n - 1`.
    pub bars: Vec<u32>,
}

impl Channel {
    pub fn new(kind: ChannelKind, patterns: u32, instruments: u32, bars: u32) -> Self {
        let octave = match kind {
            ChannelKind::Pitch => PITCH_OCTAVE,
            ChannelKind::Noise => NOISE_OCTAVE,
        };
        Self {
            kind,
            octave,
            patterns: vec![Pattern::default(); patterns as usize],
            instruments: vec![Instrument::for_channel(kind); instruments as usize],
            bars: vec![0; bars as usize],
        }
    }

    /// The pattern played at `bar`, if any.
    pub fn pattern_at(&self, bar: usize) -> Option<&Pattern> {
        let index = *self.bars.get(bar)?;
        if index == 0 {
            return None;
        }
        self.patterns.get(index as usize - 1)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Song {
    pub pitch_channel_count: u32,
    pub noise_channel_count: u32,
    pub patterns_per_channel: u32,
    pub instruments_per_channel: u32,
    pub bar_count: u32,
    /// Pitch channels first, then noise channels.
    pub channels: Vec<Channel>,
}

impl Default for Song {
    fn default() -> Self {
        Self::with_counts(
            DEFAULT_PITCH_CHANNELS,
            DEFAULT_NOISE_CHANNELS,
            DEFAULT_PATTERNS_PER_CHANNEL,
            DEFAULT_INSTRUMENTS_PER_CHANNEL,
            DEFAULT_BAR_COUNT,
        )
    }
}

impl Song {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty song with the given shape.
    pub fn with_counts(pitch: u32, noise: u32, patterns: u32, instruments: u32, bars: u32) -> Self {
        let mut channels = Vec::with_capacity((pitch + noise) as usize);
        for _ in 0..pitch {
            channels.push(Channel::new(ChannelKind::Pitch, patterns, instruments, bars));
        }
        for _ in 0..noise {
            channels.push(Channel::new(ChannelKind::Noise, patterns, instruments, bars));
        }

        Self {
            pitch_channel_count: pitch,
            noise_channel_count: noise,
            patterns_per_channel: patterns,
            instruments_per_channel: instruments,
            bar_count: bars,
            channels,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn pitch_channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter().filter(|c| c.kind == ChannelKind::Pitch)
    }

    pub fn noise_channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter().filter(|c| c.kind == ChannelKind::Noise)
    }

    /// Resize every channel's pattern list.
    ///
    /// Bars that referenced a dropped pattern become empty.
    pub fn set_patterns_per_channel(&mut self, count: u32) {
        for channel in &mut self.channels {
            for bar in &mut channel.bars {
                if *bar > count {
                    *bar = 0;
                }
            }
            channel.patterns.resize_with(count as usize, Pattern::default);
        }
        self.patterns_per_channel = count;
    }

    /// Resize every channel's instrument list.
    ///
    /// New instruments copy the channel's last instrument. Patterns that
    /// referenced a dropped instrument fall back to the first one.
    pub fn set_instruments_per_channel(&mut self, count: u32) {
        for channel in &mut self.channels {
            let template = channel
                .instruments
                .last()
                .cloned()
                .unwrap_or_else(|| Instrument::for_channel(channel.kind));
            channel.instruments.resize(count as usize, template);
            for pattern in &mut channel.patterns {
                if pattern.instrument >= count {
                    pattern.instrument = 0;
                }
            }
        }
        self.instruments_per_channel = count;
    }

    /// Change how many pitch and noise channels the song has.
    ///
    /// The first `min(old, new)` channels of each kind survive untouched.
    pub fn set_channel_counts(&mut self, pitch: u32, noise: u32) {
        let (mut pitch_channels, mut noise_channels): (Vec<_>, Vec<_>) = self
            .channels
            .drain(..)
            .partition(|c| c.kind == ChannelKind::Pitch);

        let (patterns, instruments, bars) = (
            self.patterns_per_channel,
            self.instruments_per_channel,
            self.bar_count,
        );
        pitch_channels.truncate(pitch as usize);
        pitch_channels.resize_with(pitch as usize, || {
            Channel::new(ChannelKind::Pitch, patterns, instruments, bars)
        });
        noise_channels.truncate(noise as usize);
        noise_channels.resize_with(noise as usize, || {
            Channel::new(ChannelKind::Noise, patterns, instruments, bars)
        });

        self.channels = pitch_channels;
        self.channels.append(&mut noise_channels);
        self.pitch_channel_count = pitch;
        self.noise_channel_count = noise;
    }

    /// Structural problems with the song. Empty means consistent.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let expected = (self.pitch_channel_count + self.noise_channel_count) as usize;
        if self.channels.len() != expected {
            errors.push(format!(
                "expected {expected} channels, found {}",
                self.channels.len()
            ));
        }

        for (i, channel) in self.channels.iter().enumerate() {
            let want_kind = if (i as u32) < self.pitch_channel_count {
                ChannelKind::Pitch
            } else {
                ChannelKind::Noise
            };
            if channel.kind != want_kind {
                errors.push(format!("channel {i} should be {want_kind:?}"));
            }
            if channel.patterns.len() != self.patterns_per_channel as usize {
                errors.push(format!(
                    "channel {i} has {} patterns, expected {}",
                    channel.patterns.len(),
                    self.patterns_per_channel
                ));
            }
            if channel.instruments.len() != self.instruments_per_channel as usize {
                errors.push(format!(
                    "channel {i} has {} instruments, expected {}",
                    channel.instruments.len(),
                    self.instruments_per_channel
                ));
            }
            if channel.bars.len() != self.bar_count as usize {
                errors.push(format!(
                    "channel {i} has {} bars, expected {}",
                    channel.bars.len(),
                    self.bar_count
                ));
            }
            if let Some(bar) = channel
                .bars
                .iter()
                .position(|&b| b > self.patterns_per_channel)
            {
                errors.push(format!("channel {i} bar {bar} references a missing pattern"));
            }
            if let Some(p) = channel
                .patterns
                .iter()
                .position(|p| p.instrument >= self.instruments_per_channel)
            {
                errors.push(format!(
                    "channel {i} pattern {p} references a missing instrument"
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy_song() -> Song {
        let mut song = Song::with_counts(2, 1, 4, 3, 4);
        for channel in &mut song.channels {
            channel.bars = vec![1, 4, 0, 3];
            channel.patterns[3].instrument = 2;
            channel.patterns[3].notes.push(Note {
                start: 0,
                end: 4,
                pitch: 12,
            });
            channel.instruments[2].volume = 5;
        }
        song
    }

    #[test]
    fn default_song_shape() {
        let song = Song::default();
        assert_eq!(song.pitch_channel_count, 3);
        assert_eq!(song.noise_channel_count, 1);
        assert_eq!(song.patterns_per_channel, 8);
        assert_eq!(song.instruments_per_channel, 1);
        assert_eq!(song.bar_count, 16);
        assert_eq!(song.channel_count(), 4);
        assert!(song.invariant_violations().is_empty());
    }

    #[test]
    fn fresh_channels_use_kind_octave() {
        let song = Song::default();
        assert!(song.pitch_channels().all(|c| c.octave == PITCH_OCTAVE));
        assert!(song.noise_channels().all(|c| c.octave == NOISE_OCTAVE));
        assert_eq!(song.noise_channels().count(), 1);
    }

    #[test]
    fn shrinking_patterns_empties_dangling_bars() {
        let mut song = busy_song();
        song.set_patterns_per_channel(2);
        assert!(song.invariant_violations().is_empty());
        assert_eq!(song.channels[0].bars, vec![1, 0, 0, 0]);
        assert_eq!(song.channels[0].patterns.len(), 2);
    }

    #[test]
    fn growing_patterns_appends_empty_ones() {
        let mut song = busy_song();
        song.set_patterns_per_channel(6);
        assert_eq!(song.channels[1].patterns.len(), 6);
        assert_eq!(song.channels[1].patterns[5], Pattern::default());
        assert_eq!(song.channels[1].bars, vec![1, 4, 0, 3]);
        assert!(song.channels[1].pattern_at(1).is_some_and(|p| !p.notes.is_empty()));
    }

    #[test]
    fn new_instruments_copy_the_last_one() {
        let mut song = busy_song();
        song.set_instruments_per_channel(5);
        let instruments = &song.channels[0].instruments;
        assert_eq!(instruments.len(), 5);
        assert_eq!(instruments[3].volume, 5);
        assert_eq!(instruments[4].volume, 5);
        assert!(song.invariant_violations().is_empty());
    }

    #[test]
    fn dropped_instruments_fall_back_to_first() {
        let mut song = busy_song();
        song.set_instruments_per_channel(2);
        assert_eq!(song.channels[0].patterns[3].instrument, 0);
        assert!(song.invariant_violations().is_empty());
    }

    #[test]
    fn channel_counts_keep_prefix_of_each_kind() {
        let mut song = busy_song();
        song.set_channel_counts(3, 0);
        assert_eq!(song.channel_count(), 3);
        assert_eq!(song.channels[0].bars, vec![1, 4, 0, 3]);
        assert_eq!(song.channels[1].bars, vec![1, 4, 0, 3]);
        assert_eq!(song.channels[2].bars, vec![0, 0, 0, 0]);
        assert_eq!(song.channels[2].octave, PITCH_OCTAVE);
        assert!(song.invariant_violations().is_empty());

        song.set_channel_counts(1, 2);
        assert_eq!(song.channels[0].kind, ChannelKind::Pitch);
        assert_eq!(song.channels[1].kind, ChannelKind::Noise);
        assert_eq!(song.channels[2].kind, ChannelKind::Noise);
        assert_eq!(song.channels[2].patterns.len(), 4);
        assert_eq!(song.channels[2].instruments.len(), 3);
        assert!(song.invariant_violations().is_empty());
    }

    #[test]
    fn violations_report_broken_shapes() {
        let mut song = Song::default();
        song.channels[0].bars[0] = 99;
        song.channels.pop();
        let errors = song.invariant_violations();
        assert!(errors.iter().any(|e| e.contains("expected 4 channels")));
        assert!(errors.iter().any(|e| e.contains("missing pattern")));
    }

    #[test]
    fn pattern_at_handles_empty_and_missing_bars() {
        let song = busy_song();
        assert!(song.channels[0].pattern_at(2).is_none());
        assert!(song.channels[0].pattern_at(99).is_none());
        assert!(song.channels[0].pattern_at(0).is_some());
    }
}
