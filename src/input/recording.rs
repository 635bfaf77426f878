//! Tick-indexed input recordings and their string codec.
//!
//! Layout of the plain string:
//!
//! ```text
//! 0:jump>1|fire>1 \x10 3:jump>0 \x10 12:  %  0>1,0;5>0,0 ^ 2>0,-1
//! ```
//!
//! Button segments are `tick:name>v|name>v` joined by ASCII 16, with an empty
//! `tick:` segment giving the recording length. `%` separates the axis
//! section, which holds one `^`-joined block per axis, each a `;`-joined list
//! of `tick>x,y` changes. Trailing axes without changes are left out, so a
//! decoded recording may list fewer axes than the controller it came from;
//! playback holds the missing ones at neutral. The stored form is that string
//! compressed with brotli and base64 encoded.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use glam::Vec2;

pub(crate) const SEGMENT_SEPARATOR: char = '\u{10}';
pub(crate) const SECTION_SEPARATOR: char = '%';
pub(crate) const AXIS_SEPARATOR: char = '^';
pub(crate) const ENTRY_SEPARATOR: char = ';';
pub(crate) const TICK_SEPARATOR: char = ':';
pub(crate) const EVENT_SEPARATOR: char = '|';
pub(crate) const VALUE_SEPARATOR: char = '>';
pub(crate) const COMPONENT_SEPARATOR: char = ',';

/// Characters a button or axis name may not contain
pub(crate) const RESERVED_CHARS: [char; 8] = [
    SEGMENT_SEPARATOR,
    SECTION_SEPARATOR,
    AXIS_SEPARATOR,
    ENTRY_SEPARATOR,
    TICK_SEPARATOR,
    EVENT_SEPARATOR,
    VALUE_SEPARATOR,
    COMPONENT_SEPARATOR,
];

/// Recording error types
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingError {
    /// Not valid base64
    Base64(String),
    /// Brotli stream failed
    Compression(String),
    /// Decompressed bytes are not UTF-8
    Utf8(String),
    /// String does not follow the recording layout
    Malformed(String),
    /// Playback names a button the controller lacks
    UnknownButton(String),
    /// Playback has more axis blocks than the controller has axes
    UnknownAxis(usize),
    /// File could not be read or written
    Io(String),
    /// Nothing has been recorded yet
    NoRecording,
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64(e) => write!(f, "Invalid base64 in recording: {e}"),
            Self::Compression(e) => write!(f, "Recording compression failed: {e}"),
            Self::Utf8(e) => write!(f, "Recording is not UTF-8: {e}"),
            Self::Malformed(e) => write!(f, "Malformed recording: {e}"),
            Self::UnknownButton(name) => write!(f, "Recording references unknown button '{name}'"),
            Self::UnknownAxis(index) => write!(f, "Recording references unknown axis #{index}"),
            Self::Io(e) => write!(f, "Recording IO error: {e}"),
            Self::NoRecording => write!(f, "No recording available"),
        }
    }
}

impl std::error::Error for RecordingError {}

/// Sparse timeline of input changes keyed by tick since the start
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    /// Button transitions per tick, in the order they were observed
    pub buttons: BTreeMap<u32, Vec<(String, bool)>>,
    /// Axis values per tick at moments of change, one map per axis
    pub axes: Vec<BTreeMap<u32, Vec2>>,
    /// Number of ticks covered
    pub ticks: u32,
}

impl Recording {
    /// Create an empty recording for `axis_count` axes
    pub fn new(axis_count: usize) -> Self {
        Self {
            buttons: BTreeMap::new(),
            axes: vec![BTreeMap::new(); axis_count],
            ticks: 0,
        }
    }

    /// Number of ticks playback should run, at least one past the last event
    pub fn duration(&self) -> u32 {
        let last_button = self.buttons.keys().next_back().map(|t| t + 1);
        let last_axis = self
            .axes
            .iter()
            .filter_map(|axis| axis.keys().next_back().map(|t| t + 1))
            .max();
        self.ticks
            .max(last_button.unwrap_or(0))
            .max(last_axis.unwrap_or(0))
    }

    /// Check if no events were recorded
    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty() && self.axes.iter().all(BTreeMap::is_empty)
    }

    /// Serialize to the plain delimited string
    pub fn encode(&self) -> String {
        let mut segments: Vec<String> = self
            .buttons
            .iter()
            .filter(|(_, events)| !events.is_empty())
            .map(|(tick, events)| {
                let events: Vec<String> = events
                    .iter()
                    .map(|(name, down)| format!("{name}{VALUE_SEPARATOR}{}", u8::from(*down)))
                    .collect();
                let events = events.join(EVENT_SEPARATOR.to_string().as_str());
                format!("{tick}{TICK_SEPARATOR}{events}")
            })
            .collect();
        segments.push(format!("{}{TICK_SEPARATOR}", self.ticks));

        let blocks: Vec<String> = self
            .axes
            .iter()
            .map(|axis| {
                let entries: Vec<String> = axis
                    .iter()
                    .map(|(tick, v)| {
                        format!("{tick}{VALUE_SEPARATOR}{}{COMPONENT_SEPARATOR}{}", v.x, v.y)
                    })
                    .collect();
                entries.join(ENTRY_SEPARATOR.to_string().as_str())
            })
            .collect();
        let blocks = trim_unchanged(&blocks);

        format!(
            "{}{SECTION_SEPARATOR}{}",
            segments.join(SEGMENT_SEPARATOR.to_string().as_str()),
            blocks.join(AXIS_SEPARATOR.to_string().as_str())
        )
    }

    /// Parse the plain delimited string
    ///
    /// # Errors
    ///
    /// Returns [`RecordingError::Malformed`] on any layout violation
    pub fn decode(data: &str) -> Result<Self, RecordingError> {
        let (button_section, axis_section) = data
            .split_once(SECTION_SEPARATOR)
            .ok_or_else(|| RecordingError::Malformed("missing section separator".to_string()))?;

        let mut recording = Recording::default();

        for segment in button_section.split(SEGMENT_SEPARATOR).filter(|s| !s.is_empty()) {
            let (tick, events) = segment.split_once(TICK_SEPARATOR).ok_or_else(|| {
                RecordingError::Malformed(format!("segment without tick: '{segment}'"))
            })?;
            let tick = parse_tick(tick)?;
            if events.is_empty() {
                recording.ticks = recording.ticks.max(tick);
                continue;
            }
            let bucket = recording.buttons.entry(tick).or_default();
            for event in events.split(EVENT_SEPARATOR) {
                let (name, value) = event.rsplit_once(VALUE_SEPARATOR).ok_or_else(|| {
                    RecordingError::Malformed(format!("button event without value: '{event}'"))
                })?;
                let down = match value {
                    "1" => true,
                    "0" => false,
                    other => {
                        return Err(RecordingError::Malformed(format!(
                            "button value must be 0 or 1, got '{other}'"
                        )));
                    }
                };
                if name.is_empty() {
                    return Err(RecordingError::Malformed("empty button name".to_string()));
                }
                bucket.push((name.to_string(), down));
            }
        }

        if !axis_section.is_empty() {
            for block in axis_section.split(AXIS_SEPARATOR) {
                let mut axis = BTreeMap::new();
                for entry in block.split(ENTRY_SEPARATOR).filter(|s| !s.is_empty()) {
                    let (tick, value) = entry.split_once(VALUE_SEPARATOR).ok_or_else(|| {
                        RecordingError::Malformed(format!("axis entry without value: '{entry}'"))
                    })?;
                    let (x, y) = value.split_once(COMPONENT_SEPARATOR).ok_or_else(|| {
                        RecordingError::Malformed(format!(
                            "axis value needs two components: '{value}'"
                        ))
                    })?;
                    let value = Vec2::new(parse_component(x)?, parse_component(y)?);
                    axis.insert(parse_tick(tick)?, value);
                }
                recording.axes.push(axis);
            }
            while recording.axes.last().is_some_and(BTreeMap::is_empty) {
                recording.axes.pop();
            }
        }

        Ok(recording)
    }

    /// Encode, brotli-compress and base64 the recording
    ///
    /// # Errors
    ///
    /// Returns [`RecordingError::Compression`] if the encoder fails
    pub fn compress(&self) -> Result<String, RecordingError> {
        let plain = self.encode();
        let mut compressed = Vec::new();
        brotli::BrotliCompress(
            &mut Cursor::new(plain.as_bytes()),
            &mut compressed,
            &brotli::enc::BrotliEncoderParams {
                quality: 6,
                lgwin: 22,
                ..Default::default()
            },
        )
        .map_err(|e| RecordingError::Compression(e.to_string()))?;
        Ok(STANDARD.encode(compressed))
    }

    /// Reverse [`Recording::compress`]
    ///
    /// # Errors
    ///
    /// Fails on bad base64, a corrupt brotli stream, non-UTF-8 content or a
    /// malformed layout
    pub fn decompress(data: &str) -> Result<Self, RecordingError> {
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| RecordingError::Base64(e.to_string()))?;
        let mut decompressed = Vec::new();
        brotli::BrotliDecompress(&mut Cursor::new(&bytes), &mut decompressed)
            .map_err(|e| RecordingError::Compression(e.to_string()))?;
        let plain =
            String::from_utf8(decompressed).map_err(|e| RecordingError::Utf8(e.to_string()))?;
        Self::decode(&plain)
    }
}

fn trim_unchanged(blocks: &[String]) -> &[String] {
    let len = blocks.iter().rposition(|b| !b.is_empty()).map_or(0, |i| i + 1);
    &blocks[..len]
}

fn parse_tick(text: &str) -> Result<u32, RecordingError> {
    text.parse()
        .map_err(|_| RecordingError::Malformed(format!("invalid tick '{text}'")))
}

fn parse_component(text: &str) -> Result<f32, RecordingError> {
    let value: f32 = text
        .parse()
        .map_err(|_| RecordingError::Malformed(format!("invalid axis component '{text}'")))?;
    if !value.is_finite() {
        return Err(RecordingError::Malformed(format!("axis component out of range '{text}'")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Recording {
        let mut recording = Recording::new(2);
        recording
            .buttons
            .insert(0, vec![("jump".to_string(), true), ("fire".to_string(), true)]);
        recording.buttons.insert(3, vec![("jump".to_string(), false)]);
        recording.axes[0].insert(0, Vec2::new(1.0, 0.0));
        recording.axes[0].insert(5, Vec2::ZERO);
        recording.axes[1].insert(2, Vec2::new(0.25, -1.0));
        recording.ticks = 12;
        recording
    }

    #[test]
    fn test_encode_layout() {
        assert_eq!(
            sample().encode(),
            "0:jump>1|fire>1\u{10}3:jump>0\u{10}12:%0>1,0;5>0,0^2>0.25,-1"
        );
    }

    #[test]
    fn test_decode_encoded() {
        let recording = sample();
        assert_eq!(Recording::decode(&recording.encode()).unwrap(), recording);
    }

    #[test]
    fn test_compressed_string() {
        let recording = sample();
        let packed = recording.compress().unwrap();
        assert!(!packed.contains('%'));
        assert_eq!(Recording::decompress(&packed).unwrap(), recording);
    }

    #[test]
    fn test_duration() {
        let mut recording = Recording::new(1);
        assert_eq!(recording.duration(), 0);
        assert!(recording.is_empty());

        recording.axes[0].insert(7, Vec2::X);
        assert_eq!(recording.duration(), 8);

        recording.ticks = 10;
        assert_eq!(recording.duration(), 10);
    }

    #[test]
    fn test_empty_sections() {
        let recording = Recording::decode("4:%").unwrap();
        assert_eq!(recording.ticks, 4);
        assert!(recording.buttons.is_empty());
        assert!(recording.axes.is_empty());
    }

    #[test]
    fn test_unchanged_trailing_axes_dropped() {
        assert_eq!(Recording::new(2).encode(), "0:%");
        assert_eq!(Recording::decode("0:%^").unwrap(), Recording::new(0));

        let mut recording = Recording::new(3);
        recording.axes[0].insert(1, Vec2::Y);
        assert_eq!(recording.encode(), "0:%1>0,1");

        let decoded = Recording::decode(&recording.encode()).unwrap();
        assert_eq!(decoded.axes.len(), 1);
        assert_eq!(decoded.axes[0], recording.axes[0]);

        let mut middle = Recording::new(3);
        middle.axes[2].insert(0, Vec2::X);
        assert_eq!(Recording::decode(&middle.encode()).unwrap(), middle);
    }

    #[test]
    fn test_malformed_strings() {
        for bad in [
            "no section separator",
            "x:jump>1%",
            "0:jump%",
            "0:jump>2%",
            "0:>1%",
            "0:%0>1",
            "0:%0>1,abc",
            "0:%q>1,0",
            "0:%0>NaN,0",
        ] {
            assert!(
                matches!(Recording::decode(bad), Err(RecordingError::Malformed(_))),
                "expected malformed: {bad:?}"
            );
        }
    }

    #[test]
    fn test_corrupt_compressed() {
        assert!(matches!(
            Recording::decompress("not base64!"),
            Err(RecordingError::Base64(_))
        ));
        let garbage = STANDARD.encode([0xff, 0x00, 0x13, 0x37, 0x42]);
        assert!(Recording::decompress(&garbage).is_err());
    }
}
