//! Motion-program parser producing per-segment positions and timings.
//!
//! Supports the subset of g-code that moves the tool: G0/G1 linear moves,
//! G2/G3 arcs in the XY plane (I/J centre offsets, linearised into chords),
//! G90/G91 distance modes, G20/G21 units and G92 position resets. Every
//! other word is accepted and ignored, and the free text after message
//! and file-name M codes (M23, M28, M30, M32, M117, M118) is skipped.

use std::f64::consts::TAU;
use std::path::Path;

use super::MotionParser;
use crate::domain::ParsedGcode;
use crate::error::RelayError;

/// Millimetres per inch, applied to coordinates and feeds under G20.
const MM_PER_INCH: f64 = 25.4;

/// M codes whose remainder of line is free text (messages, file names).
const TEXT_M_CODES: [i64; 6] = [23, 28, 30, 32, 117, 118];

/// Default maximum arc length of one chord, in millimetres.
pub const DEFAULT_ARC_CHORD_MM: f64 = 1.0;

/// Upper bound on chords emitted for a single arc word.
pub const MAX_ARC_CHORDS: usize = 10_000;

/// Active motion mode (modal group 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Rapid,
    Linear,
    ArcCw,
    ArcCcw,
}

/// Modal machine state carried from line to line.
#[derive(Debug, Clone, Copy)]
struct MachineState {
    position: [f64; 3],
    motion: Motion,
    relative: bool,
    inches: bool,
    feed: f64,
}

impl Default for MachineState {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            motion: Motion::Rapid,
            relative: false,
            inches: false,
            feed: 0.0,
        }
    }
}

impl MachineState {
    fn scale(&self) -> f64 {
        if self.inches { MM_PER_INCH } else { 1.0 }
    }
}

/// Words found on one line after comment removal.
#[derive(Debug, Default)]
struct LineWords {
    g_codes: Vec<f64>,
    axes: [Option<f64>; 3],
    i: Option<f64>,
    j: Option<f64>,
    feed: Option<f64>,
}

impl LineWords {
    fn has_axis(&self) -> bool {
        self.axes.iter().any(Option::is_some)
    }
}

/// File-backed g-code parser.
#[derive(Debug, Clone, Copy)]
pub struct GcodeParser {
    arc_chord_mm: f64,
}

impl GcodeParser {
    /// Creates a parser with the default arc resolution.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            arc_chord_mm: DEFAULT_ARC_CHORD_MM,
        }
    }

    /// Creates a parser that splits arcs into chords of at most `chord_mm`.
    #[must_use]
    pub fn with_arc_chord(chord_mm: f64) -> Self {
        Self {
            arc_chord_mm: if chord_mm > 0.0 { chord_mm } else { DEFAULT_ARC_CHORD_MM },
        }
    }

    /// Parses program text that is already in memory.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Parse`] when a coordinate, feed or G word
    /// carries a malformed number.
    pub fn parse_program(&self, text: &str) -> Result<ParsedGcode, RelayError> {
        let mut state = MachineState::default();
        let mut parsed = ParsedGcode::default();

        for (line_no, raw) in text.lines().enumerate() {
            let words = tokenize(raw, line_no)?;
            self.apply_line(&mut state, &words, line_no, &mut parsed);
        }
        Ok(parsed)
    }

    fn apply_line(
        &self,
        state: &mut MachineState,
        words: &LineWords,
        line_no: usize,
        parsed: &mut ParsedGcode,
    ) {
        let mut set_position = false;
        for code in &words.g_codes {
            // Codes such as G61.1 have no integral meaning here.
            if code.fract() != 0.0 {
                continue;
            }
            match *code as i64 {
                0 => state.motion = Motion::Rapid,
                1 => state.motion = Motion::Linear,
                2 => state.motion = Motion::ArcCw,
                3 => state.motion = Motion::ArcCcw,
                20 => state.inches = true,
                21 => state.inches = false,
                90 => state.relative = false,
                91 => state.relative = true,
                92 => set_position = true,
                _ => {}
            }
        }

        let scale = state.scale();
        if let Some(feed) = words.feed {
            state.feed = feed * scale;
        }

        if set_position {
            for (axis, value) in state.position.iter_mut().zip(words.axes) {
                if let Some(v) = value {
                    *axis = v * scale;
                }
            }
            return;
        }

        let mut target = state.position;
        for ((t, current), value) in target.iter_mut().zip(state.position).zip(words.axes) {
            if let Some(v) = value {
                *t = if state.relative {
                    current + v * scale
                } else {
                    v * scale
                };
            }
        }

        match state.motion {
            Motion::Rapid | Motion::Linear => {
                if words.has_axis() {
                    push_move(parsed, state, target, line_no);
                }
            }
            Motion::ArcCw | Motion::ArcCcw => {
                if words.has_axis() || words.i.is_some() || words.j.is_some() {
                    let centre = [
                        state.position[0] + words.i.unwrap_or(0.0) * scale,
                        state.position[1] + words.j.unwrap_or(0.0) * scale,
                    ];
                    let clockwise = state.motion == Motion::ArcCw;
                    self.push_arc(parsed, state, target, centre, clockwise, line_no);
                }
            }
        }
    }

    fn push_arc(
        &self,
        parsed: &mut ParsedGcode,
        state: &mut MachineState,
        target: [f64; 3],
        centre: [f64; 2],
        clockwise: bool,
        line_no: usize,
    ) {
        let start = state.position;
        let radius = (start[0] - centre[0]).hypot(start[1] - centre[1]);
        let a0 = (start[1] - centre[1]).atan2(start[0] - centre[0]);
        let a1 = (target[1] - centre[1]).atan2(target[0] - centre[0]);

        let mut sweep = a1 - a0;
        if clockwise {
            if sweep >= 0.0 {
                sweep -= TAU;
            }
        } else if sweep <= 0.0 {
            sweep += TAU;
        }

        let arc_len = (sweep.abs() * radius).hypot(target[2] - start[2]);
        // Huge radii would otherwise allocate one segment per millimetre.
        let chords = (arc_len / self.arc_chord_mm)
            .ceil()
            .clamp(1.0, MAX_ARC_CHORDS as f64) as usize;

        for k in 1..=chords {
            let t = k as f64 / chords as f64;
            let point = if k == chords {
                target
            } else {
                let angle = a0 + sweep * t;
                [
                    centre[0] + radius * angle.cos(),
                    centre[1] + radius * angle.sin(),
                    start[2] + (target[2] - start[2]) * t,
                ]
            };
            push_move(parsed, state, point, line_no);
        }
    }
}

impl Default for GcodeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionParser for GcodeParser {
    fn parse(&self, path: &Path) -> Result<ParsedGcode, RelayError> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RelayError::FileNotFound(path.to_path_buf()),
            _ => RelayError::Io(e),
        })?;
        self.parse_program(&text)
    }
}

/// Records one straight segment from the current position to `target`.
fn push_move(parsed: &mut ParsedGcode, state: &mut MachineState, target: [f64; 3], line: usize) {
    let from = state.position;
    let distance = ((target[0] - from[0]).powi(2)
        + (target[1] - from[1]).powi(2)
        + (target[2] - from[2]).powi(2))
    .sqrt();
    let minutes = if state.feed > 0.0 {
        distance / state.feed
    } else {
        0.0
    };
    parsed.push_segment(target, state.feed, minutes, line);
    state.position = target;
}

/// Removes `;` line comments and `( ... )` inline comments.
fn strip_comments(line: &str) -> String {
    let code = line.split(';').next().unwrap_or_default();
    let mut out = String::with_capacity(code.len());
    let mut depth = 0usize;
    for c in code.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Splits a line into letter/number words.
fn tokenize(raw: &str, line_no: usize) -> Result<LineWords, RelayError> {
    let code = strip_comments(raw);
    let mut words = LineWords::default();
    if code.trim_start().starts_with('%') {
        return Ok(words);
    }

    let mut chars = code.chars().peekable();
    while let Some(c) = chars.next() {
        if !c.is_ascii_alphabetic() {
            continue;
        }
        let letter = c.to_ascii_uppercase();
        while chars.peek().is_some_and(|n| n.is_whitespace()) {
            chars.next();
        }
        let mut number = String::new();
        while let Some(&n) = chars.peek() {
            if n.is_ascii_digit() || matches!(n, '.' | '+' | '-') {
                number.push(n);
                chars.next();
            } else {
                break;
            }
        }

        let slot = match letter {
            'M' => {
                if let Ok(code) = number.parse::<f64>()
                    && code.fract() == 0.0
                    && TEXT_M_CODES.contains(&(code as i64))
                {
                    break;
                }
                continue;
            }
            'G' => None,
            'X' => Some(&mut words.axes[0]),
            'Y' => Some(&mut words.axes[1]),
            'Z' => Some(&mut words.axes[2]),
            'I' => Some(&mut words.i),
            'J' => Some(&mut words.j),
            'F' => Some(&mut words.feed),
            _ => continue,
        };
        let value: f64 = number.parse().map_err(|_| RelayError::Parse {
            line: line_no,
            message: format!("invalid number {number:?} after {letter}"),
        })?;
        match slot {
            Some(slot) => *slot = Some(value),
            None => words.g_codes.push(value),
        }
    }
    Ok(words)
}
