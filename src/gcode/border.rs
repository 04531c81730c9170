//! Border program: a relative-motion trace of a program's XY bounding box.

use std::fmt::Write as _;
use std::path::Path;

use crate::domain::{BoundingBox, ParsedGcode};
use crate::error::RelayError;

/// Feed rate used for every synthesized move.
pub const BORDER_FEED_RATE: u32 = 200;

/// Bounding-box summary of a parsed program, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderProgram {
    source: String,
    bbox: BoundingBox,
    total_minutes: f64,
}

/// Estimated run time split into display units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Duration {
    /// Whole hours (not wrapped at 24).
    pub hours: u64,
    /// Whole minutes within the hour.
    pub minutes: u64,
    /// Seconds within the minute.
    pub seconds: f64,
}

impl Duration {
    /// Splits a duration given in minutes.
    #[must_use]
    pub fn from_minutes(minutes: f64) -> Self {
        let total = (minutes * 60.0).max(0.0);
        let whole = total.floor();
        let hours = (whole / 3600.0).floor();
        let mins = ((whole - hours * 3600.0) / 60.0).floor();
        Self {
            hours: hours as u64,
            minutes: mins as u64,
            seconds: total - hours * 3600.0 - mins * 60.0,
        }
    }
}

impl BorderProgram {
    /// Builds the border summary for `parsed`, labelled with `source`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Parse`] when the program has no motion
    /// segments, since an empty program has no bounding box.
    pub fn from_parsed(source: impl Into<String>, parsed: &ParsedGcode) -> Result<Self, RelayError> {
        let bbox = parsed.bounding_box().ok_or_else(|| RelayError::Parse {
            line: 0,
            message: "no motion segments".to_string(),
        })?;
        Ok(Self {
            source: source.into(),
            bbox,
            total_minutes: parsed.total_minutes(),
        })
    }

    /// The XY bounding box.
    #[must_use]
    pub const fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    /// Estimated run time of the source program.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_minutes(self.total_minutes)
    }

    /// Renders the program text.
    #[must_use]
    pub fn render(&self) -> String {
        let BoundingBox {
            xmin,
            xmax,
            ymin,
            ymax,
        } = self.bbox;
        let width = self.bbox.width();
        let height = self.bbox.height();
        let d = self.duration();
        let f = BORDER_FEED_RATE;

        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(out, "; Generated boundary from: {}", self.source);
        let _ = writeln!(out, "; xmin: {xmin}\n; xmax: {xmax}\n; ymin: {ymin}\n; ymax: {ymax}");
        let _ = writeln!(out, "; W: {width}\n; H: {height} [mm]");
        let _ = writeln!(
            out,
            "; estimated printing duration: {}h {}m {:.2}s\n",
            d.hours, d.minutes, d.seconds
        );
        out.push_str("G91\n");
        let _ = writeln!(out, "G0 X{xmin} Y{ymin} F{f}");
        let _ = writeln!(out, "G0 X{width} F{f}");
        let _ = writeln!(out, "G0 Y{height} F{f}");
        let _ = writeln!(out, "G0 X{} F{f}", -width);
        let _ = writeln!(out, "G0 Y{} F{f}", -height);
        let _ = writeln!(out, "G0 X{} Y{} F{f}", -xmin, -ymin);
        out
    }

    /// Renders and writes the program to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Io`] when the file cannot be written.
    pub async fn write(&self, path: &Path) -> Result<(), RelayError> {
        tokio::fs::write(path, self.render()).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use crate::gcode::GcodeParser;

    use super::*;

    fn rectangle() -> ParsedGcode {
        let mut parsed = ParsedGcode::default();
        parsed.push_segment([0.0, 0.0, 0.0], 100.0, 30.0, 0);
        parsed.push_segment([10.0, 0.0, 0.0], 100.0, 31.0, 1);
        parsed.push_segment([10.0, 5.0, 0.0], 100.0, 0.5125, 2);
        parsed
    }

    fn program() -> BorderProgram {
        match BorderProgram::from_parsed("part.gcode", &rectangle()) {
            Ok(p) => p,
            Err(e) => panic!("border failed: {e}"),
        }
    }

    #[test]
    fn header_reports_extent() {
        let text = program().render();
        assert!(text.starts_with("; Generated boundary from: part.gcode\n"));
        assert!(text.contains("; xmin: 0\n; xmax: 10\n; ymin: 0\n; ymax: 5\n"));
        assert!(text.contains("; W: 10\n"));
        assert!(text.contains("; H: 5 [mm]\n"));
    }

    #[test]
    fn bounding_box_matches_source_extent() {
        let bbox = program().bounding_box();
        assert_eq!((bbox.width(), bbox.height()), (10.0, 5.0));
    }

    #[test]
    fn duration_is_split_into_units() {
        // 61.5125 minutes = 1h 1m 30.75s
        assert!(
            program()
                .render()
                .contains("; estimated printing duration: 1h 1m 30.75s\n\nG91\n")
        );
    }

    #[test]
    fn duration_does_not_wrap_at_a_day() {
        let d = Duration::from_minutes(25.0 * 60.0 + 2.0);
        assert_eq!(d.hours, 25);
        assert_eq!(d.minutes, 2);
        assert!(d.seconds.abs() < 1e-9);
    }

    #[test]
    fn moves_form_a_closed_loop() {
        let text = program().render();
        let body = text.split("G91\n").nth(1).unwrap_or_default();
        let Ok(moves) = GcodeParser::new().parse_program(&format!("G91\n{body}")) else {
            panic!("border program does not parse");
        };
        assert_eq!(moves.len(), 6);
        let Some(last) = moves.positions.last() else {
            panic!("no moves");
        };
        assert_eq!(*last, [0.0, 0.0, 0.0]);
        assert!(moves.velocities.iter().all(|v| *v == 200.0));
    }

    #[test]
    fn empty_program_is_rejected() {
        let result = BorderProgram::from_parsed("empty.gcode", &ParsedGcode::default());
        assert!(matches!(result, Err(RelayError::Parse { .. })));
    }
}
