//! Parsed motion program: per-segment positions, feeds, durations, lines.

use serde::Serialize;

/// Output of parsing one motion program.
///
/// All four sequences have the same length and are indexed by segment:
/// entry `i` of each describes the `i`-th motion segment of the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedGcode {
    /// End position `[x, y, z]` of each segment, in millimetres.
    pub positions: Vec<[f64; 3]>,
    /// Feed rate of each segment, in units per minute.
    pub velocities: Vec<f64>,
    /// Duration of each segment, in minutes.
    pub durations: Vec<f64>,
    /// Zero-based source line each segment originates from.
    pub source_lines: Vec<usize>,
}

/// Axis-aligned XY bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Smallest X.
    pub xmin: f64,
    /// Largest X.
    pub xmax: f64,
    /// Smallest Y.
    pub ymin: f64,
    /// Largest Y.
    pub ymax: f64,
}

impl BoundingBox {
    /// Width along X.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Height along Y.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

impl ParsedGcode {
    /// Appends one segment, keeping the four sequences aligned.
    pub fn push_segment(&mut self, position: [f64; 3], velocity: f64, duration: f64, line: usize) {
        self.positions.push(position);
        self.velocities.push(velocity);
        self.durations.push(duration);
        self.source_lines.push(line);
    }

    /// Number of motion segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if the program has no motion segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sum of all segment durations, in minutes.
    #[must_use]
    pub fn total_minutes(&self) -> f64 {
        self.durations.iter().sum()
    }

    /// XY bounding box over all positions, or `None` when empty.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut iter = self.positions.iter();
        let first = iter.next()?;
        let init = BoundingBox {
            xmin: first[0],
            xmax: first[0],
            ymin: first[1],
            ymax: first[1],
        };
        Some(iter.fold(init, |bb, p| BoundingBox {
            xmin: bb.xmin.min(p[0]),
            xmax: bb.xmax.max(p[0]),
            ymin: bb.ymin.min(p[1]),
            ymax: bb.ymax.max(p[1]),
        }))
    }
}
