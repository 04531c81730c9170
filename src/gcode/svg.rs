//! SVG toolpath preview.

use std::fmt::Write as _;
use std::path::Path;

use super::PreviewWriter;
use crate::error::RelayError;

/// Writes the XY projection of a toolpath as a single SVG polyline path.
///
/// The document's `viewBox` is the XY bounding box padded by the stroke
/// width; Y is flipped so that +Y points up as on the machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgWriter;

impl SvgWriter {
    /// Renders the SVG document text.
    #[must_use]
    pub fn render(positions: &[[f64; 3]], stroke_width: f64) -> String {
        let (min, max) = positions.iter().fold(
            ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]),
            |(min, max), p| {
                (
                    [min[0].min(p[0]), min[1].min(p[1])],
                    [max[0].max(p[0]), max[1].max(p[1])],
                )
            },
        );
        let (min, max) = if positions.is_empty() {
            ([0.0; 2], [0.0; 2])
        } else {
            (min, max)
        };

        let pad = stroke_width;
        let view_x = min[0] - pad;
        // After flipping, the top edge of the drawing is -ymax.
        let view_y = -max[1] - pad;
        let view_w = (max[0] - min[0]) + 2.0 * pad;
        let view_h = (max[1] - min[1]) + 2.0 * pad;

        let mut d = String::new();
        for (i, p) in positions.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            if i > 0 {
                d.push(' ');
            }
            let _ = write!(d, "{cmd}{} {}", p[0], -p[1]);
        }

        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" \
             viewBox=\"{view_x} {view_y} {view_w} {view_h}\">"
        );
        let _ = writeln!(
            out,
            "  <path d=\"{d}\" fill=\"none\" stroke=\"black\" stroke-width=\"{stroke_width}\" \
             stroke-linecap=\"round\" stroke-linejoin=\"round\"/>"
        );
        out.push_str("</svg>\n");
        out
    }
}

impl PreviewWriter for SvgWriter {
    fn write(
        &self,
        positions: &[[f64; 3]],
        path: &Path,
        stroke_width: f64,
    ) -> Result<(), RelayError> {
        std::fs::write(path, Self::render(positions, stroke_width))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_visits_points_in_order_with_flipped_y() {
        let svg = SvgWriter::render(&[[0.0, 0.0, 0.0], [10.0, 5.0, 1.0], [2.5, 1.0, 0.0]], 0.5);
        assert!(svg.contains("d=\"M0 -0 L10 -5 L2.5 -1\""));
        assert!(svg.contains("stroke-width=\"0.5\""));
    }

    #[test]
    fn view_box_is_padded_bounding_box() {
        let svg = SvgWriter::render(&[[0.0, 0.0, 0.0], [10.0, 5.0, 0.0]], 1.0);
        assert!(svg.contains("viewBox=\"-1 -6 12 7\""));
    }

    #[test]
    fn empty_toolpath_renders_empty_path() {
        let svg = SvgWriter::render(&[], 0.01);
        assert!(svg.contains("d=\"\""));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn write_creates_file() {
        let Ok(dir) = tempfile::tempdir() else {
            return;
        };
        let path = dir.path().join("part.svg");
        let result = SvgWriter.write(&[[1.0, 1.0, 0.0]], &path, 0.01);
        assert!(result.is_ok());
        let text = std::fs::read_to_string(&path).unwrap_or_default();
        assert!(text.contains("<svg"));
    }

    #[test]
    fn write_into_missing_directory_is_io_error() {
        let result = SvgWriter.write(&[], Path::new("/no/such/dir/part.svg"), 0.01);
        assert!(matches!(result, Err(RelayError::Io(_))));
    }
}
