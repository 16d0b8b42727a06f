//! SVG document model and serialization

use std::fmt::{self, Write as _};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::DVec2;

use crate::error::{ArtError, Result};

use super::Color;

/// Distinguishes concurrent writers of the same destination
static TMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// One filled shape: every ring of a cell, already in canvas coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct SvgPath {
    pub fill: Color,
    /// Open rings; exterior and hole rings alike, holes resolved by `evenodd`
    pub rings: Vec<Vec<DVec2>>,
}

impl SvgPath {
    pub fn new(fill: Color, rings: Vec<Vec<DVec2>>) -> Self {
        Self { fill, rings }
    }
}

/// A complete artwork, ready to be written
///
/// Serialization is deterministic: the same document always yields the same
/// bytes, so re-running a city overwrites its file with identical content.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    width: f64,
    height: f64,
    precision: usize,
    paths: Vec<SvgPath>,
}

impl SvgDocument {
    /// Empty canvas; `precision` is the number of decimals written for coordinates
    pub fn new(width: f64, height: f64, precision: usize) -> Self {
        Self {
            width,
            height,
            precision,
            paths: Vec::new(),
        }
    }

    pub fn push(&mut self, path: SvgPath) {
        self.paths.push(path);
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[inline]
    pub fn paths(&self) -> &[SvgPath] {
        &self.paths
    }

    pub fn to_svg_string(&self) -> String {
        self.to_string()
    }

    /// Write the document to `path`, replacing any previous file
    ///
    /// The content is written to a temporary sibling first and renamed into
    /// place, so readers never observe a partial document. Every call uses its
    /// own temporary name, so concurrent writers of one path never share it;
    /// the last rename wins. Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns `OutputFailed` if any filesystem step fails.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let fail = |step: &str, e: std::io::Error| {
            ArtError::OutputFailed(format!("{} {}: {}", step, path.display(), e))
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| fail("cannot create directory for", e))?;
        }

        let tmp = temp_sibling(path);

        if let Err(e) = fs::write(&tmp, self.to_svg_string()) {
            let _ = fs::remove_file(&tmp);
            return Err(fail("cannot write", e));
        }
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(fail("cannot replace", e));
        }

        Ok(())
    }

    fn path_data(&self, path: &SvgPath) -> String {
        let mut d = String::new();
        for ring in &path.rings {
            for (i, p) in ring.iter().enumerate() {
                if !d.is_empty() {
                    d.push(' ');
                }
                let command = if i == 0 { "M" } else { "L" };
                let _ = write!(
                    d,
                    "{}{},{}",
                    command,
                    format_number(p.x, self.precision),
                    format_number(p.y, self.precision)
                );
            }
            d.push_str(" Z");
        }
        d
    }
}

impl fmt::Display for SvgDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = format_number(self.width, self.precision);
        let height = format_number(self.height, self.precision);

        writeln!(f, r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#)?;
        writeln!(
            f,
            r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">"#
        )?;
        writeln!(
            f,
            r#"<svg version="1.1" width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"#,
            w = width,
            h = height
        )?;
        for path in &self.paths {
            writeln!(
                f,
                r#"  <path fill="{}" fill-rule="evenodd" d="{}"/>"#,
                path.fill.to_hex(),
                self.path_data(path)
            )?;
        }
        writeln!(f, "</svg>")
    }
}

/// `<path>.<pid>.<n>.tmp`, unique per call within and across processes
fn temp_sibling(path: &Path) -> PathBuf {
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(format!(".{}.{}.tmp", std::process::id(), n));
    PathBuf::from(name)
}

/// Fixed decimals with trailing zeros trimmed; never prints `-0`
fn format_number(value: f64, precision: usize) -> String {
    let mut text = format!("{:.*}", precision, value);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text.remove(0);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_document() -> SvgDocument {
        let mut document = SvgDocument::new(100.0, 50.0, 3);
        document.push(SvgPath::new(
            Color::new(1.0, 0.0, 0.0).unwrap(),
            vec![vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(100.0, 0.0),
                DVec2::new(50.0, 12.3456),
            ]],
        ));
        document
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1000.0, 3), "1000");
        assert_eq!(format_number(12.3456, 3), "12.346");
        assert_eq!(format_number(7.0, 0), "7");
        assert_eq!(format_number(-0.0001, 3), "0");
        assert_eq!(format_number(-2.5, 2), "-2.5");
    }

    #[test]
    fn test_document_layout() {
        let svg = triangle_document().to_svg_string();

        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"width="100" height="50" viewBox="0 0 100 50""#));
        assert!(svg.contains(r##"<path fill="#ff0000" fill-rule="evenodd" d="M0,0 L100,0 L50,12.346 Z"/>"##));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_holes_are_separate_subpaths() {
        let mut document = SvgDocument::new(10.0, 10.0, 1);
        let square = |a: f64, b: f64| {
            vec![
                DVec2::new(a, a),
                DVec2::new(b, a),
                DVec2::new(b, b),
                DVec2::new(a, b),
            ]
        };
        document.push(SvgPath::new(
            Color::new(0.0, 0.0, 1.0).unwrap(),
            vec![square(0.0, 10.0), square(4.0, 6.0)],
        ));

        assert_eq!(
            document.path_data(&document.paths()[0]),
            "M0,0 L10,0 L10,10 L0,10 Z M4,4 L6,4 L6,6 L4,6 Z"
        );
    }

    #[test]
    fn test_write_to_replaces_file() {
        let dir = std::env::temp_dir().join(format!("city_voronoi_svg_{}", std::process::id()));
        let path = dir.join("nested").join("art.svg");

        triangle_document().write_to(&path).unwrap();
        SvgDocument::new(1.0, 1.0, 3).write_to(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, SvgDocument::new(1.0, 1.0, 3).to_svg_string());
        assert_eq!(temp_leftovers(&dir.join("nested")), 0);

        fs::remove_dir_all(&dir).unwrap();
    }

    fn temp_leftovers(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter(|entry| entry.as_ref().unwrap().file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }

    #[test]
    fn test_temp_names_are_unique() {
        let path = Path::new("out").join("art.svg");
        let first = temp_sibling(&path);
        let second = temp_sibling(&path);

        assert_ne!(first, second);
        assert_eq!(first.parent(), path.parent());
        assert!(first.to_string_lossy().ends_with(".tmp"));
    }

    #[test]
    fn test_concurrent_writes_to_one_path() {
        let dir = std::env::temp_dir().join(format!("city_voronoi_svg_race_{}", std::process::id()));
        let path = &dir.join("shared.svg");
        let documents: Vec<SvgDocument> = (1..=8)
            .map(|i| {
                let mut document = SvgDocument::new(f64::from(i), 10.0, 3);
                for _ in 0..200 {
                    document.push(triangle_document().paths()[0].clone());
                }
                document
            })
            .collect();

        for _ in 0..10 {
            std::thread::scope(|scope| {
                let handles: Vec<_> = documents
                    .iter()
                    .map(|document| scope.spawn(move || document.write_to(path)))
                    .collect();
                for handle in handles {
                    handle.join().unwrap().unwrap();
                }
            });

            let written = fs::read_to_string(path).unwrap();
            assert!(documents.iter().any(|d| d.to_svg_string() == written));
            assert_eq!(temp_leftovers(&dir), 0);
        }

        fs::remove_dir_all(&dir).unwrap();
    }
}
