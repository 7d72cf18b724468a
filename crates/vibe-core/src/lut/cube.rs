//! Header scan of `.cube` text, for logging what was installed.
//!
//! This is not a parser. Unknown keywords are skipped and nothing here ever
//! rejects content; the host is the authority on whether a LUT loads.

use std::fmt;

/// Dimensionality declared by the `LUT_*_SIZE` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeKind {
    Lut3D { size: u32 },
    Lut1D { size: u32 },
    Undeclared,
}

impl CubeKind {
    /// Data lines implied by the declared size. `None` when undeclared or
    /// too large to count.
    pub const fn expected_entries(self) -> Option<usize> {
        match self {
            Self::Lut3D { size } => (size as usize).checked_pow(3),
            Self::Lut1D { size } => Some(size as usize),
            Self::Undeclared => None,
        }
    }
}

impl fmt::Display for CubeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lut3D { size } => write!(f, "3D {size}^3"),
            Self::Lut1D { size } => write!(f, "1D {size}"),
            Self::Undeclared => write!(f, "undeclared"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeSummary {
    pub title: Option<String>,
    pub kind: CubeKind,
    /// Count of lines that look like RGB data rows.
    pub entries: usize,
}

impl CubeSummary {
    pub fn scan(content: &str) -> Self {
        let mut title = None;
        let mut kind = CubeKind::Undeclared;
        let mut entries = 0;

        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix("TITLE") {
                title = Some(rest.trim().trim_matches('"').to_string());
            } else if let Some(rest) = line.strip_prefix("LUT_3D_SIZE") {
                if let Ok(size) = rest.trim().parse() {
                    kind = CubeKind::Lut3D { size };
                }
            } else if let Some(rest) = line.strip_prefix("LUT_1D_SIZE") {
                if let Ok(size) = rest.trim().parse() {
                    kind = CubeKind::Lut1D { size };
                }
            } else if is_data_row(line) {
                entries += 1;
            }
        }

        Self {
            title,
            kind,
            entries,
        }
    }

    /// Whether the data row count matches the declared size.
    pub fn is_complete(&self) -> bool {
        self.kind.expected_entries() == Some(self.entries)
    }
}

fn is_data_row(line: &str) -> bool {
    let mut fields = line.split_whitespace();
    let rgb = fields
        .by_ref()
        .take(3)
        .filter(|f| f.parse::<f64>().is_ok())
        .count();
    rgb == 3 && fields.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_3d_header_and_rows() {
        let mut text = String::from("TITLE \"Vibe-to-LUT Generated\"\nLUT_3D_SIZE 2\n\n");
        for _ in 0..8 {
            text.push_str("0.000000 0.500000 1.000000\n");
        }
        let summary = CubeSummary::scan(&text);
        assert_eq!(summary.title.as_deref(), Some("Vibe-to-LUT Generated"));
        assert_eq!(summary.kind, CubeKind::Lut3D { size: 2 });
        assert_eq!(summary.entries, 8);
        assert!(summary.is_complete());
    }

    #[test]
    fn test_scan_skips_comments_and_domain_lines() {
        let text = "# comment\nLUT_1D_SIZE 4\nDOMAIN_MIN 0 0 0\n0 0 0\n0.3 0.3 0.3\n";
        let summary = CubeSummary::scan(text);
        assert_eq!(summary.kind, CubeKind::Lut1D { size: 4 });
        assert_eq!(summary.entries, 2);
        assert!(!summary.is_complete());
    }

    #[test]
    fn test_oversized_declaration_is_incomplete() {
        let summary = CubeSummary::scan("LUT_3D_SIZE 4294967295
0 0 0
");
        assert_eq!(summary.kind, CubeKind::Lut3D { size: u32::MAX });
        assert!(!summary.is_complete());
    }

    #[test]
    fn test_scan_opaque_garbage_does_not_fail() {
        let summary = CubeSummary::scan("hello world");
        assert_eq!(summary.kind, CubeKind::Undeclared);
        assert_eq!(summary.entries, 0);
        assert!(summary.title.is_none());
    }
}
