use std::fs;
use std::path::Path;

use crate::elements::element_set::OrbitalElementSet;
use crate::elements::error::ElementsError;

/// Split a single record into `(title, line1, line2)`. Accepts the two and
/// three line forms.
pub fn parse_tle_lines(tle: &str) -> Result<(Option<String>, String, String), ElementsError> {
    let lines: Vec<String> = tle
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    match lines.len() {
        2 => Ok((None, lines[0].clone(), lines[1].clone())),
        3 => Ok((Some(lines[0].clone()), lines[1].clone(), lines[2].clone())),
        _ => Err(ElementsError::InvalidTleFormat),
    }
}

/// Parse a single two or three line record.
pub fn parse_tle(tle: &str) -> Result<OrbitalElementSet, ElementsError> {
    let (name, line1, line2) = parse_tle_lines(tle)?;
    OrbitalElementSet::from_tle(name, &line1, &line2)
}

/// An ordered collection of element sets loaded from TLE text.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<OrbitalElementSet>,
}

impl Catalog {
    pub fn new(entries: Vec<OrbitalElementSet>) -> Self {
        Self { entries }
    }

    /// Parse multi-record content. Records that fail to parse are logged and
    /// skipped so one bad entry does not discard the catalog.
    pub fn parse(content: &str) -> Self {
        let mut entries = Vec::new();
        for (name, line1, line2) in parse_multi_tle(content) {
            match OrbitalElementSet::from_tle(name.clone(), &line1, &line2) {
                Ok(set) => entries.push(set),
                Err(e) => {
                    log::warn!(
                        "Skipping TLE {}: {}",
                        name.as_deref().unwrap_or(line1.get(2..7).unwrap_or("?")),
                        e
                    );
                }
            }
        }
        Self { entries }
    }

    /// Load a TLE file, or every `.tle`/`.txt` file of a directory in name
    /// order.
    pub fn from_path(path: &Path) -> Result<Self, std::io::Error> {
        if !path.is_dir() {
            let content = fs::read_to_string(path)?;
            return Ok(Self::parse(&content));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(path)? {
            let file = entry?.path();
            if !file.is_file() {
                continue;
            }
            if let Some(ext) = file.extension() {
                if ext == "tle" || ext == "txt" {
                    files.push(file);
                }
            }
        }
        files.sort();

        let mut entries = Vec::new();
        for file in files {
            match fs::read_to_string(&file) {
                Ok(content) => entries.extend(Self::parse(&content).entries),
                Err(e) => {
                    log::warn!("Failed to read TLE file {}: {}", file.display(), e);
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[OrbitalElementSet] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, catalog_id: u64) -> Option<&OrbitalElementSet> {
        self.entries.iter().find(|e| e.catalog_id() == catalog_id)
    }
}

/// Group multi-satellite TLE content into `(title, line1, line2)` records.
fn parse_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            result.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS: &str = "ISS (ZARYA)
1 25544U 98067A   21275.59097222  .00002182  00000-0  50300-4 0  9998
2 25544  51.6442  21.5553 0005545  45.1234 315.6789 15.48815347249553";

    const UNNAMED: &str = "1 43210U 98067B   21275.59097222  .00002182  00000-0  50300-4 0  9998
2 43210  51.6442  21.5553 0005545  45.1234 315.6789 15.48815347249553";

    #[test]
    fn splits_two_and_three_line_records() {
        let (name, l1, l2) = parse_tle_lines(ISS).unwrap();
        assert_eq!(name.as_deref(), Some("ISS (ZARYA)"));
        assert!(l1.starts_with("1 25544"));
        assert!(l2.starts_with("2 25544"));

        let (name, _, _) = parse_tle_lines(UNNAMED).unwrap();
        assert!(name.is_none());

        assert_eq!(
            parse_tle_lines("only one line").unwrap_err(),
            ElementsError::InvalidTleFormat
        );
    }

    #[test]
    fn catalog_skips_broken_records() {
        let broken = "BROKEN
1 99999U 98067A   21275.59097222  .00002182  00000-0  50300-4 0  9990
2 99999  5X.6442  21.5553 00Y5545  45.1234 315.6789 15.48815347249550";
        let content = format!("{ISS}\n{broken}\n\n{UNNAMED}\n");
        let catalog = Catalog::parse(&content);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[0].catalog_id(), 25544);
        assert_eq!(catalog.entries()[1].catalog_id(), 43210);
        assert!(catalog.find(99999).is_none());
        assert_eq!(catalog.find(25544).and_then(|e| e.name()), Some("ISS (ZARYA)"));
    }

    #[test]
    fn parses_single_record() {
        let set = parse_tle(UNNAMED).unwrap();
        assert_eq!(set.catalog_id(), 43210);
        assert_eq!(set.display_name(), "NORAD 43210");
    }
}
