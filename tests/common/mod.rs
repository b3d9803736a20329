//! Test-only encoder for WOD native ASCII casts
//!
//! Builds cast text from typed values so scenarios read as data rather than
//! hand-counted digit strings.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

/// `<n><n digits>`
pub fn internal(value: i64) -> String {
    let digits = value.to_string();
    format!("{}{}", digits.len(), digits)
}

/// `<sig><total><right><digits>`; a leading `-` counts as a digit slot
pub fn measured(value: i32, significant: u8, right: u8) -> String {
    let digits = value.to_string();
    format!("{}{}{}{}", significant, digits.len(), right, digits)
}

/// Measured field with significant figures equal to its digit count
pub fn scaled(value: i32, right: u8) -> String {
    let significant = value.unsigned_abs().to_string().len() as u8;
    measured(value, significant, right)
}

pub const MISSING: &str = "-";

/// Byte count prefix followed by the block body
fn block(body: String) -> String {
    if body.is_empty() {
        internal(0)
    } else {
        format!("{}{}", internal(body.len() as i64), body)
    }
}

#[derive(Debug, Clone)]
pub struct Level {
    pub depth: String,
    pub values: Vec<String>,
}

impl Level {
    /// Level with an encoded depth and measurements, all flags zero
    pub fn new(depth: String, values: Vec<String>) -> Self {
        Self { depth, values }
    }
}

#[derive(Debug, Clone)]
pub struct CastBuilder {
    pub tag: char,
    pub cast_number: i64,
    pub country: String,
    pub cruise: i64,
    pub date: (i32, i32, i32),
    pub time: String,
    pub latitude: String,
    pub longitude: String,
    pub standard_levels: bool,
    pub variables: Vec<i64>,
    pub originator_cruise: Option<String>,
    pub secondary_headers: Vec<(i64, String)>,
    pub biological_headers: Vec<(i64, String)>,
    pub taxa_sets: Vec<Vec<(i64, String)>>,
    pub levels: Vec<Level>,
}

impl Default for CastBuilder {
    fn default() -> Self {
        Self {
            tag: 'C',
            cast_number: 1,
            country: "US".to_string(),
            cruise: 1,
            date: (1998, 7, 14),
            time: scaled(1230, 2),
            latitude: scaled(-45000, 3),
            longitude: scaled(170500, 3),
            standard_levels: false,
            variables: Vec::new(),
            originator_cruise: None,
            secondary_headers: Vec::new(),
            biological_headers: Vec::new(),
            taxa_sets: Vec::new(),
            levels: Vec::new(),
        }
    }
}

impl CastBuilder {
    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push(self.tag);
        out += &internal(0);
        out += &internal(self.cast_number);
        out += &self.country;
        out += &internal(self.cruise);
        out += &format!("{:04}{:02}{:02}", self.date.0, self.date.1, self.date.2);
        out += &self.time;
        out += &self.latitude;
        out += &self.longitude;
        out += &internal(self.levels.len() as i64);
        out += if self.standard_levels { "1" } else { "0" };
        out += &format!("{:02}", self.variables.len());
        for code in &self.variables {
            out += &internal(*code);
            out += "0";
            out += &internal(0);
        }

        let character = match &self.originator_cruise {
            Some(code) => format!("11{:02}{}", code.len(), code),
            None => String::new(),
        };
        out += &block(character);

        let mut secondary = String::new();
        if !self.secondary_headers.is_empty() {
            secondary += &internal(self.secondary_headers.len() as i64);
            for (code, value) in &self.secondary_headers {
                secondary += &internal(*code);
                secondary += value;
            }
        }
        out += &block(secondary);

        let mut biology = String::new();
        if !self.biological_headers.is_empty() || !self.taxa_sets.is_empty() {
            biology += &internal(self.biological_headers.len() as i64);
            for (code, value) in &self.biological_headers {
                biology += &internal(*code);
                biology += value;
            }
            biology += &internal(self.taxa_sets.len() as i64);
            for set in &self.taxa_sets {
                biology += &internal(set.len() as i64);
                for (code, value) in set {
                    biology += &internal(*code);
                    biology += value;
                    biology += "00";
                }
            }
        }
        out += &block(biology);

        let depth_encoded = !self.standard_levels || self.tag == 'C';
        for level in &self.levels {
            if depth_encoded {
                out += &level.depth;
                out += "00";
            }
            for value in &level.values {
                out += value;
                if value != MISSING {
                    out += "00";
                }
            }
        }
        out += "\r\n";
        out
    }
}

/// Write `contents` to a file in a fresh temporary directory
pub fn write_fixture(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("casts.txt");
    let mut file = std::fs::File::create(&path).expect("Failed to create fixture");
    file.write_all(contents.as_bytes())
        .expect("Failed to write fixture");
    (dir, path)
}

/// The two-level temperature cast used across tests
pub fn temperature_cast(cast_number: i64) -> CastBuilder {
    CastBuilder {
        cast_number,
        variables: vec![1],
        levels: vec![
            Level::new(scaled(0, 0), vec![scaled(150, 1)]),
            Level::new(scaled(100, 0), vec![scaled(140, 1)]),
        ],
        ..Default::default()
    }
}
