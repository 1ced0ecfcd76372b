//! Customization options a customer picks for a printed product.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use printshop_core::{DomainError, ValueObject};

/// Print colour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    White,
    Black,
    Red,
    Blue,
    Green,
    Yellow,
    /// Free colour; the hex code lives in `custom_color_code`.
    Custom,
}

impl Color {
    pub const ALL: [Color; 7] = [
        Color::White,
        Color::Black,
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Custom,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Color::White => "White",
            Color::Black => "Black",
            Color::Red => "Red",
            Color::Blue => "Blue",
            Color::Green => "Green",
            Color::Yellow => "Yellow",
            Color::Custom => "Custom Color",
        }
    }
}

impl FromStr for Color {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::ALL
            .into_iter()
            .find(|c| c.code() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown color '{s}'")))
    }
}

impl core::fmt::Display for Color {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// Printed size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    #[default]
    Medium,
    Large,
    #[serde(rename = "xlarge")]
    XLarge,
}

impl Size {
    pub const ALL: [Size; 4] = [Size::Small, Size::Medium, Size::Large, Size::XLarge];

    pub fn code(self) -> &'static str {
        match self {
            Size::Small => "small",
            Size::Medium => "medium",
            Size::Large => "large",
            Size::XLarge => "xlarge",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Size::Small => "Small",
            Size::Medium => "Medium",
            Size::Large => "Large",
            Size::XLarge => "Extra Large",
        }
    }
}

impl FromStr for Size {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Size::ALL
            .into_iter()
            .find(|size| size.code() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown size '{s}'")))
    }
}

impl core::fmt::Display for Size {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// Uploaded design (PNG, JPG, STL, ...). Content is opaque to the domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignFile {
    pub filename: Option<String>,
    pub content: Vec<u8>,
}

impl ValueObject for DesignFile {}

impl DesignFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: Some(filename.into()),
            content: content.into(),
        }
    }

    /// An upload with no bytes counts as no upload.
    pub fn is_present(&self) -> bool {
        !self.content.is_empty()
    }

    pub fn describe(&self) -> String {
        match &self.filename {
            Some(name) => format!("{name} ({} bytes)", self.content.len()),
            None => format!("{} bytes", self.content.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_fresh_order() {
        assert_eq!(Color::default(), Color::White);
        assert_eq!(Size::default(), Size::Medium);
    }

    #[test]
    fn codes_parse_back() {
        for color in Color::ALL {
            assert_eq!(color.code().parse::<Color>().unwrap(), color);
        }
        for size in Size::ALL {
            assert_eq!(size.code().parse::<Size>().unwrap(), size);
        }
        assert!("huge".parse::<Size>().is_err());
    }

    #[test]
    fn serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Size::XLarge).unwrap(), "\"xlarge\"");
        assert_eq!(serde_json::to_string(&Color::Custom).unwrap(), "\"custom\"");
    }

    #[test]
    fn labels_are_human_readable() {
        assert_eq!(Size::XLarge.label(), "Extra Large");
        assert_eq!(Color::Custom.label(), "Custom Color");
    }

    #[test]
    fn empty_upload_is_not_present() {
        assert!(!DesignFile::new("logo.png", Vec::new()).is_present());
        assert!(DesignFile::new("logo.png", vec![1, 2, 3]).is_present());
        assert_eq!(DesignFile::new("logo.png", vec![0; 4]).describe(), "logo.png (4 bytes)");
    }
}
