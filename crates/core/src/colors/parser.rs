//! CSS color text parsing.
//!
//! Handles: `#rgb[a]`, `#rrggbb[aa]`, keywords, `rgb()`, `rgba()`, `hsl()`,
//! `hsla()`, `hwb()`, `lab()`, `lch()`, `oklab()`, `oklch()`, `icc-color()`
//! and `color()` with `srgb`, `srgb-linear`, `xyz`, `xyz-d65`, `xyz-d50`,
//! plus `device-cmyk()`.
//!
//! Parsers are looked up by the text before the opening parenthesis (or by
//! the first word inside `color(`). A hex color may be followed by an
//! `icc-color()`, in which case the hex becomes the fallback.

use std::collections::HashMap;

use crate::colors::space::{Hsv, SpaceType, css_name_to_rgba, scale_down};
use crate::colors::utils::rgba_to_values;

/// Result of parsing a color string.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedColor {
    pub space_type: SpaceType,
    /// Profile name for `icc-color()`, empty otherwise.
    pub cms_name: String,
    pub values: Vec<f64>,
    /// sRGB values given before an `icc-color()`.
    pub fallback: Vec<f64>,
}

// ============================================================================
// Scanner
// ============================================================================

/// Byte cursor over the input text.
#[derive(Debug, Clone)]
pub struct CssScanner<'a> {
    data: &'a [u8],
    pos: usize,
    has_comma: bool,
}

impl<'a> CssScanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            data: input.as_bytes(),
            pos: 0,
            has_comma: input.contains(','),
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    /// True when the whole input contains a comma (legacy syntax).
    pub fn has_comma(&self) -> bool {
        self.has_comma
    }

    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn get(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    pub fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Reads a whitespace delimited word.
    pub fn word(&mut self) -> String {
        self.skip_ws();
        let start = self.pos;
        while self.peek().is_some_and(|c| !c.is_ascii_whitespace()) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.data[start..self.pos]).into_owned()
    }

    /// Reads a decimal number, skipping leading whitespace.
    pub fn number(&mut self) -> Option<f64> {
        self.skip_ws();
        let start = self.pos;
        let mut end = self.pos;
        if matches!(self.data.get(end), Some(b'+' | b'-')) {
            end += 1;
        }
        let mut digits = 0;
        while self.data.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
            digits += 1;
        }
        if self.data.get(end) == Some(&b'.') {
            end += 1;
            while self.data.get(end).is_some_and(u8::is_ascii_digit) {
                end += 1;
                digits += 1;
            }
        }
        if digits == 0 {
            return None;
        }
        if matches!(self.data.get(end), Some(b'e' | b'E')) {
            let mut exp = end + 1;
            if matches!(self.data.get(exp), Some(b'+' | b'-')) {
                exp += 1;
            }
            if self.data.get(exp).is_some_and(u8::is_ascii_digit) {
                while self.data.get(exp).is_some_and(u8::is_ascii_digit) {
                    exp += 1;
                }
                end = exp;
            }
        }
        let text = std::str::from_utf8(&self.data[start..end]).ok()?;
        let value = text.parse().ok()?;
        self.pos = end;
        Some(value)
    }

    /// Reads the hex digits following `#`, returning the value and digit count.
    pub fn hex(&mut self) -> Option<(u32, usize)> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.pos += 1;
        }
        let count = self.pos - start;
        if count == 0 || count > 8 {
            return None;
        }
        let text = std::str::from_utf8(&self.data[start..self.pos]).ok()?;
        u32::from_str_radix(text, 16).ok().map(|v| (v, count))
    }

    /// Reads the parser prefix: `#`, a function name, the first word of
    /// `color(`, or an empty string when there is no parenthesis.
    pub fn css_prefix(&mut self) -> String {
        self.skip_ws();
        if self.peek() == Some(b'#') {
            self.pos += 1;
            return "#".into();
        }
        let start = self.pos;
        let Some(paren) = self.data[start..].iter().position(|&c| c == b'(') else {
            return String::new();
        };
        let mut token = String::from_utf8_lossy(&self.data[start..start + paren]).into_owned();
        self.pos = start + paren + 1;
        if token == "color" {
            token = self.word();
        }
        token.to_ascii_lowercase()
    }

    /// Reads one number and its unit.
    ///
    /// Returns `(value, unit)` and sets `end` when the closing parenthesis
    /// was consumed. A separator `sep` (0 for none) ends the unit.
    pub fn css_number(&mut self, end: &mut bool, sep: u8) -> Option<(f64, String)> {
        let value = self.number()?;
        let mut unit = String::new();
        if matches!(self.peek(), Some(b'.' | b'0'..=b'9')) {
            return Some((value, unit));
        }
        while let Some(c) = self.get() {
            if c == b')' {
                *end = true;
                break;
            } else if sep != 0 && c == sep {
                break;
            }
            if c == b' ' {
                let p = self.peek();
                if p != Some(b' ') && (sep == 0 || p != Some(sep)) && p != Some(b')') {
                    break;
                }
            } else {
                unit.push(c as char);
            }
        }
        Some((value, unit))
    }

    /// Reads a number and appends it scaled by its unit.
    ///
    /// `%` divides by `pc_scale`, `deg` by 360, `turn` is kept as-is and no
    /// unit divides by `scale`. Unknown units fail.
    pub fn append_css_value(
        &mut self,
        output: &mut Vec<f64>,
        end: &mut bool,
        sep: u8,
        scale: f64,
        pc_scale: f64,
    ) -> bool {
        if *end {
            return false;
        }
        let Some((value, unit)) = self.css_number(end, sep) else {
            return false;
        };
        let value = match unit.as_str() {
            "%" => value / pc_scale,
            "deg" => value / 360.0,
            "turn" => value,
            "" => value / scale,
            other => {
                tracing::warn!(unit = other, "unknown unit in css color");
                return false;
            }
        };
        output.push(value);
        true
    }
}

// ============================================================================
// Parsers
// ============================================================================

/// One color syntax.
pub trait ColorParser: Send + Sync {
    fn prefix(&self) -> &str;

    fn space_type(&self) -> SpaceType;

    /// Appends the parsed values; returns false on malformed input.
    fn parse(&self, ss: &mut CssScanner<'_>, output: &mut Vec<f64>) -> bool;

    /// Parses and returns the profile name (if any). `more` is set when
    /// another color may follow.
    fn parse_color(&self, ss: &mut CssScanner<'_>, output: &mut Vec<f64>, more: &mut bool) -> String {
        let _ = more;
        if !self.parse(ss, output) {
            output.clear();
        }
        String::new()
    }
}

/// `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`.
struct HexParser;

impl ColorParser for HexParser {
    fn prefix(&self) -> &str {
        "#"
    }

    fn space_type(&self) -> SpaceType {
        SpaceType::Rgb
    }

    fn parse(&self, ss: &mut CssScanner<'_>, output: &mut Vec<f64>) -> bool {
        let mut more = false;
        self.parse_color(ss, output, &mut more);
        !output.is_empty()
    }

    fn parse_color(&self, ss: &mut CssScanner<'_>, output: &mut Vec<f64>, more: &mut bool) -> String {
        if let Some((hex, size)) = ss.hex() {
            match size {
                3 | 4 => {
                    for p in (0..size).rev() {
                        let nibble = (hex >> (4 * p)) & 0xf;
                        output.push((nibble + (nibble << 4)) as f64 / 255.0);
                    }
                }
                6 => output.extend(rgba_to_values(hex << 8, false)),
                8 => output.extend(rgba_to_values(hex, true)),
                _ => {}
            }
        }
        ss.skip_ws();
        *more = ss.peek() == Some(b'i');
        String::new()
    }
}

/// CSS keywords.
struct NameParser;

impl ColorParser for NameParser {
    fn prefix(&self) -> &str {
        ""
    }

    fn space_type(&self) -> SpaceType {
        SpaceType::CssName
    }

    fn parse(&self, ss: &mut CssScanner<'_>, output: &mut Vec<f64>) -> bool {
        let name = ss.word();
        match css_name_to_rgba(&name) {
            Some(rgba) => {
                output.extend(rgba_to_values(rgba, false));
                true
            }
            None => false,
        }
    }
}

/// `icc-color(name, v1, v2, ...)`.
struct CmsParser;

impl ColorParser for CmsParser {
    fn prefix(&self) -> &str {
        "icc-color"
    }

    fn space_type(&self) -> SpaceType {
        SpaceType::Cms
    }

    fn parse(&self, ss: &mut CssScanner<'_>, output: &mut Vec<f64>) -> bool {
        let mut more = false;
        let _ = self.parse_color(ss, output, &mut more);
        !output.is_empty()
    }

    fn parse_color(&self, ss: &mut CssScanner<'_>, output: &mut Vec<f64>, _more: &mut bool) -> String {
        let mut name = ss.word();
        if name.ends_with(',') {
            name.pop();
        }
        let mut end = false;
        while ss.append_css_value(output, &mut end, b',', 1.0, 100.0) {}
        if output.is_empty() {
            let named = ss.word();
            if !named.is_empty() {
                tracing::warn!(named = %named, profile = %name, "ICC named colors are not supported");
            }
        }
        name
    }
}

/// `rgb()` and `rgba()`, legacy and modern syntax.
struct RgbParser {
    prefix: &'static str,
}

impl ColorParser for RgbParser {
    fn prefix(&self) -> &str {
        self.prefix
    }

    fn space_type(&self) -> SpaceType {
        SpaceType::Rgb
    }

    fn parse(&self, ss: &mut CssScanner<'_>, output: &mut Vec<f64>) -> bool {
        let (sep0, sep1) = if ss.has_comma() { (b',', b',') } else { (0, b'/') };
        let mut end = false;
        while !end && output.len() < 4 {
            let scale = if output.len() == 3 { 1.0 } else { 255.0 };
            let sep = if output.len() == 2 { sep1 } else { sep0 };
            if !ss.append_css_value(output, &mut end, sep, scale, 100.0) {
                break;
            }
        }
        end
    }
}

/// Hue based functions: `hsl()`, `hsla()` and `hwb()`.
///
/// Only `hsl`/`hsla` accept the legacy comma syntax.
struct HueParser {
    prefix: &'static str,
    space_type: SpaceType,
    alpha: bool,
    scale: f64,
    hwb: bool,
}

impl ColorParser for HueParser {
    fn prefix(&self) -> &str {
        self.prefix
    }

    fn space_type(&self) -> SpaceType {
        self.space_type
    }

    fn parse(&self, ss: &mut CssScanner<'_>, output: &mut Vec<f64>) -> bool {
        let mut sep0 = 0;
        let mut sep1 = b'/';
        let mut max_count = 4;
        if ss.has_comma() && self.prefix.starts_with("hsl") {
            sep0 = b',';
            sep1 = b',';
            max_count = if self.alpha { 4 } else { 3 };
        }
        let mut end = false;
        while !end && output.len() < max_count {
            let scale = match output.len() {
                0 => 360.0,
                3 => 1.0,
                _ => self.scale,
            };
            let sep = if output.len() == 2 { sep1 } else { sep0 };
            if !ss.append_css_value(output, &mut end, sep, scale, 100.0) {
                break;
            }
        }
        if end && self.hwb && output.len() >= 3 {
            let hsv = Hsv::from_hwb(output[0], output[1], output[2]);
            output[..3].copy_from_slice(&hsv);
        }
        end
    }
}

/// `lab(L a b [/ alpha])`. Percentages of a/b are relative to 125.
struct LabParser;

impl ColorParser for LabParser {
    fn prefix(&self) -> &str {
        "lab"
    }

    fn space_type(&self) -> SpaceType {
        SpaceType::Lab
    }

    fn parse(&self, ss: &mut CssScanner<'_>, output: &mut Vec<f64>) -> bool {
        const PC: f64 = 100.0 / 125.0;
        let mut end = false;
        let ok = ss.append_css_value(output, &mut end, b',', 100.0, 100.0)
            && ss.append_css_value(output, &mut end, b',', 1.0, PC)
            && ss.append_css_value(output, &mut end, b'/', 1.0, PC);
        if !ok {
            return false;
        }
        ss.append_css_value(output, &mut end, 0, 1.0, 100.0);
        if !end {
            return false;
        }
        output[1] = scale_down(output[1], -128.0, 127.0);
        output[2] = scale_down(output[2], -128.0, 127.0);
        true
    }
}

/// Three channels with fixed scales plus optional alpha: `lch()`,
/// `oklab()`, `oklch()`.
struct PolarParser {
    prefix: &'static str,
    space_type: SpaceType,
    scales: [f64; 3],
    signed_ab: bool,
}

impl ColorParser for PolarParser {
    fn prefix(&self) -> &str {
        self.prefix
    }

    fn space_type(&self) -> SpaceType {
        self.space_type
    }

    fn parse(&self, ss: &mut CssScanner<'_>, output: &mut Vec<f64>) -> bool {
        let [s0, s1, s2] = self.scales;
        let mut end = false;
        let ok = ss.append_css_value(output, &mut end, b',', s0, 100.0)
            && ss.append_css_value(output, &mut end, b',', s1, 100.0)
            && ss.append_css_value(output, &mut end, b'/', s2, 100.0);
        if !ok {
            return false;
        }
        ss.append_css_value(output, &mut end, 0, 1.0, 100.0);
        if !end {
            return false;
        }
        if self.signed_ab {
            output[1] = (output[1] + 1.0) / 2.0;
            output[2] = (output[2] + 1.0) / 2.0;
        }
        true
    }
}

/// Modern space separated functions with a fixed channel count.
struct CssParser {
    prefix: &'static str,
    space_type: SpaceType,
    channels: usize,
}

impl ColorParser for CssParser {
    fn prefix(&self) -> &str {
        self.prefix
    }

    fn space_type(&self) -> SpaceType {
        self.space_type
    }

    fn parse(&self, ss: &mut CssScanner<'_>, output: &mut Vec<f64>) -> bool {
        let mut end = false;
        while !end && output.len() < self.channels + 1 {
            let sep = if output.len() + 1 == self.channels { b'/' } else { 0 };
            if !ss.append_css_value(output, &mut end, sep, 1.0, 100.0) {
                break;
            }
        }
        end
    }
}

/// Registry of parsers keyed by prefix.
pub struct Parsers {
    parsers: HashMap<String, Vec<Box<dyn ColorParser>>>,
}

impl Default for Parsers {
    fn default() -> Self {
        let mut p = Self {
            parsers: HashMap::new(),
        };
        p.add_parser(Box::new(HexParser));
        p.add_parser(Box::new(NameParser));
        p.add_parser(Box::new(CmsParser));
        p.add_parser(Box::new(RgbParser { prefix: "rgb" }));
        p.add_parser(Box::new(RgbParser { prefix: "rgba" }));
        for (prefix, space_type, alpha, hwb) in [
            ("hsl", SpaceType::Hsl, false, false),
            ("hsla", SpaceType::Hsl, true, false),
            ("hwb", SpaceType::Hsv, false, true),
            ("hwba", SpaceType::Hsv, true, true),
        ] {
            p.add_parser(Box::new(HueParser {
                prefix,
                space_type,
                alpha,
                scale: 100.0,
                hwb,
            }));
        }
        p.add_parser(Box::new(LabParser));
        p.add_parser(Box::new(PolarParser {
            prefix: "lch",
            space_type: SpaceType::Lch,
            scales: [100.0, 150.0, 360.0],
            signed_ab: false,
        }));
        p.add_parser(Box::new(PolarParser {
            prefix: "oklab",
            space_type: SpaceType::OkLab,
            scales: [1.0, 0.4, 0.4],
            signed_ab: true,
        }));
        p.add_parser(Box::new(PolarParser {
            prefix: "oklch",
            space_type: SpaceType::OkLch,
            scales: [1.0, 0.4, 360.0],
            signed_ab: false,
        }));
        for (prefix, space_type, channels) in [
            ("srgb", SpaceType::Rgb, 3),
            ("srgb-linear", SpaceType::LinearRgb, 3),
            ("device-cmyk", SpaceType::Cmyk, 4),
            ("xyz", SpaceType::Xyz, 3),
            ("xyz-d65", SpaceType::Xyz, 3),
            ("xyz-d50", SpaceType::Xyz50, 3),
        ] {
            p.add_parser(Box::new(CssParser {
                prefix,
                space_type,
                channels,
            }));
        }
        p
    }
}

impl Parsers {
    pub fn add_parser(&mut self, parser: Box<dyn ColorParser>) {
        self.parsers
            .entry(parser.prefix().to_string())
            .or_default()
            .push(parser);
    }

    /// Parses a complete color string.
    pub fn parse(&self, input: &str) -> Option<ParsedColor> {
        let mut ss = CssScanner::new(input);
        let mut parsed = ParsedColor {
            space_type: SpaceType::None,
            cms_name: String::new(),
            values: Vec::new(),
            fallback: Vec::new(),
        };
        self.parse_inner(&mut ss, &mut parsed).then_some(parsed)
    }

    fn parse_inner(&self, ss: &mut CssScanner<'_>, out: &mut ParsedColor) -> bool {
        let prefix = ss.css_prefix();
        let Some(parsers) = self.parsers.get(&prefix) else {
            return false;
        };
        for parser in parsers {
            let pos = ss.pos();
            let mut more = false;
            out.values.clear();
            let mut values = Vec::new();
            out.cms_name = parser.parse_color(ss, &mut values, &mut more);

            if more && prefix == "#" {
                let mut icc = ParsedColor {
                    space_type: SpaceType::None,
                    cms_name: String::new(),
                    values: Vec::new(),
                    fallback: Vec::new(),
                };
                if self.parse_inner(ss, &mut icc) && icc.space_type == SpaceType::Cms {
                    out.space_type = SpaceType::Cms;
                    out.cms_name = icc.cms_name;
                    out.fallback = values;
                    out.values = icc.values;
                    return true;
                }
            }
            if !values.is_empty() {
                out.space_type = parser.space_type();
                out.values = values;
                return true;
            }
            ss.seek(pos);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_number_units() {
        let mut ss = CssScanner::new("50% 20deg 0.5turn 3)");
        let mut end = false;
        assert_eq!(ss.css_number(&mut end, 0), Some((50.0, "%".to_string())));
        assert_eq!(ss.css_number(&mut end, 0), Some((20.0, "deg".to_string())));
        assert_eq!(ss.css_number(&mut end, 0), Some((0.5, "turn".to_string())));
        assert!(!end);
        assert_eq!(ss.css_number(&mut end, 0), Some((3.0, String::new())));
        assert!(end);
    }

    #[test]
    fn test_css_number_separator() {
        let mut ss = CssScanner::new("1 , 2 / 3)");
        let mut end = false;
        assert_eq!(ss.css_number(&mut end, b','), Some((1.0, String::new())));
        assert_eq!(ss.css_number(&mut end, b'/'), Some((2.0, String::new())));
        assert_eq!(ss.css_number(&mut end, 0), Some((3.0, String::new())));
        assert!(end);
    }

    #[test]
    fn test_unknown_unit_fails() {
        let mut ss = CssScanner::new("3px)");
        let mut out = Vec::new();
        let mut end = false;
        assert!(!ss.append_css_value(&mut out, &mut end, 0, 1.0, 100.0));
        assert!(out.is_empty());
    }

    #[test]
    fn test_prefix() {
        assert_eq!(CssScanner::new("  #fff").css_prefix(), "#");
        assert_eq!(CssScanner::new("RGB(1 2 3)").css_prefix(), "rgb");
        assert_eq!(CssScanner::new("color(sRGb 1 0 0)").css_prefix(), "srgb");
        assert_eq!(CssScanner::new("red").css_prefix(), "");
    }
}
