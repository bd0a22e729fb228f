//! CSS text output for color values.

/// Formats a number with at most three decimals and no trailing zeros.
pub fn format_number(v: f64) -> String {
    let mut s = format!("{v:.3}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".into();
    }
    s
}

/// Builds modern space separated CSS functions such as
/// `device-cmyk(0.1 0.2 0.3 0.4 / 50%)`.
#[derive(Debug, Clone)]
pub struct CssFuncPrinter {
    name: String,
    parts: Vec<String>,
    alpha: Option<f64>,
}

impl CssFuncPrinter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parts: Vec::new(),
            alpha: None,
        }
    }

    /// Adds a value as-is.
    pub fn value(mut self, v: f64) -> Self {
        self.parts.push(format_number(v));
        self
    }

    /// Adds a value rounded to an integer.
    pub fn int(mut self, v: f64) -> Self {
        self.parts.push(format!("{}", v.round() as i64));
        self
    }

    /// Adds a bare word, used for the space id of `color()`.
    pub fn word(mut self, w: &str) -> Self {
        self.parts.push(w.to_string());
        self
    }

    /// Sets the opacity, printed as a percentage after a slash.
    pub fn alpha(mut self, a: Option<f64>) -> Self {
        self.alpha = a;
        self
    }

    pub fn finish(self) -> String {
        let mut out = format!("{}({}", self.name, self.parts.join(" "));
        if let Some(a) = self.alpha {
            out.push_str(" / ");
            out.push_str(&format_number(a * 100.0));
            out.push('%');
        }
        out.push(')');
        out
    }

    /// Prints `color(<id> v1 v2 ...)` for the first `channels` values.
    pub fn color(id: &str, values: &[f64], channels: usize, opacity: bool) -> String {
        let printer = values
            .iter()
            .take(channels)
            .fold(CssFuncPrinter::new("color").word(id), |p, &v| p.value(v));
        printer.alpha(opacity_of(values, channels, opacity)).finish()
    }
}

/// Builds legacy comma separated CSS functions such as `hsla(0, 100, 50, 1)`.
///
/// The function name gains an `a` suffix when opacity is printed.
#[derive(Debug, Clone)]
pub struct CssLegacyPrinter {
    name: String,
    parts: Vec<String>,
    alpha: Option<f64>,
}

impl CssLegacyPrinter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parts: Vec::new(),
            alpha: None,
        }
    }

    pub fn value(mut self, v: f64) -> Self {
        self.parts.push(format_number(v));
        self
    }

    pub fn int(mut self, v: f64) -> Self {
        self.parts.push(format!("{}", v.round() as i64));
        self
    }

    pub fn alpha(mut self, a: Option<f64>) -> Self {
        self.alpha = a;
        self
    }

    pub fn finish(mut self) -> String {
        let mut name = self.name;
        if let Some(a) = self.alpha {
            name.push('a');
            self.parts.push(format_number(a));
        }
        format!("{}({})", name, self.parts.join(", "))
    }
}

/// Opacity to print, if the caller wants it and the values carry one.
pub fn opacity_of(values: &[f64], channels: usize, opacity: bool) -> Option<f64> {
    if opacity && values.len() > channels {
        values.get(channels).copied()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(83.33333), "83.333");
        assert_eq!(format_number(-0.0001), "0");
    }

    #[test]
    fn test_func_printer() {
        let s = CssFuncPrinter::new("device-cmyk")
            .value(0.9)
            .value(0.0)
            .value(0.2)
            .value(0.6)
            .alpha(Some(0.8))
            .finish();
        assert_eq!(s, "device-cmyk(0.9 0 0.2 0.6 / 80%)");
    }

    #[test]
    fn test_legacy_printer() {
        let s = CssLegacyPrinter::new("hsl").int(0.0).value(100.0).value(50.0).finish();
        assert_eq!(s, "hsl(0, 100, 50)");
        let s = CssLegacyPrinter::new("hsl")
            .int(0.0)
            .value(100.0)
            .value(50.0)
            .alpha(Some(1.0))
            .finish();
        assert_eq!(s, "hsla(0, 100, 50, 1)");
    }
}
