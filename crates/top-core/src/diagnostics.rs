//! Values exposed through the host's info CHOP channels and info DAT table.

/// One named scalar for the info CHOP.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoChannel {
    pub name: &'static str,
    pub value: f32,
}

/// Row-major string table for the info DAT.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InfoTable {
    pub rows: Vec<Vec<String>>,
}

impl InfoTable {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }
}

/// Execute counter and step, the pair every TOP in this workspace reports.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Diagnostics {
    pub execute_count: i32,
    pub step: f64,
}

impl Diagnostics {
    pub fn channels(&self) -> Vec<InfoChannel> {
        vec![
            InfoChannel {
                name: "executeCount",
                value: self.execute_count as f32,
            },
            InfoChannel {
                name: "step",
                value: self.step as f32,
            },
        ]
    }

    pub fn table(&self) -> InfoTable {
        InfoTable {
            rows: vec![
                vec!["executeCount".to_string(), self.execute_count.to_string()],
                vec!["step".to_string(), format_g(self.step)],
            ],
        }
    }
}

/// Format like C's `%g`: six significant digits, trailing zeros removed,
/// scientific notation when the exponent is below -4 or at least 6.
pub fn format_g(value: f64) -> String {
    const PRECISION: i32 = 6;

    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the target precision first; rounding can bump the exponent.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= PRECISION {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    } else {
        let decimals = (PRECISION - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_g_matches_printf() {
        assert_eq!(format_g(0.0), "0");
        assert_eq!(format_g(1.0), "1");
        assert_eq!(format_g(-2.5), "-2.5");
        assert_eq!(format_g(123456.0), "123456");
        assert_eq!(format_g(1234567.0), "1.23457e+06");
        assert_eq!(format_g(0.0001), "0.0001");
        assert_eq!(format_g(0.00001), "1e-05");
        assert_eq!(format_g(0.1 + 0.2), "0.3");
        assert_eq!(format_g(999999.5), "1e+06");
    }

    #[test]
    fn table_mirrors_channels() {
        let diagnostics = Diagnostics {
            execute_count: 42,
            step: 12.5,
        };
        let channels = diagnostics.channels();
        assert_eq!(channels[0].name, "executeCount");
        assert_eq!(channels[0].value, 42.0);
        assert_eq!(channels[1].name, "step");
        assert_eq!(channels[1].value, 12.5);

        let table = diagnostics.table();
        assert_eq!((table.num_rows(), table.num_cols()), (2, 2));
        assert_eq!(table.row(0).unwrap(), ["executeCount", "42"]);
        assert_eq!(table.row(1).unwrap(), ["step", "12.5"]);
    }
}
