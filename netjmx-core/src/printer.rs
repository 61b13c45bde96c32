//! Writer for the netdata external plugin protocol.
//!
//! Chart definitions:
//!
//! ```text
//! CHART type.id name title units family chart_type priority [update_every]
//! DIMENSION id name algorithm multiplier divisor [hidden]
//! ```
//!
//! Values, once per cycle and chart:
//!
//! ```text
//! BEGIN type.id
//! SET id = value
//! END
//! ```

use crate::model::Chart;
use std::fmt::Write as _;
use std::io::{self, Write};

/// Writes protocol lines to the host, flushing after every call.
pub struct Printer<W: Write> {
    out: W,
}

impl Printer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Printer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Define (or redefine) a chart and all of its dimensions.
    pub fn define_chart(&mut self, chart: &Chart) -> io::Result<()> {
        let mut lines = String::new();
        // Writing into a String cannot fail.
        let _ = write!(
            lines,
            "CHART {} {} {} {} {} {} {}",
            chart.full_id(),
            match &chart.name {
                Some(name) if chart.has_name() => name.as_str(),
                _ => "null",
            },
            chart.title,
            chart.units,
            match &chart.family {
                Some(family) if chart.has_family() => family.as_str(),
                _ => chart.id.as_str(),
            },
            chart.chart_type,
            chart.priority,
        );
        if let Some(update_every) = chart.update_every.filter(|_| chart.has_update_every()) {
            let _ = write!(lines, " {}", update_every);
        }
        lines.push('\n');

        for dimension in &chart.dimensions {
            let _ = write!(
                lines,
                "DIMENSION {} {} {} {} {}",
                dimension.id,
                match &dimension.name {
                    Some(name) if dimension.has_name() => name.as_str(),
                    _ => dimension.id.as_str(),
                },
                dimension.algorithm,
                dimension.multiplier,
                dimension.divisor,
            );
            if dimension.hidden {
                lines.push_str(" hidden");
            }
            lines.push('\n');
        }

        self.out.write_all(lines.as_bytes())?;
        self.out.flush()
    }

    /// Report the current values of a chart.
    pub fn collect(&mut self, chart: &Chart) -> io::Result<()> {
        let mut lines = format!("BEGIN {}\n", chart.full_id());
        for dimension in &chart.dimensions {
            match dimension.current_value {
                Some(value) => {
                    let _ = writeln!(lines, "SET {} = {}", dimension.id, value);
                }
                None => {
                    let _ = writeln!(lines, "SET {} = ", dimension.id);
                }
            }
        }
        lines.push_str("END\n");

        self.out.write_all(lines.as_bytes())?;
        self.out.flush()
    }

    /// Tell the host to stop running this plugin.
    pub fn disable(&mut self) -> io::Result<()> {
        self.out.write_all(b"DISABLE\n")?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
