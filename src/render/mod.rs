//! Terminal rendering of interaction reports.
//!
//! A [`Frame`] buffers one interaction's output and is consumed by
//! [`flush_to`](Frame::flush_to) — the render surface is scoped to a
//! single interaction and released afterwards, so repeated interactions
//! never accumulate rendering state.

use std::fmt::Write as _;
use std::io;

use crate::data::FeatureSchema;
use crate::explain::{Attribution, SurrogateReport};
use crate::pipeline::InteractionReport;

/// Width of the contribution bars, in characters.
const BAR_WIDTH: usize = 24;

/// One interaction's render buffer.
#[derive(Debug, Default)]
pub struct Frame {
    buf: String,
}

impl Frame {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// The buffered content so far.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Append a title with an underline.
    pub fn title(&mut self, text: &str) {
        let _ = writeln!(self.buf, "{text}");
        let _ = writeln!(self.buf, "{}", "=".repeat(text.chars().count()));
    }

    /// Append a section heading with an underline.
    pub fn section(&mut self, text: &str) {
        let _ = writeln!(self.buf);
        let _ = writeln!(self.buf, "{text}");
        let _ = writeln!(self.buf, "{}", "-".repeat(text.chars().count()));
    }

    /// Append one plain line.
    pub fn line(&mut self, text: &str) {
        let _ = writeln!(self.buf, "{text}");
    }

    /// Append a labeled metric, rounded to two decimals.
    pub fn metric(&mut self, label: &str, value: f64) {
        self.section(label);
        let _ = writeln!(self.buf, "{value:.2}");
    }

    /// Append a stage-named error message.
    pub fn stage_error(&mut self, stage: &str, error: &dyn std::fmt::Display) {
        let _ = writeln!(self.buf);
        let _ = writeln!(self.buf, "error [{stage}]: {error}");
    }

    /// Append the attribution waterfall: baseline, per-feature bars in
    /// descending magnitude order, reconstructed prediction.
    pub fn waterfall(&mut self, schema: &FeatureSchema, attribution: &Attribution, top: usize) {
        self.section("Attribution");

        let ranked = attribution.ranked();
        let shown = ranked.len().min(top.max(1));
        let name_width = ranked[..shown]
            .iter()
            .map(|(idx, _)| schema.name(*idx).map_or(1, str::len))
            .max()
            .unwrap_or(1);
        let max_abs = ranked[..shown]
            .iter()
            .map(|(_, c)| c.abs())
            .fold(0.0f64, f64::max)
            .max(f64::MIN_POSITIVE);

        let _ = writeln!(
            self.buf,
            "  {:<name_width$}  {:>10.3}",
            "baseline",
            attribution.base_value()
        );
        for (idx, contribution) in &ranked[..shown] {
            let name = schema.name(*idx).unwrap_or("?");
            let bar_len = ((contribution.abs() / max_abs) * BAR_WIDTH as f64).round() as usize;
            let bar = "█".repeat(bar_len.max(usize::from(*contribution != 0.0)));
            let _ = writeln!(
                self.buf,
                "+ {name:<name_width$}  {contribution:>+10.3}  {bar}"
            );
        }
        if shown < ranked.len() {
            let _ = writeln!(self.buf, "  ({} more features)", ranked.len() - shown);
        }
        let _ = writeln!(
            self.buf,
            "= {:<name_width$}  {:>10.3}",
            "prediction",
            attribution.predicted()
        );
    }

    /// Append the surrogate weight table.
    pub fn surrogate(&mut self, schema: &FeatureSchema, report: &SurrogateReport, top: usize) {
        self.section("Local surrogate");
        let _ = writeln!(
            self.buf,
            "fit R2 {:.3} over {} samples, kernel width {:.3}",
            report.score(),
            report.n_samples(),
            report.kernel_width()
        );

        let ranked = report.ranked();
        let shown = ranked.len().min(top.max(1));
        let _ = writeln!(self.buf, "{:>10}  feature", "weight");
        for (idx, weight) in &ranked[..shown] {
            let name = schema.name(*idx).unwrap_or("?");
            let _ = writeln!(self.buf, "{weight:>+10.3}  {name}");
        }
        if shown < ranked.len() {
            let _ = writeln!(self.buf, "  ({} more features)", ranked.len() - shown);
        }
        let _ = writeln!(self.buf, "{:>+10.3}  (intercept)", report.intercept());
    }

    /// Write the frame out and release it.
    pub fn flush_to<W: io::Write>(self, out: &mut W) -> io::Result<()> {
        out.write_all(self.buf.as_bytes())?;
        out.flush()
    }
}

/// Render a full interaction report into a frame.
///
/// The prediction always renders; each explanation renders its result or
/// its own error line, independently of the other.
pub fn render_report(
    frame: &mut Frame,
    schema: &FeatureSchema,
    report: &InteractionReport,
    top: usize,
) {
    frame.metric("Prediction", report.display_prediction());

    match &report.attribution {
        Ok(attribution) => frame.waterfall(schema, attribution, top),
        Err(e) => frame.stage_error("attribution", e),
    }
    match &report.surrogate {
        Ok(surrogate) => frame.surrogate(schema, surrogate, top),
        Err(e) => frame.stage_error("surrogate", e),
    }
}
