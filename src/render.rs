use std::io::{self, Write};
use rgb::RGB8;
use textplots::{Chart, ColorPlot, Plot, Shape};

use crate::measurement::Mode;
use crate::window::{Sample, SampleWindow};

/// Everything a renderer needs for one redraw.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub series: Vec<Sample>,
    pub latest: Sample,
    pub mean: f64,
    /// Smallest and largest value in `series`.
    pub bounds: (f64, f64),
    pub unit: &'static str,
}

impl Frame {
    /// `None` while the window is still empty.
    pub fn from_window(window: &SampleWindow, mode: Mode) -> Option<Self> {
        Some(Self {
            latest: window.latest()?,
            mean: window.mean()?,
            bounds: window.min_max()?,
            series: window.snapshot(),
            unit: mode.unit(),
        })
    }

    /// Caption with the latest value and running mean.
    pub fn summary(&self) -> String {
        format!(
            "Current: {:.9}{unit};  Mean: {:.9}{unit}",
            self.latest.value,
            self.mean,
            unit = self.unit
        )
    }

    /// Largest magnitude in the series, for axis scaling.
    pub fn max_abs(&self) -> f64 {
        self.bounds.0.abs().max(self.bounds.1.abs())
    }

    /// Points as (seconds since the first sample, value).
    pub fn points(&self) -> Vec<(f64, f64)> {
        let Some(first) = self.series.first() else {
            return Vec::new();
        };
        self.series
            .iter()
            .map(|s| {
                let elapsed = (s.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0;
                (elapsed, s.value)
            })
            .collect()
    }
}

pub trait Renderer {
    fn render(&mut self, frame: &Frame) -> io::Result<()>;
}

/// Determine the best scale and unit prefix for a given maximum value
pub fn determine_scale(max_value: f64) -> (f64, &'static str) {
    if max_value == 0.0 || max_value >= 1.0 {
        (1.0, "")
    } else if max_value >= 1e-3 {
        (1e3, "m")
    } else if max_value >= 1e-6 {
        (1e6, "μ")
    } else if max_value >= 1e-9 {
        (1e9, "n")
    } else {
        (1e12, "p")
    }
}

/// Color of the latest-point marker.
pub const MARKER_COLOR: RGB8 = RGB8 { r: 255, g: 0, b: 0 };

/// Redraws the whole terminal with a line chart of the window.
pub struct TerminalRenderer {
    width: u32,
    height: u32,
}

impl TerminalRenderer {
    /// Minimum chart size textplots can draw.
    pub const MIN_WIDTH: u32 = 32;
    pub const MIN_HEIGHT: u32 = 3;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(Self::MIN_WIDTH),
            height: height.max(Self::MIN_HEIGHT),
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(140, 40)
    }
}

impl TerminalRenderer {
    /// Header and chart for one frame, the latest point drawn as a red marker.
    pub fn draw(&self, frame: &Frame) -> String {
        let (scale, prefix) = determine_scale(frame.max_abs());

        let line: Vec<(f32, f32)> = frame
            .points()
            .iter()
            .map(|(x, y)| (*x as f32, (y * scale) as f32))
            .collect();
        let marker: Vec<(f32, f32)> = line.last().copied().into_iter().collect();
        let x_max = line.last().map(|(x, _)| *x).filter(|x| *x > 0.0).unwrap_or(1.0);

        let line_shape = Shape::Lines(&line);
        let marker_shape = Shape::Points(&marker);
        let mut chart = Chart::new(self.width, self.height, 0.0, x_max);
        let chart = chart
            .lineplot(&line_shape)
            .linecolorplot(&marker_shape, MARKER_COLOR);
        chart.borders();
        chart.axis();
        chart.figures();

        format!(
            "{}\nX-axis: Time (s) | Y-axis: {}{} | {} samples\n{}\n{}",
            frame.summary(),
            prefix,
            frame.unit,
            frame.series.len(),
            "─".repeat(self.width as usize),
            chart
        )
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, frame: &Frame) -> io::Result<()> {
        let text = self.draw(frame);
        let mut out = io::stdout().lock();
        // Clear screen, cursor home.
        write!(out, "\x1B[2J\x1B[1;1H{}", text)?;
        writeln!(out)?;
        out.flush()
    }
}
