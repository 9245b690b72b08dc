//! Visualization utilities for CVRP solutions.
//!
//! Generates SVG drawings of the decoded trips (one colour per vehicle) and of
//! the best-cost history of a run.

use crate::fitness;
use crate::instance::ProblemData;
use crate::solution::Solution;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
#[cfg(feature = "resvg")]
use resvg::tiny_skia::{Pixmap, Transform};
#[cfg(feature = "resvg")]
use resvg::usvg::{self, TreeParsing};
#[cfg(feature = "resvg")]
use resvg::FitTo;

/// Trip colours, reused cyclically
const PALETTE: [&str; 10] = [
    "#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#42d4f4", "#f032e6", "#9a6324", "#800000", "#469990",
];

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Node radius
    pub node_radius: f64,
    /// Print raw node ids next to the customers
    pub show_labels: bool,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            node_radius: 5.0,
            show_labels: true,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trip_color(trip: usize) -> &'static str {
        PALETTE[trip % PALETTE.len()]
    }

    /// Generate SVG visualization of a solution
    pub fn generate_svg(&self, data: &ProblemData, solution: &Solution) -> String {
        let mut svg = String::new();

        let (min_x, max_x, min_y, max_y) = self.get_bounds(data);
        let scale_x = (self.width - 2.0 * self.margin) / (max_x - min_x).max(1e-9);
        let scale_y = (self.height - 2.0 * self.margin) / (max_y - min_y).max(1e-9);
        let scale = scale_x.min(scale_y);

        let transform = |(x, y): (f64, f64)| -> (f64, f64) {
            (
                self.margin + (x - min_x) * scale,
                self.height - self.margin - (y - min_y) * scale,
            )
        };

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .node {{ fill: #ffffff; stroke: #2c3e50; stroke-width: 1.5; }}
    .depot {{ fill: #2c3e50; stroke: #000000; stroke-width: 2; }}
    .trip {{ stroke-width: 2; fill: none; stroke-linejoin: round; }}
    .label {{ font-family: Arial; font-size: 9px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r#"<text x="{}" y="25" class="title">Instance: {} | {} | Cost: {:.2} | Trips: {}</text>
"#,
            self.margin,
            data.name,
            solution.algorithm,
            solution.cost,
            solution.num_trips()
        ));

        let coords = data.coordinates();
        let depot = transform(coords[data.depot()]);

        for (k, trip) in solution.trips.iter().enumerate() {
            let mut points = vec![depot];
            points.extend(trip.iter().map(|&c| transform(coords[c])));
            points.push(depot);

            let path: Vec<String> = points.iter().map(|(x, y)| format!("{:.2},{:.2}", x, y)).collect();
            svg.push_str(&format!(
                r#"<polyline points="{}" class="trip" stroke="{}"/>
"#,
                path.join(" "),
                Self::trip_color(k)
            ));
        }

        let ids = data.ids();
        for &c in data.customers() {
            let (x, y) = transform(coords[c]);
            svg.push_str(&format!(
                r#"<circle cx="{:.2}" cy="{:.2}" r="{}" class="node"/>
"#,
                x, y, self.node_radius
            ));
            if self.show_labels {
                svg.push_str(&format!(
                    r#"<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>
"#,
                    x,
                    y - self.node_radius - 2.0,
                    ids.to_raw(c)
                ));
            }
        }

        let side = 2.5 * self.node_radius;
        svg.push_str(&format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" class="depot"/>
"#,
            depot.0 - side / 2.0,
            depot.1 - side / 2.0,
            side,
            side
        ));

        let legend_y = self.height - 20.0;
        for (k, load) in fitness::trip_loads(data, &solution.trips).iter().enumerate() {
            let x = self.margin + (k % 8) as f64 * 90.0;
            let y = legend_y - (k / 8) as f64 * 14.0;
            svg.push_str(&format!(
                r#"<rect x="{:.2}" y="{:.2}" width="10" height="10" fill="{}"/>
<text x="{:.2}" y="{:.2}" class="label">#{} load {}</text>
"#,
                x,
                y - 9.0,
                Self::trip_color(k),
                x + 14.0,
                y,
                k + 1,
                load
            ));
        }

        svg.push_str("</svg>");

        svg
    }

    /// Generate the best-cost-per-iteration curve of a run
    pub fn generate_convergence_svg(&self, solution: &Solution) -> String {
        let mut svg = String::new();

        let width = self.width;
        let height = 300.0;
        let margin = 50.0;

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .line {{ stroke: #3498db; stroke-width: 2; fill: none; }}
    .axis {{ stroke: #2c3e50; stroke-width: 1; }}
    .label {{ font-family: Arial; font-size: 12px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            width, height, width, height
        ));

        svg.push_str(&format!(
            r#"<text x="{}" y="25" class="title">Convergence - {} ({} iterations)</text>
"#,
            margin,
            solution.algorithm,
            solution.cost_history.len()
        ));

        let plot_width = width - 2.0 * margin;
        let plot_height = height - 2.0 * margin;

        svg.push_str(&format!(
            r#"<line x1="{m}" y1="{b}" x2="{r}" y2="{b}" class="axis"/>
<line x1="{m}" y1="{m}" x2="{m}" y2="{b}" class="axis"/>
"#,
            m = margin,
            b = height - margin,
            r = width - margin
        ));

        let history = &solution.cost_history;
        if !history.is_empty() {
            let lo = history.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = history.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let x_scale = plot_width / (history.len().max(2) - 1) as f64;
            let y_scale = plot_height / (hi - lo).max(1e-9);

            let path: Vec<String> = history
                .iter()
                .enumerate()
                .map(|(i, &cost)| {
                    let x = margin + i as f64 * x_scale;
                    let y = height - margin - (cost - lo) * y_scale;
                    format!("{}{:.2} {:.2}", if i == 0 { "M " } else { "L " }, x, y)
                })
                .collect();

            svg.push_str(&format!(
                r#"<path d="{}" class="line"/>
<text x="{}" y="{}" class="label">{:.2}</text>
<text x="{}" y="{}" class="label">{:.2}</text>
"#,
                path.join(" "),
                5.0,
                margin + 4.0,
                hi,
                5.0,
                height - margin,
                lo
            ));
        }

        svg.push_str("</svg>");

        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, svg).with_context(|| format!("cannot write {}", path.display()))
    }

    /// Render an SVG string to a PNG file
    #[cfg(feature = "resvg")]
    pub fn save_png<P: AsRef<Path>>(&self, svg: &str, path: P) -> Result<()> {
        let path = path.as_ref();
        let tree = usvg::Tree::from_str(svg, &usvg::Options::default()).context("usvg parse error")?;

        let (w, h) = (tree.size.width().ceil() as u32, tree.size.height().ceil() as u32);
        let mut pixmap = Pixmap::new(w.max(1), h.max(1))
            .context("failed to create pixmap")?;
        resvg::render(&tree, FitTo::Original, Transform::default(), pixmap.as_mut())
            .context("resvg render failed")?;
        pixmap
            .save_png(path)
            .with_context(|| format!("cannot write {}", path.display()))?;
        Ok(())
    }

    #[cfg(not(feature = "resvg"))]
    pub fn save_png<P: AsRef<Path>>(&self, _svg: &str, path: P) -> Result<()> {
        anyhow::bail!(
            "cannot write {}: PNG export requires the `resvg` feature",
            path.as_ref().display()
        )
    }

    /// Get coordinate bounds
    fn get_bounds(&self, data: &ProblemData) -> (f64, f64, f64, f64) {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for &(x, y) in data.coordinates() {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        (min_x, max_x, min_y, max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_instance() -> ProblemData {
        let coords = vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];
        let demands = (1..=4).map(|c| (c, 1.0)).collect();
        let mut data = ProblemData::new(coords, demands, 2.0, 0).unwrap();
        data.name = "test".to_string();
        data
    }

    #[test]
    fn test_visualizer() {
        let data = create_test_instance();
        let solution = Solution::from_route(&data, vec![1, 2, 3, 4], "manual").unwrap();

        let viz = Visualizer::new();
        let svg = viz.generate_svg(&data, &solution);

        assert!(svg.starts_with("<?xml"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("test"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains(Visualizer::trip_color(0)));
        assert!(svg.contains(Visualizer::trip_color(1)));
    }

    #[test]
    fn test_palette_wraps() {
        assert_eq!(Visualizer::trip_color(0), Visualizer::trip_color(PALETTE.len()));
    }

    #[test]
    fn test_convergence_svg() {
        let data = create_test_instance();
        let mut solution = Solution::from_route(&data, vec![1, 2, 3, 4], "manual").unwrap();
        let viz = Visualizer::new();

        assert!(!viz.generate_convergence_svg(&solution).contains("<path"));

        solution.cost_history = vec![10.0, 8.0, 8.0, 7.5];
        let svg = viz.generate_convergence_svg(&solution);
        assert!(svg.contains("<path"));
        assert!(svg.contains("4 iterations"));
    }
}
