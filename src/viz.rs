//! Visualization of student clusters using Plotters

use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::cluster::Clustering;
use crate::error::PipelineError;

/// Color palette for different clusters
static CLUSTER_COLORS: [RGBColor; 5] = [RED, BLUE, GREEN, YELLOW, MAGENTA];

fn cluster_color(cluster: usize) -> &'static RGBColor {
    CLUSTER_COLORS.get(cluster).unwrap_or(&BLACK)
}

/// Scatter plot of GPA against attendance, colored by cluster, with centroids.
///
/// # Arguments
/// * `clustering` - Output of the clustering stage
/// * `output_path` - Path to save the PNG plot
/// * `plot_title` - Title for the plot
pub fn create_cluster_visualization(
    clustering: &Clustering,
    output_path: &Path,
    plot_title: Option<&str>,
) -> Result<(), PipelineError> {
    let title = plot_title.unwrap_or("Student Segments: CGPA vs Attendance (Colored by Cluster)");
    let plot_err = |e: &dyn std::fmt::Display| PipelineError::plot(output_path, e);

    let cgpa: Vec<f64> = clustering.raw_features.column(0).to_vec();
    let attendance: Vec<f64> = clustering.raw_features.column(1).to_vec();
    let x_range = padded_range(&cgpa, 0.2);
    let y_range = padded_range(&attendance, 5.0);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| plot_err(&e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| plot_err(&e))?;

    chart
        .configure_mesh()
        .x_desc("Current CGPA")
        .y_desc("Attendance (%)")
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(|e| plot_err(&e))?;

    for ((&x, &y), &cluster) in cgpa.iter().zip(&attendance).zip(&clustering.labels) {
        chart
            .draw_series(std::iter::once(Circle::new(
                (x, y),
                4,
                cluster_color(cluster).filled(),
            )))
            .map_err(|e| plot_err(&e))?;
    }

    // Centroids as larger squares, in raw units
    let centroids = clustering.model.centroids_raw();
    for (cluster_id, centroid) in centroids.outer_iter().enumerate() {
        let (cx, cy) = (centroid[0], centroid[1]);
        let color = cluster_color(cluster_id);
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(cx - 0.03, cy - 1.0), (cx + 0.03, cy + 1.0)],
                color.filled(),
            )))
            .map_err(|e| plot_err(&e))?
            .label(format!("Cluster {} Centroid", cluster_id))
            .legend(move |(x, y)| Rectangle::new([(x, y), (x + 10, y + 10)], color.filled()));
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .draw()
        .map_err(|e| plot_err(&e))?;

    root.present().map_err(|e| plot_err(&e))?;
    Ok(())
}

/// Bar chart of students per cluster
pub fn create_cluster_size_chart(clustering: &Clustering, output_path: &Path) -> Result<(), PipelineError> {
    let plot_err = |e: &dyn std::fmt::Display| PipelineError::plot(output_path, e);
    let cluster_sizes = clustering.cluster_sizes();
    let max_size = cluster_sizes.iter().copied().max().unwrap_or(1).max(1) as f64;
    let n_clusters = cluster_sizes.len() as f64;

    let root = BitMapBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| plot_err(&e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Cluster Sizes", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n_clusters - 0.5), 0f64..(max_size * 1.1))
        .map_err(|e| plot_err(&e))?;

    chart
        .configure_mesh()
        .x_desc("Cluster ID")
        .y_desc("Number of Students")
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(|e| plot_err(&e))?;

    for (cluster_id, &size) in cluster_sizes.iter().enumerate() {
        let x = cluster_id as f64;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - 0.4, 0.0), (x + 0.4, size as f64)],
                cluster_color(cluster_id).filled(),
            )))
            .map_err(|e| plot_err(&e))?;
    }

    root.present().map_err(|e| plot_err(&e))?;
    Ok(())
}

/// Path of the size chart that accompanies a scatter plot at `base`.
pub fn size_chart_path(base: &Path) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "clusters".to_string());
    base.with_file_name(format!("{}_sizes.png", stem))
}

/// Render the scatter plot and the size chart; returns both paths.
pub fn generate_visualization_report(
    clustering: &Clustering,
    base_output_path: &Path,
) -> Result<Vec<PathBuf>, PipelineError> {
    create_cluster_visualization(clustering, base_output_path, None)?;

    let size_chart = size_chart_path(base_output_path);
    create_cluster_size_chart(clustering, &size_chart)?;

    Ok(vec![base_output_path.to_path_buf(), size_chart])
}

/// Print cluster statistics to console
pub fn print_cluster_statistics(clustering: &Clustering) {
    let total: usize = clustering.labels.len();
    println!("\n=== Cluster Statistics ===");
    println!("Number of clusters: {}", clustering.model.n_clusters());
    println!("Total students: {}", total);
    println!("Mean distance to centroid (Inertia): {:.3}", clustering.inertia);
    println!("Silhouette score (sample): {:.3}", clustering.silhouette);

    println!("\n  Cluster |  Size |  Share | Mean CGPA | Mean Attendance");
    println!("  --------|-------|--------|-----------|----------------");
    for summary in &clustering.summaries {
        let share = if total == 0 {
            0.0
        } else {
            summary.size as f64 / total as f64 * 100.0
        };
        println!(
            "  {:7} | {:5} | {:5.1}% | {:9.2} | {:15.2}",
            summary.cluster, summary.size, share, summary.means[0], summary.means[1]
        );
    }
}

/// Min..max of `values` widened by `pad` on both sides.
fn padded_range(values: &[f64], pad: f64) -> Range<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    (min - pad)..(max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(&[2.0, 3.5, 3.0], 0.5), 1.5..4.0);
        assert_eq!(padded_range(&[], 0.5), 0.0..1.0);
    }

    #[test]
    fn test_size_chart_path() {
        assert_eq!(
            size_chart_path(Path::new("out/segments.png")),
            PathBuf::from("out/segments_sizes.png")
        );
    }
}
