use crate::ensemble::EnsembleSummary;
use crate::grid_state::GridState;
use anyhow::{Context, Result};
use epigrid_common::Snapshot;
use log::{error, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Serialisation format for recorded snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Bincode,
    MessagePack,
}

impl OutputFormat {
    /// Parses the configured format name. Missing means JSON; unknown names are
    /// logged and fall back to JSON.
    pub fn from_config(name: Option<&str>) -> Self {
        match name.unwrap_or("json") {
            "json" => OutputFormat::Json,
            "bincode" => OutputFormat::Bincode,
            "messagepack" => OutputFormat::MessagePack,
            other => {
                error!("Unknown output format: {}. Using JSON instead.", other);
                OutputFormat::Json
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Bincode => "bin",
            OutputFormat::MessagePack => "msgpack",
        }
    }
}

/// `{base}{suffix}_snapshots.{ext}`
pub fn snapshot_path(base_filename: &str, suffix: &str, format: OutputFormat) -> PathBuf {
    PathBuf::from(format!("{}{}_snapshots.{}", base_filename, suffix, format.extension()))
}

/// `{base}{suffix}_final_grid.csv`
pub fn final_grid_path(base_filename: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{}_final_grid.csv", base_filename, suffix))
}

/// `{base}_ensemble_summary.json`
pub fn summary_path(base_filename: &str) -> PathBuf {
    PathBuf::from(format!("{}_ensemble_summary.json", base_filename))
}

/// Writes all snapshots to `path` in the given format.
pub fn save_snapshots(snapshots: &[Snapshot], path: &Path, format: OutputFormat) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Error creating snapshot file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Json => {
            // Compact, not pretty-printed, to keep long runs small
            serde_json::to_writer(&mut writer, snapshots)
                .context("Error serializing snapshots to JSON")?;
        }
        OutputFormat::Bincode => {
            bincode::serialize_into(&mut writer, snapshots)
                .context("Error serializing snapshots to bincode")?;
        }
        OutputFormat::MessagePack => {
            rmp_serde::encode::write(&mut writer, snapshots)
                .context("Error serializing snapshots to MessagePack")?;
        }
    }
    writer.flush()?;

    info!("{} snapshots saved to {} ({:?} format)", snapshots.len(), path.display(), format);
    Ok(())
}

/// Writes one CSV row per cell: `row,col,susceptible,infected,recovered`.
pub fn save_final_grid(grid: &GridState, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Error creating CSV file '{}'", path.display()))?;
    writer.write_record(["row", "col", "susceptible", "infected", "recovered"])?;
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let (s, i, r) = grid.cell(row, col);
            writer.write_record(&[
                row.to_string(),
                col.to_string(),
                format!("{:.6}", s),
                format!("{:.6}", i),
                format!("{:.6}", r),
            ])?;
        }
    }
    writer.flush()?;
    info!("Final grid saved to {}", path.display());
    Ok(())
}

/// Writes the ensemble summary as pretty-printed JSON.
pub fn save_summary(summary: &EnsembleSummary, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Error creating summary file '{}'", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)
        .context("Error serializing ensemble summary to JSON")?;
    info!("Ensemble summary saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use epigrid_common::Compartment;
    use std::fs;

    fn sample_snapshots() -> Vec<Snapshot> {
        vec![Snapshot {
            step: 3,
            time: 0.6,
            beta: 0.35,
            gamma: 0.1,
            mean_susceptible: 0.7,
            mean_infected: 0.2,
            mean_recovered: 0.1,
            dominant_counts: [3, 1, 0],
            labels: Some(vec![
                Compartment::Susceptible,
                Compartment::Infected,
                Compartment::Susceptible,
                Compartment::Susceptible,
            ]),
        }]
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("epigrid_test_{}_{}", std::process::id(), name))
    }

    #[test]
    fn unknown_format_falls_back_to_json() {
        assert_eq!(OutputFormat::from_config(None), OutputFormat::Json);
        assert_eq!(OutputFormat::from_config(Some("bincode")), OutputFormat::Bincode);
        assert_eq!(OutputFormat::from_config(Some("messagepack")), OutputFormat::MessagePack);
        assert_eq!(OutputFormat::from_config(Some("yaml")), OutputFormat::Json);
    }

    #[test]
    fn paths_include_suffix_and_extension() {
        let path = snapshot_path("out/run", "_rep2", OutputFormat::MessagePack);
        assert_eq!(path, PathBuf::from("out/run_rep2_snapshots.msgpack"));
        assert_eq!(final_grid_path("run", ""), PathBuf::from("run_final_grid.csv"));
    }

    #[test]
    fn json_snapshots_can_be_read_back() {
        let path = temp_path("snapshots.json");
        let snapshots = sample_snapshots();
        save_snapshots(&snapshots, &path, OutputFormat::Json).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let loaded: Vec<Snapshot> = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].step, 3);
        assert_eq!(loaded[0].dominant_counts, [3, 1, 0]);
        assert!(text.contains("\"infected\""));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_labels_are_not_serialized() {
        let path = temp_path("nolabels.json");
        let mut snapshots = sample_snapshots();
        snapshots[0].labels = None;
        save_snapshots(&snapshots, &path, OutputFormat::Json).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains("labels"));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn summary_is_written_as_json() {
        let path = temp_path("summary.json");
        let summary = EnsembleSummary {
            replicates: 2,
            seeds: vec![7, 8],
            mean_peak_infected: 0.3,
            min_peak_infected: 0.25,
            max_peak_infected: 0.35,
            mean_final_recovered: 0.8,
        };
        save_summary(&summary, &path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["replicates"], 2);
        assert_eq!(value["seeds"][1], 8);
        assert_eq!(summary_path("run"), PathBuf::from("run_ensemble_summary.json"));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn final_grid_csv_has_one_row_per_cell() {
        let path = temp_path("grid.csv");
        let grid = GridState::from_channels(2, 3, vec![1.0; 6], vec![0.0; 6], vec![0.0; 6]).unwrap();
        save_final_grid(&grid, &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[2], "susceptible");
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 6);
        assert_eq!(&rows[5][0], "1");
        assert_eq!(&rows[5][1], "2");
        assert_eq!(&rows[5][2], "1.000000");
        fs::remove_file(&path).ok();
    }
}
