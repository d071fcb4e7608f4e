//! The summarizing pipeline.
//!
//! load -> validate -> clean -> aggregate -> write table -> bar chart -> pie chart.
//!
//! Every check on the input data happens before any output is produced.
//! Artifacts are then staged as temporary files in the output directory
//! and renamed into place only after all of them rendered, so a failed run
//! never leaves partial outputs behind.

use crate::analysis::{self, COUNT_COLUMN, PHYLUM_COLUMN};
use crate::dataset::RawTable;
use crate::error::{DataQualityWarning, SummaryError};
use crate::models::FrequencyTable;
use crate::report::{write_frequency_csv, BarChart, ChartRenderer, PieChart};
use anyhow::Context;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

pub const TABLE_FILE_NAME: &str = "frequency_table_by_phylum.csv";
pub const BAR_CHART_FILE_NAME: &str = "bar_chart.png";
pub const PIE_CHART_FILE_NAME: &str = "pie_chart.png";

/// Paths of the three artifacts written by a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    pub table_file: PathBuf,
    pub bar_chart_file: PathBuf,
    pub pie_chart_file: PathBuf,
}

impl Outputs {
    fn in_dir(dir: &Path) -> Self {
        Self {
            table_file: dir.join(TABLE_FILE_NAME),
            bar_chart_file: dir.join(BAR_CHART_FILE_NAME),
            pie_chart_file: dir.join(PIE_CHART_FILE_NAME),
        }
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct Summary {
    pub table: FrequencyTable,
    pub warnings: Vec<DataQualityWarning>,
    pub outputs: Outputs,
}

/// Validated, aggregated data ready for output.
#[derive(Debug)]
pub struct Analysis {
    pub table: FrequencyTable,
    pub warnings: Vec<DataQualityWarning>,
}

/// Load, validate and aggregate the input file without writing anything.
pub fn analyze(input: &Path) -> Result<Analysis, SummaryError> {
    let raw = RawTable::from_path(input)?;

    let phylum_idx = raw.column_index(PHYLUM_COLUMN)?;
    let count_idx = raw.column_index(COUNT_COLUMN)?;
    debug!(
        "Using columns '{}' (#{}) and '{}' (#{})",
        PHYLUM_COLUMN, phylum_idx, COUNT_COLUMN, count_idx
    );

    let mut warnings = Vec::new();

    let (records, warning) = analysis::drop_missing_counts(raw.records(phylum_idx, count_idx));
    if let Some(warning) = warning {
        warn!("{} (lines {:?})", warning, warning.lines);
        warnings.push(warning);
    }

    if records.is_empty() {
        return Err(SummaryError::NoData {
            column: COUNT_COLUMN.to_string(),
            path: input.to_path_buf(),
        });
    }

    let counted = analysis::parse_counts(records, input)?;

    let (counted, warning) = analysis::drop_missing_phyla(counted);
    if let Some(warning) = warning {
        warn!("{} (lines {:?})", warning, warning.lines);
        warnings.push(warning);
    }

    if counted.is_empty() {
        return Err(SummaryError::NoData {
            column: PHYLUM_COLUMN.to_string(),
            path: input.to_path_buf(),
        });
    }

    let table = analysis::frequency_by_phylum(&counted)?;
    info!(
        "Aggregated {} of {} rows into {} phyla",
        counted.len(),
        raw.len(),
        table.len()
    );

    Ok(Analysis { table, warnings })
}

/// Run the whole pipeline: analyze `input` and write the frequency table,
/// bar chart and pie chart into `output_dir`.
pub fn summarize(
    input: &Path,
    output_dir: &Path,
    renderer: &dyn ChartRenderer,
) -> Result<Summary, SummaryError> {
    let Analysis { table, warnings } = analyze(input)?;

    let bar_chart = BarChart::from_table(&table);
    let pie_chart = PieChart::from_table(&table)?;

    let outputs = Outputs::in_dir(output_dir);

    let table_stage = stage(output_dir, ".csv")?;
    {
        let writer = BufWriter::new(table_stage.as_file());
        write_frequency_csv(&table, writer)?;
    }
    table_stage.as_file().sync_all()?;

    let bar_stage = stage(output_dir, ".png")?;
    renderer
        .render_bar(&bar_chart, bar_stage.path())
        .with_context(|| format!("Failed to render {}", outputs.bar_chart_file.display()))?;

    let pie_stage = stage(output_dir, ".png")?;
    renderer
        .render_pie(&pie_chart, pie_stage.path())
        .with_context(|| format!("Failed to render {}", outputs.pie_chart_file.display()))?;

    commit_all(vec![
        (table_stage, outputs.table_file.as_path()),
        (bar_stage, outputs.bar_chart_file.as_path()),
        (pie_stage, outputs.pie_chart_file.as_path()),
    ])?;

    Ok(Summary {
        table,
        warnings,
        outputs,
    })
}

/// Temporary file in `dir`, removed on drop unless committed.
///
/// The suffix matters: the image encoder picks the format from it.
/// Mode is 0666 minus the umask, like a plain file create (tempfile
/// defaults to 0600).
fn stage(dir: &Path, suffix: &str) -> Result<NamedTempFile, SummaryError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".taxsum-").suffix(suffix);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    Ok(builder.tempfile_in(dir)?)
}

/// Rename every staged file onto its target.
///
/// If one rename fails, targets already renamed in this call are removed
/// and the remaining staged files are dropped, so the output directory
/// ends up with either all artifacts or none of this run's artifacts.
fn commit_all(staged: Vec<(NamedTempFile, &Path)>) -> Result<(), SummaryError> {
    let mut committed: Vec<&Path> = Vec::with_capacity(staged.len());

    for (file, target) in staged {
        if let Err(e) = file.persist(target) {
            warn!("Failed to write {}: {}", target.display(), e.error);
            for done in committed {
                if let Err(cleanup) = std::fs::remove_file(done) {
                    warn!("Failed to remove {}: {}", done.display(), cleanup);
                }
            }
            return Err(e.error.into());
        }
        debug!("Wrote {}", target.display());
        committed.push(target);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::charts::Wedge;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Records what it was asked to draw and writes a placeholder file.
    #[derive(Default)]
    struct RecordingRenderer {
        bars: RefCell<Vec<BarChart>>,
        pies: RefCell<Vec<PieChart>>,
        fail_pie: bool,
    }

    impl ChartRenderer for RecordingRenderer {
        fn render_bar(&self, chart: &BarChart, path: &Path) -> anyhow::Result<()> {
            std::fs::write(path, b"bar")?;
            self.bars.borrow_mut().push(chart.clone());
            Ok(())
        }

        fn render_pie(&self, chart: &PieChart, path: &Path) -> anyhow::Result<()> {
            if self.fail_pie {
                anyhow::bail!("renderer exploded");
            }
            std::fs::write(path, b"pie")?;
            self.pies.borrow_mut().push(chart.clone());
            Ok(())
        }
    }

    fn setup(csv: &str) -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.csv");
        std::fs::write(&input, csv).unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        (dir, input, out)
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    fn read_table(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_scenario_grouped_totals() {
        let (_dir, input, out) = setup(
            "species,phylum,count\n\
             a,Firmicutes,10\n\
             b,Firmicutes,20\n\
             c,Bacteroidetes,5\n",
        );
        let renderer = RecordingRenderer::default();

        let summary = summarize(&input, &out, &renderer).unwrap();

        assert!(summary.warnings.is_empty());
        assert_eq!(summary.outputs.table_file, out.join(TABLE_FILE_NAME));
        assert_eq!(
            read_table(&summary.outputs.table_file),
            vec![
                "phylum,TotalSpeciesCountPerPhylum,MeanSpeciesCountPerPhylum",
                "Firmicutes,30,15.0",
                "Bacteroidetes,5,5.0",
            ]
        );
        assert_eq!(std::fs::read(&summary.outputs.bar_chart_file).unwrap(), b"bar");
        assert_eq!(std::fs::read(&summary.outputs.pie_chart_file).unwrap(), b"pie");

        let bars = renderer.bars.borrow();
        let labels: Vec<&str> = bars[0].bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Firmicutes", "Bacteroidetes"]);

        let pies = renderer.pies.borrow();
        assert_eq!(pies[0].start_angle, 90.0);
        assert_eq!(pies[0].wedges.len(), 2);
        let colors: Vec<(u8, u8, u8)> = pies[0].wedges.iter().map(|w: &Wedge| w.color).collect();
        let bar_colors: Vec<(u8, u8, u8)> = bars[0].bars.iter().map(|b| b.color).collect();
        assert_eq!(colors, bar_colors);
    }

    #[test]
    fn test_scenario_missing_count_is_dropped_with_warning() {
        let (_dir, input, out) = setup("phylum,count\nFirmicutes,\nFirmicutes,10\n");

        let summary = summarize(&input, &out, &RecordingRenderer::default()).unwrap();

        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(summary.warnings[0].column, "count");
        assert_eq!(summary.warnings[0].lines, vec![2]);
        assert_eq!(
            read_table(&summary.outputs.table_file),
            vec![
                "phylum,TotalSpeciesCountPerPhylum,MeanSpeciesCountPerPhylum",
                "Firmicutes,10,10.0",
            ]
        );
    }

    #[test]
    fn test_scenario_fractional_count_aborts() {
        let (_dir, input, out) = setup("phylum,count\nFirmicutes,1.5\n");

        let err = summarize(&input, &out, &RecordingRenderer::default()).unwrap_err();

        assert!(matches!(err, SummaryError::DataType { .. }));
        assert!(err.to_string().contains(&input.display().to_string()));
        assert!(dir_is_empty(&out));
    }

    #[test]
    fn test_text_count_aborts() {
        let (_dir, input, out) = setup("phylum,count\nFirmicutes,abc\nFirmicutes,3\n");

        let err = summarize(&input, &out, &RecordingRenderer::default()).unwrap_err();

        assert!(matches!(err, SummaryError::DataType { .. }));
        assert!(dir_is_empty(&out));
    }

    #[test]
    fn test_scenario_missing_phylum_column_aborts() {
        let (_dir, input, out) = setup("Species,Count\nx,3\n");

        let err = summarize(&input, &out, &RecordingRenderer::default()).unwrap_err();

        match &err {
            SummaryError::Schema { column, .. } => assert_eq!(column, "phylum"),
            other => panic!("expected schema error, got {:?}", other),
        }
        assert!(dir_is_empty(&out));
    }

    #[test]
    fn test_missing_count_column_aborts() {
        let (_dir, input, out) = setup("PHYLUM,reads\nFirmicutes,3\n");

        let err = summarize(&input, &out, &RecordingRenderer::default()).unwrap_err();

        match &err {
            SummaryError::Schema { column, .. } => assert_eq!(column, "count"),
            other => panic!("expected schema error, got {:?}", other),
        }
        assert!(dir_is_empty(&out));
    }

    #[test]
    fn test_mixed_case_headers_are_accepted() {
        let (_dir, input, out) = setup("PhYlUm,COUNT,Other\nA,2,x\nA,4,y\n");

        let summary = summarize(&input, &out, &RecordingRenderer::default()).unwrap();

        assert_eq!(summary.table.get("A").map(|r| r.total_count), Some(6));
        assert_eq!(summary.table.get("A").map(|r| r.mean_count), Some(3.0));
    }

    #[test]
    fn test_float_column_with_nulls_passes() {
        let (_dir, input, out) = setup("phylum,count\nA,10.0\nA,NaN\nB,3.0\n");

        let summary = summarize(&input, &out, &RecordingRenderer::default()).unwrap();

        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(summary.table.get("A").map(|r| r.total_count), Some(10));
        assert_eq!(summary.table.get("B").map(|r| r.total_count), Some(3));
    }

    #[test]
    fn test_all_counts_missing_is_no_data() {
        let (_dir, input, out) = setup("phylum,count\nA,\nB,NA\n");

        let err = summarize(&input, &out, &RecordingRenderer::default()).unwrap_err();

        assert!(matches!(err, SummaryError::NoData { .. }));
        assert!(dir_is_empty(&out));
    }

    #[test]
    fn test_all_phyla_missing_is_no_data_for_phylum() {
        let (_dir, input, out) = setup("phylum,count\n,3\nNA,4\n");

        let err = summarize(&input, &out, &RecordingRenderer::default()).unwrap_err();

        match &err {
            SummaryError::NoData { column, .. } => assert_eq!(column, "phylum"),
            other => panic!("expected no-data error, got {:?}", other),
        }
        assert!(dir_is_empty(&out));
    }

    #[test]
    fn test_all_counts_missing_names_count_column() {
        let (_dir, input, out) = setup("phylum,count\nA,\nB,null\n");

        match summarize(&input, &out, &RecordingRenderer::default()).unwrap_err() {
            SummaryError::NoData { column, .. } => assert_eq!(column, "count"),
            other => panic!("expected no-data error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_phylum_rows_are_excluded() {
        let (_dir, input, out) = setup("phylum,count\nA,1\n,7\nA,3\n");

        let summary = summarize(&input, &out, &RecordingRenderer::default()).unwrap();

        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(summary.warnings[0].column, "phylum");
        assert_eq!(summary.table.len(), 1);
        assert_eq!(summary.table.get("A").map(|r| r.total_count), Some(4));
    }

    #[test]
    fn test_render_failure_leaves_no_outputs() {
        let (_dir, input, out) = setup("phylum,count\nA,1\nB,2\n");
        let renderer = RecordingRenderer {
            fail_pie: true,
            ..Default::default()
        };

        let err = summarize(&input, &out, &renderer).unwrap_err();

        assert!(matches!(err, SummaryError::Render(_)));
        assert!(dir_is_empty(&out));
    }

    #[test]
    fn test_negative_totals_abort_before_writing() {
        let (_dir, input, out) = setup("phylum,count\nA,5\nB,-9\n");

        let err = summarize(&input, &out, &RecordingRenderer::default()).unwrap_err();

        assert!(matches!(err, SummaryError::Chart(_)));
        assert!(dir_is_empty(&out));
    }

    #[test]
    fn test_rerun_overwrites_outputs() {
        let (_dir, input, out) = setup("phylum,count\nA,1\n");
        let renderer = RecordingRenderer::default();

        summarize(&input, &out, &renderer).unwrap();
        std::fs::write(&input, "phylum,count\nB,2\n").unwrap();
        let summary = summarize(&input, &out, &renderer).unwrap();

        assert_eq!(
            read_table(&summary.outputs.table_file)[1],
            "B,2,2.0"
        );
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 3);
    }

    #[test]
    fn test_failed_commit_removes_earlier_outputs() {
        let (_dir, input, out) = setup("phylum,count\nA,1\nB,2\n");
        // a directory in the way makes the last rename fail
        std::fs::create_dir(out.join(PIE_CHART_FILE_NAME)).unwrap();

        let err = summarize(&input, &out, &RecordingRenderer::default()).unwrap_err();

        assert!(matches!(err, SummaryError::Io(_)));
        assert!(!out.join(TABLE_FILE_NAME).exists());
        assert!(!out.join(BAR_CHART_FILE_NAME).exists());
        let leftovers: Vec<String> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(leftovers, vec![PIE_CHART_FILE_NAME.to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_outputs_get_regular_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, input, out) = setup("phylum,count\nA,1\n");
        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;

        let plain = out.join("plain.txt");
        std::fs::File::create(&plain).unwrap();
        let expected = mode(&plain);
        std::fs::remove_file(&plain).unwrap();

        let summary = summarize(&input, &out, &RecordingRenderer::default()).unwrap();

        assert_eq!(mode(&summary.outputs.table_file), expected);
        assert_eq!(mode(&summary.outputs.bar_chart_file), expected);
        assert_eq!(mode(&summary.outputs.pie_chart_file), expected);
    }

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
    }

    #[test]
    fn test_sample_fixture() {
        let out = TempDir::new().unwrap();

        let summary =
            summarize(&fixture("phylum_counts.csv"), out.path(), &RecordingRenderer::default())
                .unwrap();

        let order: Vec<&str> = summary.table.rows.iter().map(|r| r.phylum.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "Firmicutes",
                "Bacteroidetes",
                "Proteobacteria",
                "Actinobacteria",
                "Verrucomicrobia",
            ]
        );
        let firmicutes = summary.table.get("Firmicutes").unwrap();
        assert_eq!(firmicutes.total_count, 312);
        assert_eq!(firmicutes.mean_count, 156.0);
        assert_eq!(summary.warnings[0].lines, vec![7]);
    }

    #[test]
    fn test_bad_fixtures_abort() {
        let out = TempDir::new().unwrap();
        let renderer = RecordingRenderer::default();

        let err = summarize(&fixture("fractional_counts.csv"), out.path(), &renderer).unwrap_err();
        assert!(matches!(err, SummaryError::DataType { line: 3, .. }));

        let err = summarize(&fixture("no_phylum.csv"), out.path(), &renderer).unwrap_err();
        assert!(matches!(err, SummaryError::Schema { .. }));

        assert!(dir_is_empty(out.path()));
    }

    #[test]
    fn test_analyze_writes_nothing() {
        let (_dir, input, out) = setup("phylum,count\nA,1\n");
        let analysis = analyze(&input).unwrap();
        assert_eq!(analysis.table.len(), 1);
        assert!(dir_is_empty(&out));
    }
}
