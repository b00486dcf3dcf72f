//! Result-file writer: metadata header plus one fixed-width row per
//! completed averaging window.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use eyre::WrapErr;

use crate::config::SampleInfo;
use crate::error::Result;
use crate::results::ResultRow;

const RULE: &str = "============================================================";
const COLUMNS: &str =
    "  Time(s)  |   Temp(K)   |  Vref(V)  |  Vsig_x(mV)  |  Vsig_y(mV)  |  Res(Ohm)";

/// Writes the result log file. The header is written once at creation; rows
/// are appended as windows complete.
pub struct ResultWriter {
    path: PathBuf,
}

impl ResultWriter {
    /// Create (or truncate) the file at `path` and write the header block.
    pub fn create(path: impl AsRef<Path>, info: &SampleInfo) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = std::fs::File::create(&path)
            .wrap_err_with(|| format!("create result file {}", path.display()))?;
        let started = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        write!(
            file,
            "Resistivity Measurement: {started}\n\
             {RULE}\n\
             Sample Name: {sample}\n\
             User: {user}\n\
             Material: {material}\n\
             Reference Resistor (Ohm): {rr:.1}\n\
             Amplification: {amp:.1}\n\
             {RULE}\n\
             {COLUMNS}\n\
             {RULE}\n",
            sample = info.sample,
            user = info.user,
            material = info.material,
            rr = info.reference_resistor_ohm,
            amp = info.amplification,
        )
        .wrap_err("write result file header")?;
        Ok(Self { path })
    }

    /// Append one data row. The file is reopened per row so a crash never
    /// loses more than the row being written.
    pub fn append_row(&self, row: &ResultRow) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .wrap_err_with(|| format!("open result file {}", self.path.display()))?;
        writeln!(file, "{}", format_row(row)).wrap_err("append result row")?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One fixed-width, pipe-delimited row; signal columns in millivolts.
pub fn format_row(row: &ResultRow) -> String {
    let r = &row.record;
    format!(
        "  {:.5}  |  {:.5}  |  {:.5}  |  {:.5}  |  {:.5}  |  {:.5}",
        r.elapsed_ms as f64 / 1000.0,
        r.temperature_k,
        r.reference_v,
        r.signal.in_phase_v * 1.0e3,
        r.signal.quadrature_v * 1.0e3,
        row.resistance_ohm,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::AveragedRecord;
    use cryostat_traits::Signal;

    fn row() -> ResultRow {
        ResultRow {
            record: AveragedRecord {
                elapsed_ms: 12_500,
                temperature_k: 250.123,
                signal: Signal::new(0.005, 0.001),
                reference_v: 1.02,
            },
            resistance_ohm: 49.0196,
        }
    }

    #[test]
    fn row_has_six_pipe_delimited_numeric_fields() {
        let line = format_row(&row());
        let fields: Vec<&str> = line.split('|').collect();
        assert_eq!(fields.len(), 6);
        for field in &fields {
            field.trim().parse::<f64>().expect("numeric field");
        }
        assert!(line.starts_with("  12.50000  |"));
        // Signal columns are rendered in mV.
        assert!(fields[3].trim().starts_with("5.0"));
    }

    #[test]
    fn header_then_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Sample_001.txt");
        let info = SampleInfo {
            sample: "NbSe2 flake".into(),
            user: "rt".into(),
            material: "NbSe2".into(),
            ..SampleInfo::default()
        };
        let writer = ResultWriter::create(&path, &info).expect("create");
        writer.append_row(&row()).expect("append");
        writer.append_row(&row()).expect("append");

        let text = std::fs::read_to_string(&path).expect("read back");
        assert!(text.contains("Sample Name: NbSe2 flake"));
        assert!(text.contains("User: rt"));
        assert!(text.contains("Time(s)"));
        let data_lines = text
            .lines()
            .filter(|l| l.starts_with("  ") && l.contains('|') && !l.contains("Time"))
            .count();
        assert_eq!(data_lines, 2);
    }
}
