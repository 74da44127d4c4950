use std::path::PathBuf;

use anyhow::Context;
use rust_xlsxwriter::Workbook;

/// Deterministic PRNG (splitmix64), enough to jitter demo intensities.
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        SimpleRng { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> anyhow::Result<()> {
    let out_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| ".".to_string()));
    std::fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    // (Sample ID, replicates)
    let groups = [("Control", 4), ("Drought", 4), ("Heat", 3)];
    // (compound, mean area ratio per group)
    let compounds = [
        ("Abscisic acid", [0.8, 2.4, 1.6]),
        ("Jasmonic acid", [1.2, 1.5, 3.1]),
        ("Salicylic acid", [0.4, 0.9, 0.7]),
    ];

    let mut files = Vec::new();
    for (sample_id, replicates) in groups {
        for rep in 1..=replicates {
            let filename = format!("{}_{rep:02}.raw", sample_id.to_lowercase());
            let dry_weight = rng.gauss(12.0, 2.0).max(4.0);
            files.push((filename, sample_id, dry_weight));
        }
    }

    let mut workbook = Workbook::new();
    let component = workbook.add_worksheet();
    component.set_name("Component")?;
    component.write_string(0, 0, "Component")?;
    component.write_string(0, 1, "Internal standard")?;
    for (row, (name, _)) in compounds.iter().enumerate() {
        component.write_string(row as u32 + 1, 0, *name)?;
        component.write_string(row as u32 + 1, 1, "d6-ABA")?;
    }

    for (name, means) in &compounds {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name)?;
        sheet.write_string(0, 0, format!("Component Name: {name}"))?;
        sheet.write_string(1, 0, "Quan method: hormones_v3")?;
        for (col, header) in ["Filename", "Sample ID", "Area", "ISTD Area", "Area Ratio"].iter().enumerate() {
            sheet.write_string(3, col as u16, *header)?;
        }

        for (i, (filename, sample_id, _)) in files.iter().enumerate() {
            let row = i as u32 + 4;
            let group = groups.iter().position(|(g, _)| g == sample_id).unwrap_or(0);
            let istd_area = rng.gauss(50_000.0, 4_000.0).max(1_000.0);
            sheet.write_string(row, 0, filename)?;
            sheet.write_string(row, 1, *sample_id)?;
            sheet.write_number(row, 3, istd_area)?;
            // One not-found peak per compound
            if i == 2 {
                sheet.write_string(row, 2, "NF")?;
                sheet.write_string(row, 4, "NF")?;
                continue;
            }
            let ratio = rng.gauss(means[group], means[group] * 0.15).max(0.01);
            sheet.write_number(row, 2, ratio * istd_area)?;
            sheet.write_number(row, 4, ratio)?;
        }
    }

    let report_path = out_dir.join("sample_report.xlsx");
    workbook
        .save(&report_path)
        .with_context(|| format!("writing {}", report_path.display()))?;

    let weights_path = out_dir.join("sample_weights.csv");
    let mut writer = csv::Writer::from_path(&weights_path)
        .with_context(|| format!("writing {}", weights_path.display()))?;
    writer.write_record(["Filename", "Sample wt"])?;
    for (filename, _, dry_weight) in &files {
        let dry_weight = format!("{dry_weight:.2}");
        writer.write_record([filename.as_str(), dry_weight.as_str()])?;
    }
    writer.flush()?;

    println!(
        "Wrote {} compounds x {} files to {} and {}",
        compounds.len(),
        files.len(),
        report_path.display(),
        weights_path.display()
    );
    Ok(())
}
