//! Plain-text output of pipeline results, tab separated.

use std::io::Write;

use anyhow::{bail, Result};

use crate::data::model::{Derived, DerivedResult};

fn tsv_writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_writer(out)
}

/// One line per trace: `name [param] mean [unit_y]`.
///
/// Numbers use Rust's shortest round-trip form, so a mean of two prints as `2`, not `2.0`.
pub fn write_means<W: Write>(out: W, results: &[DerivedResult], with_unit: bool) -> Result<()> {
    let mut wtr = tsv_writer(out);
    for result in results {
        let Derived::Mean { value, param } = &result.value else {
            bail!("{}: not a mean result", result.name);
        };
        let mut row = vec![result.name.clone()];
        if let Some(param) = param {
            row.push(param.to_string());
        }
        row.push(value.to_string());
        if with_unit {
            row.push(result.unit_y.clone());
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// One block per trace: a `# name` line, then `x y` rows over the overlap of
/// axis and samples.
pub fn write_curves<W: Write>(out: W, results: &[DerivedResult]) -> Result<()> {
    let mut wtr = tsv_writer(out);
    for result in results {
        let Derived::Curve { x, y } = &result.value else {
            bail!("{}: not a curve result", result.name);
        };
        wtr.write_record([format!("# {} [{}] [{}]", result.name, result.unit_x, result.unit_y)])?;
        for (xi, yi) in x.iter().zip(y) {
            wtr.write_record([xi.to_string(), yi.to_string()])?;
        }
    }
    wtr.flush()?;
    Ok(())
}
