//! Write a synthetic NMOS operating-point table for trying out the viewer.
//!
//! The devices follow a long-channel square-law model with body effect,
//! channel-length modulation and an exponential subthreshold region. The
//! sweep covers W × L × VGS × VDS × VSB; `--vgs-steps 75 --vds-steps 50`
//! gives 900,000 rows.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

use op_explorer::data::units::format_si;

#[derive(Parser, Debug)]
#[command(about = "Generate a synthetic operating-point table", long_about = None)]
struct Args {
    /// Output file (.csv or .parquet)
    #[arg(default_value = "sample_lut.parquet")]
    out: PathBuf,
    #[arg(long, default_value_t = 30)]
    vgs_steps: usize,
    #[arg(long, default_value_t = 20)]
    vds_steps: usize,
}

const KP: f64 = 300e-6; // µn·Cox, A/V²
const COX: f64 = 8.6e-3; // F/m²
const VTH0: f64 = 0.45;
const GAMMA: f64 = 0.4;
const PHI2: f64 = 0.7;
const N_SUB: f64 = 1.3;
const UT: f64 = 0.0259;
const LAMBDA_L: f64 = 0.08e-6; // λ·L, m/V

const WIDTHS: [f64; 8] = [0.5e-6, 1e-6, 2e-6, 4e-6, 8e-6, 16e-6, 32e-6, 64e-6];
const LENGTHS: [f64; 6] = [0.18e-6, 0.35e-6, 0.5e-6, 1e-6, 2e-6, 4e-6];
const VSBS: [f64; 5] = [0.0, 0.1, 0.25, 0.35, 0.5];

#[derive(Debug, Default)]
struct Rows {
    w: Vec<f64>,
    l: Vec<f64>,
    vgs: Vec<f64>,
    vds: Vec<f64>,
    vsb: Vec<f64>,
    id: Vec<f64>,
    gm: Vec<f64>,
    gmb: Vec<f64>,
    rout: Vec<f64>,
    cgg: Vec<f64>,
    region: Vec<i64>,
}

/// Operating point of one device: (id, gm, gmb, rout, cgg, region).
fn operating_point(w: f64, l: f64, vgs: f64, vds: f64, vsb: f64) -> (f64, f64, f64, f64, f64, i64) {
    let beta = KP * w / l;
    let lambda = LAMBDA_L / l;
    let vth = VTH0 + GAMMA * ((PHI2 + vsb).sqrt() - PHI2.sqrt());
    let vov = vgs - vth;
    let clm = 1.0 + lambda * vds;
    let cgate = COX * w * l;

    let (id, gm, gds, cgg, region) = if vov <= 2.0 * N_SUB * UT {
        // Weak inversion, matched to the square law at 2·n·Ut.
        let i0 = 0.5 * beta * (2.0 * N_SUB * UT).powi(2);
        let id = i0 * ((vov - 2.0 * N_SUB * UT) / (N_SUB * UT)).exp()
            * (1.0 - (-vds / UT).exp())
            * clm;
        (id, id / (N_SUB * UT), lambda * id / clm, 0.3 * cgate, 0)
    } else if vds < vov {
        let id = beta * (vov * vds - 0.5 * vds * vds) * clm;
        let gds = beta * (vov - vds) * clm + lambda * id / clm;
        (id, beta * vds * clm, gds, cgate, 1)
    } else {
        let id = 0.5 * beta * vov * vov * clm;
        (id, 2.0 * id / vov, lambda * id / clm, 2.0 / 3.0 * cgate, 2)
    };

    let gmb = gm * GAMMA / (2.0 * (PHI2 + vsb).sqrt());
    (id, gm, gmb, 1.0 / gds, cgg, region)
}

fn sweep(args: &Args) -> Result<Rows> {
    if args.vgs_steps < 2 || args.vds_steps < 2 {
        bail!("need at least two VGS and VDS steps");
    }
    let step = |n: usize, i: usize, hi: f64| 0.05 + (hi - 0.05) * i as f64 / (n - 1) as f64;

    let mut rows = Rows::default();
    for &w in &WIDTHS {
        for &l in &LENGTHS {
            for i in 0..args.vgs_steps {
                let vgs = step(args.vgs_steps, i, 1.8);
                for j in 0..args.vds_steps {
                    let vds = step(args.vds_steps, j, 1.8);
                    for &vsb in &VSBS {
                        let (id, gm, gmb, rout, cgg, region) = operating_point(w, l, vgs, vds, vsb);
                        rows.w.push(w);
                        rows.l.push(l);
                        rows.vgs.push(vgs);
                        rows.vds.push(vds);
                        rows.vsb.push(vsb);
                        rows.id.push(id);
                        rows.gm.push(gm);
                        rows.gmb.push(gmb);
                        rows.rout.push(rout);
                        rows.cgg.push(cgg);
                        rows.region.push(region);
                    }
                }
            }
        }
    }
    Ok(rows)
}

const HEADERS: [&str; 11] = [
    "W", "L", "VGS", "VDS", "VSB", "id", "gm", "gmb", "rout", "cgg", "region",
];

/// CSV with `W` and `L` written with SI prefixes, as simulator LUTs often are.
fn write_csv(path: &Path, rows: &Rows) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(HEADERS)?;
    for i in 0..rows.w.len() {
        writer.write_record([
            format_si(rows.w[i]),
            format_si(rows.l[i]),
            rows.vgs[i].to_string(),
            rows.vds[i].to_string(),
            rows.vsb[i].to_string(),
            rows.id[i].to_string(),
            rows.gm[i].to_string(),
            rows.gmb[i].to_string(),
            rows.rout[i].to_string(),
            rows.cgg[i].to_string(),
            rows.region[i].to_string(),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &Path, rows: Rows) -> Result<()> {
    let mut fields: Vec<Field> = HEADERS[..10]
        .iter()
        .map(|name| Field::new(*name, DataType::Float64, false))
        .collect();
    fields.push(Field::new("region", DataType::Int64, false));
    let schema = Arc::new(Schema::new(fields));

    let float = |v: Vec<f64>| Arc::new(Float64Array::from(v)) as ArrayRef;
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            float(rows.w),
            float(rows.l),
            float(rows.vgs),
            float(rows.vds),
            float(rows.vsb),
            float(rows.id),
            float(rows.gm),
            float(rows.gmb),
            float(rows.rout),
            float(rows.cgg),
            Arc::new(Int64Array::from(rows.region)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let rows = sweep(&args)?;
    let n = rows.w.len();

    match args.out.extension().and_then(|e| e.to_str()) {
        Some("csv") => write_csv(&args.out, &rows)?,
        Some("parquet") | Some("pq") => write_parquet(&args.out, rows)?,
        _ => bail!("output must end in .csv or .parquet"),
    }

    println!("Wrote {n} operating points to {}", args.out.display());
    Ok(())
}
