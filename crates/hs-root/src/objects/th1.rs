//! TH1D and TH1F streamer codec.
//!
//! Layout (simplified):
//! ```text
//! TH1D (or TH1F)
//!   └─ TH1 (base)
//!        ├─ TNamed (name, title)
//!        ├─ TAttLine, TAttFill, TAttMarker (skipped via byte count)
//!        ├─ fNcells (i32)
//!        ├─ fXaxis, fYaxis, fZaxis (TAxis)
//!        ├─ fBarOffset, fBarWidth, fEntries, fTsumw, fTsumw2, fTsumwx, fTsumwx2
//!        ├─ fMaximum, fMinimum (v >= 2), fNormFactor (v >= 3)
//!        ├─ fContour (TArrayD)
//!        ├─ fSumw2 (TArrayD)
//!        ├─ fOption (TString)
//!        ├─ fFunctions (TList, skipped via byte count)
//!        ├─ fBufferSize (v >= 4)
//!        └─ fBinStatErrOpt (v >= 7), fStatOverflows (v >= 8)
//!   └─ TArrayD / TArrayF (packed contents, n = fNcells)
//! ```

use crate::error::{Result, RootError};
use crate::histogram::{RootHistogram, Th1Kind};
use crate::rbuffer::{RBuffer, WBuffer};

const TH1D_VERSION: u16 = 3;
const TH1F_VERSION: u16 = 3;
const TH1_VERSION: u16 = 8;
const TAXIS_VERSION: u16 = 10;
const TATTAXIS_VERSION: u16 = 4;
const TATT_VERSION: u16 = 2;
const TLIST_VERSION: u16 = 5;

/// Edge tolerance under which an axis is written as uniform.
const UNIFORM_RTOL: f64 = 1e-12;

/// Decode a `TH1D`/`TH1F` payload.
pub fn read_th1(data: &[u8], kind: Th1Kind) -> Result<RootHistogram> {
    let mut r = RBuffer::new(data);

    let (ver, end) = r.read_version()?;
    if ver < 1 {
        return Err(RootError::Deserialization(format!(
            "unsupported {} version: {}",
            kind.class_name(),
            ver
        )));
    }

    let base = read_th1_base(&mut r)?;

    let arr_n = r.read_u32()? as usize;
    if arr_n != base.n_cells {
        return Err(RootError::Deserialization(format!(
            "{} array size {} != fNcells {}",
            kind.class_name(),
            arr_n,
            base.n_cells
        )));
    }
    let cells = match kind {
        Th1Kind::Double => r.read_array_f64(arr_n)?,
        Th1Kind::Float => r.read_array_f32(arr_n)?,
    };
    r.finish_object(end)?;

    let bin_edges = base.axis.edges()?;
    let sumw2 = match base.sumw2 {
        Some(sw2) if sw2.len() != base.n_cells => {
            return Err(RootError::Deserialization(format!(
                "fSumw2 size {} != fNcells {}",
                sw2.len(),
                base.n_cells
            )));
        }
        other => other,
    };

    log::debug!(
        "decoded {} '{}': {} bins, sumw2 {}",
        kind.class_name(),
        base.name,
        base.axis.n_bins,
        if sumw2.is_some() { "stored" } else { "absent" }
    );

    let mut h = RootHistogram::new(base.name, kind, bin_edges, cells, sumw2)?.with_title(base.title);
    h.entries = base.entries;
    Ok(h)
}

/// Encode a histogram as a `TH1D`/`TH1F` payload.
pub fn write_th1(h: &RootHistogram) -> Vec<u8> {
    let mut w = WBuffer::new();
    let version = match h.kind {
        Th1Kind::Double => TH1D_VERSION,
        Th1Kind::Float => TH1F_VERSION,
    };
    let start = w.begin_object(version);
    write_th1_base(&mut w, h);
    w.write_u32(h.cells.len() as u32);
    match h.kind {
        Th1Kind::Double => w.write_array_f64(&h.cells),
        Th1Kind::Float => w.write_array_f32(&h.cells),
    }
    w.end_object(start);
    w.into_inner()
}

// ── TH1 base ──────────────────────────────────────────────────────

struct Th1Base {
    name: String,
    title: String,
    n_cells: usize,
    axis: AxisInfo,
    entries: f64,
    sumw2: Option<Vec<f64>>,
}

fn read_th1_base(r: &mut RBuffer) -> Result<Th1Base> {
    let (th1_ver, th1_end) = r.read_version()?;

    let (name, title) = r.read_tnamed()?;
    r.skip_object()?; // TAttLine
    r.skip_object()?; // TAttFill
    r.skip_object()?; // TAttMarker

    let n_cells = r.read_i32()?;
    let axis = read_taxis(r)?;
    if n_cells < 0 || n_cells as i64 != axis.n_bins as i64 + 2 {
        return Err(RootError::Deserialization(format!(
            "fNcells {} inconsistent with {} x-axis bins",
            n_cells, axis.n_bins
        )));
    }
    r.skip_object()?; // fYaxis
    r.skip_object()?; // fZaxis

    let _bar_offset = r.read_i16()?;
    let _bar_width = r.read_i16()?;
    let entries = r.read_f64()?;
    let _tsumw = r.read_f64()?;
    let _tsumw2 = r.read_f64()?;
    let _tsumwx = r.read_f64()?;
    let _tsumwx2 = r.read_f64()?;
    if th1_ver >= 2 {
        let _max = r.read_f64()?;
        let _min = r.read_f64()?;
    }
    if th1_ver >= 3 {
        let _norm = r.read_f64()?;
    }

    let contour_n = r.read_u32()? as usize;
    r.skip(contour_n.saturating_mul(8))?;

    let sumw2 = r.read_tarray_f64()?;
    let sumw2 = if sumw2.is_empty() { None } else { Some(sumw2) };

    let _option = r.read_string()?;
    r.skip_object()?; // fFunctions

    if th1_ver >= 4 {
        let buf_size = r.read_i32()?;
        if buf_size > 0 {
            r.skip(buf_size as usize * 8)?;
        }
    }
    if th1_ver >= 7 {
        let _err_opt = r.read_i32()?;
    }
    if th1_ver >= 8 {
        let _stat_overflows = r.read_i32()?;
    }
    r.finish_object(th1_end)?;

    Ok(Th1Base { name, title, n_cells: n_cells as usize, axis, entries, sumw2 })
}

fn write_th1_base(w: &mut WBuffer, h: &RootHistogram) {
    let start = w.begin_object(TH1_VERSION);
    w.write_tnamed(&h.name, &h.title);
    write_att(w, |w| {
        w.write_i16(602); // line color
        w.write_i16(1);
        w.write_i16(1);
    });
    write_att(w, |w| {
        w.write_i16(0); // fill color
        w.write_i16(1001);
    });
    write_att(w, |w| {
        w.write_i16(1); // marker color
        w.write_i16(1);
        w.write_f32(1.0);
    });

    w.write_i32(h.cells.len() as i32);
    write_taxis(w, "xaxis", &h.bin_edges);
    write_taxis(w, "yaxis", &[0.0, 1.0]);
    write_taxis(w, "zaxis", &[0.0, 1.0]);

    let stats = Stats::of(h);
    w.write_i16(0);
    w.write_i16(1000);
    w.write_f64(h.entries);
    w.write_f64(stats.sumw);
    w.write_f64(stats.sumw2);
    w.write_f64(stats.sumwx);
    w.write_f64(stats.sumwx2);
    w.write_f64(-1111.0); // fMaximum unset
    w.write_f64(-1111.0); // fMinimum unset
    w.write_f64(0.0);

    w.write_tarray_f64(&[]); // fContour
    w.write_tarray_f64(h.sumw2.as_deref().unwrap_or(&[]));
    w.write_string(""); // fOption

    let list = w.begin_object(TLIST_VERSION);
    w.write_tobject();
    w.write_string("");
    w.write_i32(0);
    w.end_object(list);

    w.write_i32(0); // fBufferSize
    w.write_i32(0); // fBinStatErrOpt
    w.write_i32(2); // fStatOverflows
    w.end_object(start);
}

fn write_att(w: &mut WBuffer, body: impl FnOnce(&mut WBuffer)) {
    let start = w.begin_object(TATT_VERSION);
    body(w);
    w.end_object(start);
}

/// Statistics block over the regular bins.
struct Stats {
    sumw: f64,
    sumw2: f64,
    sumwx: f64,
    sumwx2: f64,
}

impl Stats {
    fn of(h: &RootHistogram) -> Self {
        let n = h.n_bins();
        let variances = h.cell_variances();
        let mut s = Stats { sumw: 0.0, sumw2: 0.0, sumwx: 0.0, sumwx2: 0.0 };
        for i in 0..n {
            let w = h.cells[i + 1];
            let x = 0.5 * (h.bin_edges[i] + h.bin_edges[i + 1]);
            s.sumw += w;
            s.sumw2 += variances[i + 1];
            s.sumwx += w * x;
            s.sumwx2 += w * x * x;
        }
        s
    }
}

// ── TAxis ─────────────────────────────────────────────────────────

struct AxisInfo {
    n_bins: i32,
    x_min: f64,
    x_max: f64,
    /// Variable-width bin edges (empty for uniform binning).
    bin_edges: Vec<f64>,
}

impl AxisInfo {
    fn edges(&self) -> Result<Vec<f64>> {
        let n = self.n_bins as usize;
        if self.n_bins < 1 {
            return Err(RootError::Deserialization(format!("axis with {} bins", self.n_bins)));
        }
        if !self.bin_edges.is_empty() {
            if self.bin_edges.len() != n + 1 {
                return Err(RootError::Deserialization(format!(
                    "fXbins has {} edges for {} bins",
                    self.bin_edges.len(),
                    n
                )));
            }
            return Ok(self.bin_edges.clone());
        }
        let width = (self.x_max - self.x_min) / n as f64;
        Ok((0..=n)
            .map(|i| if i == n { self.x_max } else { self.x_min + i as f64 * width })
            .collect())
    }
}

fn read_taxis(r: &mut RBuffer) -> Result<AxisInfo> {
    let (_ver, end) = r.read_version()?;
    r.read_tnamed()?;
    r.skip_object()?; // TAttAxis
    let n_bins = r.read_i32()?;
    let x_min = r.read_f64()?;
    let x_max = r.read_f64()?;
    let bin_edges = r.read_tarray_f64()?;
    // fFirst, fLast, fBits2, fTimeDisplay, fTimeFormat, fLabels, fModLabs
    r.finish_object(end)?;
    Ok(AxisInfo { n_bins, x_min, x_max, bin_edges })
}

fn write_taxis(w: &mut WBuffer, name: &str, edges: &[f64]) {
    let n = edges.len() - 1;
    let (x_min, x_max) = (edges[0], edges[n]);

    let start = w.begin_object(TAXIS_VERSION);
    w.write_tnamed(name, "");

    let att = w.begin_object(TATTAXIS_VERSION);
    w.write_i32(510); // fNdivisions
    w.write_i16(1); // fAxisColor
    w.write_i16(1); // fLabelColor
    w.write_i16(42); // fLabelFont
    w.write_f32(0.005); // fLabelOffset
    w.write_f32(0.035); // fLabelSize
    w.write_f32(0.03); // fTickLength
    w.write_f32(1.0); // fTitleOffset
    w.write_f32(0.035); // fTitleSize
    w.write_i16(1); // fTitleColor
    w.write_i16(42); // fTitleFont
    w.end_object(att);

    w.write_i32(n as i32);
    w.write_f64(x_min);
    w.write_f64(x_max);
    if is_uniform(edges) {
        w.write_tarray_f64(&[]);
    } else {
        w.write_tarray_f64(edges);
    }
    w.write_i32(0); // fFirst
    w.write_i32(0); // fLast
    w.write_u16(0); // fBits2
    w.write_u8(0); // fTimeDisplay
    w.write_string(""); // fTimeFormat
    w.write_u32(0); // fLabels (null)
    w.write_u32(0); // fModLabs (null)
    w.end_object(start);
}

fn is_uniform(edges: &[f64]) -> bool {
    let n = edges.len() - 1;
    let width = (edges[n] - edges[0]) / n as f64;
    edges.iter().enumerate().all(|(i, &e)| {
        let expected = edges[0] + i as f64 * width;
        (e - expected).abs() <= UNIFORM_RTOL * width.abs().max(e.abs())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: Th1Kind, edges: Vec<f64>) -> RootHistogram {
        let n = edges.len() - 1;
        let cells: Vec<f64> = (0..n + 2).map(|i| i as f64 * 1.5).collect();
        let sumw2: Vec<f64> = cells.iter().map(|c| c * 2.0).collect();
        RootHistogram::new("sample", kind, edges, cells, Some(sumw2)).unwrap().with_title("A sample")
    }

    #[test]
    fn th1d_round_trip_variable_edges() {
        let h = sample(Th1Kind::Double, vec![0.0, 1.0, 2.0, 3.0, 5.0]);
        let back = read_th1(&write_th1(&h), Th1Kind::Double).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn th1f_round_trip_narrows_contents() {
        let mut h = sample(Th1Kind::Float, vec![0.0, 0.5, 1.0]);
        h.cells[1] = 0.1;
        let back = read_th1(&write_th1(&h), Th1Kind::Float).unwrap();
        assert_eq!(back.cells[1], 0.1f32 as f64);
        assert_eq!(back.sumw2, h.sumw2);
        assert_eq!(back.title, "A sample");
    }

    #[test]
    fn uniform_axis_is_reconstructed() {
        let edges: Vec<f64> = (0..=10).map(|i| i as f64 * 0.1).collect();
        assert!(is_uniform(&edges));
        let h = sample(Th1Kind::Double, edges.clone());
        let back = read_th1(&write_th1(&h), Th1Kind::Double).unwrap();
        assert_eq!(back.bin_edges.len(), 11);
        for (got, want) in back.bin_edges.iter().zip(&edges) {
            assert!((got - want).abs() < 1e-12, "{} vs {}", got, want);
        }
        assert_eq!(back.bin_edges[10], 1.0);
    }

    #[test]
    fn missing_sumw2_round_trips_as_none() {
        let mut h = sample(Th1Kind::Double, vec![0.0, 1.0]);
        h.sumw2 = None;
        let back = read_th1(&write_th1(&h), Th1Kind::Double).unwrap();
        assert!(back.sumw2.is_none());
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let bytes = write_th1(&sample(Th1Kind::Double, vec![0.0, 1.0, 2.0]));
        for cut in [0, 4, bytes.len() / 2, bytes.len() - 1] {
            assert!(read_th1(&bytes[..cut], Th1Kind::Double).is_err(), "cut at {}", cut);
        }
    }

    #[test]
    fn float_payload_read_as_double_fails() {
        let bytes = write_th1(&sample(Th1Kind::Float, vec![0.0, 1.0, 2.0]));
        assert!(read_th1(&bytes, Th1Kind::Double).is_err());
    }
}
