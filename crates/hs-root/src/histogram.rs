//! ROOT `TH1` histogram object and its adapter onto [`hs_core`].

use hs_core::{BinArrays, ContentLayout, ExternalHistogram, FlowBin};

use crate::error::{Result, RootError};

/// Storage precision of a 1D ROOT histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Th1Kind {
    /// `TH1D`: f64 contents.
    #[default]
    Double,
    /// `TH1F`: f32 contents.
    Float,
}

impl Th1Kind {
    /// ROOT class name.
    pub fn class_name(self) -> &'static str {
        match self {
            Th1Kind::Double => "TH1D",
            Th1Kind::Float => "TH1F",
        }
    }

    /// Parse a ROOT class name.
    pub fn from_class_name(class_name: &str) -> Result<Self> {
        match class_name {
            "TH1D" => Ok(Th1Kind::Double),
            "TH1F" => Ok(Th1Kind::Float),
            _ => Err(RootError::UnsupportedClass(class_name.to_string())),
        }
    }
}

/// A 1D ROOT histogram in its native packed layout.
///
/// `cells` (and `sumw2`, when stored) hold `n_bins + 2` entries:
/// `[underflow, bin 1, ..., bin N, overflow]`. The packing is checked by
/// [`RootHistogram::new`] and cannot be broken afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RootHistogram {
    pub(crate) name: String,
    pub(crate) title: String,
    pub(crate) kind: Th1Kind,
    pub(crate) bin_edges: Vec<f64>,
    pub(crate) cells: Vec<f64>,
    pub(crate) sumw2: Option<Vec<f64>>,
    pub(crate) entries: f64,
}

impl RootHistogram {
    /// Build from packed arrays, checking their lengths against the edges.
    ///
    /// `entries` (fEntries) starts as the sum of all cells.
    pub fn new(
        name: impl Into<String>,
        kind: Th1Kind,
        bin_edges: Vec<f64>,
        cells: Vec<f64>,
        sumw2: Option<Vec<f64>>,
    ) -> Result<Self> {
        check_packing(&bin_edges, &cells, sumw2.as_deref())?;
        let entries = cells.iter().sum();
        Ok(Self { name: name.into(), title: String::new(), kind, bin_edges, cells, sumw2, entries })
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the storage precision.
    pub fn with_kind(mut self, kind: Th1Kind) -> Self {
        self.kind = kind;
        self
    }

    /// Histogram name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Histogram title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Storage precision.
    pub fn kind(&self) -> Th1Kind {
        self.kind
    }

    /// Bin edges (length = n_bins + 1).
    pub fn bin_edges(&self) -> &[f64] {
        &self.bin_edges
    }

    /// Packed bin contents, including under/overflow.
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    /// Packed sum of weights squared, if stored.
    pub fn sumw2(&self) -> Option<&[f64]> {
        self.sumw2.as_deref()
    }

    /// Number of entries (fEntries).
    pub fn entries(&self) -> f64 {
        self.entries
    }

    /// Number of regular bins.
    pub fn n_bins(&self) -> usize {
        self.bin_edges.len() - 1
    }

    /// Regular bin contents (excluding under/overflow).
    pub fn bin_content(&self) -> &[f64] {
        &self.cells[1..=self.n_bins()]
    }

    /// Underflow content.
    pub fn underflow(&self) -> f64 {
        self.cells[0]
    }

    /// Overflow content.
    pub fn overflow(&self) -> f64 {
        self.cells[self.n_bins() + 1]
    }

    /// Per-cell variance: `fSumw2` when stored, otherwise ROOT's Poisson default `|content|`.
    pub fn cell_variances(&self) -> Vec<f64> {
        match &self.sumw2 {
            Some(sw2) => sw2.clone(),
            None => self.cells.iter().map(|c| c.abs()).collect(),
        }
    }

    /// Per-bin errors as ROOT's `GetBinError` reports them (excluding flows).
    pub fn bin_errors(&self) -> Vec<f64> {
        self.cell_variances()[1..=self.n_bins()].iter().map(|v| v.sqrt()).collect()
    }

    /// Decode from a streamed object payload.
    pub fn from_bytes(payload: &[u8], class_name: &str) -> Result<Self> {
        crate::objects::read_histogram(payload, class_name)
    }

    /// Encode into a streamed object payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        crate::objects::write_histogram(self)
    }
}

/// Decoding yields variances (`fSumw2`, or `|content|` when absent); import
/// with [`hs_core::ErrorConvention::Variance`]. Encoding expects variances.
impl ExternalHistogram for RootHistogram {
    fn decode(&self) -> hs_core::Result<BinArrays> {
        check_packing(&self.bin_edges, &self.cells, self.sumw2.as_deref())?;
        let n = self.n_bins();
        let variances = self.cell_variances();
        let flow = |i: usize| FlowBin { content: self.cells[i], uncertainty: variances[i] };
        Ok(BinArrays {
            bin_edges: self.bin_edges.clone(),
            contents: self.bin_content().to_vec(),
            uncertainties: variances[1..=n].to_vec(),
            layout: ContentLayout::PerBin,
            underflow: Some(flow(0)),
            overflow: Some(flow(n + 1)),
        })
    }

    fn encode(arrays: BinArrays) -> hs_core::Result<Self> {
        let arrays = arrays.into_per_bin()?;
        let n = arrays.n_bins();
        if arrays.contents.len() != n || arrays.uncertainties.len() != n {
            return Err(hs_core::Error::Validation(format!(
                "{} bins from edges, but {} contents and {} uncertainties",
                n,
                arrays.contents.len(),
                arrays.uncertainties.len()
            )));
        }
        let uf = arrays.underflow.unwrap_or_default();
        let of = arrays.overflow.unwrap_or_default();

        let pack = |inner: &[f64], first: f64, last: f64| {
            let mut packed = Vec::with_capacity(n + 2);
            packed.push(first);
            packed.extend_from_slice(inner);
            packed.push(last);
            packed
        };
        let cells = pack(&arrays.contents, uf.content, of.content);
        let sumw2 = pack(&arrays.uncertainties, uf.uncertainty, of.uncertainty);

        Ok(RootHistogram::new("h", Th1Kind::Double, arrays.bin_edges, cells, Some(sumw2))?)
    }
}

/// Lengths of packed arrays against the edges: at least one bin, `n_bins + 2` cells.
fn check_packing(bin_edges: &[f64], cells: &[f64], sumw2: Option<&[f64]>) -> Result<()> {
    if bin_edges.len() < 2 {
        return Err(RootError::Deserialization(format!(
            "need at least 2 bin edges, got {}",
            bin_edges.len()
        )));
    }
    let n_cells = bin_edges.len() + 1;
    if cells.len() != n_cells {
        return Err(RootError::Deserialization(format!(
            "{} cells for {} bins (expected {})",
            cells.len(),
            bin_edges.len() - 1,
            n_cells
        )));
    }
    if let Some(sw2) = sumw2 {
        if sw2.len() != n_cells {
            return Err(RootError::Deserialization(format!(
                "fSumw2 has {} entries, fNcells is {}",
                sw2.len(),
                n_cells
            )));
        }
    }
    Ok(())
}
