use std::fmt;
use std::str::FromStr;

use polars::frame::DataFrame;

use crate::errors::{MethCompareError, Result};

/// Anything that can be read from disk into a normalised table.
pub trait Dataset {
    fn load(&self) -> Result<DataFrame>;
}

/// A genomic interval. The `chrom:start-end` key is only a join and display
/// convenience; coordinates are kept as integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Region {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
}

impl Region {
    pub fn new(chrom: impl Into<String>, start: i64, end: i64) -> Result<Self> {
        let chrom = chrom.into();
        if chrom.is_empty() {
            return Err(MethCompareError::MalformedRegion(
                "empty chromosome name".to_string(),
            ));
        }
        if start >= end {
            return Err(MethCompareError::MalformedRegion(format!(
                "{chrom}: start {start} is not before end {end}"
            )));
        }
        Ok(Self { chrom, start, end })
    }

    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

impl FromStr for Region {
    type Err = MethCompareError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || MethCompareError::MalformedRegion(format!("cannot parse region key '{s}'"));

        // contig names may themselves contain ':' (e.g. HLA alts), so split on the last one
        let (chrom, span) = s.rsplit_once(':').ok_or_else(malformed)?;
        let (start, end) = span.split_once('-').ok_or_else(malformed)?;
        let start = start.trim().parse::<i64>().map_err(|_| malformed())?;
        let end = end.trim().parse::<i64>().map_err(|_| malformed())?;

        Region::new(chrom, start, end)
    }
}

/// Which kind of region a row of entropy/DMR statistics describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionType {
    GenomicWindows,
    ModkitDmrSegments,
    DssUnsmoothedDmrs,
    DssSmoothedDmrs,
}

impl RegionType {
    pub fn description(&self) -> &'static str {
        match self {
            RegionType::GenomicWindows => "genomic windows",
            RegionType::ModkitDmrSegments => "modkit DMR segments",
            RegionType::DssUnsmoothedDmrs => "DSS unsmoothed DMRs",
            RegionType::DssSmoothedDmrs => "DSS smoothed DMRs",
        }
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Provenance tag carried in the `name` column of every labeled table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    pub sample: String,
    pub region_type: RegionType,
}

impl Label {
    pub fn new(sample: impl Into<String>, region_type: RegionType) -> Self {
        Self {
            sample: sample.into(),
            region_type,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.sample, self.region_type)
    }
}
