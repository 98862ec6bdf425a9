// Results Matrix
// Best (lowest) time per 1000 iterations for each (language, compiler) cell.

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// The fastest cell, used as the normalisation baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fastest {
    pub lang_tech: String,
    pub comp_opt: String,
    pub kiter_secs: f64,
}

/// 2D table indexed by language/technique (rows) and compiler/options (columns).
/// A cell value of 0.0 means "no result".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsMatrix {
    lang_techs: Vec<String>,
    comp_opts: Vec<String>,
    cells: Vec<f64>,
}

impl ResultsMatrix {
    pub fn new(lang_techs: Vec<String>, comp_opts: Vec<String>) -> Self {
        let cells = vec![0.0; lang_techs.len() * comp_opts.len()];
        Self {
            lang_techs,
            comp_opts,
            cells,
        }
    }

    pub fn lang_techs(&self) -> &[String] {
        &self.lang_techs
    }

    pub fn comp_opts(&self) -> &[String] {
        &self.comp_opts
    }

    fn index(&self, lang_tech: &str, comp_opt: &str) -> Result<usize> {
        let row = self
            .lang_techs
            .iter()
            .position(|l| l == lang_tech)
            .ok_or_else(|| DomainError::UnknownLangTech(lang_tech.to_string()))?;
        let col = self
            .comp_opts
            .iter()
            .position(|c| c == comp_opt)
            .ok_or_else(|| DomainError::UnknownCompOpt(comp_opt.to_string()))?;
        Ok(row * self.comp_opts.len() + col)
    }

    /// Record a timing, keeping the lowest positive value seen for the cell.
    /// Non-positive timings are ignored.
    pub fn record(&mut self, lang_tech: &str, comp_opt: &str, kiter_secs: f64) -> Result<()> {
        let idx = self.index(lang_tech, comp_opt)?;
        if kiter_secs <= 0.0 {
            return Ok(());
        }
        let cell = &mut self.cells[idx];
        if *cell <= 0.0 || kiter_secs < *cell {
            *cell = kiter_secs;
        }
        Ok(())
    }

    /// Cell value (0.0 when empty)
    pub fn get(&self, lang_tech: &str, comp_opt: &str) -> Result<f64> {
        Ok(self.cells[self.index(lang_tech, comp_opt)?])
    }

    /// Lowest positive cell, scanning rows then columns in label order.
    /// Ties go to the first cell found.
    pub fn fastest(&self) -> Option<Fastest> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, &value) in self.cells.iter().enumerate() {
            if value <= 0.0 {
                continue;
            }
            match best {
                Some((_, lowest)) if value >= lowest => {}
                _ => best = Some((idx, value)),
            }
        }

        best.map(|(idx, kiter_secs)| {
            let cols = self.comp_opts.len();
            Fastest {
                lang_tech: self.lang_techs[idx / cols].clone(),
                comp_opt: self.comp_opts[idx % cols].clone(),
                kiter_secs,
            }
        })
    }

    /// Cell value divided by the baseline
    pub fn relative(&self, lang_tech: &str, comp_opt: &str, bench: f64) -> Result<f64> {
        Ok(self.get(lang_tech, comp_opt)? / bench)
    }
}
