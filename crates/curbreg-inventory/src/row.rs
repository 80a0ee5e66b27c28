//! Flat inventory row as exported by the civic open-data portal.
//!
//! Column names are kept as in the export. Exports disagree on whether
//! numeric columns are numbers or strings, so those columns are `Cell`s.

use serde::{Deserialize, Serialize};

use crate::error::InventoryError;

/// A value that may be exported as a number or as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
}

impl Cell {
    /// Whether the cell holds nothing useful (empty or blank text).
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(t) if t.trim().is_empty())
    }

    /// The value as text. Whole numbers render without a fraction, so an
    /// id exported as `1340101.0` reads `1340101`.
    pub fn to_text(&self) -> String {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Text(t) => t.trim().to_string(),
        }
    }

    /// The value as a number.
    pub fn to_f64(&self, column: &'static str) -> Result<f64, InventoryError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(t) => t
                .trim()
                .replace(',', ".")
                .parse()
                .map_err(|_| InventoryError::InvalidNumber {
                    column,
                    value: t.clone(),
                }),
        }
    }

    /// The value as a whole number.
    pub fn to_i64(&self, column: &'static str) -> Result<i64, InventoryError> {
        let n = self.to_f64(column)?;
        if n.fract() != 0.0 || !n.is_finite() {
            return Err(InventoryError::InvalidNumber {
                column,
                value: self.to_text(),
            });
        }
        Ok(n as i64)
    }
}

/// Non-blank cell, if any.
pub(crate) fn present(cell: &Option<Cell>) -> Option<&Cell> {
    cell.as_ref().filter(|c| !c.is_blank())
}

/// Non-blank trimmed text, if any.
pub(crate) fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|t| !t.is_empty())
}

/// One inventory row: a panel, one of its periods, or a sub-plate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInventoryRow {
    /// Panel identifier.
    pub globalid_panneau: Option<String>,
    /// `panneau` or `panonceau` (sub-plate).
    #[serde(rename = "ObjetType")]
    pub objet_type: Option<String>,
    /// Panel reference a sub-plate hangs from.
    #[serde(rename = "IdObjetRefExt")]
    pub id_objet_ref_ext: Option<Cell>,
    /// Reference other rows use to point at this panel.
    pub id_rp_panneau: Option<Cell>,

    /// `permission` / `interdiction`.
    #[serde(rename = "RegNature")]
    pub reg_nature: Option<String>,
    /// `stationnement` / `arrêt`.
    #[serde(rename = "RegTypeImmo")]
    pub reg_type_immo: Option<String>,
    /// Vehicle categories, comma separated.
    #[serde(rename = "RegVehType")]
    pub reg_veh_type: Option<String>,
    /// Residential permit sectors, comma separated.
    #[serde(rename = "RegVehSRRR")]
    pub reg_veh_srrr: Option<String>,
    /// `oui` / `non`.
    #[serde(rename = "RegVehExcept")]
    pub reg_veh_except: Option<String>,
    /// `oui` when disabled-permit holders are exempt.
    #[serde(rename = "RegHandicap")]
    pub reg_handicap: Option<String>,

    /// Start time of the period.
    #[serde(rename = "RegTmpHeureDebut")]
    pub reg_tmp_heure_debut: Option<String>,
    /// End time of the period.
    #[serde(rename = "RegTmpHeureFin")]
    pub reg_tmp_heure_fin: Option<String>,
    /// Day expression of the period.
    #[serde(rename = "RegTmpJours")]
    pub reg_tmp_jours: Option<String>,
    /// `oui` when the period is an exception to the regulation.
    #[serde(rename = "RegTmpExcept")]
    pub reg_tmp_except: Option<String>,
    /// Non-empty when the period applies on school days.
    #[serde(rename = "RegTmpEcole")]
    pub reg_tmp_ecole: Option<String>,
    /// Maximum stay, minutes.
    #[serde(rename = "RegTmpDuree")]
    pub reg_tmp_duree: Option<Cell>,

    /// Months, comma separated.
    pub panneau_mois: Option<String>,
    /// Day of the first month the period starts.
    pub panneau_an_jour_debut: Option<Cell>,
    /// Day of the last month the period ends.
    pub panneau_an_jour_fin: Option<Cell>,

    /// `vers rue` / `vers trottoir`.
    #[serde(rename = "RegFleche")]
    pub reg_fleche: Option<String>,
    /// Side code; a last digit of `1` is the right side.
    pub cote_rue_id: Option<Cell>,
    /// Recorded segment.
    #[serde(rename = "IdTroncon")]
    pub id_troncon: Option<Cell>,
    /// Easting.
    #[serde(rename = "X")]
    pub x: Option<Cell>,
    /// Northing.
    #[serde(rename = "Y")]
    pub y: Option<Cell>,
}

impl RawInventoryRow {
    /// Whether the row is a sub-plate attached to another panel.
    pub fn is_sub_plate(&self) -> bool {
        text(&self.objet_type).is_some_and(|t| t.eq_ignore_ascii_case("panonceau"))
    }
}
