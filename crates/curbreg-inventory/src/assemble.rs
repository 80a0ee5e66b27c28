//! # Row Assembly
//!
//! Turns inventory rows into signs. The export has one row per panel
//! period, plus one row per sub-plate (`panonceau`) hanging under a panel:
//!
//! - rows sharing `globalid_panneau` become one sign whose time windows
//!   follow row order;
//! - a sub-plate row adds its windows and fills the vehicle, stay and
//!   season fields its panel left empty. It is matched to the panel whose
//!   `id_rp_panneau` equals the sub-plate's `IdObjetRefExt`.
//!
//! A row that cannot be read is returned as a `RowError` and skipped.

use std::collections::HashMap;

use chrono::{NaiveTime, Weekday};

use curbreg_core::{
    Activity, BoundaryRole, DaySet, Point, RawDateRange, RawTimeWindow, RegulationNature,
    SegmentId, SideOfStreet, Sign, SignId, TriState, VehicleType,
};

use crate::calendar::{parse_days, parse_season, parse_time};
use crate::error::{InventoryError, RowError};
use crate::row::{present, text, Cell, RawInventoryRow};

/// Signs and the rows that could not be read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    /// One sign per panel, in first-seen order.
    pub signs: Vec<Sign>,
    /// Skipped rows.
    pub errors: Vec<RowError>,
}

/// What one row contributes.
#[derive(Debug)]
struct ParsedRow {
    sign: Sign,
    window: Option<RawTimeWindow>,
}

fn tri(value: &Option<String>) -> TriState {
    match text(value).map(str::to_lowercase).as_deref() {
        Some("oui") | Some("yes") => TriState::Yes,
        Some("non") | Some("no") => TriState::No,
        _ => TriState::Absent,
    }
}

fn optional_day(cell: &Option<Cell>, column: &'static str) -> Result<Option<u32>, InventoryError> {
    present(cell)
        .map(|c| {
            let n = c.to_i64(column)?;
            u32::try_from(n).map_err(|_| InventoryError::InvalidNumber {
                column,
                value: c.to_text(),
            })
        })
        .transpose()
}

fn coordinate(cell: &Option<Cell>, column: &'static str) -> Result<f64, InventoryError> {
    present(cell)
        .ok_or(InventoryError::MissingValue(column))?
        .to_f64(column)
}

fn vehicle(row: &RawInventoryRow) -> Option<VehicleType> {
    let zones: Vec<String> = text(&row.reg_veh_srrr)
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|z| !z.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if !zones.is_empty() {
        return Some(VehicleType::ResidentialPermit { zones });
    }
    text(&row.reg_veh_type).map(|name| VehicleType::Class {
        name: name.to_string(),
    })
}

fn school_window() -> RawTimeWindow {
    RawTimeWindow {
        start: NaiveTime::from_hms_opt(7, 0, 0),
        end: NaiveTime::from_hms_opt(17, 0, 0),
        days: DaySet::range(Weekday::Mon, Weekday::Fri),
        school_days: true,
        temporal_exception: TriState::Absent,
    }
}

fn window(row: &RawInventoryRow) -> Result<Option<RawTimeWindow>, InventoryError> {
    let start = text(&row.reg_tmp_heure_debut).map(parse_time).transpose()?;
    let end = text(&row.reg_tmp_heure_fin).map(parse_time).transpose()?;
    let days = text(&row.reg_tmp_jours)
        .map(parse_days)
        .transpose()?
        .unwrap_or(DaySet::EMPTY);
    let school = text(&row.reg_tmp_ecole).is_some();
    let exception = tri(&row.reg_tmp_except);

    if start.is_none() && end.is_none() && days.is_empty() {
        // School-day panels often carry no hours of their own.
        return Ok(school.then(|| RawTimeWindow {
            temporal_exception: exception,
            ..school_window()
        }));
    }
    Ok(Some(RawTimeWindow {
        start,
        end,
        days,
        school_days: school,
        temporal_exception: exception,
    }))
}

/// Convert one row into a sign carrying at most one time window.
pub fn sign_from_row(row: &RawInventoryRow) -> Result<Sign, InventoryError> {
    parse_row(row).map(|p| {
        let mut sign = p.sign;
        sign.time_windows.extend(p.window);
        sign
    })
}

fn parse_row(row: &RawInventoryRow) -> Result<ParsedRow, InventoryError> {
    let id = text(&row.globalid_panneau).ok_or(InventoryError::MissingValue("globalid_panneau"))?;
    let position = Point::new(coordinate(&row.x, "X")?, coordinate(&row.y, "Y")?);

    let nature = match text(&row.reg_nature).map(str::to_lowercase).as_deref() {
        None => RegulationNature::Unknown,
        Some("permission") => RegulationNature::Permission,
        Some(_) => RegulationNature::Interdiction,
    };
    let activity = match text(&row.reg_type_immo).map(str::to_lowercase).as_deref() {
        Some("arrêt") | Some("arret") => Activity::Standing,
        _ => Activity::Parking,
    };
    let boundary_role = match text(&row.reg_fleche).map(str::to_lowercase).as_deref() {
        Some("vers rue") => BoundaryRole::Begin,
        Some("vers trottoir") => BoundaryRole::End,
        _ => BoundaryRole::Standalone,
    };
    let side_of_street = present(&row.cote_rue_id)
        .map(|c| c.to_i64("cote_rue_id"))
        .transpose()?
        .map(|code| {
            if code.rem_euclid(10) == 1 {
                SideOfStreet::Right
            } else {
                SideOfStreet::Left
            }
        });
    let raw_segment_hint = present(&row.id_troncon)
        .map(Cell::to_text)
        .filter(|t| t != "-1")
        .map(SegmentId::new);

    let max_stay_minutes = optional_day(&row.reg_tmp_duree, "RegTmpDuree")?;
    let date_range = parse_season(
        text(&row.panneau_mois),
        optional_day(&row.panneau_an_jour_debut, "panneau_an_jour_debut")?,
        optional_day(&row.panneau_an_jour_fin, "panneau_an_jour_fin")?,
    )?;

    let sign = Sign {
        id: SignId::new(id),
        position,
        nature,
        activity,
        vehicle_type: vehicle(row),
        vehicle_exception: tri(&row.reg_veh_except),
        time_windows: Vec::new(),
        date_range,
        boundary_role,
        raw_segment_hint,
        side_of_street,
        max_stay_minutes,
        disabled_permit_exempt: tri(&row.reg_handicap) == TriState::Yes,
        point_regulation: false,
    };
    Ok(ParsedRow {
        sign,
        window: window(row)?,
    })
}

fn merge_season(into: &mut Option<RawDateRange>, from: Option<RawDateRange>) {
    if into.is_none() {
        *into = from;
    }
}

fn skip(out: &mut Assembly, row: usize, r: &RawInventoryRow, source: InventoryError) {
    let panel = text(&r.globalid_panneau).unwrap_or_default().to_string();
    tracing::warn!(row, panel = %panel, error = %source, "inventory row skipped");
    out.errors.push(RowError { row, panel, source });
}

/// Assemble every row of an export.
pub fn assemble_signs(rows: &[RawInventoryRow]) -> Assembly {
    let mut out = Assembly::default();
    let mut by_id: HashMap<SignId, usize> = HashMap::new();
    let mut by_reference: HashMap<String, usize> = HashMap::new();
    let mut sub_plates = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        if row.is_sub_plate() {
            sub_plates.push(i);
            continue;
        }
        let parsed = match parse_row(row) {
            Ok(p) => p,
            Err(e) => {
                skip(&mut out, i, row, e);
                continue;
            }
        };
        let idx = match by_id.get(&parsed.sign.id) {
            Some(&idx) => {
                let sign = &mut out.signs[idx];
                merge_season(&mut sign.date_range, parsed.sign.date_range);
                idx
            }
            None => {
                let idx = out.signs.len();
                by_id.insert(parsed.sign.id.clone(), idx);
                out.signs.push(parsed.sign);
                idx
            }
        };
        out.signs[idx].time_windows.extend(parsed.window);
        if let Some(reference) = present(&row.id_rp_panneau) {
            by_reference.entry(reference.to_text()).or_insert(idx);
        }
    }

    for i in sub_plates {
        let row = &rows[i];
        let parent = present(&row.id_objet_ref_ext).map(Cell::to_text);
        let Some(&idx) = parent.as_ref().and_then(|p| by_reference.get(p)) else {
            skip(
                &mut out,
                i,
                row,
                InventoryError::OrphanSubPlate(parent.unwrap_or_default()),
            );
            continue;
        };
        let plate = match parse_row(row) {
            Ok(p) => p,
            Err(e) => {
                skip(&mut out, i, row, e);
                continue;
            }
        };
        let sign = &mut out.signs[idx];
        sign.time_windows.extend(plate.window);
        if sign.vehicle_type.is_none() {
            sign.vehicle_type = plate.sign.vehicle_type;
        }
        if sign.vehicle_exception == TriState::Absent {
            sign.vehicle_exception = plate.sign.vehicle_exception;
        }
        if sign.max_stay_minutes.is_none() {
            sign.max_stay_minutes = plate.sign.max_stay_minutes;
        }
        sign.disabled_permit_exempt |= plate.sign.disabled_permit_exempt;
        merge_season(&mut sign.date_range, plate.sign.date_range);
    }

    tracing::info!(
        rows = rows.len(),
        signs = out.signs.len(),
        skipped = out.errors.len(),
        "inventory assembled"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> RawInventoryRow {
        RawInventoryRow {
            globalid_panneau: Some(id.into()),
            reg_nature: Some("interdiction".into()),
            x: Some(Cell::Number(299_900.0)),
            y: Some(Cell::Number(5_041_000.0)),
            ..RawInventoryRow::default()
        }
    }

    #[test]
    fn arrows_and_side_codes() {
        let mut r = row("A");
        r.reg_fleche = Some("vers rue".into());
        r.cote_rue_id = Some(Cell::Number(10_121.0));
        let s = sign_from_row(&r).unwrap();
        assert_eq!(s.boundary_role, BoundaryRole::Begin);
        assert_eq!(s.side_of_street, Some(SideOfStreet::Right));

        r.reg_fleche = Some("Vers trottoir".into());
        r.cote_rue_id = Some(Cell::Text("10122".into()));
        let s = sign_from_row(&r).unwrap();
        assert_eq!(s.boundary_role, BoundaryRole::End);
        assert_eq!(s.side_of_street, Some(SideOfStreet::Left));

        r.reg_fleche = Some("aucune".into());
        assert_eq!(sign_from_row(&r).unwrap().boundary_role, BoundaryRole::Standalone);
    }

    #[test]
    fn nature_and_activity() {
        let mut r = row("A");
        r.reg_nature = Some("permission".into());
        r.reg_type_immo = Some("arrêt".into());
        let s = sign_from_row(&r).unwrap();
        assert_eq!(s.nature, RegulationNature::Permission);
        assert_eq!(s.activity, Activity::Standing);

        r.reg_nature = None;
        assert_eq!(sign_from_row(&r).unwrap().nature, RegulationNature::Unknown);
    }

    #[test]
    fn residential_permit_takes_precedence() {
        let mut r = row("A");
        r.reg_veh_type = Some("taxi".into());
        r.reg_veh_srrr = Some("108, 109".into());
        r.reg_veh_except = Some("non".into());
        r.reg_handicap = Some("oui".into());
        let s = sign_from_row(&r).unwrap();
        assert_eq!(
            s.vehicle_type,
            Some(VehicleType::ResidentialPermit {
                zones: vec!["108".into(), "109".into()]
            })
        );
        assert_eq!(s.vehicle_exception, TriState::No);
        assert!(s.disabled_permit_exempt);
    }

    #[test]
    fn half_open_period_is_kept_for_the_normalizer() {
        let mut r = row("A");
        r.reg_tmp_heure_debut = Some("08:00:00".into());
        let s = sign_from_row(&r).unwrap();
        assert_eq!(s.time_windows.len(), 1);
        assert!(s.time_windows[0].is_half_open());
    }

    #[test]
    fn school_only_period() {
        let mut r = row("A");
        r.reg_tmp_ecole = Some("oui".into());
        let s = sign_from_row(&r).unwrap();
        assert_eq!(s.time_windows, vec![school_window()]);
    }

    #[test]
    fn missing_coordinates() {
        let mut r = row("A");
        r.x = None;
        assert_eq!(sign_from_row(&r), Err(InventoryError::MissingValue("X")));
    }

    #[test]
    fn period_rows_merge_in_order() {
        let mut a = row("P");
        a.reg_tmp_heure_debut = Some("08:00".into());
        a.reg_tmp_heure_fin = Some("10:00".into());
        a.reg_tmp_jours = Some("lundi-vendredi".into());
        let mut b = row("P");
        b.reg_tmp_heure_debut = Some("14:00".into());
        b.reg_tmp_heure_fin = Some("16:00".into());
        b.reg_tmp_except = Some("oui".into());

        let out = assemble_signs(&[a, b, row("Q")]);
        assert!(out.errors.is_empty());
        assert_eq!(out.signs.len(), 2);
        let p = &out.signs[0];
        assert_eq!(p.id.as_str(), "P");
        assert_eq!(p.time_windows.len(), 2);
        assert_eq!(p.time_windows[0].start, NaiveTime::from_hms_opt(8, 0, 0));
        assert_eq!(p.time_windows[1].temporal_exception, TriState::Yes);
    }

    #[test]
    fn sub_plate_attaches_to_panel() {
        let mut panel = row("P");
        panel.id_rp_panneau = Some(Cell::Number(77.0));
        let mut plate = row("P-sub");
        plate.objet_type = Some("panonceau".into());
        plate.id_objet_ref_ext = Some(Cell::Text("77".into()));
        plate.reg_veh_type = Some("livraison".into());
        plate.reg_veh_except = Some("oui".into());
        plate.reg_tmp_duree = Some(Cell::Number(60.0));

        let out = assemble_signs(&[plate, panel]);
        assert!(out.errors.is_empty());
        assert_eq!(out.signs.len(), 1);
        let s = &out.signs[0];
        assert_eq!(
            s.vehicle_type,
            Some(VehicleType::Class {
                name: "livraison".into()
            })
        );
        assert_eq!(s.vehicle_exception, TriState::Yes);
        assert_eq!(s.max_stay_minutes, Some(60));
    }

    #[test]
    fn bad_rows_are_reported_not_fatal() {
        let mut bad = row("B");
        bad.reg_tmp_jours = Some("lun".into());
        let mut orphan = row("O");
        orphan.objet_type = Some("panonceau".into());
        orphan.id_objet_ref_ext = Some(Cell::Text("404".into()));

        let out = assemble_signs(&[row("A"), bad, orphan]);
        assert_eq!(out.signs.len(), 1);
        assert_eq!(out.errors.len(), 2);
        assert_eq!(out.errors[0].row, 1);
        assert_eq!(out.errors[0].source, InventoryError::UnknownDay("lun".into()));
        assert_eq!(
            out.errors[1].source,
            InventoryError::OrphanSubPlate("404".into())
        );
    }
}
