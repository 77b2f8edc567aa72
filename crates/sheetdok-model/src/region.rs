//! Cell regions: connected blocks of occupied cells
//!
//! A coordinate is occupied when it holds a value, a formula or a
//! non-default style, or lies inside a merge or a data validation range.
//! Occupied coordinates within [`Sheet::base_ranges`] are grouped into
//! 4-connected components; each component becomes one [`CellRegion`].
//! Covered coordinates that have no `<c>` element appear as virtual cells.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use serde::Serialize;

use crate::reference::{CellRef, RangeRef};
use crate::sheet::{Cell, Sheet};

/// Why a region cell is listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionFlag {
    Merged,
    DataValidation,
    /// No `<c>` element at this coordinate
    Virtual,
    HasValue,
    HasFormula,
    HasCached,
    NonDefaultStyle,
}

impl RegionFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merged => "merged",
            Self::DataValidation => "data_validation",
            Self::Virtual => "virtual",
            Self::HasValue => "has_value",
            Self::HasFormula => "has_formula",
            Self::HasCached => "has_cached",
            Self::NonDefaultStyle => "non_default_style",
        }
    }
}

impl fmt::Display for RegionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One coordinate of a region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCell<'a> {
    pub coord: CellRef,
    /// `None` for virtual cells
    pub cell: Option<&'a Cell>,
    /// Merge covering the coordinate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<RangeRef>,
    pub flags: Vec<RegionFlag>,
}

impl RegionCell<'_> {
    pub fn is_virtual(&self) -> bool {
        self.cell.is_none()
    }

    /// `virtual` or the cell kind
    pub fn kind(&self) -> &'static str {
        self.cell.map_or("virtual", |c| c.kind.as_str())
    }

    pub fn flags_text(&self) -> String {
        self.flags
            .iter()
            .map(RegionFlag::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A 4-connected block of occupied coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellRegion<'a> {
    /// 1-based, in order of the top-left corner
    pub id: usize,
    /// Bounding range of the component
    pub bounds: RangeRef,
    /// Cells in row-major order
    pub cells: Vec<RegionCell<'a>>,
}

impl CellRegion<'_> {
    pub fn virtual_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_virtual()).count()
    }
}

fn non_default_style(cell: &Cell) -> bool {
    cell.style_id.is_some_and(|id| id != 0)
}

/// Group the occupied coordinates of a sheet into regions
pub fn build_regions(sheet: &Sheet) -> Vec<CellRegion<'_>> {
    let base = sheet.base_ranges();
    if base.is_empty() {
        return Vec::new();
    }
    let in_base = |coord: CellRef| base.iter().any(|r| r.contains(coord));
    // Range cells clipped to the base, so sheet-wide ranges stay bounded
    let clipped = |range: &RangeRef| -> Vec<CellRef> {
        base.iter()
            .filter_map(|b| b.intersection(range))
            .flat_map(|r| r.cells().collect::<Vec<_>>())
            .collect()
    };

    let mut occupied: BTreeSet<CellRef> = sheet
        .cells
        .iter()
        .filter(|c| c.has_content() || non_default_style(c))
        .map(|c| c.coord)
        .filter(|coord| in_base(*coord))
        .collect();
    for merge in &sheet.merges {
        occupied.extend(clipped(&merge.range));
    }
    let mut validated = BTreeSet::new();
    for rule in &sheet.validations {
        for range in &rule.ranges {
            validated.extend(clipped(range));
        }
    }
    occupied.extend(validated.iter().copied());

    let mut components = connected_components(occupied);
    components.sort_by_key(|comp| {
        let top = comp.iter().map(|c| c.row).min().unwrap_or(0);
        let left = comp.iter().map(|c| c.col).min().unwrap_or(0);
        (top, left)
    });

    components
        .into_iter()
        .enumerate()
        .filter_map(|(idx, component)| {
            let bounds = component
                .iter()
                .map(|c| RangeRef::single(*c))
                .reduce(|acc, r| acc.union(&r))?;
            let cells = component
                .into_iter()
                .map(|coord| region_cell(sheet, coord, validated.contains(&coord)))
                .collect();
            Some(CellRegion {
                id: idx + 1,
                bounds,
                cells,
            })
        })
        .collect()
}

fn region_cell(sheet: &Sheet, coord: CellRef, validated: bool) -> RegionCell<'_> {
    let merge = sheet.merge_at(coord).map(|m| m.range);
    let cell = sheet.cell(coord);

    let mut flags = Vec::new();
    if merge.is_some() {
        flags.push(RegionFlag::Merged);
    }
    if validated {
        flags.push(RegionFlag::DataValidation);
    }
    match cell {
        None => flags.push(RegionFlag::Virtual),
        Some(cell) => {
            if cell.value.as_deref().is_some_and(|v| !v.is_empty()) {
                flags.push(RegionFlag::HasValue);
            }
            if cell.formula.is_some() {
                flags.push(RegionFlag::HasFormula);
            }
            if cell.cached_value.as_deref().is_some_and(|v| !v.is_empty()) {
                flags.push(RegionFlag::HasCached);
            }
            if non_default_style(cell) {
                flags.push(RegionFlag::NonDefaultStyle);
            }
        }
    }

    RegionCell {
        coord,
        cell,
        merge,
        flags,
    }
}

/// 4-connected components, each sorted row-major
fn connected_components(mut remaining: BTreeSet<CellRef>) -> Vec<BTreeSet<CellRef>> {
    let mut components = Vec::new();
    while let Some(start) = remaining.pop_first() {
        let mut component = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(coord) = queue.pop_front() {
            for (dr, dc) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                let Some(next) = coord.offset(dr, dc) else { continue };
                if remaining.remove(&next) {
                    component.insert(next);
                    queue.push_back(next);
                }
            }
        }
        components.push(component);
    }
    components
}
