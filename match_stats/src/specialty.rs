//! The list of specialties offered by the filter control and the pure
//! selection operations behind its checkboxes.

use std::collections::BTreeSet;

use crate::table::Table;

/// How many names the collapsed selection summary shows.
pub const SUMMARY_MAX_NAMES: usize = 3;

/// Distinct specialty names, each list sorted ascending.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SpecialtyCatalog {
    pub all: Vec<String>,
    /// Names found on rows of the `Main` table.
    pub main: Vec<String>,
    /// Names found on rows of the `Specialty` table.
    pub subspecialties: Vec<String>,
}

pub fn catalog(table: &Table) -> SpecialtyCatalog {
    let col = match table.specialty_column() {
        Some(c) => c,
        None => return SpecialtyCatalog::default(),
    };
    let section_col = table.table_section_column();
    let mut all: BTreeSet<String> = BTreeSet::new();
    let mut main: BTreeSet<String> = BTreeSet::new();
    let mut subspecialties: BTreeSet<String> = BTreeSet::new();
    for row in table.rows() {
        let name = row.get(col);
        if name.trim().is_empty() {
            continue;
        }
        all.insert(name.to_string());
        match section_col.map(|sc| row.get(sc)) {
            Some("Main") => {
                main.insert(name.to_string());
            }
            Some("Specialty") => {
                subspecialties.insert(name.to_string());
            }
            _ => {}
        }
    }
    SpecialtyCatalog {
        all: all.into_iter().collect(),
        main: main.into_iter().collect(),
        subspecialties: subspecialties.into_iter().collect(),
    }
}

/// True when every member of a non-empty group is selected.
pub fn is_group_selected(selection: &BTreeSet<String>, group: &[String]) -> bool {
    !group.is_empty() && group.iter().all(|s| selection.contains(s))
}

/// "Select all": clears a complete selection, otherwise selects everything.
pub fn toggle_all(selection: &BTreeSet<String>, catalog: &SpecialtyCatalog) -> BTreeSet<String> {
    if is_group_selected(selection, &catalog.all) {
        BTreeSet::new()
    } else {
        catalog.all.iter().cloned().collect()
    }
}

/// Removes the group when it is fully selected, adds its missing members
/// otherwise. Names outside the group are left alone.
pub fn toggle_group(selection: &BTreeSet<String>, group: &[String]) -> BTreeSet<String> {
    let mut res = selection.clone();
    if is_group_selected(selection, group) {
        for s in group {
            res.remove(s);
        }
    } else {
        res.extend(group.iter().cloned());
    }
    res
}

pub fn toggle_one(selection: &BTreeSet<String>, name: &str) -> BTreeSet<String> {
    let mut res = selection.clone();
    if !res.remove(name) {
        res.insert(name.to_string());
    }
    res
}

/// Short text for a partial selection, e.g. `Anesthesiology, Neurology,
/// Pediatrics and 2 more`. Nothing is shown when the selection is empty or
/// covers the whole catalog.
pub fn selection_summary(
    selection: &BTreeSet<String>,
    catalog: &SpecialtyCatalog,
) -> Option<String> {
    if selection.is_empty() || is_group_selected(selection, &catalog.all) {
        return None;
    }
    let shown: Vec<&str> = selection
        .iter()
        .take(SUMMARY_MAX_NAMES)
        .map(|s| s.as_str())
        .collect();
    let mut text = shown.join(", ");
    if selection.len() > SUMMARY_MAX_NAMES {
        text.push_str(&format!(" and {} more", selection.len() - SUMMARY_MAX_NAMES));
    }
    Some(text)
}
