//! Blueprint form builder: largest-remainder LO targets, feasibility
//! checking, and greedy deficit-driven form assembly.

use crate::rng::Lcg;
use std::collections::HashMap;
use studyforge_domain::{Blueprint, Item};

/// A single LO's target shortfall, reported when a blueprint can't be
/// satisfied by the available item bank.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LoDeficit {
    pub lo_id: String,
    pub needed: usize,
    pub have: usize,
}

#[derive(Debug, Clone)]
pub struct BlueprintDeficit {
    pub blueprint_id: String,
    pub deficits: Vec<LoDeficit>,
}

impl std::fmt::Display for BlueprintDeficit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lines: Vec<String> = self
            .deficits
            .iter()
            .map(|d| format!("{}: need {}, have {}", d.lo_id, d.needed, d.have))
            .collect();
        write!(f, "blueprint {} is infeasible: {}", self.blueprint_id, lines.join("; "))
    }
}

impl std::error::Error for BlueprintDeficit {}

/// Distribute `form_length` across the blueprint's LO weights by the
/// largest-remainder method, with a stable cyclic tie-break on the
/// sorted LO id order.
pub fn derive_lo_targets(blueprint: &Blueprint, form_length: usize) -> HashMap<String, usize> {
    let mut lo_ids: Vec<&String> = blueprint.weights.keys().collect();
    lo_ids.sort();

    let mut base = HashMap::new();
    let mut remainders: Vec<(String, f64)> = Vec::new();
    let mut allocated = 0usize;

    for lo_id in &lo_ids {
        let weight = blueprint.weights[*lo_id];
        let raw = weight * form_length as f64;
        let floor = raw.floor();
        base.insert((*lo_id).clone(), floor as usize);
        allocated += floor as usize;
        remainders.push(((*lo_id).clone(), raw - floor));
    }

    let remaining = form_length.saturating_sub(allocated);

    // Descending remainder; ties broken by the stable (already sorted) LO
    // id order via a stable sort, giving deterministic cyclic insertion.
    remainders.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    for (lo_id, _) in remainders.into_iter().take(remaining) {
        *base.entry(lo_id).or_insert(0) += 1;
    }

    base
}

/// True when, for every LO with a nonzero target, the item bank has at
/// least that many items covering the LO.
pub fn is_blueprint_feasible(blueprint: &Blueprint, items: &[Item], form_length: usize) -> bool {
    feasibility_deficits(blueprint, items, form_length).is_empty()
}

fn feasibility_deficits(blueprint: &Blueprint, items: &[Item], form_length: usize) -> Vec<LoDeficit> {
    let targets = derive_lo_targets(blueprint, form_length);
    let mut deficits = Vec::new();

    for (lo_id, needed) in &targets {
        if *needed == 0 {
            continue;
        }
        let have = items.iter().filter(|item| item.los.contains(lo_id)).count();
        if have < *needed {
            deficits.push(LoDeficit {
                lo_id: lo_id.clone(),
                needed: *needed,
                have,
            });
        }
    }

    deficits.sort_by(|a, b| a.lo_id.cmp(&b.lo_id));
    deficits
}

pub struct BuildFormInput<'a> {
    pub blueprint: &'a Blueprint,
    pub items: &'a [Item],
    pub form_length: usize,
    pub seed: u64,
}

/// Greedily assemble a form: repeatedly pick the LO with the highest
/// remaining deficit, then pick uniformly (seeded LCG) among its
/// not-yet-selected covering items; once no deficited LO has a candidate,
/// fill the remainder uniformly from the rest of the pool.
pub fn build_form_greedy(input: BuildFormInput) -> Result<Vec<String>, BlueprintDeficit> {
    let deficits = feasibility_deficits(input.blueprint, input.items, input.form_length);
    if !deficits.is_empty() {
        return Err(BlueprintDeficit {
            blueprint_id: input.blueprint.id.clone(),
            deficits,
        });
    }

    let mut targets = derive_lo_targets(input.blueprint, input.form_length);
    let mut rng = Lcg::new(input.seed);
    let mut selected: Vec<String> = Vec::new();
    let mut selected_set: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    while selected.len() < input.form_length {
        let mut lo_ids: Vec<&String> = targets
            .iter()
            .filter(|&(lo_id, &target)| target > counts.get(lo_id).copied().unwrap_or(0))
            .map(|(lo_id, _)| lo_id)
            .collect();
        lo_ids.sort();

        let candidate_item = lo_ids.iter().find_map(|lo_id| {
            let mut covering: Vec<&Item> = input
                .items
                .iter()
                .filter(|item| item.los.contains(*lo_id) && !selected_set.contains(&item.id))
                .collect();
            covering.sort_by(|a, b| a.id.cmp(&b.id));
            if covering.is_empty() {
                None
            } else {
                let idx = rng.next_below(covering.len());
                Some(((*lo_id).clone(), covering[idx].id.clone(), covering[idx].los.clone()))
            }
        });

        let (picked_id, picked_los) = match candidate_item {
            Some((_, id, los)) => (id, los),
            None => {
                let mut remaining: Vec<&Item> = input
                    .items
                    .iter()
                    .filter(|item| !selected_set.contains(&item.id))
                    .collect();
                remaining.sort_by(|a, b| a.id.cmp(&b.id));
                if remaining.is_empty() {
                    break;
                }
                let idx = rng.next_below(remaining.len());
                (remaining[idx].id.clone(), remaining[idx].los.clone())
            }
        };

        selected_set.insert(picked_id.clone());
        selected.push(picked_id);
        for lo_id in picked_los {
            *counts.entry(lo_id.clone()).or_insert(0) += 1;
            targets.entry(lo_id).or_insert(0);
        }
    }

    Ok(selected)
}
