//! Opposite-side controller lookup for baking the other half of a rig.

use super::ControllerId;

/// Side token pairs, tried in order. The first token found in the short name
/// is swapped once.
const MIRROR_TOKENS: &[(&str, &str)] = &[
    ("R_", "L_"), ("L_", "R_"),
    ("_R", "_L"), ("_L", "_R"),
    ("_R_", "_L_"), ("_L_", "_R_"),
    ("r_", "l_"), ("l_", "r_"),
    ("_r_", "_l_"), ("_l_", "_r_"),
    ("_rt_", "_lf_"), ("_lf_", "_rt_"),
    ("_rg_", "_lf_"), ("_lf_", "_rg_"),
    ("_lf", "_rg"), ("_rg", "_lf"),
    ("RF_", "LF_"), ("LF_", "RF_"),
    ("left_", "right_"), ("right_", "left_"),
    ("_left", "_right"), ("_right", "_left"),
    ("_left_", "_right_"), ("_right_", "_left_"),
];

/// Every candidate opposite name for `id`, in token order. Namespace is kept.
pub fn opposite_candidates(id: &ControllerId) -> Vec<ControllerId> {
    let full = id.as_str();
    let (namespace, short) = match full.rfind(':') {
        Some(i) => (Some(&full[..i]), &full[i + 1..]),
        None => (None, full),
    };
    MIRROR_TOKENS
        .iter()
        .filter(|(token, _)| short.contains(token))
        .map(|(token, opposite)| {
            let swapped = short.replacen(token, opposite, 1);
            match namespace {
                Some(ns) => ControllerId::new(format!("{ns}:{swapped}")),
                None => ControllerId::new(swapped),
            }
        })
        .collect()
}

/// First candidate the host reports as existing.
pub fn opposite_name<F>(id: &ControllerId, exists: F) -> Option<ControllerId>
where
    F: Fn(&ControllerId) -> bool,
{
    opposite_candidates(id).into_iter().find(|c| exists(c))
}

/// Map a chain to its opposite side, dropping controllers with no match.
pub fn opposite_chain<F>(ids: &[ControllerId], exists: F) -> Vec<ControllerId>
where
    F: Fn(&ControllerId) -> bool,
{
    ids.iter().filter_map(|id| opposite_name(id, &exists)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn scene(names: &[&str]) -> HashSet<ControllerId> {
        names.iter().map(|n| ControllerId::from(*n)).collect()
    }

    #[test]
    fn swaps_side_prefix_and_keeps_namespace() {
        let s = scene(&["rig:R_ear_01", "rig:R_ear_02"]);
        let got = opposite_name(&"rig:L_ear_01".into(), |c| s.contains(c));
        assert_eq!(got, Some(ControllerId::from("rig:R_ear_01")));
    }

    #[test]
    fn falls_through_to_later_tokens() {
        let s = scene(&["tail_right_ctl"]);
        let got = opposite_name(&"tail_left_ctl".into(), |c| s.contains(c));
        assert_eq!(got, Some(ControllerId::from("tail_right_ctl")));
    }

    #[test]
    fn chain_skips_missing_controllers() {
        let s = scene(&["R_ear_01", "R_ear_03"]);
        let chain: Vec<ControllerId> = ["L_ear_01", "L_ear_02", "L_ear_03"].into_iter().map(Into::into).collect();
        let got = opposite_chain(&chain, |c| s.contains(c));
        assert_eq!(got, vec![ControllerId::from("R_ear_01"), ControllerId::from("R_ear_03")]);
        assert!(opposite_name(&"spine_01".into(), |_| true).is_none());
    }
}
