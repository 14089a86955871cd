//! First-improvement cyclic hill climbing on a single individual.
//!
//! Starting from a random site, the search tries the site's frequency
//! alternatives in offset order `0, 1, 2, ...` and commits the first one
//! whose previewed score is strictly below the current score, then moves
//! to the next site (circularly). Sites without an improving alternative
//! are skipped.
//!
//! # Budget
//!
//! Every rejected alternative costs one unit and every move to the next
//! site costs two. A committed alternative is free. The search stops
//! as soon as the budget is used up, even in the middle of a site.

use crate::error::Result;
use crate::ga::Individual;
use crate::problem::Score;
use crate::random::RandomSource;

/// Refines `ind` in place under `budget` units. Returns the final score.
///
/// The score never increases. One random draw selects the start site.
pub fn local_search<R: RandomSource + ?Sized>(
    ind: &mut Individual<'_>,
    budget: usize,
    rng: &mut R,
) -> Result<Score> {
    let problem = ind.problem();
    let n = problem.site_count();
    if n == 0 {
        return Ok(ind.score());
    }

    let mut site = rng.index(n);
    let mut used = 0;
    while used < budget {
        let range = problem.range_size(site);
        let mut offset = 0;
        while offset < range && used < budget {
            if ind.preview_change(site, offset)? < ind.score() {
                ind.commit_change(site, offset)?;
                break;
            }
            offset += 1;
            used += 1;
        }
        site = (site + 1) % n;
        used += 2;
    }
    Ok(ind.score())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::fixtures::{random_instance, three_sites};
    use crate::random::testing::ScriptedRng;
    use crate::random::SeededRng;

    #[test]
    fn test_commits_first_improvement() {
        let p = three_sites();
        let mut ind = Individual::from_assignment(&p, vec![2, 0, 0]).unwrap();
        let mut rng = ScriptedRng::new(&[0]);
        assert_eq!(local_search(&mut ind, 10, &mut rng).unwrap(), 0);
        // offset 0 is the current index; offset 1 wraps 30 -> 10
        assert_eq!(ind.genes()[0], 0);
        assert_eq!(rng.requests, vec![(0, 2)]);
    }

    #[test]
    fn test_budget_runs_out_before_improvement() {
        let p = three_sites();
        // start at site 1: 2 rejections + advance (4), 1 rejection + advance
        // (7), then site 0 offset 0 rejected (8)
        for budget in [7, 8] {
            let mut ind = Individual::from_assignment(&p, vec![2, 0, 0]).unwrap();
            let mut rng = ScriptedRng::new(&[1]);
            assert_eq!(local_search(&mut ind, budget, &mut rng).unwrap(), 7);
            assert_eq!(ind.genes(), &[2, 0, 0]);
        }

        let mut ind = Individual::from_assignment(&p, vec![2, 0, 0]).unwrap();
        let mut rng = ScriptedRng::new(&[1]);
        assert_eq!(local_search(&mut ind, 9, &mut rng).unwrap(), 0);
    }

    #[test]
    fn test_zero_budget_is_noop() {
        let p = three_sites();
        let mut ind = Individual::from_assignment(&p, vec![2, 0, 0]).unwrap();
        let mut rng = ScriptedRng::new(&[0]);
        assert_eq!(local_search(&mut ind, 0, &mut rng).unwrap(), 7);
        assert_eq!(rng.requests.len(), 1);
    }

    #[test]
    fn test_never_worsens_and_stays_consistent() {
        let p = random_instance(40, 0.25, 13);
        let mut rng = SeededRng::new(99);
        for _ in 0..20 {
            let mut ind = Individual::random(&p, &mut rng).unwrap();
            let before = ind.score();
            let after = local_search(&mut ind, 200, &mut rng).unwrap();
            assert!(after <= before, "local search worsened {before} -> {after}");
            assert_eq!(ind.clone().evaluate().unwrap(), after);
        }
    }

    #[test]
    fn test_improves_random_start() {
        let p = random_instance(40, 0.25, 13);
        let mut rng = SeededRng::new(3);
        let mut gained = 0;
        for _ in 0..10 {
            let mut ind = Individual::random(&p, &mut rng).unwrap();
            let before = ind.score();
            gained += before - local_search(&mut ind, 400, &mut rng).unwrap();
        }
        assert!(gained > 0, "expected some improvement over ten random starts");
    }
}
