//! Reward distribution.
//!
//! A forger shares `reward × reward_share` evenly among the opened accounts
//! voting for it and keeps the rest. The integer remainder of the even split
//! stays with the forger, so the credits always sum to the full reward.

use vigil_types::{AccountId, Amount, RewardShare};

/// Plan the credits for one reward: stakeholders first in the given order,
/// then the forger's kept portion. Zero-valued credits are omitted.
pub fn split_reward(
    reward: Amount,
    share: RewardShare,
    forger: AccountId,
    stakeholders: &[AccountId],
) -> Vec<(AccountId, Amount)> {
    let mut credits = Vec::with_capacity(stakeholders.len() + 1);
    let mut kept = reward;

    if let Some((each, _)) = reward.percent_of(share).split(stakeholders.len()) {
        if !each.is_zero() {
            for stakeholder in stakeholders {
                credits.push((*stakeholder, each));
                kept = kept.saturating_sub(each);
            }
        }
    }

    if !kept.is_zero() {
        credits.push((forger, kept));
    }
    credits
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(byte: u8) -> AccountId {
        AccountId::new([byte; 32])
    }

    fn total(credits: &[(AccountId, Amount)]) -> Amount {
        credits
            .iter()
            .fold(Amount::ZERO, |sum, (_, amount)| sum.saturating_add(*amount))
    }

    #[test]
    fn forty_percent_among_three() {
        let share = RewardShare::from_percent(40.0).unwrap();
        let stakeholders = [id(1), id(2), id(3)];
        let credits = split_reward(Amount::from_units(100), share, id(9), &stakeholders);

        // 40 split three ways leaves one raw unit over, which the forger keeps.
        let each = Amount::new(13_333_333);
        assert_eq!(
            credits,
            vec![
                (id(1), each),
                (id(2), each),
                (id(3), each),
                (id(9), Amount::new(60_000_001)),
            ]
        );
        assert_eq!(total(&credits), Amount::from_units(100));
    }

    #[test]
    fn no_stakeholders_means_forger_keeps_all() {
        let credits = split_reward(Amount::from_units(4), RewardShare::FULL, id(9), &[]);
        assert_eq!(credits, vec![(id(9), Amount::from_units(4))]);
    }

    #[test]
    fn full_share_leaves_nothing_but_remainder() {
        let credits = split_reward(
            Amount::from_units(4),
            RewardShare::FULL,
            id(9),
            &[id(1), id(2)],
        );
        assert_eq!(
            credits,
            vec![(id(1), Amount::from_units(2)), (id(2), Amount::from_units(2))]
        );
    }

    #[test]
    fn zero_share_pays_only_the_forger() {
        let credits = split_reward(Amount::from_units(4), RewardShare::NONE, id(9), &[id(1)]);
        assert_eq!(credits, vec![(id(9), Amount::from_units(4))]);
    }

    #[test]
    fn dust_smaller_than_the_stakeholder_count_goes_to_the_forger() {
        let credits = split_reward(Amount::new(2), RewardShare::FULL, id(9), &[id(1), id(2), id(3)]);
        assert_eq!(credits, vec![(id(9), Amount::new(2))]);
    }

    proptest! {
        #[test]
        fn credits_sum_to_the_reward(
            raw in 0u128..1_000_000_000_000,
            bps in 0u16..=10_000,
            holders in 0usize..40,
        ) {
            let share = RewardShare::from_basis_points(bps).unwrap();
            let stakeholders: Vec<AccountId> = (0..holders).map(|i| id(i as u8)).collect();
            let credits = split_reward(Amount::new(raw), share, id(200), &stakeholders);
            prop_assert_eq!(total(&credits), Amount::new(raw));
            prop_assert!(credits.iter().all(|(_, amount)| !amount.is_zero()));
        }
    }
}
