use common::error::Error;
use common::money::dec;
use order_service::compute_split;

#[test]
fn splits_amount_at_default_rate() {
    let split = compute_split(dec!(100.00), dec!(20)).unwrap();

    assert_eq!(split.platform_commission, dec!(20.00));
    assert_eq!(split.agent_earnings, dec!(80.00));
}

#[test]
fn platform_cut_is_rounded_and_agent_cut_is_remainder() {
    // 99.99 * 33.33% = 33.326667, rounds to 33.33
    let split = compute_split(dec!(99.99), dec!(33.33)).unwrap();

    assert_eq!(split.platform_commission, dec!(33.33));
    assert_eq!(split.agent_earnings, dec!(66.66));
}

#[test]
fn midpoint_rounds_away_from_zero() {
    // 0.01 * 50% = 0.005, rounds up to 0.01
    let split = compute_split(dec!(0.01), dec!(50)).unwrap();

    assert_eq!(split.platform_commission, dec!(0.01));
    assert_eq!(split.agent_earnings, dec!(0.00));
}

#[test]
fn split_always_sums_back_to_amount() {
    let amounts = [dec!(0.01), dec!(9.99), dec!(100.00), dec!(123.45), dec!(9876.54)];
    let rates = [dec!(0), dec!(7.5), dec!(12.34), dec!(20), dec!(33.33), dec!(100)];

    for amount in amounts {
        for rate in rates {
            let split = compute_split(amount, rate).unwrap();
            assert_eq!(
                split.platform_commission + split.agent_earnings,
                amount,
                "drift at amount {} rate {}",
                amount,
                rate
            );
        }
    }
}

#[test]
fn boundary_rates_keep_full_amount_on_one_side() {
    let zero = compute_split(dec!(50.00), dec!(0)).unwrap();
    assert_eq!(zero.platform_commission, dec!(0.00));
    assert_eq!(zero.agent_earnings, dec!(50.00));

    let hundred = compute_split(dec!(50.00), dec!(100)).unwrap();
    assert_eq!(hundred.platform_commission, dec!(50.00));
    assert_eq!(hundred.agent_earnings, dec!(0.00));
}

#[test]
fn rejects_rates_outside_bounds() {
    assert!(matches!(
        compute_split(dec!(100.00), dec!(-0.01)),
        Err(Error::InvalidCommissionRate(_))
    ));
    assert!(matches!(
        compute_split(dec!(100.00), dec!(100.01)),
        Err(Error::InvalidCommissionRate(_))
    ));
}

#[test]
fn rejects_non_positive_amounts() {
    assert!(matches!(
        compute_split(dec!(0.00), dec!(20)),
        Err(Error::InvalidAmount(_))
    ));
    assert!(matches!(
        compute_split(dec!(-10.00), dec!(20)),
        Err(Error::InvalidAmount(_))
    ));
}
