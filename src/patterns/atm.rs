// Chain of responsibility, by way of an ATM. Every pile of bills hands out as
// many bills as it can towards the requested amount and passes whatever is
// left over to the next pile. The ATM itself only knows where the chain
// starts.
//
// N.B. the stock of a pile is a ceiling for a single withdrawal, not a
// resource that gets used up. Every call to withdraw starts over from the
// configured quantity, so asking for the same amount twice always gives the
// same answer.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AtmError {
    #[error("an ATM needs at least one pile of bills")]
    EmptyChain,

    #[error("bill value must be positive, got {0}")]
    InvalidDenomination(i64),

    #[error("invalid pile '{0}', expected VALUExCOUNT (e.g. 100x1)")]
    InvalidPile(String),
}

/// A stack of bills of a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoneyPile {
    value: i64,
    quantity: u32,
}

impl MoneyPile {
    pub fn new(value: i64, quantity: u32) -> Result<Self, AtmError> {
        if value <= 0 {
            return Err(AtmError::InvalidDenomination(value));
        }
        Ok(Self { value, quantity })
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Try to cover `amount`, delegating any remainder down the chain.
    ///
    /// `rest` is the part of the chain after this pile, so its first element
    /// is this pile's successor. The piles are borrowed from whoever owns the
    /// chain; a pile never owns the next one.
    pub fn withdraw(&self, amount: i64, rest: &[MoneyPile]) -> bool {
        let mut remaining = amount;
        let mut handed_out = 0;

        // Any positive remainder wants another bill, even if the bill is
        // bigger than what is left. That lets the last bill overshoot.
        if remaining > 0 {
            let wanted = remaining / self.value + i64::from(remaining % self.value != 0);
            handed_out = wanted.min(i64::from(self.quantity));
            // Wide enough that the overshoot of the last bill can't overflow.
            remaining = (i128::from(remaining) - i128::from(handed_out) * i128::from(self.value)) as i64;
        }

        debug!(
            value = self.value,
            handed_out,
            remaining,
            "pile visited"
        );

        if remaining <= 0 {
            return true;
        }

        match rest.split_first() {
            Some((next, rest)) => next.withdraw(remaining, rest),
            None => false,
        }
    }
}

impl fmt::Display for MoneyPile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.value, self.quantity)
    }
}

impl FromStr for MoneyPile {
    type Err = AtmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AtmError::InvalidPile(s.to_string());
        let (value, quantity) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let value = value.trim().parse::<i64>().map_err(|_| invalid())?;
        let quantity = quantity.trim().parse::<u32>().map_err(|_| invalid())?;
        MoneyPile::new(value, quantity)
    }
}

/// Owns the chain of piles. Pile `i` hands its remainder to pile `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atm {
    piles: Vec<MoneyPile>,
}

impl Atm {
    pub fn new(piles: Vec<MoneyPile>) -> Result<Self, AtmError> {
        if piles.is_empty() {
            return Err(AtmError::EmptyChain);
        }
        if piles.windows(2).any(|pair| pair[0].value <= pair[1].value) {
            warn!(
                chain = %piles.iter().map(MoneyPile::to_string).collect::<Vec<_>>().join(" -> "),
                "piles are not in descending order of value"
            );
        }
        Ok(Self { piles })
    }

    /// One hundred, two fifties, two twenties and six tens.
    pub fn standard() -> Self {
        Self {
            piles: vec![
                MoneyPile { value: 100, quantity: 1 },
                MoneyPile { value: 50, quantity: 2 },
                MoneyPile { value: 20, quantity: 2 },
                MoneyPile { value: 10, quantity: 6 },
            ],
        }
    }

    pub fn piles(&self) -> &[MoneyPile] {
        &self.piles
    }

    /// Insufficient funds is reported as `false`, never as an error.
    #[instrument(level = "debug", skip(self))]
    pub fn withdraw(&self, amount: i64) -> bool {
        match self.piles.split_first() {
            Some((head, rest)) => head.withdraw(amount, rest),
            // Only reachable if the invariant from `new` was broken.
            None => amount <= 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn atm(piles: &[(i64, u32)]) -> Atm {
        Atm::new(
            piles
                .iter()
                .map(|&(value, quantity)| MoneyPile::new(value, quantity).unwrap())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_standard_example() {
        let atm = Atm::standard();
        assert!(!atm.withdraw(310));
        assert!(atm.withdraw(150));
    }

    #[rstest]
    #[case(0, true)]
    #[case(-40, true)]
    #[case(100, true)]
    #[case(150, true)]
    #[case(200, true)]
    #[case(300, true)]
    #[case(310, false)]
    #[case(301, false)]
    // The last bill handed out may overshoot instead of refusing.
    #[case(295, true)]
    #[case(5, true)]
    fn test_standard_amounts(#[case] amount: i64, #[case] expected: bool) {
        assert_eq!(Atm::standard().withdraw(amount), expected);
    }

    #[test]
    fn test_stock_is_not_depleted_between_calls() {
        let atm = atm(&[(10, 1)]);
        assert!(atm.withdraw(10));
        assert!(atm.withdraw(10));
        assert_eq!(atm.piles()[0].quantity(), 1);
    }

    #[test]
    fn test_huge_pile_is_counted_not_looped() {
        let atm = atm(&[(1, u32::MAX)]);
        assert!(atm.withdraw(3_000_000_000));
        assert!(atm.withdraw(i64::from(u32::MAX)));
        assert!(!atm.withdraw(i64::from(u32::MAX) + 1));
    }

    #[test]
    fn test_overshoot_near_i64_max() {
        let atm = atm(&[(i64::MAX, 1)]);
        assert!(atm.withdraw(i64::MAX));
        assert!(atm.withdraw(1));
    }

    #[test]
    fn test_short_circuits_before_later_piles() {
        // The tail pile alone could never pay 100, so reaching it would fail.
        let atm = atm(&[(100, 1), (1, 0)]);
        assert!(atm.withdraw(100));
        assert!(!atm.withdraw(101));
    }

    #[test]
    fn test_empty_pile_passes_everything_on() {
        let atm = atm(&[(50, 0), (10, 5)]);
        assert!(atm.withdraw(50));
        assert!(!atm.withdraw(60));
    }

    #[test]
    fn test_out_of_order_chain_still_works() {
        let atm = atm(&[(10, 1), (100, 1)]);
        assert!(atm.withdraw(110));
    }

    #[test]
    fn test_rejects_empty_chain() {
        assert_eq!(Atm::new(Vec::new()), Err(AtmError::EmptyChain));
    }

    #[rstest]
    #[case(0)]
    #[case(-5)]
    fn test_rejects_non_positive_denomination(#[case] value: i64) {
        assert_eq!(
            MoneyPile::new(value, 1),
            Err(AtmError::InvalidDenomination(value))
        );
    }

    #[rstest]
    #[case("100x1", 100, 1)]
    #[case(" 20X2 ", 20, 2)]
    #[case("10 x 6", 10, 6)]
    fn test_parse_pile(#[case] input: &str, #[case] value: i64, #[case] quantity: u32) {
        let pile: MoneyPile = input.parse().unwrap();
        assert_eq!(pile, MoneyPile::new(value, quantity).unwrap());
    }

    #[rstest]
    #[case("100")]
    #[case("x1")]
    #[case("100x-1")]
    #[case("ax1")]
    fn test_parse_pile_rejects_garbage(#[case] input: &str) {
        assert_eq!(
            input.parse::<MoneyPile>(),
            Err(AtmError::InvalidPile(input.to_string()))
        );
    }

    #[test]
    fn test_parse_pile_rejects_zero_value() {
        assert_eq!(
            "0x3".parse::<MoneyPile>(),
            Err(AtmError::InvalidDenomination(0))
        );
    }

    #[test]
    fn test_display_round_trips() {
        for pile in Atm::standard().piles() {
            assert_eq!(pile.to_string().parse::<MoneyPile>().unwrap(), *pile);
        }
    }

    fn arb_atm() -> impl Strategy<Value = Atm> {
        prop::collection::vec((1i64..500, 0u32..10), 1..6).prop_map(|piles| atm(&piles))
    }

    proptest! {
        #[test]
        fn non_positive_amounts_always_succeed(atm in arb_atm(), amount in -10_000i64..=0) {
            prop_assert!(atm.withdraw(amount));
        }

        #[test]
        fn repeated_withdrawals_agree(atm in arb_atm(), amount in -100i64..5_000) {
            let first = atm.withdraw(amount);
            prop_assert_eq!(atm.withdraw(amount), first);
            prop_assert_eq!(atm.withdraw(amount), first);
        }

        #[test]
        fn never_pays_more_than_total_stock_plus_one_bill(atm in arb_atm(), amount in 1i64..5_000) {
            let total: i64 = atm.piles().iter().map(|p| p.value() * p.quantity() as i64).sum();
            if amount > total {
                prop_assert!(!atm.withdraw(amount));
            }
        }
    }
}
