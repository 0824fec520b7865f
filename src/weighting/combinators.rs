//! N-ary sum and product over weightings

use super::{Weighting, INFEASIBLE};
use crate::error::{Error, Result};
use crate::graph::{EdgeId, EdgeState};

fn fold(
    parts: &[Box<dyn Weighting>],
    edge: &EdgeState,
    reverse: bool,
    prev_edge: Option<EdgeId>,
    init: f64,
    op: impl Fn(f64, f64) -> f64,
) -> Result<f64> {
    let mut acc = init;
    for part in parts {
        let w = part.calc_weight(edge, reverse, prev_edge)?;
        if w == INFEASIBLE {
            return Ok(INFEASIBLE);
        }
        acc = op(acc, w);
    }
    Ok(acc)
}

fn check_parts(name: &str, parts: &[Box<dyn Weighting>]) -> Result<()> {
    if parts.is_empty() {
        return Err(Error::config(format!("{name} weighting needs at least one operand")));
    }
    Ok(())
}

/// Sum of the operands, evaluated in order
#[derive(Debug)]
pub struct SumWeighting {
    parts: Vec<Box<dyn Weighting>>,
}

impl SumWeighting {
    pub fn new(parts: Vec<Box<dyn Weighting>>) -> Result<Self> {
        check_parts("sum", &parts)?;
        Ok(Self { parts })
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Weighting for SumWeighting {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        reverse: bool,
        prev_edge: Option<EdgeId>,
    ) -> Result<f64> {
        fold(&self.parts, edge, reverse, prev_edge, 0.0, |a, b| a + b)
    }
}

/// Product of the operands, evaluated in order
#[derive(Debug)]
pub struct ProductWeighting {
    parts: Vec<Box<dyn Weighting>>,
}

impl ProductWeighting {
    pub fn new(parts: Vec<Box<dyn Weighting>>) -> Result<Self> {
        check_parts("product", &parts)?;
        Ok(Self { parts })
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Weighting for ProductWeighting {
    fn calc_weight(
        &self,
        edge: &EdgeState,
        reverse: bool,
        prev_edge: Option<EdgeId>,
    ) -> Result<f64> {
        fold(&self.parts, edge, reverse, prev_edge, 1.0, |a, b| a * b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weighting::test_support::edge;
    use crate::weighting::{FastestWeighting, ShortestWeighting};

    /// Constant cost, for checking fold order and sentinels
    #[derive(Debug)]
    struct Fixed(f64);

    impl Weighting for Fixed {
        fn calc_weight(&self, _: &EdgeState, _: bool, _: Option<EdgeId>) -> Result<f64> {
            Ok(self.0)
        }
    }

    #[test]
    fn sum_adds_every_operand() {
        let w = SumWeighting::new(vec![
            Box::new(ShortestWeighting),
            Box::new(FastestWeighting::new()),
            Box::new(Fixed(2.0)),
        ])
        .unwrap();
        let cost = w.calc_weight(&edge(0, 100.0, 36.0), false, None).unwrap();
        assert!((cost - 112.0).abs() < 1e-9);
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn product_of_zero_and_infeasible_stays_infeasible() {
        let w = ProductWeighting::new(vec![
            Box::new(Fixed(0.0)),
            Box::new(Fixed(INFEASIBLE)),
        ])
        .unwrap();
        assert_eq!(w.calc_weight(&edge(0, 1.0, 1.0), false, None).unwrap(), INFEASIBLE);
    }

    #[test]
    fn empty_combinators_are_rejected() {
        assert!(SumWeighting::new(Vec::new()).is_err());
        assert!(ProductWeighting::new(Vec::new()).is_err());
    }

    #[test]
    fn single_operand_is_identity() {
        let sum = SumWeighting::new(vec![Box::new(Fixed(3.5))]).unwrap();
        let product = ProductWeighting::new(vec![Box::new(Fixed(3.5))]).unwrap();
        let e = edge(0, 1.0, 1.0);
        assert_eq!(sum.calc_weight(&e, false, None).unwrap(), 3.5);
        assert_eq!(product.calc_weight(&e, false, None).unwrap(), 3.5);
    }
}
